//! # FerrePOS Operator Tool
//!
//! Maintenance and reporting from the command line. Output is JSON on
//! stdout; logs go to stderr.
//!
//! ## Usage
//! ```bash
//! ferre-pos migrate
//! ferre-pos dashboard
//! ferre-pos daily --date 2024-03-15
//! ferre-pos sales-report --from 2024-03-01 --to 2024-03-31 --table
//! ferre-pos monthly --year 2024 --table
//! ferre-pos low-stock
//! ferre-pos inventory
//!
//! # Any command against another database file
//! ferre-pos --db ./data/ferrepos.db dashboard
//! ```
//!
//! Demo data comes from the `seed` binary of ferre-db.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use ferre_db::migrations::migration_status;
use ferre_pos::commands::report::{self, DateRange};
use ferre_pos::{init_tracing, AppConfig, AppState};

#[derive(Debug, Parser)]
#[command(name = "ferre-pos", about = "FerrePOS operator tool", long_about = None)]
struct Cli {
    /// SQLite database file (default: the platform data directory)
    #[arg(short, long, global = true, env = "FERRE_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations
    Migrate,
    /// Today's summary, top products and low stock
    Dashboard,
    /// Summary for one day
    Daily {
        /// Day to summarize, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Sales with cash, card and refund totals
    SalesReport(SalesReportArgs),
    /// Monthly totals for one year
    Monthly(MonthlyArgs),
    /// Products at or below their threshold
    LowStock,
    /// Stock grouped by supplier
    Inventory,
}

#[derive(Debug, Args)]
struct SalesReportArgs {
    /// First day, YYYY-MM-DD
    #[arg(long)]
    from: NaiveDate,

    /// Last day (included), YYYY-MM-DD
    #[arg(long)]
    to: NaiveDate,

    /// Flatten into headers and rows for export
    #[arg(long)]
    table: bool,
}

#[derive(Debug, Args)]
struct MonthlyArgs {
    /// Calendar year (default: this year)
    #[arg(long)]
    year: Option<i32>,

    /// Flatten into headers and rows for export
    #[arg(long)]
    table: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(path) = cli.db {
        config.database_path = path;
    }

    let state = AppState::connect(config).await.context("Could not open database")?;
    let result = run(&state, cli.command).await;
    state.db().close().await;
    result
}

async fn run(state: &AppState, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Migrate => {
            let (total, applied) = migration_status(state.db().pool()).await?;
            info!(total, applied, "Migrations up to date");
            print_json(&serde_json::json!({ "total": total, "applied": applied }))
        }
        Command::Dashboard => print_json(&report::dashboard(state).await?),
        Command::Daily { date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            print_json(&report::daily_summary(state, date).await?)
        }
        Command::SalesReport(args) => {
            let range = DateRange::new(args.from, args.to);
            if args.table {
                print_json(&report::sales_report_table(state, range).await?)
            } else {
                print_json(&report::sales_report(state, range).await?)
            }
        }
        Command::Monthly(args) => {
            let range = DateRange::year(args.year.unwrap_or_else(|| Utc::now().year()))?;
            if args.table {
                print_json(&report::monthly_table(state, range).await?)
            } else {
                print_json(&report::monthly_summary(state, range).await?)
            }
        }
        Command::LowStock => print_json(&report::low_stock_alert(state).await?),
        Command::Inventory => print_json(&report::supplier_inventory(state).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sales_report_arguments() {
        let cli = Cli::try_parse_from([
            "ferre-pos",
            "sales-report",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-31",
            "--table",
        ])
        .unwrap();

        match cli.command {
            Command::SalesReport(args) => {
                assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
                assert_eq!(args.to, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
                assert!(args.table);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["ferre-pos", "daily", "--date", "15/03/2024"]).is_err());
        assert!(Cli::try_parse_from(["ferre-pos", "sales-report", "--from", "2024-03-01"]).is_err());
    }

    #[test]
    fn test_db_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["ferre-pos", "low-stock", "--db", "shop.db"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("shop.db")));
        assert!(matches!(cli.command, Command::LowStock));
    }
}
