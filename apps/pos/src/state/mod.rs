//! # State Module
//!
//! Everything a command needs, built once at startup.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │   Database   │  │    AppConfig     │  │   AccessGate     │          │
//! │  │              │  │                  │  │                  │          │
//! │  │  SQLite pool │  │  FERRE_* env     │  │  GatePolicy      │          │
//! │  │  repositories│  │  limits, routes  │  │  (from config)   │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • AppConfig / AccessGate: read-only after initialization              │
//! │  • Carts live in the database, so there is no in-process cart lock     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;

pub use config::{AppConfig, ConfigError};

use thiserror::Error;
use tracing::info;

use crate::gate::AccessGate;
use ferre_db::{Database, DbConfig, DbError};

/// Failures while bringing the application up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Shared application state handed to every command.
#[derive(Debug)]
pub struct AppState {
    db: Database,
    config: AppConfig,
    gate: AccessGate,
}

impl AppState {
    /// Wraps an already opened database.
    pub fn new(db: Database, config: AppConfig) -> Self {
        let gate = AccessGate::new(config.gate.clone());
        AppState { db, config, gate }
    }

    /// Opens the configured database file, applying migrations.
    pub async fn connect(config: AppConfig) -> Result<Self, StartupError> {
        config.ensure_data_dir()?;
        info!(path = ?config.database_path(), "Opening database");

        let db_config = DbConfig::new(config.database_path()).max_connections(config.max_connections);
        let db = Database::new(db_config).await?;

        info!("Database connected and migrations applied");
        Ok(AppState::new(db, config))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use ferre_core::{Actor, Product, DEFAULT_LOW_STOCK_THRESHOLD};
    use ferre_db::repository::generate_id;

    pub async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory())
            .await
            .expect("Failed to create test database");
        AppState::new(db, AppConfig::with_database_path(":memory:"))
    }

    pub async fn actor(state: &AppState, username: &str, is_admin: bool) -> Actor {
        let user = state
            .db()
            .users()
            .create(username, is_admin)
            .await
            .expect("Failed to create user");
        Actor::from(&user)
    }

    pub async fn stocked(state: &AppState, sku: &str, price_cents: i64, stock: i64) -> Product {
        let now = chrono::Utc::now();
        let product = Product {
            id: generate_id(),
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            price_cents,
            cost_cents: Some(price_cents / 2),
            stock,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            category_id: None,
            supplier_id: None,
            created_at: now,
            updated_at: now,
        };
        state
            .db()
            .products()
            .insert(&product)
            .await
            .expect("Failed to insert product");
        product
    }
}
