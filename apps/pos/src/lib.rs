//! # FerrePOS Application Library
//!
//! The command layer a web front-end calls into, plus the startup helpers
//! used by the operator binary.
//!
//! ## Module Organization
//! ```text
//! ferre_pos/
//! ├── lib.rs          ◄─── You are here (startup helpers)
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState (Database + AppConfig + AccessGate)
//! │   └── config.rs   ◄─── AppConfig::from_env
//! ├── gate.rs         ◄─── Access gate: route policy + session lookup
//! ├── commands/       ◄─── One async function per user action
//! └── error.rs        ◄─── ApiError { code, message }
//! ```
//!
//! ## Embedding
//! ```rust,ignore
//! ferre_pos::init_tracing();
//! let state = AppState::connect(AppConfig::from_env()?).await?;
//!
//! // inside a request handler
//! match commands::access::check_access(&state, Some(&actor), path).await? {
//!     GateDecision::Allow => {}
//!     GateDecision::RedirectToOpenSession { location } => return redirect(location),
//! }
//! let cart = commands::cart::add_to_cart(&state, &actor, request).await?;
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter                                │
//! │     • Default: info,ferre=debug,sqlx=warn; override with RUST_LOG       │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • FERRE_* variables over defaults                                   │
//! │     • Database path: FERRE_DB_PATH or the platform data directory       │
//! │                                                                         │
//! │  3. Connect to Database ──────────────────────────────────────────────► │
//! │     • SQLite with WAL mode, foreign keys on                             │
//! │     • Run pending migrations                                            │
//! │                                                                         │
//! │  4. Build AppState ───────────────────────────────────────────────────► │
//! │     • Access gate from the configured routes                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod gate;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use gate::{AccessGate, Landing};
pub use state::{AppConfig, AppState, ConfigError, StartupError};

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=ferre=trace` - Show trace for ferre crates only
/// - Default: `info,ferre=debug,sqlx=warn`
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ferre=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
