//! # ferre-db: Database Layer for FerrePOS
//!
//! This crate provides database access for the FerrePOS system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FerrePOS Data Flow                               │
//! │                                                                         │
//! │  ferre-pos command (checkout, process_return, open_session, ...)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     ferre-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SessionRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ 001_initial_ │  │   │
//! │  │   │ Connection    │    │ ReturnRepo    │    │  schema.sql  │  │   │
//! │  │   │ Management    │    │ CartRepo, ... │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/ferrepos/ferrepos.db (per-platform data dir)   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ferre_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/ferrepos.db")).await?;
//!
//! let session = db.sessions().open(&user_id, Money::from_cents(10_000)).await?;
//! db.carts().add_by_sku(&user_id, "A1", 3).await?;
//! let receipt = db.sales().checkout(&user_id, PaymentMethod::Cash, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::client::ClientRepository;
pub use repository::product::ProductRepository;
pub use repository::report::{day_bounds, ReportRepository};
pub use repository::returns::ReturnRepository;
pub use repository::sale::SaleRepository;
pub use repository::session::SessionRepository;
pub use repository::user::UserRepository;
