//! # Commands Module
//!
//! All commands exposed to the web layer.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── access.rs   ◄─── Access gate check, post-login landing
//! ├── session.rs  ◄─── Open/close cash drawer, session audit
//! ├── cart.rs     ◄─── Per-user cart manipulation
//! ├── sale.rs     ◄─── Checkout, sale lookup
//! ├── returns.rs  ◄─── Return search and processing
//! ├── product.rs  ◄─── Product list/get/create/edit/restock
//! ├── catalog.rs  ◄─── Categories and suppliers
//! ├── client.rs   ◄─── Client CRUD and search
//! └── report.rs   ◄─── Dashboard, sales report, monthly, inventory
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Web layer (authenticates the user, owns HTML and routing)              │
//! │  ─────────                                                              │
//! │  POST /pos/add-product/  sku=A1                                         │
//! │         │                                                               │
//! │         │ builds Actor from the login, deserializes the form            │
//! │         ▼                                                               │
//! │  Rust Backend                                                           │
//! │  ────────────                                                           │
//! │  async fn add_to_cart(                                                  │
//! │      state: &AppState,          ◄── Shared, built at startup           │
//! │      actor: &Actor,             ◄── Who is acting                      │
//! │      request: AddToCartRequest, ◄── camelCase JSON / form fields       │
//! │  ) -> Result<AddToCartResponse, ApiError>                               │
//! │         │                                                               │
//! │         │ (JSON serialization)                                          │
//! │         ▼                                                               │
//! │  Web layer renders the row, or the error code + message                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands that act "as the cashier" take the [`Actor`](ferre_core::Actor);
//! admin-only views do not check roles here. Authorization is the web
//! layer's job.

pub mod access;
pub mod cart;
pub mod catalog;
pub mod client;
pub mod product;
pub mod report;
pub mod returns;
pub mod sale;
pub mod session;
