//! # Repository Module
//!
//! Database repository implementations for FerrePOS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  ferre-pos command                                                     │
//! │       │                                                                 │
//! │       │  db.sales().checkout(&actor.user_id, PaymentMethod::Cash, None) │
//! │       ▼                                                                 │
//! │  Reference data        Till & cart          Transactions     Reads     │
//! │  ──────────────        ───────────          ────────────     ─────     │
//! │  UserRepository        SessionRepository    SaleRepository   Report-   │
//! │  CatalogRepository     CartRepository       ReturnRepository Repository│
//! │  ProductRepository                                                     │
//! │  ClientRepository                                                      │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked sqlx queries)                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multi-statement writes (checkout, return) open one transaction and pass
//! `&mut SqliteConnection` to the helpers below, so every statement of the
//! operation commits or rolls back together.

pub mod cart;
pub mod catalog;
pub mod client;
pub mod product;
pub mod report;
pub mod returns;
pub mod sale;
pub mod session;
pub mod user;

/// Generates a new entity id (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Builds a `LIKE ... ESCAPE '\'` pattern matching `query` anywhere.
pub(crate) fn contains_pattern(query: &str) -> String {
    format!("%{}%", escape_like(query))
}

/// Builds a `LIKE ... ESCAPE '\'` pattern matching values starting with `query`.
pub(crate) fn prefix_pattern(query: &str) -> String {
    format!("{}%", escape_like(query))
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}


#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the repository tests.

    use chrono::Utc;
    use ferre_core::{Money, Product, User};

    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn cashier(db: &Database, username: &str) -> User {
        db.users().create(username, false).await.unwrap()
    }

    pub fn product(sku: &str, price: Money, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_id(),
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            price_cents: price.cents(),
            cost_cents: Some(price.cents() / 2),
            stock,
            low_stock_threshold: 5,
            category_id: None,
            supplier_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn stocked_product(db: &Database, sku: &str, price: Money, stock: i64) -> Product {
        let product = product(sku, price, stock);
        db.products().insert(&product).await.unwrap();
        product
    }
}
