//! # Error Types
//!
//! Domain-specific error types for ferre-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ferre-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  ferre-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  ferre-pos errors (app)                                                │
//! │  └── ApiError         - What the web layer sees (code + message)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Web layer    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant aborts the enclosing transaction. Nothing here is retried.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found (by id or SKU).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Requested quantity exceeds available stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan "A1" a sixth time (stock: 5)
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "A1", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// UI shows: "Only 5 of Hammer A1 in stock"
    /// ```
    #[error("Insufficient stock for {name} ({sku}): available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// The user already has an open cash-drawer session.
    #[error("User {user_id} already has an open cash drawer session")]
    SessionAlreadyOpen { user_id: String },

    /// The session was already closed; CLOSED is terminal.
    #[error("Cash drawer session {session_id} is already closed")]
    SessionClosed { session_id: String },

    /// The session still has sales attached and cannot be deleted.
    #[error("Cash drawer session {session_id} has sales and cannot be deleted")]
    SessionHasSales { session_id: String },

    /// The acting user has no open cash-drawer session.
    #[error("User {user_id} has no open cash drawer session")]
    NoActiveSession { user_id: String },

    /// Checkout was requested on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed distinct products.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for the variants the web layer reports as a conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::SessionAlreadyOpen { .. }
                | CoreError::SessionClosed { .. }
                | CoreError::SessionHasSales { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, malformed decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A return asks for more units than are still returnable.
    #[error("Cannot return {requested} of {product}: only {remaining} remaining")]
    ReturnExceedsPurchase {
        product: String,
        requested: i64,
        remaining: i64,
    },

    /// A return without a single positive quantity.
    #[error("Select at least one item to return")]
    EmptyReturn,

    /// A return line names an item that does not belong to the sale.
    #[error("Item {sale_item_id} is not part of this sale")]
    NotInSale { sale_item_id: String },

    /// Compensating sales record a return; they are not returnable.
    #[error("Sale {sale_id} records a return and cannot itself be returned")]
    NotReturnable { sale_id: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "A1".to_string(),
            name: "Hammer".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Hammer (A1): available 5, requested 6"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::ReturnExceedsPurchase {
            product: "Hammer".to_string(),
            requested: 4,
            remaining: 3,
        };
        assert_eq!(
            err.to_string(),
            "Cannot return 4 of Hammer: only 3 remaining"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::EmptyReturn.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_conflict());
    }

    #[test]
    fn test_session_errors_are_conflicts() {
        let err = CoreError::SessionAlreadyOpen {
            user_id: "u1".to_string(),
        };
        assert!(err.is_conflict());
        assert!(!CoreError::NoActiveSession {
            user_id: "u1".to_string()
        }
        .is_conflict());
    }
}
