//! # Return Planning
//!
//! Turns a cashier's return form into a validated plan before anything is
//! written. The database layer runs the plan inside one transaction.
//!
//! ## Cumulative Cap
//! ```text
//!  Sale item: 3 × Hammer @ 10.00
//!
//!  return #1: 2  ──► remaining 1
//!  return #2: 2  ──► ReturnExceedsPurchase { requested: 2, remaining: 1 }
//!  return #2: 1  ──► remaining 0
//! ```
//!
//! Previously returned quantities are passed in by the caller, summed per
//! sale item over every earlier return of the same sale.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{ReturnableItem, SaleItem};

/// Requested quantity for one original sale item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnRequest {
    pub sale_item_id: String,
    #[serde(default)]
    pub quantity: i64,
}

/// A validated line of a return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnLine {
    pub sale_item_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub refund_cents: i64,
}

/// Everything a return will write, computed up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnPlan {
    pub lines: Vec<ReturnLine>,
    pub total_refund_cents: i64,
}

impl ReturnPlan {
    #[inline]
    pub fn total_refund(&self) -> Money {
        Money::from_cents(self.total_refund_cents)
    }
}

/// Validates a return against the sale's items.
///
/// `already_returned` maps sale item id to units returned by earlier
/// returns of the same sale. Missing entries mean zero.
///
/// ## Errors
/// - [`ValidationError::Negative`] for a negative quantity
/// - [`ValidationError::NotInSale`] for an item of another sale
/// - [`ValidationError::ReturnExceedsPurchase`] past the cumulative cap
/// - [`ValidationError::EmptyReturn`] when no quantity is positive
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use ferre_core::{plan_return, ReturnRequest, SaleItem};
///
/// let item = SaleItem {
///     id: "i1".into(), sale_id: "s1".into(), product_id: "p1".into(),
///     product_name: "Hammer".into(), sku: "A1".into(),
///     quantity: 3, unit_price_cents: 1000, subtotal_cents: 3000,
/// };
/// let plan = plan_return(
///     &[item],
///     &HashMap::new(),
///     &[ReturnRequest { sale_item_id: "i1".into(), quantity: 2 }],
/// ).unwrap();
/// assert_eq!(plan.total_refund_cents, 2000);
/// ```
pub fn plan_return(
    items: &[SaleItem],
    already_returned: &HashMap<String, i64>,
    requests: &[ReturnRequest],
) -> Result<ReturnPlan, ValidationError> {
    let mut requested: HashMap<&str, i64> = HashMap::new();
    for request in requests {
        if request.quantity < 0 {
            return Err(ValidationError::Negative {
                field: "quantity".to_string(),
            });
        }
        let Some(item) = items.iter().find(|i| i.id == request.sale_item_id) else {
            return Err(ValidationError::NotInSale {
                sale_item_id: request.sale_item_id.clone(),
            });
        };

        // Never more than the line's own quantity, so the sum cannot overflow.
        let entry = requested.entry(item.id.as_str()).or_insert(0);
        match entry.checked_add(request.quantity) {
            Some(total) if total <= item.quantity => *entry = total,
            total => {
                return Err(ValidationError::ReturnExceedsPurchase {
                    product: item.product_name.clone(),
                    requested: total.unwrap_or(i64::MAX),
                    remaining: remaining_for(item, already_returned),
                });
            }
        }
    }

    let mut lines = Vec::new();
    for item in items {
        let quantity = requested.get(item.id.as_str()).copied().unwrap_or(0);
        if quantity == 0 {
            continue;
        }

        let remaining = remaining_for(item, already_returned);
        if quantity > remaining {
            return Err(ValidationError::ReturnExceedsPurchase {
                product: item.product_name.clone(),
                requested: quantity,
                remaining,
            });
        }

        lines.push(ReturnLine {
            sale_item_id: item.id.clone(),
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            quantity,
            unit_price_cents: item.unit_price_cents,
            refund_cents: item.unit_price().multiply_quantity(quantity).cents(),
        });
    }

    if lines.is_empty() {
        return Err(ValidationError::EmptyReturn);
    }

    let total_refund_cents = lines.iter().map(|l| l.refund_cents).sum();
    Ok(ReturnPlan {
        lines,
        total_refund_cents,
    })
}

/// Pairs each sale item with what was already returned and what remains.
pub fn returnable_items(
    items: Vec<SaleItem>,
    already_returned: &HashMap<String, i64>,
) -> Vec<ReturnableItem> {
    items
        .into_iter()
        .map(|item| {
            let returned = already_returned.get(&item.id).copied().unwrap_or(0);
            let remaining = remaining_for(&item, already_returned);
            ReturnableItem {
                item,
                already_returned: returned,
                remaining,
            }
        })
        .collect()
}

fn remaining_for(item: &SaleItem, already_returned: &HashMap<String, i64>) -> i64 {
    let returned = already_returned.get(&item.id).copied().unwrap_or(0);
    (item.quantity - returned).max(0)
}
