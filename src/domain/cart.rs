use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}

/// A line held in the client-side staged cart, before the user has logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedCartItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// How `update_item` combines the requested quantity with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    Increment,
    Decrement,
    Set,
}

impl UpdateMode {
    /// New line quantity, never below one.
    pub fn apply(self, current: i32, quantity: i32) -> Result<i32, DomainError> {
        ensure_positive_quantity(quantity)?;
        let next = match self {
            UpdateMode::Increment => current.checked_add(quantity),
            UpdateMode::Decrement => current.checked_sub(quantity),
            UpdateMode::Set => Some(quantity),
        }
        .ok_or_else(|| DomainError::invalid("quantity out of range"))?;

        if next < 1 {
            return Err(DomainError::invalid(format!(
                "cannot decrement quantity {current} by {quantity}; remove the item instead"
            )));
        }
        Ok(next)
    }
}

pub fn ensure_positive_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity <= 0 {
        return Err(DomainError::invalid(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    Ok(())
}

/// Collapses staged lines so each product appears once, summing quantities.
/// Output is ordered by product id.
pub fn aggregate_staged(items: &[StagedCartItem]) -> Result<Vec<StagedCartItem>, DomainError> {
    let mut merged: BTreeMap<Uuid, i32> = BTreeMap::new();
    for item in items {
        ensure_positive_quantity(item.quantity)?;
        let entry = merged.entry(item.product_id).or_insert(0);
        *entry = entry
            .checked_add(item.quantity)
            .ok_or_else(|| DomainError::invalid("staged quantity out of range"))?;
    }
    Ok(merged
        .into_iter()
        .map(|(product_id, quantity)| StagedCartItem {
            product_id,
            quantity,
        })
        .collect())
}
