use log::warn;
use uuid::Uuid;

use crate::domain::cart::{aggregate_staged, CartItem, StagedCartItem, UpdateMode};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartStore, Catalog, UserDirectory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub cart_id: Uuid,
    /// Persisted lines touched by the merge, after incrementing.
    pub merged: Vec<CartItem>,
    /// Staged products that no longer exist in the catalog.
    pub skipped: Vec<Uuid>,
}

/// Folds a client-side staged cart into the user's persisted cart.
pub struct CartMerger;

impl CartMerger {
    /// Must run inside a unit of work: the cart row stays locked until it
    /// commits, so two concurrent merges cannot both add the staged lines on
    /// top of the same base.
    pub fn merge<S>(
        store: &mut S,
        user_id: Uuid,
        staged: &[StagedCartItem],
    ) -> Result<MergeOutcome, DomainError>
    where
        S: UserDirectory + Catalog + CartStore + ?Sized,
    {
        let user = store.get_user(user_id)?.ok_or(DomainError::UserNotFound)?;
        let cart = store.ensure_cart(user.id)?;
        store.lock_cart(cart.id)?;

        let mut outcome = MergeOutcome {
            cart_id: cart.id,
            merged: Vec::new(),
            skipped: Vec::new(),
        };

        for line in aggregate_staged(staged)? {
            let existing = store.get_item(cart.id, line.product_id)?;
            if existing.is_none() && store.get_product(line.product_id)?.is_none() {
                warn!(
                    "Skipping staged product {} for user {}: not in catalog",
                    line.product_id, user.id
                );
                outcome.skipped.push(line.product_id);
                continue;
            }
            if let Some(existing) = &existing {
                UpdateMode::Increment.apply(existing.quantity, line.quantity)?;
            }
            let item = store.add_item(cart.id, line.product_id, line.quantity)?;
            outcome.merged.push(item);
        }

        Ok(outcome)
    }
}
