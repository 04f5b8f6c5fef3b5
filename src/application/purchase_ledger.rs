use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::catalog::User;
use crate::domain::errors::DomainError;
use crate::domain::ports::PurchaseRepository;
use crate::domain::purchase::{Purchase, ShippingAddress};

pub struct PurchaseLedger;

impl PurchaseLedger {
    /// Records a new purchase owned by `user`, stamped with `now`.
    ///
    /// The caller is responsible for having checked that the user's cart is
    /// not empty.
    pub fn create<S>(
        store: &mut S,
        address: ShippingAddress,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<Purchase, DomainError>
    where
        S: PurchaseRepository + ?Sized,
    {
        let purchase = Purchase {
            id: Uuid::new_v4(),
            owner_id: user.id,
            transaction_date: now,
            address,
        };
        store.insert_purchase(&purchase)?;
        Ok(purchase)
    }
}
