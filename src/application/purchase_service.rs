use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::money::checked_sum;
use crate::domain::ports::{ReceiptRenderer, Store, UnitOfWork};
use crate::domain::purchase::{Purchase, PurchaseRecord};

/// Read side of past purchases: history and receipts.
#[derive(Clone)]
pub struct PurchaseService<U> {
    uow: U,
    renderer: Arc<dyn ReceiptRenderer>,
}

impl<U: UnitOfWork> PurchaseService<U> {
    pub fn new(uow: U, renderer: Arc<dyn ReceiptRenderer>) -> Self {
        Self { uow, renderer }
    }

    pub fn list_purchases(&self, user_id: Uuid) -> Result<Vec<PurchaseRecord>, DomainError> {
        self.uow.run(|store| {
            store
                .list_purchases(user_id)?
                .into_iter()
                .map(|purchase| load_record(store, purchase))
                .collect()
        })
    }

    /// Returns [`DomainError::PurchaseNotFound`] for purchases owned by
    /// somebody else.
    pub fn get_purchase(
        &self,
        user_id: Uuid,
        purchase_id: Uuid,
    ) -> Result<PurchaseRecord, DomainError> {
        self.uow.run(|store| {
            let purchase = store
                .find_purchase(purchase_id, user_id)?
                .ok_or(DomainError::PurchaseNotFound)?;
            load_record(store, purchase)
        })
    }

    pub fn render_receipt(&self, user_id: Uuid, purchase_id: Uuid) -> Result<Vec<u8>, DomainError> {
        let record = self.get_purchase(user_id, purchase_id)?;
        self.renderer.render(&record.purchase, &record.lines)
    }
}

fn load_record(store: &mut dyn Store, purchase: Purchase) -> Result<PurchaseRecord, DomainError> {
    let lines = store.receipt_lines(purchase.id)?;
    let ticket = store.find_ticket(purchase.id)?;
    let total_price = match &ticket {
        Some(ticket) => ticket.total_price,
        None => checked_sum(lines.iter().map(|l| l.total_price))?,
    };
    Ok(PurchaseRecord {
        purchase,
        ticket_id: ticket.map(|t| t.id),
        total_price,
        lines,
    })
}
