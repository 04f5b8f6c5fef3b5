use uuid::Uuid;

use crate::domain::catalog::User;
use crate::domain::errors::DomainError;
use crate::domain::money::checked_sum;
use crate::domain::ports::TicketRepository;
use crate::domain::purchase::{Purchase, SaleItem, Ticket};

/// Aggregates sale items into the purchase's receipt.
pub struct TicketIssuer;

impl TicketIssuer {
    pub fn issue<S>(
        store: &mut S,
        user: &User,
        purchase: &Purchase,
        sale_items: Vec<SaleItem>,
    ) -> Result<Ticket, DomainError>
    where
        S: TicketRepository + ?Sized,
    {
        if sale_items.is_empty() {
            return Err(DomainError::invalid("a ticket needs at least one sale item"));
        }
        if let Some(stray) = sale_items.iter().find(|s| s.purchase_id != purchase.id) {
            return Err(DomainError::Internal(format!(
                "sale item for product {} belongs to another purchase",
                stray.product_id
            )));
        }

        let total_price = checked_sum(sale_items.iter().map(|s| s.total_price))?;
        let ticket = Ticket {
            id: Uuid::new_v4(),
            purchase_id: purchase.id,
            owner_id: user.id,
            purchase_date: purchase.transaction_date,
            total_price,
            sale_items,
        };
        store.insert_ticket(&ticket)?;
        Ok(ticket)
    }
}
