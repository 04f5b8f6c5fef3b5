use std::fmt;

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::{OutboxEvent, Store, UnitOfWork};
use crate::domain::purchase::{Purchase, SaleItem, ShippingAddress, Ticket};

use super::price_snapshotter::PriceSnapshotter;
use super::purchase_ledger::PurchaseLedger;
use super::ticket_issuer::TicketIssuer;

/// Progress of a single checkout. Each step either advances to the next
/// state or the checkout fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    CartValidated,
    PurchaseCreated,
    SaleItemsSnapshotted,
    TicketIssued,
    CartCleared,
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutState::Idle => "idle",
            CheckoutState::CartValidated => "cart validated",
            CheckoutState::PurchaseCreated => "purchase created",
            CheckoutState::SaleItemsSnapshotted => "sale items snapshotted",
            CheckoutState::TicketIssued => "ticket issued",
            CheckoutState::CartCleared => "cart cleared",
        };
        f.write_str(name)
    }
}

/// A checkout that did not reach [`CheckoutState::CartCleared`]. Nothing it
/// wrote was committed.
#[derive(Debug, Error)]
#[error("checkout failed after '{reached}': {reason}")]
pub struct CheckoutFailure {
    pub reached: CheckoutState,
    #[source]
    pub reason: DomainError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOutcome {
    pub purchase: Purchase,
    pub sale_items: Vec<SaleItem>,
    pub ticket: Ticket,
}

/// Converts a user's cart into a purchase, its sale items and a ticket, then
/// empties the cart, all in one unit of work.
#[derive(Clone)]
pub struct CheckoutService<U> {
    uow: U,
}

impl<U: UnitOfWork> CheckoutService<U> {
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    pub fn checkout(
        &self,
        user_id: Uuid,
        address: ShippingAddress,
    ) -> Result<CheckoutOutcome, CheckoutFailure> {
        let mut reached = CheckoutState::Idle;

        let result = self
            .uow
            .run(|store| Self::run_steps(store, user_id, address, &mut reached));

        match result {
            Ok(outcome) => {
                info!(
                    "Checkout completed for user {}: purchase {} ticket {} total {}",
                    user_id, outcome.purchase.id, outcome.ticket.id, outcome.ticket.total_price
                );
                Ok(outcome)
            }
            Err(reason) => {
                warn!(
                    "Checkout failed for user {} after '{}': {}",
                    user_id, reached, reason
                );
                Err(CheckoutFailure { reached, reason })
            }
        }
    }

    fn run_steps(
        store: &mut dyn Store,
        user_id: Uuid,
        address: ShippingAddress,
        reached: &mut CheckoutState,
    ) -> Result<CheckoutOutcome, DomainError> {
        let user = store.get_user(user_id)?.ok_or(DomainError::UserNotFound)?;
        let cart = store.get_cart(user.id)?.ok_or(DomainError::CartNotFound)?;
        // Serializes checkouts of the same cart; the loser sees an empty cart.
        store.lock_cart(cart.id)?;
        let items = store.list_items(cart.id)?;
        if items.is_empty() {
            return Err(DomainError::CartEmpty);
        }
        advance(reached, CheckoutState::CartValidated);

        let purchase = PurchaseLedger::create(store, address, &user, Utc::now())?;
        advance(reached, CheckoutState::PurchaseCreated);

        let sale_items = PriceSnapshotter::snapshot(store, &items, &purchase)?;
        advance(reached, CheckoutState::SaleItemsSnapshotted);

        let ticket = TicketIssuer::issue(store, &user, &purchase, sale_items.clone())?;
        advance(reached, CheckoutState::TicketIssued);

        if !store.clear(cart.id)? {
            return Err(DomainError::CartClearFailed);
        }
        advance(reached, CheckoutState::CartCleared);

        store.append_event(purchase_completed_event(&purchase, &ticket))?;

        Ok(CheckoutOutcome {
            purchase,
            sale_items,
            ticket,
        })
    }
}

fn advance(reached: &mut CheckoutState, next: CheckoutState) {
    debug!("checkout: {} -> {}", reached, next);
    *reached = next;
}

fn purchase_completed_event(purchase: &Purchase, ticket: &Ticket) -> OutboxEvent {
    let lines: Vec<serde_json::Value> = ticket
        .sale_items
        .iter()
        .map(|s| {
            json!({
                "product_id": s.product_id,
                "quantity": s.quantity,
                "unit_price": s.unit_price.to_string(),
                "total_price": s.total_price.to_string(),
            })
        })
        .collect();

    OutboxEvent {
        aggregate_type: "Purchase".to_string(),
        aggregate_id: purchase.id.to_string(),
        event_type: "PurchaseCompleted".to_string(),
        payload: json!({
            "purchase_id": purchase.id,
            "ticket_id": ticket.id,
            "owner_id": purchase.owner_id,
            "transaction_date": purchase.transaction_date.to_rfc3339(),
            "total_price": ticket.total_price.to_string(),
            "lines": lines,
        }),
    }
}
