use uuid::Uuid;

use super::cart::{Cart, CartItem};
use super::catalog::{Product, User};
use super::errors::DomainError;
use super::purchase::{Purchase, ReceiptLine, SaleItem, Ticket};

/// Read access to the identity service's users.
pub trait UserDirectory {
    fn get_user(&mut self, id: Uuid) -> Result<Option<User>, DomainError>;
}

/// Read access to the product catalog.
pub trait Catalog {
    fn get_product(&mut self, id: Uuid) -> Result<Option<Product>, DomainError>;
}

/// Persisted carts. Implementations must enforce one line per
/// `(cart_id, product_id)`.
pub trait CartStore {
    fn get_cart(&mut self, owner_id: Uuid) -> Result<Option<Cart>, DomainError>;

    /// Fails with [`DomainError::CartAlreadyExists`] if the owner has a cart.
    fn create_cart(&mut self, owner_id: Uuid) -> Result<Cart, DomainError>;

    /// Returns the owner's cart, creating it if missing. Safe against a
    /// concurrent creation for the same owner.
    fn ensure_cart(&mut self, owner_id: Uuid) -> Result<Cart, DomainError>;

    /// Holds a row lock on the cart until the enclosing unit of work ends.
    fn lock_cart(&mut self, cart_id: Uuid) -> Result<(), DomainError>;

    /// Inserts the line, or increments the existing line by `quantity`.
    fn add_item(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, DomainError>;

    fn get_item(&mut self, cart_id: Uuid, product_id: Uuid)
        -> Result<Option<CartItem>, DomainError>;

    fn set_item_quantity(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, DomainError>;

    fn remove_item(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, DomainError>;

    fn list_items(&mut self, cart_id: Uuid) -> Result<Vec<CartItem>, DomainError>;

    /// Deletes every line of the cart. Returns whether anything was deleted.
    fn clear(&mut self, cart_id: Uuid) -> Result<bool, DomainError>;
}

pub trait PurchaseRepository {
    fn insert_purchase(&mut self, purchase: &Purchase) -> Result<(), DomainError>;

    /// Only returns the purchase if it belongs to `owner_id`.
    fn find_purchase(&mut self, id: Uuid, owner_id: Uuid)
        -> Result<Option<Purchase>, DomainError>;

    /// Newest first.
    fn list_purchases(&mut self, owner_id: Uuid) -> Result<Vec<Purchase>, DomainError>;
}

pub trait SaleItemRepository {
    fn insert_sale_items(&mut self, items: &[SaleItem]) -> Result<(), DomainError>;

    fn receipt_lines(&mut self, purchase_id: Uuid) -> Result<Vec<ReceiptLine>, DomainError>;
}

pub trait TicketRepository {
    fn insert_ticket(&mut self, ticket: &Ticket) -> Result<(), DomainError>;

    fn find_ticket(&mut self, purchase_id: Uuid) -> Result<Option<Ticket>, DomainError>;
}

/// An event written to the transactional outbox alongside the state change
/// that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEvent {
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

pub trait OutboxRepository {
    fn append_event(&mut self, event: OutboxEvent) -> Result<(), DomainError>;
}

/// Everything a unit of work can touch.
pub trait Store:
    UserDirectory
    + Catalog
    + CartStore
    + PurchaseRepository
    + SaleItemRepository
    + TicketRepository
    + OutboxRepository
{
}

impl<T> Store for T where
    T: UserDirectory
        + Catalog
        + CartStore
        + PurchaseRepository
        + SaleItemRepository
        + TicketRepository
        + OutboxRepository
{
}

/// Turns a purchase and its lines into a printable document.
pub trait ReceiptRenderer: Send + Sync {
    fn render(&self, purchase: &Purchase, lines: &[ReceiptLine]) -> Result<Vec<u8>, DomainError>;
}

/// Runs a closure against a [`Store`] inside one transaction. An `Err` from
/// the closure rolls back every write it made.
pub trait UnitOfWork: Clone + Send + Sync + 'static {
    fn run<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Store) -> Result<T, DomainError>;
}
