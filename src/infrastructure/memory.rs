//! In-memory [`UnitOfWork`] for tests.
//!
//! Every `run` works on a copy of the state and swaps it in only when the
//! closure succeeds, so rollback behaves like a database transaction. The
//! state mutex is held for the whole closure, which serializes units of work
//! the same way a row lock on the cart would.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem};
use crate::domain::catalog::{Product, User};
use crate::domain::errors::DomainError;
use crate::domain::money::Money;
use crate::domain::ports::{
    CartStore, Catalog, OutboxEvent, OutboxRepository, PurchaseRepository, SaleItemRepository,
    Store, TicketRepository, UnitOfWork, UserDirectory,
};
use crate::domain::purchase::{Purchase, ReceiptLine, SaleItem, Ticket};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: HashMap<Uuid, User>,
    pub products: HashMap<Uuid, Product>,
    pub carts: HashMap<Uuid, Cart>,
    pub cart_items: BTreeMap<(Uuid, Uuid), CartItem>,
    pub purchases: Vec<Purchase>,
    pub sale_items: Vec<SaleItem>,
    pub tickets: Vec<Ticket>,
    pub outbox: Vec<OutboxEvent>,
    /// Makes `clear` report that nothing was deleted.
    pub clear_deletes_nothing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryUnitOfWork {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_user(&self, name: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", name.to_lowercase()),
            name: name.to_string(),
        };
        self.lock().users.insert(user.id, user.clone());
        user
    }

    pub fn add_product(&self, name: &str, price_minor: i64) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price: Money::from_minor(price_minor),
            product_type: "General".to_string(),
        };
        self.lock().products.insert(product.id, product.clone());
        product
    }

    pub fn set_price(&self, product_id: Uuid, price_minor: i64) {
        if let Some(product) = self.lock().products.get_mut(&product_id) {
            product.price = Money::from_minor(price_minor);
        }
    }

    pub fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> MemoryState {
        self.lock().clone()
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    fn run<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Store) -> Result<T, DomainError>,
    {
        let mut guard = self.lock();
        let mut working = guard.clone();
        let result = f(&mut MemoryTx {
            state: &mut working,
        })?;
        *guard = working;
        Ok(result)
    }
}

struct MemoryTx<'a> {
    state: &'a mut MemoryState,
}

impl UserDirectory for MemoryTx<'_> {
    fn get_user(&mut self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.state.users.get(&id).cloned())
    }
}

impl Catalog for MemoryTx<'_> {
    fn get_product(&mut self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.state.products.get(&id).cloned())
    }
}

impl CartStore for MemoryTx<'_> {
    fn get_cart(&mut self, owner_id: Uuid) -> Result<Option<Cart>, DomainError> {
        Ok(self
            .state
            .carts
            .values()
            .find(|c| c.owner_id == owner_id)
            .cloned())
    }

    fn create_cart(&mut self, owner_id: Uuid) -> Result<Cart, DomainError> {
        if !self.state.users.contains_key(&owner_id) {
            return Err(DomainError::UserNotFound);
        }
        if self.get_cart(owner_id)?.is_some() {
            return Err(DomainError::CartAlreadyExists);
        }
        let cart = Cart {
            id: Uuid::new_v4(),
            owner_id,
            created_at: Utc::now(),
        };
        self.state.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    fn ensure_cart(&mut self, owner_id: Uuid) -> Result<Cart, DomainError> {
        match self.get_cart(owner_id)? {
            Some(cart) => Ok(cart),
            None => self.create_cart(owner_id),
        }
    }

    fn lock_cart(&mut self, cart_id: Uuid) -> Result<(), DomainError> {
        if self.state.carts.contains_key(&cart_id) {
            Ok(())
        } else {
            Err(DomainError::CartNotFound)
        }
    }

    fn add_item(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, DomainError> {
        let item = self
            .state
            .cart_items
            .entry((cart_id, product_id))
            .or_insert(CartItem {
                cart_id,
                product_id,
                quantity: 0,
            });
        item.quantity = item
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invalid("quantity out of range"))?;
        Ok(item.clone())
    }

    fn get_item(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, DomainError> {
        Ok(self.state.cart_items.get(&(cart_id, product_id)).cloned())
    }

    fn set_item_quantity(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, DomainError> {
        let item = self
            .state
            .cart_items
            .get_mut(&(cart_id, product_id))
            .ok_or(DomainError::CartItemNotFound)?;
        item.quantity = quantity;
        Ok(item.clone())
    }

    fn remove_item(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, DomainError> {
        Ok(self.state.cart_items.remove(&(cart_id, product_id)))
    }

    fn list_items(&mut self, cart_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        Ok(self
            .state
            .cart_items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .cloned()
            .collect())
    }

    fn clear(&mut self, cart_id: Uuid) -> Result<bool, DomainError> {
        if self.state.clear_deletes_nothing {
            return Ok(false);
        }
        let before = self.state.cart_items.len();
        self.state.cart_items.retain(|(cart, _), _| *cart != cart_id);
        Ok(self.state.cart_items.len() < before)
    }
}

impl PurchaseRepository for MemoryTx<'_> {
    fn insert_purchase(&mut self, purchase: &Purchase) -> Result<(), DomainError> {
        self.state.purchases.push(purchase.clone());
        Ok(())
    }

    fn find_purchase(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Purchase>, DomainError> {
        Ok(self
            .state
            .purchases
            .iter()
            .find(|p| p.id == id && p.owner_id == owner_id)
            .cloned())
    }

    fn list_purchases(&mut self, owner_id: Uuid) -> Result<Vec<Purchase>, DomainError> {
        let mut purchases: Vec<Purchase> = self
            .state
            .purchases
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        purchases.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
        Ok(purchases)
    }
}

impl SaleItemRepository for MemoryTx<'_> {
    fn insert_sale_items(&mut self, items: &[SaleItem]) -> Result<(), DomainError> {
        for item in items {
            let duplicate = self
                .state
                .sale_items
                .iter()
                .any(|s| s.purchase_id == item.purchase_id && s.product_id == item.product_id);
            if duplicate {
                return Err(DomainError::Internal(format!(
                    "duplicate sale item for product {}",
                    item.product_id
                )));
            }
            self.state.sale_items.push(item.clone());
        }
        Ok(())
    }

    fn receipt_lines(&mut self, purchase_id: Uuid) -> Result<Vec<ReceiptLine>, DomainError> {
        let mut lines = self
            .state
            .sale_items
            .iter()
            .filter(|s| s.purchase_id == purchase_id)
            .map(|s| {
                let product = self
                    .state
                    .products
                    .get(&s.product_id)
                    .ok_or(DomainError::ProductNotFound(s.product_id))?;
                Ok(ReceiptLine {
                    product_id: s.product_id,
                    product_name: product.name.clone(),
                    product_type: product.product_type.clone(),
                    quantity: s.quantity,
                    unit_price: s.unit_price,
                    total_price: s.total_price,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        lines.sort_by(|a, b| {
            a.product_name
                .cmp(&b.product_name)
                .then(a.product_id.cmp(&b.product_id))
        });
        Ok(lines)
    }
}

impl TicketRepository for MemoryTx<'_> {
    fn insert_ticket(&mut self, ticket: &Ticket) -> Result<(), DomainError> {
        if self
            .state
            .tickets
            .iter()
            .any(|t| t.purchase_id == ticket.purchase_id)
        {
            return Err(DomainError::Internal(format!(
                "ticket already issued for purchase {}",
                ticket.purchase_id
            )));
        }
        self.state.tickets.push(ticket.clone());
        Ok(())
    }

    fn find_ticket(&mut self, purchase_id: Uuid) -> Result<Option<Ticket>, DomainError> {
        Ok(self
            .state
            .tickets
            .iter()
            .find(|t| t.purchase_id == purchase_id)
            .cloned())
    }
}

impl OutboxRepository for MemoryTx<'_> {
    fn append_event(&mut self, event: OutboxEvent) -> Result<(), DomainError> {
        self.state.outbox.push(event);
        Ok(())
    }
}
