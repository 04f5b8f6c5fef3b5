use log::info;
use uuid::Uuid;

use crate::domain::cart::{ensure_positive_quantity, Cart, CartItem, CartView, StagedCartItem, UpdateMode};
use crate::domain::errors::DomainError;
use crate::domain::ports::{Store, UnitOfWork};

use super::cart_merger::{CartMerger, MergeOutcome};

/// Operations on a user's persisted cart.
#[derive(Clone)]
pub struct CartService<U> {
    uow: U,
}

impl<U: UnitOfWork> CartService<U> {
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    pub fn get_cart(&self, user_id: Uuid) -> Result<CartView, DomainError> {
        self.uow.run(|store| {
            let cart = owned_cart(store, user_id)?;
            let items = store.list_items(cart.id)?;
            Ok(CartView { cart, items })
        })
    }

    /// Fails with [`DomainError::CartAlreadyExists`] rather than returning the
    /// existing cart.
    pub fn create_cart(&self, user_id: Uuid) -> Result<Cart, DomainError> {
        let cart = self.uow.run(|store| {
            store.get_user(user_id)?.ok_or(DomainError::UserNotFound)?;
            store.create_cart(user_id)
        })?;
        info!("Created cart {} for user {}", cart.id, user_id);
        Ok(cart)
    }

    pub fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, DomainError> {
        ensure_positive_quantity(quantity)?;
        self.uow.run(|store| {
            let cart = owned_cart(store, user_id)?;
            store
                .get_product(product_id)?
                .ok_or(DomainError::ProductNotFound(product_id))?;
            store.lock_cart(cart.id)?;
            if let Some(existing) = store.get_item(cart.id, product_id)? {
                UpdateMode::Increment.apply(existing.quantity, quantity)?;
            }
            store.add_item(cart.id, product_id, quantity)
        })
    }

    pub fn update_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        mode: UpdateMode,
    ) -> Result<CartItem, DomainError> {
        self.uow.run(|store| {
            let cart = owned_cart(store, user_id)?;
            store.lock_cart(cart.id)?;
            let current = store
                .get_item(cart.id, product_id)?
                .ok_or(DomainError::CartItemNotFound)?;
            let next = mode.apply(current.quantity, quantity)?;
            store.set_item_quantity(cart.id, product_id, next)
        })
    }

    pub fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<CartItem, DomainError> {
        self.uow.run(|store| {
            let cart = owned_cart(store, user_id)?;
            store
                .remove_item(cart.id, product_id)?
                .ok_or(DomainError::CartItemNotFound)
        })
    }

    pub fn list_items(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        self.uow.run(|store| {
            let cart = owned_cart(store, user_id)?;
            store.list_items(cart.id)
        })
    }

    /// Empties the cart. Returns `false` when it was already empty.
    pub fn clear(&self, user_id: Uuid) -> Result<bool, DomainError> {
        self.uow.run(|store| {
            let cart = owned_cart(store, user_id)?;
            store.lock_cart(cart.id)?;
            store.clear(cart.id)
        })
    }

    pub fn merge_staged(
        &self,
        user_id: Uuid,
        staged: &[StagedCartItem],
    ) -> Result<MergeOutcome, DomainError> {
        let outcome = self
            .uow
            .run(|store| CartMerger::merge(store, user_id, staged))?;
        info!(
            "Merged {} staged line(s) into cart {} for user {} ({} skipped)",
            outcome.merged.len(),
            outcome.cart_id,
            user_id,
            outcome.skipped.len()
        );
        Ok(outcome)
    }
}

fn owned_cart(store: &mut dyn Store, user_id: Uuid) -> Result<Cart, DomainError> {
    store.get_cart(user_id)?.ok_or(DomainError::CartNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::MemoryUnitOfWork;

    fn setup() -> (MemoryUnitOfWork, CartService<MemoryUnitOfWork>, Uuid) {
        let uow = MemoryUnitOfWork::new();
        let user = uow.add_user("Mara");
        let service = CartService::new(uow.clone());
        (uow, service, user.id)
    }

    #[test]
    fn create_twice_conflicts() {
        let (_uow, service, user_id) = setup();
        service.create_cart(user_id).expect("first create");
        let err = service.create_cart(user_id).expect_err("second create");
        assert!(matches!(err, DomainError::CartAlreadyExists));
    }

    #[test]
    fn create_for_unknown_user_fails() {
        let (_uow, service, _) = setup();
        let err = service.create_cart(Uuid::new_v4()).expect_err("no user");
        assert!(matches!(err, DomainError::UserNotFound));
    }

    #[test]
    fn adding_the_same_product_increments() {
        let (uow, service, user_id) = setup();
        let product = uow.add_product("Pen", 150);
        service.create_cart(user_id).expect("create");

        service.add_item(user_id, product.id, 2).expect("add");
        let item = service.add_item(user_id, product.id, 3).expect("add again");

        assert_eq!(item.quantity, 5);
        assert_eq!(service.list_items(user_id).expect("list").len(), 1);
    }

    #[test]
    fn add_past_the_quantity_range_is_rejected() {
        let (uow, service, user_id) = setup();
        let product = uow.add_product("Pen", 150);
        service.create_cart(user_id).expect("create");
        service.add_item(user_id, product.id, i32::MAX).expect("add");

        assert!(matches!(
            service.add_item(user_id, product.id, 1),
            Err(DomainError::InvalidInput(_))
        ));
        let items = service.list_items(user_id).expect("list");
        assert_eq!(items[0].quantity, i32::MAX);
    }

    #[test]
    fn add_rejects_unknown_product_and_bad_quantity() {
        let (uow, service, user_id) = setup();
        let product = uow.add_product("Pen", 150);
        service.create_cart(user_id).expect("create");

        let missing = Uuid::new_v4();
        assert!(matches!(
            service.add_item(user_id, missing, 1),
            Err(DomainError::ProductNotFound(id)) if id == missing
        ));
        assert!(matches!(
            service.add_item(user_id, product.id, 0),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn update_modes() {
        let (uow, service, user_id) = setup();
        let product = uow.add_product("Pen", 150);
        service.create_cart(user_id).expect("create");
        service.add_item(user_id, product.id, 4).expect("add");

        let item = service
            .update_item(user_id, product.id, 2, UpdateMode::Decrement)
            .expect("decrement");
        assert_eq!(item.quantity, 2);
        let item = service
            .update_item(user_id, product.id, 10, UpdateMode::Set)
            .expect("set");
        assert_eq!(item.quantity, 10);
        let item = service
            .update_item(user_id, product.id, 1, UpdateMode::Increment)
            .expect("increment");
        assert_eq!(item.quantity, 11);
    }

    #[test]
    fn update_and_remove_missing_item_fail() {
        let (_uow, service, user_id) = setup();
        service.create_cart(user_id).expect("create");
        let product_id = Uuid::new_v4();

        assert!(matches!(
            service.update_item(user_id, product_id, 1, UpdateMode::Set),
            Err(DomainError::CartItemNotFound)
        ));
        assert!(matches!(
            service.remove_item(user_id, product_id),
            Err(DomainError::CartItemNotFound)
        ));
    }

    #[test]
    fn clear_is_idempotent() {
        let (uow, service, user_id) = setup();
        let product = uow.add_product("Pen", 150);
        service.create_cart(user_id).expect("create");
        service.add_item(user_id, product.id, 1).expect("add");

        assert!(service.clear(user_id).expect("first clear"));
        assert!(!service.clear(user_id).expect("second clear"));
        assert!(service.get_cart(user_id).expect("cart").items.is_empty());
    }

    #[test]
    fn operations_without_a_cart_are_not_found() {
        let (_uow, service, user_id) = setup();
        assert!(matches!(
            service.get_cart(user_id),
            Err(DomainError::CartNotFound)
        ));
        assert!(matches!(
            service.clear(user_id),
            Err(DomainError::CartNotFound)
        ));
    }
}
