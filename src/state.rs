use std::sync::Arc;

use crate::application::cart_service::CartService;
use crate::application::checkout_service::CheckoutService;
use crate::application::purchase_service::PurchaseService;
use crate::domain::ports::{ReceiptRenderer, UnitOfWork};
use crate::infrastructure::staged_cart::StagedCartCodec;

/// Services shared by every worker, registered as `web::Data<AppState<U>>`.
pub struct AppState<U> {
    pub carts: CartService<U>,
    pub checkout: CheckoutService<U>,
    pub purchases: PurchaseService<U>,
    pub staged: StagedCartCodec,
}

impl<U: UnitOfWork> AppState<U> {
    pub fn new(uow: U, renderer: Arc<dyn ReceiptRenderer>, staged: StagedCartCodec) -> Self {
        Self {
            carts: CartService::new(uow.clone()),
            checkout: CheckoutService::new(uow.clone()),
            purchases: PurchaseService::new(uow, renderer),
            staged,
        }
    }
}
