use crate::domain::cart::CartItem;
use crate::domain::errors::DomainError;
use crate::domain::ports::{Catalog, SaleItemRepository};
use crate::domain::purchase::{Purchase, SaleItem};

/// Freezes current catalog prices into sale items.
pub struct PriceSnapshotter;

impl PriceSnapshotter {
    /// Resolves every product before writing anything, so an unknown product
    /// leaves no sale items behind.
    pub fn snapshot<S>(
        store: &mut S,
        items: &[CartItem],
        purchase: &Purchase,
    ) -> Result<Vec<SaleItem>, DomainError>
    where
        S: Catalog + SaleItemRepository + ?Sized,
    {
        let mut sale_items = Vec::with_capacity(items.len());
        for item in items {
            let product = store
                .get_product(item.product_id)?
                .ok_or(DomainError::ProductNotFound(item.product_id))?;

            let unit_price = product.price;
            sale_items.push(SaleItem {
                purchase_id: purchase.id,
                product_id: product.id,
                quantity: item.quantity,
                unit_price,
                total_price: unit_price.checked_mul_quantity(item.quantity)?,
            });
        }

        store.insert_sale_items(&sale_items)?;
        Ok(sale_items)
    }
}
