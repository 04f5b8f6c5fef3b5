use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem};
use crate::domain::catalog::{Product, User};
use crate::domain::errors::DomainError;
use crate::domain::money::Money;
use crate::domain::purchase::{Purchase, SaleItem, ShippingAddress};
use crate::schema::{
    cart_items, carts, checkout_outbox, products, purchases, sale_items, tickets, users,
};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub product_type: String,
    pub price_minor: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: Money::from_minor(row.price_minor),
            product_type: row.product_type,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Cart {
            id: row.id,
            owner_id: row.owner_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCartRow {
    pub id: Uuid,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItemRow {
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = purchases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PurchaseRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub transaction_date: DateTime<Utc>,
    pub country: String,
    pub city: String,
    pub commune: String,
    pub street: String,
}

impl From<&Purchase> for PurchaseRow {
    fn from(p: &Purchase) -> Self {
        PurchaseRow {
            id: p.id,
            owner_id: p.owner_id,
            transaction_date: p.transaction_date,
            country: p.address.country().to_string(),
            city: p.address.city().to_string(),
            commune: p.address.commune().to_string(),
            street: p.address.street().to_string(),
        }
    }
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let address = ShippingAddress::new(&row.country, &row.city, &row.commune, &row.street)
            .map_err(|e| {
                DomainError::Internal(format!("purchase {} has a bad address: {}", row.id, e))
            })?;
        Ok(Purchase {
            id: row.id,
            owner_id: row.owner_id,
            transaction_date: row.transaction_date,
            address,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sale_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SaleItemRow {
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_minor: i64,
    pub total_price_minor: i64,
}

impl From<&SaleItem> for SaleItemRow {
    fn from(s: &SaleItem) -> Self {
        SaleItemRow {
            purchase_id: s.purchase_id,
            product_id: s.product_id,
            quantity: s.quantity,
            unit_price_minor: s.unit_price.minor(),
            total_price_minor: s.total_price.minor(),
        }
    }
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            purchase_id: row.purchase_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: Money::from_minor(row.unit_price_minor),
            total_price: Money::from_minor(row.total_price_minor),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TicketRow {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub owner_id: Uuid,
    pub purchase_date: DateTime<Utc>,
    pub total_price_minor: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = checkout_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = checkout_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
