use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::Money;

/// A validated shipping address. Every field is trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    country: String,
    city: String,
    commune: String,
    street: String,
}

impl ShippingAddress {
    pub fn new(
        country: &str,
        city: &str,
        commune: &str,
        street: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            country: required("country", country, 100)?,
            city: required("city", city, 100)?,
            commune: required("commune", commune, 100)?,
            street: required("street", street, 255)?,
        })
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn commune(&self) -> &str {
        &self.commune
    }

    pub fn street(&self) -> &str {
        &self.street
    }
}

fn required(field: &str, value: &str, max_chars: usize) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::invalid(format!("{field} is required")));
    }
    if value.chars().count() > max_chars {
        return Err(DomainError::invalid(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(value.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub transaction_date: DateTime<Utc>,
    pub address: ShippingAddress,
}

/// A price-snapshotted line of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleItem {
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Money,
    pub total_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub owner_id: Uuid,
    pub purchase_date: DateTime<Utc>,
    pub total_price: Money,
    pub sale_items: Vec<SaleItem>,
}

/// A sale item joined with the product's descriptive fields, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_type: String,
    pub quantity: i32,
    pub unit_price: Money,
    pub total_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRecord {
    pub purchase: Purchase,
    pub ticket_id: Option<Uuid>,
    pub total_price: Money,
    pub lines: Vec<ReceiptLine>,
}
