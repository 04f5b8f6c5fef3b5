use uuid::Uuid;

use super::money::Money;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Current catalog price. Only read at checkout time; sale items keep their own copy.
    pub price: Money,
    pub product_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}
