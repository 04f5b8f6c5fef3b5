pub mod cart_merger;
pub mod cart_service;
pub mod checkout_service;
pub mod price_snapshotter;
pub mod purchase_ledger;
pub mod purchase_service;
pub mod ticket_issuer;
