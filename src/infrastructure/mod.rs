#[cfg(test)]
pub mod memory;
pub mod models;
pub mod pg_store;
pub mod receipt_pdf;
pub mod staged_cart;
