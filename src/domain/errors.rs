use thiserror::Error;
use uuid::Uuid;

/// Coarse classification of a [`DomainError`], used by the HTTP layer to pick
/// a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    State,
    Internal,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound,
    #[error("Cart not found")]
    CartNotFound,
    #[error("Cart item not found")]
    CartItemNotFound,
    #[error("Product {0} not found")]
    ProductNotFound(Uuid),
    #[error("Purchase not found")]
    PurchaseNotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Cart already exists")]
    CartAlreadyExists,
    #[error("Cart is empty")]
    CartEmpty,
    #[error("Cart could not be cleared")]
    CartClearFailed,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::UserNotFound
            | DomainError::CartNotFound
            | DomainError::CartItemNotFound
            | DomainError::ProductNotFound(_)
            | DomainError::PurchaseNotFound => ErrorKind::NotFound,
            DomainError::InvalidInput(_) => ErrorKind::Validation,
            DomainError::CartAlreadyExists => ErrorKind::Conflict,
            DomainError::CartEmpty | DomainError::CartClearFailed => ErrorKind::State,
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DomainError::InvalidInput(msg.into())
    }
}
