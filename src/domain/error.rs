use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Product not found")]
    ProductNotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Internal error: {0}")]
    Internal(String),
}
