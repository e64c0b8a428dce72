use crate::domain::product::{CreateProduct, Product, UpdateProduct};
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new user. A duplicate email surfaces as
    /// `DomainError::EmailTaken`.
    async fn insert(&self, email: &str, password_hash: &str) -> Result<User>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, data: CreateProduct) -> Result<Product>;
    async fn find_all(&self) -> Result<Vec<Product>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>>;
    /// Conditional partial update in a single store round trip.
    /// Returns `None` when no row matched the id.
    async fn update(&self, id: i64, changes: UpdateProduct) -> Result<Option<Product>>;
    /// Conditional delete; `false` when no row matched the id.
    async fn delete(&self, id: i64) -> Result<bool>;
}
