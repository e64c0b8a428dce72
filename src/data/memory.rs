use crate::domain::error::DomainError;
use crate::domain::product::{CreateProduct, Product, UpdateProduct};
use crate::domain::repository::{ProductRepository, UserRepository};
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// In-memory stand-in for the SQLite store. Mirrors its observable behavior
/// (generated ids, email uniqueness, conditional update/delete) so services
/// can be unit-tested without a database.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<HashMap<i64, User>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, email: &str, password_hash: &str) -> Result<User> {
        let mut storage = self.storage.write().await;
        if storage.values().any(|u| u.email == email) {
            return Err(DomainError::EmailTaken.into());
        }
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        storage.insert(user.id, user.clone());
        debug!(user_id = user.id, email = %user.email, "User saved to memory storage");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        trace!(email = email, "Looking up user by email in storage");
        Ok(storage.values().find(|u| u.email == email).cloned())
    }
}

#[derive(Clone)]
pub struct InMemoryProductRepository {
    storage: Arc<RwLock<HashMap<i64, Product>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, data: CreateProduct) -> Result<Product> {
        let mut storage = self.storage.write().await;
        let product = Product {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: data.name,
            price: data.price,
            description: data.description,
        };
        storage.insert(product.id, product.clone());
        debug!(product_id = product.id, "Product saved to memory storage");
        Ok(product)
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        let storage = self.storage.read().await;
        let mut products: Vec<Product> = storage.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        let storage = self.storage.read().await;
        Ok(storage.get(&id).cloned())
    }

    async fn update(&self, id: i64, changes: UpdateProduct) -> Result<Option<Product>> {
        let mut storage = self.storage.write().await;
        let Some(product) = storage.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(description) = changes.description {
            product.description = Some(description);
        }
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut storage = self.storage.write().await;
        Ok(storage.remove(&id).is_some())
    }
}
