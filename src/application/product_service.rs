use crate::domain::error::DomainError;
use crate::domain::product::{CreateProduct, Product, UpdateProduct};
use crate::domain::repository::ProductRepository;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create(&self, data: CreateProduct) -> Result<Product> {
        let product = self.repository.insert(data).await?;
        info!(product_id = product.id, "Product created");
        Ok(product)
    }

    pub async fn get_all(&self) -> Result<Vec<Product>> {
        self.repository.find_all().await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Product> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::ProductNotFound.into())
    }

    /// The repository applies the partial update conditionally in one round
    /// trip; an absent row comes back as `None` and maps to not-found.
    #[instrument(skip(self, changes), fields(product_id = id))]
    pub async fn update(&self, id: i64, changes: UpdateProduct) -> Result<Product> {
        let product = self
            .repository
            .update(id, changes)
            .await?
            .ok_or_else(|| anyhow::Error::from(DomainError::ProductNotFound))?;
        info!(product_id = product.id, "Product updated");
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = id))]
    pub async fn remove(&self, id: i64) -> Result<()> {
        if !self.repository.delete(id).await? {
            return Err(DomainError::ProductNotFound.into());
        }
        info!(product_id = id, "Product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryProductRepository;

    fn service() -> ProductService<InMemoryProductRepository> {
        ProductService::new(Arc::new(InMemoryProductRepository::new()))
    }

    fn widget() -> CreateProduct {
        CreateProduct {
            name: "Widget".to_string(),
            price: 9.99,
            description: Some("A widget".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_by_id() {
        let service = service();

        let created = service.create(widget()).await.unwrap();
        let fetched = service.get_by_id(created.id).await.unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "Widget");
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let service = service();

        let err = service.get_by_id(999).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::ProductNotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let service = service();

        let err = service
            .update(
                999,
                UpdateProduct {
                    name: Some("Ghost".to_string()),
                    price: None,
                    description: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::ProductNotFound)
        ));
    }

    #[tokio::test]
    async fn test_remove_then_get_is_not_found() {
        let service = service();
        let created = service.create(widget()).await.unwrap();

        service.remove(created.id).await.unwrap();

        let err = service.get_by_id(created.id).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::ProductNotFound)
        ));
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let service = service();

        let err = service.remove(123).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::ProductNotFound)
        ));
    }
}
