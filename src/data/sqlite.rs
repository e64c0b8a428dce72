use crate::domain::error::DomainError;
use crate::domain::product::{CreateProduct, Product, UpdateProduct};
use crate::domain::repository::{ProductRepository, UserRepository};
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, instrument};

/// Ordered schema migrations, applied once at startup. Each file holds a
/// single statement so it can run through a prepared query.
const MIGRATIONS: &[&str] = &[
    include_str!("../../migrations/0001_create_users.sql"),
    include_str!("../../migrations/0002_create_products.sql"),
];

pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    for sql in MIGRATIONS {
        sqlx::query(sql).execute(pool).await?;
    }
    Ok(())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password"),
    }
}

fn row_to_product(row: &SqliteRow) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        description: row.get("description"),
    }
}

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self, password_hash), fields(email = email))]
    async fn insert(&self, email: &str, password_hash: &str) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (email, password) VALUES (?, ?)")
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    anyhow::Error::from(DomainError::EmailTaken)
                } else {
                    e.into()
                }
            })?;

        let user = User {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        debug!(user_id = user.id, "User row inserted");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, password FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_user(&r)))
    }
}

#[derive(Clone)]
pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    #[instrument(skip(self, data), fields(name = %data.name))]
    async fn insert(&self, data: CreateProduct) -> Result<Product> {
        let result = sqlx::query("INSERT INTO products (name, price, description) VALUES (?, ?, ?)")
            .bind(&data.name)
            .bind(data.price)
            .bind(&data.description)
            .execute(&self.pool)
            .await?;

        let product = Product {
            id: result.last_insert_rowid(),
            name: data.name,
            price: data.price,
            description: data.description,
        };
        debug!(product_id = product.id, "Product row inserted");
        Ok(product)
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT id, name, price, description FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_product).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT id, name, price, description FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_product(&r)))
    }

    // Single conditional statement: no row matched means the product does not
    // exist, so there is no check-then-mutate window.
    #[instrument(skip(self, changes), fields(product_id = id))]
    async fn update(&self, id: i64, changes: UpdateProduct) -> Result<Option<Product>> {
        let row = sqlx::query(
            "UPDATE products \
             SET name = COALESCE(?, name), \
                 price = COALESCE(?, price), \
                 description = COALESCE(?, description) \
             WHERE id = ? \
             RETURNING id, name, price, description",
        )
        .bind(&changes.name)
        .bind(changes.price)
        .bind(&changes.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| row_to_product(&r)))
    }

    #[instrument(skip(self), fields(product_id = id))]
    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_insert_user_assigns_generated_id() {
        let repo = SqliteUserRepository::new(test_pool().await);

        let user = repo.insert("test@example.com", "hash123").await.unwrap();

        assert!(user.id > 0);
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.password_hash, "hash123");
    }

    #[tokio::test]
    async fn test_insert_duplicate_email_is_email_taken() {
        let repo = SqliteUserRepository::new(test_pool().await);

        repo.insert("dup@example.com", "hash1").await.unwrap();
        let err = repo.insert("dup@example.com", "hash2").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_find_user_by_email() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.insert("alice@example.com", "hash").await.unwrap();

        let found = repo.find_by_email("alice@example.com").await.unwrap();
        assert!(found.is_some());

        let missing = repo.find_by_email("nobody@example.com").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_product_crud_round_trip() {
        let repo = SqliteProductRepository::new(test_pool().await);

        let created = repo
            .insert(CreateProduct {
                name: "Widget".to_string(),
                price: 9.99,
                description: Some("A widget".to_string()),
            })
            .await
            .unwrap();
        assert!(created.id > 0);

        let fetched = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Widget");
        assert_eq!(fetched.price, 9.99);

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 1);

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.find_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_unset_fields() {
        let repo = SqliteProductRepository::new(test_pool().await);
        let created = repo
            .insert(CreateProduct {
                name: "Widget".to_string(),
                price: 10.0,
                description: Some("Original".to_string()),
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                created.id,
                UpdateProduct {
                    name: None,
                    price: Some(12.5),
                    description: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Widget");
        assert_eq!(updated.price, 12.5);
        assert_eq!(updated.description.as_deref(), Some("Original"));
    }

    #[tokio::test]
    async fn test_update_missing_product_returns_none() {
        let repo = SqliteProductRepository::new(test_pool().await);

        let result = repo
            .update(
                999,
                UpdateProduct {
                    name: Some("Ghost".to_string()),
                    price: None,
                    description: None,
                },
            )
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_product_returns_false() {
        let repo = SqliteProductRepository::new(test_pool().await);
        assert!(!repo.delete(999).await.unwrap());
    }
}
