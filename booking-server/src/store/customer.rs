use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::CustomerId;

use super::error::StoreError;

/// Lookup of registered customers.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn exists(&self, id: CustomerId) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct SqliteCustomerDirectory {
    pool: SqlitePool,
}

impl SqliteCustomerDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a customer. Used for seeding and tests.
    pub async fn create(
        &self,
        name: &str,
        email: Option<&str>,
        mobile: Option<&str>,
    ) -> Result<CustomerId, StoreError> {
        let result = sqlx::query(
            "INSERT INTO customers (name, email, mobile, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(name)
        .bind(email)
        .bind(mobile)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(CustomerId(result.last_insert_rowid()))
    }
}

#[async_trait]
impl CustomerDirectory for SqliteCustomerDirectory {
    async fn exists(&self, id: CustomerId) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::test_pool;

    #[tokio::test]
    async fn created_customer_exists() {
        let directory = SqliteCustomerDirectory::new(test_pool().await);
        let id = directory.create("Asha Rao", None, None).await.unwrap();

        assert!(directory.exists(id).await.unwrap());
        assert!(!directory.exists(CustomerId(id.0 + 1)).await.unwrap());
    }
}
