//! Per-customer address book, filled in as bookings are made.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::{Address, AddressFields, CustomerId};

use super::error::StoreError;

/// A stored address book row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressBookEntry {
    pub id: i64,
    pub customer_id: CustomerId,
    pub address: Address,
}

#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Return the entry matching {customer, address line, city, state,
    /// postal code}, creating it if there is none.
    ///
    /// The boolean is `true` when a new entry was written. Existing entries
    /// are never updated.
    async fn find_or_create(
        &self,
        customer: CustomerId,
        address: &Address,
    ) -> Result<(AddressBookEntry, bool), StoreError>;

    async fn entries(&self, customer: CustomerId) -> Result<Vec<AddressBookEntry>, StoreError>;
}

#[derive(Clone)]
pub struct SqliteAddressBook {
    pool: SqlitePool,
}

impl SqliteAddressBook {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressBook for SqliteAddressBook {
    async fn find_or_create(
        &self,
        customer: CustomerId,
        address: &Address,
    ) -> Result<(AddressBookEntry, bool), StoreError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM address_books
            WHERE customer_id = ?1 AND address_line_1 = ?2 AND city = ?3
              AND state = ?4 AND postal_code = ?5
            ORDER BY id LIMIT 1
            "#,
        )
        .bind(customer.0)
        .bind(address.address())
        .bind(address.city())
        .bind(address.state())
        .bind(address.postal_code())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(id) = existing {
            let entry = load(&mut *tx, id).await?;
            return Ok((entry, false));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO address_books (
                customer_id, name, address_line_1, city, state, postal_code, country,
                mobile, email, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(customer.0)
        .bind(address.name())
        .bind(address.address())
        .bind(address.city())
        .bind(address.state())
        .bind(address.postal_code())
        .bind(address.country())
        .bind(address.mobile())
        .bind(address.email())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let id = result.last_insert_rowid();
        debug!(customer_id = %customer, entry = id, "address book entry created");

        Ok((
            AddressBookEntry {
                id,
                customer_id: customer,
                address: address.clone(),
            },
            true,
        ))
    }

    async fn entries(&self, customer: CustomerId) -> Result<Vec<AddressBookEntry>, StoreError> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM address_books WHERE customer_id = ?1 ORDER BY id")
                .bind(customer.0)
                .fetch_all(&self.pool)
                .await?;

        let mut conn = self.pool.acquire().await?;
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            entries.push(load(&mut *conn, id).await?);
        }
        Ok(entries)
    }
}

async fn load(conn: &mut sqlx::SqliteConnection, id: i64) -> Result<AddressBookEntry, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT customer_id, name, address_line_1, city, state, postal_code, country,
               mobile, email
        FROM address_books WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    let address = Address::new(AddressFields {
        name: row.try_get("name")?,
        mobile: row.try_get("mobile")?,
        email: row.try_get("email")?,
        address: row.try_get("address_line_1")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        postal_code: row.try_get("postal_code")?,
        country: row.try_get("country")?,
    })
    .map_err(|e| StoreError::Corrupt {
        table: "address_books",
        id: id.to_string(),
        reason: e.to_string(),
    })?;

    Ok(AddressBookEntry {
        id,
        customer_id: CustomerId(row.try_get("customer_id")?),
        address,
    })
}
