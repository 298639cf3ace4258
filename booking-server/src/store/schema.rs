//! Connection setup and table creation.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::error::StoreError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT,
        mobile TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quotations (
        id TEXT PRIMARY KEY,
        status TEXT NOT NULL,
        document TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_quotations_status ON quotations(status, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL REFERENCES customers(id),
        from_name TEXT NOT NULL,
        from_mobile TEXT,
        from_email TEXT,
        from_address TEXT NOT NULL,
        from_city TEXT NOT NULL,
        from_state TEXT NOT NULL,
        from_pincode TEXT NOT NULL,
        from_country TEXT NOT NULL,
        to_name TEXT NOT NULL,
        to_mobile TEXT,
        to_email TEXT,
        to_address TEXT NOT NULL,
        to_city TEXT NOT NULL,
        to_state TEXT NOT NULL,
        to_pincode TEXT NOT NULL,
        to_country TEXT NOT NULL,
        carrier_name TEXT NOT NULL,
        carrier_plan TEXT NOT NULL,
        pickup_date TEXT NOT NULL,
        pickup_time TEXT NOT NULL,
        est_delivery_date TEXT,
        est_cost TEXT NOT NULL,
        total_cost TEXT NOT NULL,
        package_count INTEGER NOT NULL,
        quotation_id TEXT,
        status TEXT NOT NULL,
        active_flag INTEGER NOT NULL DEFAULT 1,
        shipment_id TEXT,
        tracking_number TEXT,
        shipment_charges TEXT,
        base_service_charge TEXT,
        residential_surcharge TEXT,
        label_path TEXT,
        booking_date TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status, booking_date)",
    r#"
    CREATE TABLE IF NOT EXISTS booking_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        booking_id INTEGER NOT NULL REFERENCES bookings(id),
        package_type TEXT NOT NULL,
        item_length REAL,
        item_width REAL,
        item_height REAL,
        dimension_unit TEXT,
        item_weight REAL,
        weight_unit TEXT,
        package_cost TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_booking_items_booking ON booking_items(booking_id)",
    r#"
    CREATE TABLE IF NOT EXISTS address_books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL REFERENCES customers(id),
        name TEXT NOT NULL,
        address_line_1 TEXT NOT NULL,
        city TEXT NOT NULL,
        state TEXT NOT NULL,
        postal_code TEXT NOT NULL,
        country TEXT NOT NULL,
        mobile TEXT,
        email TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_address_books_match
    ON address_books(customer_id, address_line_1, city, state, postal_code)
    "#,
];

/// Open a pool for `database_url`, creating the file if needed.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create the tables this service uses.
pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!(tables = 5, "database schema ready");
    Ok(())
}

/// A single-connection in-memory database with the schema applied.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = connect("sqlite::memory:", 1).await.unwrap();
    migrate(&pool).await.unwrap();
    pool
}
