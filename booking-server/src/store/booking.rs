//! Bookings and their items in the relational store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::{
    Address, AddressFields, Booking, BookingId, BookingItem, BookingStatus, CustomerId,
    DimensionUnit, Dimensions, DomainError, Measure, Money, NewBooking, PackageSpec, QuotationId,
    ShipmentResult, StatusChange, Weight, WeightUnit,
};

use super::error::{StoreError, UpdateOutcome};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Relational store for bookings.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert the booking and all of its items in one transaction.
    ///
    /// An empty item list is rejected and nothing is written.
    async fn insert_with_items(&self, booking: &NewBooking) -> Result<BookingId, StoreError>;

    /// Fold a created shipment into the booking and mark it `Booked`.
    async fn record_shipment(
        &self,
        id: BookingId,
        shipment: &ShipmentResult,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Mark the booking `Cancelled` and clear its active flag.
    async fn cancel(&self, id: BookingId) -> Result<UpdateOutcome, StoreError>;

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError>;

    /// All bookings, newest first, optionally filtered by status.
    async fn list(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, StoreError>;
}

/// [`BookingStore`] backed by the `bookings` and `booking_items` tables.
#[derive(Clone)]
pub struct SqliteBookingStore {
    pool: SqlitePool,
}

impl SqliteBookingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn current_status<'c, E>(
        executor: E,
        id: BookingId,
    ) -> Result<Option<BookingStatus>, StoreError>
    where
        E: sqlx::Executor<'c, Database = sqlx::Sqlite>,
    {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM bookings WHERE id = ?1")
                .bind(id.0)
                .fetch_optional(executor)
                .await?;

        status
            .map(|s| BookingStatus::parse(&s).map_err(|e| corrupt(id.0, e)))
            .transpose()
    }

    async fn items(&self, id: BookingId) -> Result<Vec<BookingItem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT package_type, item_length, item_width, item_height, dimension_unit,
                   item_weight, weight_unit, package_cost
            FROM booking_items WHERE booking_id = ?1 ORDER BY id
            "#,
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| decode_item(id, row)).collect()
    }

    async fn hydrate(&self, row: &SqliteRow) -> Result<Booking, StoreError> {
        let id = BookingId(row.try_get("id")?);
        let items = self.items(id).await?;
        decode_booking(row, items)
    }
}

const BOOKING_COLUMNS: &str = r#"
    id, customer_id,
    from_name, from_mobile, from_email, from_address, from_city, from_state, from_pincode, from_country,
    to_name, to_mobile, to_email, to_address, to_city, to_state, to_pincode, to_country,
    carrier_name, carrier_plan, pickup_date, pickup_time, est_delivery_date, est_cost, total_cost,
    quotation_id, status, active_flag, shipment_id, tracking_number, shipment_charges,
    base_service_charge, residential_surcharge, label_path, booking_date
"#;

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn insert_with_items(&self, booking: &NewBooking) -> Result<BookingId, StoreError> {
        if booking.items.is_empty() {
            return Err(DomainError::NoItems.into());
        }

        let now = Utc::now().to_rfc3339();
        let from = &booking.origin;
        let to = &booking.destination;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO bookings (
                customer_id,
                from_name, from_mobile, from_email, from_address, from_city, from_state,
                from_pincode, from_country,
                to_name, to_mobile, to_email, to_address, to_city, to_state,
                to_pincode, to_country,
                carrier_name, carrier_plan, pickup_date, pickup_time, est_delivery_date,
                est_cost, total_cost, package_count, quotation_id, status, active_flag,
                booking_date, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, 1, ?28, ?28
            )
            "#,
        )
        .bind(booking.customer_id.0)
        .bind(from.name())
        .bind(from.mobile())
        .bind(from.email())
        .bind(from.address())
        .bind(from.city())
        .bind(from.state())
        .bind(from.postal_code())
        .bind(from.country())
        .bind(to.name())
        .bind(to.mobile())
        .bind(to.email())
        .bind(to.address())
        .bind(to.city())
        .bind(to.state())
        .bind(to.postal_code())
        .bind(to.country())
        .bind(&booking.carrier_name)
        .bind(&booking.service_code)
        .bind(booking.pickup_date.format(DATE_FORMAT).to_string())
        .bind(booking.pickup_time.format(TIME_FORMAT).to_string())
        .bind(booking.est_delivery_date.as_deref())
        .bind(booking.est_cost.to_string())
        .bind(booking.total_cost.to_string())
        .bind(booking.items.len() as i64)
        .bind(booking.quotation_id.map(|q| q.to_string()))
        .bind(BookingStatus::Pending.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let id = BookingId(result.last_insert_rowid());

        for item in &booking.items {
            let package = &item.package;
            let dims = package.dimensions();
            let weight = package.weight();

            sqlx::query(
                r#"
                INSERT INTO booking_items (
                    booking_id, package_type, item_length, item_width, item_height,
                    dimension_unit, item_weight, weight_unit, package_cost
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(id.0)
            .bind(package.package_type())
            .bind(dims.map(|d| d.length.value()))
            .bind(dims.map(|d| d.width.value()))
            .bind(dims.map(|d| d.height.value()))
            .bind(dims.map(|d| d.unit.code()))
            .bind(weight.map(|w| w.value.value()))
            .bind(weight.map(|w| w.unit.code()))
            .bind(item.cost.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(booking_id = %id, items = booking.items.len(), "booking stored");
        Ok(id)
    }

    async fn record_shipment(
        &self,
        id: BookingId,
        shipment: &ShipmentResult,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(status) = Self::current_status(&mut *tx, id).await? else {
            return Ok(UpdateOutcome::NoMatch);
        };
        if status.transition_to(BookingStatus::Booked)? == StatusChange::Unchanged {
            return Ok(UpdateOutcome::Unchanged);
        }

        sqlx::query(
            r#"
            UPDATE bookings SET
                status = ?1, shipment_id = ?2, tracking_number = ?3, shipment_charges = ?4,
                base_service_charge = ?5, residential_surcharge = ?6, label_path = ?7,
                updated_at = ?8
            WHERE id = ?9
            "#,
        )
        .bind(BookingStatus::Booked.as_str())
        .bind(&shipment.shipment_id)
        .bind(&shipment.tracking_number)
        .bind(shipment.total_charges.map(|m| m.to_string()))
        .bind(shipment.base_service_charge.map(|m| m.to_string()))
        .bind(shipment.residential_surcharge.map(|m| m.to_string()))
        .bind(shipment.label.as_deref())
        .bind(Utc::now().to_rfc3339())
        .bind(id.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(booking_id = %id, tracking_number = %shipment.tracking_number, "shipment recorded");
        Ok(UpdateOutcome::Updated)
    }

    async fn cancel(&self, id: BookingId) -> Result<UpdateOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(status) = Self::current_status(&mut *tx, id).await? else {
            return Ok(UpdateOutcome::NoMatch);
        };
        if status.transition_to(BookingStatus::Cancelled)? == StatusChange::Unchanged {
            return Ok(UpdateOutcome::Unchanged);
        }

        sqlx::query(
            "UPDATE bookings SET status = ?1, active_flag = 0, updated_at = ?2 WHERE id = ?3",
        )
        .bind(BookingStatus::Cancelled.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(booking_id = %id, "booking cancelled");
        Ok(UpdateOutcome::Updated)
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, StoreError> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE (?1 IS NULL OR status = ?1) ORDER BY id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(status.map(BookingStatus::as_str))
            .fetch_all(&self.pool)
            .await?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in &rows {
            bookings.push(self.hydrate(row).await?);
        }
        Ok(bookings)
    }
}

fn corrupt(id: i64, reason: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        table: "bookings",
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

fn money(id: i64, raw: &str) -> Result<Money, StoreError> {
    Money::parse(raw).map_err(|e| corrupt(id, e))
}

fn optional_money(id: i64, raw: Option<String>) -> Result<Option<Money>, StoreError> {
    raw.as_deref().map(|s| money(id, s)).transpose()
}

fn decode_address(row: &SqliteRow, prefix: &str, id: i64) -> Result<Address, StoreError> {
    let column = |name: &str| format!("{prefix}_{name}");

    Address::new(AddressFields {
        name: row.try_get(column("name").as_str())?,
        mobile: row.try_get(column("mobile").as_str())?,
        email: row.try_get(column("email").as_str())?,
        address: row.try_get(column("address").as_str())?,
        city: row.try_get(column("city").as_str())?,
        state: row.try_get(column("state").as_str())?,
        postal_code: row.try_get(column("pincode").as_str())?,
        country: row.try_get(column("country").as_str())?,
    })
    .map_err(|e| corrupt(id, e))
}

fn decode_booking(row: &SqliteRow, items: Vec<BookingItem>) -> Result<Booking, StoreError> {
    let id: i64 = row.try_get("id")?;

    let pickup_date: String = row.try_get("pickup_date")?;
    let pickup_date =
        NaiveDate::parse_from_str(&pickup_date, DATE_FORMAT).map_err(|e| corrupt(id, e))?;
    let pickup_time: String = row.try_get("pickup_time")?;
    let pickup_time =
        NaiveTime::parse_from_str(&pickup_time, TIME_FORMAT).map_err(|e| corrupt(id, e))?;
    let booking_date: String = row.try_get("booking_date")?;
    let booking_date = DateTime::parse_from_rfc3339(&booking_date)
        .map_err(|e| corrupt(id, e))?
        .with_timezone(&Utc);

    let status: String = row.try_get("status")?;
    let status = BookingStatus::parse(&status).map_err(|e| corrupt(id, e))?;

    let quotation_id: Option<String> = row.try_get("quotation_id")?;
    let quotation_id = quotation_id
        .map(|q| QuotationId::parse(&q).map_err(|e| corrupt(id, e)))
        .transpose()?;

    let shipment_id: Option<String> = row.try_get("shipment_id")?;
    let tracking_number: Option<String> = row.try_get("tracking_number")?;
    let shipment = match (shipment_id, tracking_number) {
        (Some(shipment_id), Some(tracking_number)) => Some(ShipmentResult {
            shipment_id,
            tracking_number,
            total_charges: optional_money(id, row.try_get("shipment_charges")?)?,
            base_service_charge: optional_money(id, row.try_get("base_service_charge")?)?,
            residential_surcharge: optional_money(id, row.try_get("residential_surcharge")?)?,
            label: row.try_get("label_path")?,
        }),
        _ => None,
    };

    let est_cost: String = row.try_get("est_cost")?;
    let total_cost: String = row.try_get("total_cost")?;
    let active: i64 = row.try_get("active_flag")?;

    Ok(Booking {
        id: BookingId(id),
        customer_id: CustomerId(row.try_get("customer_id")?),
        origin: decode_address(row, "from", id)?,
        destination: decode_address(row, "to", id)?,
        carrier_name: row.try_get("carrier_name")?,
        service_code: row.try_get("carrier_plan")?,
        items,
        pickup_date,
        pickup_time,
        est_delivery_date: row.try_get("est_delivery_date")?,
        est_cost: money(id, &est_cost)?,
        total_cost: money(id, &total_cost)?,
        quotation_id,
        status,
        active: active != 0,
        shipment,
        booking_date,
    })
}

fn decode_item(booking: BookingId, row: &SqliteRow) -> Result<BookingItem, StoreError> {
    let id = booking.0;
    let measure = |v: Option<f64>| -> Result<Option<Measure>, StoreError> {
        v.map(|v| Measure::new(v).map_err(|e| corrupt(id, e)))
            .transpose()
    };

    let length = measure(row.try_get("item_length")?)?;
    let width = measure(row.try_get("item_width")?)?;
    let height = measure(row.try_get("item_height")?)?;
    let dimension_unit: Option<String> = row.try_get("dimension_unit")?;
    let dimensions = match (length, width, height) {
        (Some(length), Some(width), Some(height)) => Some(Dimensions {
            length,
            width,
            height,
            unit: dimension_unit
                .as_deref()
                .and_then(DimensionUnit::from_code)
                .unwrap_or_default(),
        }),
        _ => None,
    };

    let weight_unit: Option<String> = row.try_get("weight_unit")?;
    let weight = measure(row.try_get("item_weight")?)?.map(|value| Weight {
        value,
        unit: weight_unit
            .as_deref()
            .and_then(WeightUnit::from_code)
            .unwrap_or_default(),
    });

    let package_type: String = row.try_get("package_type")?;
    let package = PackageSpec::new(package_type, weight, dimensions).map_err(|e| corrupt(id, e))?;
    let cost: String = row.try_get("package_cost")?;

    Ok(BookingItem {
        package,
        cost: money(id, &cost)?,
    })
}
