//! Bookings, their items and the shipment outcome folded into them.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, DomainError, Money, PackageSpec, QuotationId, StatusChange};

/// Customer identifier from the customer directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub i64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Row id of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub i64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Booking status. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Booked,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Booked => "Booked",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "Pending" | "pending" => Ok(BookingStatus::Pending),
            "Booked" | "booked" => Ok(BookingStatus::Booked),
            "Cancelled" | "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(DomainError::Invalid {
                field: "status",
                reason: format!("unknown booking status {other:?}"),
            }),
        }
    }

    /// `Pending` may become `Booked` or `Cancelled`, `Booked` may become
    /// `Cancelled`. Staying put is a no-op. `Cancelled` never changes.
    pub fn transition_to(self, next: BookingStatus) -> Result<StatusChange, DomainError> {
        use BookingStatus::*;

        match (self, next) {
            (a, b) if a == b => Ok(StatusChange::Unchanged),
            (Pending, Booked) | (Pending, Cancelled) | (Booked, Cancelled) => {
                Ok(StatusChange::Apply)
            }
            (from, to) => Err(DomainError::BookingTransition { from, to }),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical package in a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingItem {
    pub package: PackageSpec,
    pub cost: Money,
}

/// Everything needed to create a booking.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub customer_id: CustomerId,
    pub origin: Address,
    pub destination: Address,
    pub carrier_name: String,
    /// Carrier service code chosen from a rate offer.
    pub service_code: String,
    pub items: Vec<BookingItem>,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub est_delivery_date: Option<String>,
    pub est_cost: Money,
    pub total_cost: Money,
    pub quotation_id: Option<QuotationId>,
}

/// Fields returned by the carrier for a created shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentResult {
    pub shipment_id: String,
    pub tracking_number: String,
    pub total_charges: Option<Money>,
    pub base_service_charge: Option<Money>,
    pub residential_surcharge: Option<Money>,
    /// Relative path of the saved label, if one was returned and decoded.
    pub label: Option<String>,
}

/// Whatever shipment fields were present in a failed creation response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialShipment {
    pub shipment_id: Option<String>,
    pub total_charges: Option<Money>,
    pub base_service_charge: Option<Money>,
    pub residential_surcharge: Option<Money>,
}

impl PartialShipment {
    pub fn is_empty(&self) -> bool {
        self.shipment_id.is_none()
            && self.total_charges.is_none()
            && self.base_service_charge.is_none()
            && self.residential_surcharge.is_none()
    }
}

/// A stored booking with its items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: CustomerId,
    pub origin: Address,
    pub destination: Address,
    pub carrier_name: String,
    pub service_code: String,
    pub items: Vec<BookingItem>,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub est_delivery_date: Option<String>,
    pub est_cost: Money,
    pub total_cost: Money,
    pub quotation_id: Option<QuotationId>,
    pub status: BookingStatus,
    pub active: bool,
    pub shipment: Option<ShipmentResult>,
    pub booking_date: DateTime<Utc>,
}
