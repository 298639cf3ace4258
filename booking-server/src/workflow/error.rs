//! Workflow error taxonomy.
//!
//! Gateway and store errors are folded in here with enough context for a
//! caller to act on, and nothing more.

use crate::carrier::CarrierError;
use crate::domain::{BookingId, DomainError, PartialShipment};
use crate::store::StoreError;

/// The error kinds a workflow can surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    /// The request was malformed or broke a domain rule
    #[error("invalid request: {0}")]
    Validation(String),

    /// A referenced customer, quotation or booking does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// A store read or write failed
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// The carrier refused our credentials
    #[error("carrier authentication failed: {0}")]
    Auth(String),

    /// Rate shopping failed or returned nothing
    #[error("rate fetch failed: {0}")]
    RateFetch(String),

    /// Shipment creation failed after the booking was stored
    #[error("shipment creation failed for booking {booking_id}: {message}")]
    ShipmentCreation {
        booking_id: BookingId,
        message: String,
        partial: PartialShipment,
    },
}

impl WorkflowError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation",
            WorkflowError::NotFound(_) => "not_found",
            WorkflowError::Persistence(_) => "persistence",
            WorkflowError::Auth(_) => "auth",
            WorkflowError::RateFetch(_) => "rate_fetch",
            WorkflowError::ShipmentCreation { .. } => "shipment_creation",
        }
    }

    /// Wrap a store failure with what we were doing at the time.
    ///
    /// Domain rejections from the store are the caller's fault and surface
    /// as validation errors.
    pub(crate) fn store(context: &str, err: StoreError) -> Self {
        match err {
            StoreError::Rejected(DomainError::NoItems) => {
                WorkflowError::Validation(DomainError::NoItems.to_string())
            }
            other => WorkflowError::Persistence(format!("{context}: {other}")),
        }
    }

    /// Map a carrier failure outside shipment creation.
    pub(crate) fn carrier(err: CarrierError) -> Self {
        match err {
            CarrierError::Auth(message) | CarrierError::Config(message) => {
                WorkflowError::Auth(message)
            }
            CarrierError::RateFetch(message) => WorkflowError::RateFetch(message),
            CarrierError::Validation(message) => WorkflowError::Validation(message),
            CarrierError::ShipmentCreation { message, .. } => WorkflowError::Persistence(message),
        }
    }

    /// Map a shipment creation failure for a stored booking.
    pub(crate) fn shipment(booking_id: BookingId, err: CarrierError) -> Self {
        match err {
            CarrierError::ShipmentCreation { message, partial } => WorkflowError::ShipmentCreation {
                booking_id,
                message,
                partial,
            },
            CarrierError::Auth(message) => WorkflowError::Auth(message),
            other => WorkflowError::ShipmentCreation {
                booking_id,
                message: other.to_string(),
                partial: PartialShipment::default(),
            },
        }
    }
}

impl From<DomainError> for WorkflowError {
    fn from(err: DomainError) -> Self {
        WorkflowError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;

    #[test]
    fn kinds() {
        assert_eq!(WorkflowError::NotFound("customer 4".into()).kind(), "not_found");
        assert_eq!(
            WorkflowError::from(DomainError::NoPackages).kind(),
            "validation"
        );
    }

    #[test]
    fn empty_items_is_a_validation_error() {
        let err = WorkflowError::store("storing booking", StoreError::Rejected(DomainError::NoItems));
        assert_eq!(err.kind(), "validation");

        let err = WorkflowError::store(
            "storing booking",
            StoreError::Corrupt {
                table: "bookings",
                id: "1".into(),
                reason: "bad".into(),
            },
        );
        assert_eq!(err.kind(), "persistence");
        assert!(err.to_string().starts_with("persistence failed: storing booking:"));
    }

    #[test]
    fn shipment_failure_keeps_partial_fields() {
        let partial = PartialShipment {
            base_service_charge: Money::from_cents(910).ok(),
            ..Default::default()
        };
        let err = WorkflowError::shipment(
            BookingId(7),
            CarrierError::ShipmentCreation {
                message: "no tracking number".into(),
                partial: partial.clone(),
            },
        );

        assert_eq!(
            err,
            WorkflowError::ShipmentCreation {
                booking_id: BookingId(7),
                message: "no tracking number".into(),
                partial,
            }
        );
        assert_eq!(
            err.to_string(),
            "shipment creation failed for booking 7: no tracking number"
        );
    }
}
