//! Carrier gateway error types.

use crate::domain::PartialShipment;

/// Failure of a single HTTP exchange with the carrier.
///
/// Gateway operations fold these into the operation's own error kind.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failure or other reqwest error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No response within the configured timeout
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The carrier rejected our token or credentials
    #[error("unauthorized")]
    Unauthorized,

    /// Non-success status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Body did not match the expected shape
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },
}

/// Errors from carrier gateway operations, one kind per operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CarrierError {
    /// Token exchange failed
    #[error("carrier authentication failed: {0}")]
    Auth(String),

    /// Rate shopping failed or returned nothing usable
    #[error("rate fetch failed: {0}")]
    RateFetch(String),

    /// Shipment creation failed; carries any fields the carrier did return
    #[error("shipment creation failed: {message}")]
    ShipmentCreation {
        message: String,
        partial: PartialShipment,
    },

    /// Address validation failed or found no candidate
    #[error("address validation failed: {0}")]
    Validation(String),

    /// The client could not be built from its configuration
    #[error("carrier client misconfigured: {0}")]
    Config(String),
}

impl CarrierError {
    pub(crate) fn shipment(err: TransportError) -> Self {
        CarrierError::ShipmentCreation {
            message: err.to_string(),
            partial: PartialShipment::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TransportError::Api {
            status: 400,
            message: "Invalid ShipperNumber".into(),
        };
        assert_eq!(err.to_string(), "API error 400: Invalid ShipperNumber");

        let err = CarrierError::RateFetch(TransportError::Timeout(20).to_string());
        assert_eq!(err.to_string(), "rate fetch failed: request timed out after 20s");

        let err = CarrierError::shipment(TransportError::Unauthorized);
        assert!(err.to_string().contains("unauthorized"));
        assert!(matches!(
            err,
            CarrierError::ShipmentCreation { ref partial, .. } if partial.is_empty()
        ));
    }
}
