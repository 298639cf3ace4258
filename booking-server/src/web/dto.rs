//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{BookingId, PartialShipment, QuotationId, RateOffer};
use crate::workflow::QuoteOutcome;

/// Response to a successful rate request.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quotation_id: QuotationId,

    /// Offers in carrier order
    pub shipping_rates: Vec<RateOffer>,
}

impl From<QuoteOutcome> for QuoteResponse {
    fn from(outcome: QuoteOutcome) -> Self {
        Self {
            quotation_id: outcome.quotation_id,
            shipping_rates: outcome.rates,
        }
    }
}

/// Body of `PUT /quotations/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    /// Only `"Saved"` (or legacy `"saved"`) is accepted
    pub status: String,
}

/// Query for `GET /bookings`.
#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    /// Optional status filter (`Pending`, `Booked`, `Cancelled`)
    pub status: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    pub kind: &'static str,

    /// Error message
    pub error: String,

    /// Booking left pending by a failed shipment creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,

    /// Shipment fields the carrier did return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<PartialShipment>,

    /// Quotation left behind by a failed rate request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotation_id: Option<QuotationId>,

    /// Last workflow stage reached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl ErrorResponse {
    pub fn new(kind: &'static str, error: impl Into<String>) -> Self {
        Self {
            kind,
            error: error.into(),
            booking_id: None,
            partial: None,
            quotation_id: None,
            stage: None,
        }
    }
}
