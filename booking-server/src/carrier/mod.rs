//! Carrier gateway client.
//!
//! Wraps the carrier's OAuth token exchange, address validation, rate
//! shopping and shipment creation, and normalizes the carrier's response
//! shapes into [`RateOffer`](crate::domain::RateOffer) and
//! [`ShipmentResult`](crate::domain::ShipmentResult).
//!
//! Key characteristics of the carrier API:
//! - Lists are sometimes sent as a single object when there is one entry
//! - Amounts and counts arrive as strings
//! - Arrival dates are `YYYYMMDD` and times `HHMMSS`
//! - Labels come back base64-encoded inside the ship response

mod client;
mod convert;
mod error;
mod gateway;
mod label;
mod mock;
mod request;
mod types;

pub use client::{CarrierClient, CarrierConfig, DEFAULT_BASE_URL};
pub use convert::{ConversionError, format_arrival_date, format_arrival_time};
pub use error::{CarrierError, TransportError};
pub use gateway::{AccessToken, CarrierGateway, Credentials};
pub use label::{LABEL_PREFIX, LabelStore};
pub use mock::{CallCounts, MockCarrier, sample_rates, sample_shipment};
pub use request::{
    RateQuery, ShipmentOrder, ShipperProfile, build_rate_request, build_shipment_request,
};

#[cfg(test)]
pub(crate) use request::fixtures;
