//! The two back-office workflows.
//!
//! * [`QuotationWorkflow`] takes a rate request, stores a draft quotation,
//!   shops the carrier for rates and attaches them.
//! * [`BookingWorkflow`] stores a booking with its items, records the
//!   addresses in the customer's address book, creates the carrier shipment
//!   and folds the result back into the booking. It also cancels bookings.
//!
//! Both take their gateway and stores as trait objects, so tests run them
//! against [`MockCarrier`](crate::carrier::MockCarrier) and an in-memory
//! database.

mod booking;
mod error;
mod input;
mod quotation;


pub use booking::{BookingStores, BookingWorkflow};
pub use error::WorkflowError;
pub use input::{BookingInput, PackageInput, QuoteInput, ValidBooking, parse_date, parse_time};
pub use quotation::{QuotationFailure, QuotationStage, QuotationWorkflow, QuoteOutcome};

use crate::carrier::{Credentials, ShipperProfile};

/// Who we are to the carrier.
#[derive(Debug, Clone)]
pub struct CarrierAccount {
    pub credentials: Credentials,
    pub shipper: ShipperProfile,
    /// Recorded on every booking.
    pub carrier_name: String,
}
