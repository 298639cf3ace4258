//! Domain types for the booking back office.
//!
//! All types enforce their invariants at construction time, so code that
//! receives them can trust their validity.

mod address;
mod booking;
mod error;
mod money;
mod package;
mod quotation;

pub use address::{Address, AddressFields};
pub use booking::{
    Booking, BookingId, BookingItem, BookingStatus, CustomerId, NewBooking, PartialShipment,
    ShipmentResult,
};
pub use error::DomainError;
pub use money::{InvalidMoney, Money};
pub use package::{
    DOCUMENT_TOKEN, DimensionUnit, Dimensions, Measure, PackageKind, PackageSpec, Weight,
    WeightUnit,
};
pub use quotation::{
    Quotation, QuotationAddresses, QuotationId, QuotationStatus, QuoteRequest, RateOffer,
    StatusChange,
};
