//! Domain error types.
//!
//! These errors represent validation failures caught when building domain
//! values. They are distinct from carrier and storage errors.

use super::{BookingStatus, QuotationStatus};

/// Domain-level validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// A required field was absent or blank
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field was present but not acceptable
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// A quotation request listed no packages
    #[error("at least one package is required")]
    NoPackages,

    /// A booking listed no items
    #[error("a booking must have at least one item")]
    NoItems,

    /// A quotation status change would move backwards
    #[error("quotation cannot move from {from} to {to}")]
    BackwardTransition {
        from: QuotationStatus,
        to: QuotationStatus,
    },

    /// A booking status change is not allowed
    #[error("booking cannot move from {from} to {to}")]
    BookingTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
}
