//! Application state for the web layer.

use std::sync::Arc;

use crate::workflow::{BookingWorkflow, QuotationWorkflow};

/// Shared application state.
///
/// Workflows are behind `Arc` so handlers can move a handle into a
/// spawned task.
#[derive(Clone)]
pub struct AppState {
    /// Rate requests and quotation lookups
    pub quotations: Arc<QuotationWorkflow>,

    /// Booking confirmation, cancellation and lookups
    pub bookings: Arc<BookingWorkflow>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(quotations: QuotationWorkflow, bookings: BookingWorkflow) -> Self {
        Self {
            quotations: Arc::new(quotations),
            bookings: Arc::new(bookings),
        }
    }
}
