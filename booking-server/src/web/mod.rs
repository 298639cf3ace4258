//! Web layer for the booking back office.
//!
//! JSON endpoints for rate requests, quotations and bookings, plus the
//! saved shipping labels as static files.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
