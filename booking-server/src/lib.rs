//! Logistics booking back office.
//!
//! Requests carrier rates for shipments, keeps them as quotations, and
//! turns confirmed bookings into carrier shipments with printable labels.

pub mod cache;
pub mod carrier;
pub mod config;
pub mod domain;
pub mod store;
pub mod web;
pub mod workflow;
