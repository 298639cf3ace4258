//! Persistence for quotations, bookings, customers and address books.
//!
//! Everything lives in one SQLite database. Quotations are stored as JSON
//! documents with an indexed status column; bookings, their items, customers
//! and address book entries are plain relational rows. Each store is a
//! trait so the workflows can be handed any implementation.

mod address_book;
mod booking;
mod customer;
mod error;
mod quotation;
mod schema;

pub use address_book::{AddressBook, AddressBookEntry, SqliteAddressBook};
pub use booking::{BookingStore, SqliteBookingStore};
pub use customer::{CustomerDirectory, SqliteCustomerDirectory};
pub use error::{StoreError, UpdateOutcome};
pub use quotation::{QuotationStore, SqliteQuotationStore};
pub use schema::{connect, migrate};

#[cfg(test)]
pub(crate) use schema::test_pool;
