//! Booking workflow: store the booking, then turn it into a carrier shipment.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::carrier::{CarrierGateway, ShipmentOrder};
use crate::domain::{
    Address, Booking, BookingId, BookingStatus, CustomerId, Money, NewBooking, Quotation,
};
use crate::store::{AddressBook, BookingStore, CustomerDirectory, QuotationStore, UpdateOutcome};

use super::CarrierAccount;
use super::error::WorkflowError;
use super::input::{BookingInput, ValidBooking};

const DEFAULT_DESCRIPTION: &str = "Shipment";

/// The stores the booking workflow reads and writes.
#[derive(Clone)]
pub struct BookingStores {
    pub bookings: Arc<dyn BookingStore>,
    pub quotations: Arc<dyn QuotationStore>,
    pub customers: Arc<dyn CustomerDirectory>,
    pub address_book: Arc<dyn AddressBook>,
}

/// Drives bookings from request to shipment, and cancels them.
pub struct BookingWorkflow {
    gateway: Arc<dyn CarrierGateway>,
    stores: BookingStores,
    account: CarrierAccount,
}

impl BookingWorkflow {
    pub fn new(
        gateway: Arc<dyn CarrierGateway>,
        stores: BookingStores,
        account: CarrierAccount,
    ) -> Self {
        Self {
            gateway,
            stores,
            account,
        }
    }

    /// Store a booking and create its shipment.
    ///
    /// If the carrier call fails the booking stays `Pending` and the error
    /// carries its id and whatever shipment fields the carrier returned.
    #[instrument(skip_all, fields(customer_id = input.customer_id, booking_id = tracing::field::Empty))]
    pub async fn confirm(&self, input: BookingInput) -> Result<Booking, WorkflowError> {
        let valid = input.validate()?;

        let known = self
            .stores
            .customers
            .exists(valid.customer_id)
            .await
            .map_err(|e| WorkflowError::store("checking customer", e))?;
        if !known {
            return Err(WorkflowError::NotFound(format!(
                "customer {}",
                valid.customer_id
            )));
        }

        let quotation = match valid.quotation_id {
            Some(id) => Some(
                self.stores
                    .quotations
                    .get_saved(id)
                    .await
                    .map_err(|e| WorkflowError::store("loading quotation", e))?
                    .ok_or_else(|| WorkflowError::NotFound(format!("saved quotation {id}")))?,
            ),
            None => None,
        };

        let new = new_booking(&valid, quotation.as_ref(), &self.account.carrier_name);
        let id = self
            .stores
            .bookings
            .insert_with_items(&new)
            .await
            .map_err(|e| WorkflowError::store("storing booking", e))?;
        tracing::Span::current().record("booking_id", id.0);

        self.remember(new.customer_id, &new.origin).await?;
        self.remember(new.customer_id, &new.destination).await?;

        let order = ShipmentOrder {
            shipper: self.account.shipper.clone(),
            ship_from: new.origin.clone(),
            ship_to: new.destination.clone(),
            packages: new.items.iter().map(|item| item.package.clone()).collect(),
            service_code: new.service_code.clone(),
            description: valid
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            pickup_date: new.pickup_date,
            pickup_time: new.pickup_time,
        };

        let token = self
            .gateway
            .authenticate(&self.account.credentials)
            .await
            .map_err(|e| WorkflowError::shipment(id, e))?;

        let shipment = match self.gateway.create_shipment(&token, &order).await {
            Ok(shipment) => shipment,
            Err(e) => {
                warn!(error = %e, "shipment creation failed, booking left pending");
                return Err(WorkflowError::shipment(id, e));
            }
        };

        let outcome = self
            .stores
            .bookings
            .record_shipment(id, &shipment)
            .await
            .map_err(|e| WorkflowError::store("recording shipment", e))?;
        if outcome == UpdateOutcome::NoMatch {
            return Err(WorkflowError::Persistence(format!(
                "booking {id} disappeared before its shipment was recorded"
            )));
        }

        info!(tracking_number = %shipment.tracking_number, "booking confirmed");
        self.get(id).await
    }

    async fn remember(&self, customer: CustomerId, address: &Address) -> Result<(), WorkflowError> {
        self.stores
            .address_book
            .find_or_create(customer, address)
            .await
            .map_err(|e| WorkflowError::store("updating address book", e))?;
        Ok(())
    }

    /// Cancel a booking. Never contacts the carrier.
    ///
    /// Cancelling an already cancelled booking succeeds without change.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: BookingId) -> Result<Booking, WorkflowError> {
        let outcome = self
            .stores
            .bookings
            .cancel(id)
            .await
            .map_err(|e| WorkflowError::store("cancelling booking", e))?;

        match outcome {
            UpdateOutcome::NoMatch => return Err(WorkflowError::NotFound(format!("booking {id}"))),
            UpdateOutcome::Unchanged => info!("booking already cancelled"),
            UpdateOutcome::Updated => info!("booking cancelled"),
        }
        self.get(id).await
    }

    pub async fn get(&self, id: BookingId) -> Result<Booking, WorkflowError> {
        self.stores
            .bookings
            .get(id)
            .await
            .map_err(|e| WorkflowError::store("loading booking", e))?
            .ok_or_else(|| WorkflowError::NotFound(format!("booking {id}")))
    }

    pub async fn list(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, WorkflowError> {
        self.stores
            .bookings
            .list(status)
            .await
            .map_err(|e| WorkflowError::store("listing bookings", e))
    }
}

/// Fill in costs and delivery estimate, preferring what the caller sent,
/// then the quoted offer for the chosen service, then the item costs.
fn new_booking(valid: &ValidBooking, quotation: Option<&Quotation>, carrier: &str) -> NewBooking {
    let offer = quotation.and_then(|q| {
        q.shipping_rates
            .iter()
            .find(|rate| rate.service_code == valid.service_code)
    });

    let item_total = valid
        .items
        .iter()
        .try_fold(Money::ZERO, |sum, item| sum.checked_add(item.cost))
        .unwrap_or(Money::ZERO);

    let est_cost = valid
        .est_cost
        .or(offer.map(|o| o.total_charges))
        .unwrap_or(item_total);
    let total_cost = valid.total_cost.unwrap_or(est_cost);
    let est_delivery_date = valid
        .est_delivery_date
        .clone()
        .or_else(|| offer.map(|o| o.estimated_arrival_date.clone()));

    NewBooking {
        customer_id: valid.customer_id,
        origin: valid.origin.clone(),
        destination: valid.destination.clone(),
        carrier_name: carrier.to_string(),
        service_code: valid.service_code.clone(),
        items: valid.items.clone(),
        pickup_date: valid.pickup_date,
        pickup_time: valid.pickup_time,
        est_delivery_date,
        est_cost,
        total_cost,
        quotation_id: quotation.map(|q| q.id),
    }
}
