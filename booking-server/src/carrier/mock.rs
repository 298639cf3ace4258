//! Scripted carrier for tests and offline runs.
//!
//! Each operation returns a preset result and counts its calls, so tests
//! can assert both what the workflow got back and whether the carrier was
//! contacted at all.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::{Address, Money, RateOffer, ShipmentResult};

use super::error::CarrierError;
use super::gateway::{AccessToken, CarrierGateway, Credentials};
use super::request::{RateQuery, ShipmentOrder};

/// Number of calls made to each operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub authenticate: usize,
    pub fetch_rates: usize,
    pub create_shipment: usize,
    pub validate_address: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.authenticate + self.fetch_rates + self.create_shipment + self.validate_address
    }
}

/// A carrier that answers from presets.
pub struct MockCarrier {
    auth: Result<AccessToken, CarrierError>,
    rates: Result<Vec<RateOffer>, CarrierError>,
    shipment: Result<ShipmentResult, CarrierError>,
    address: Option<Result<Address, CarrierError>>,
    authenticate_calls: AtomicUsize,
    rate_calls: AtomicUsize,
    shipment_calls: AtomicUsize,
    validate_calls: AtomicUsize,
    last_rate_query: Mutex<Option<RateQuery>>,
    last_order: Mutex<Option<ShipmentOrder>>,
}

impl Default for MockCarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCarrier {
    /// A carrier that succeeds at everything with sample data.
    pub fn new() -> Self {
        Self {
            auth: Ok(AccessToken::new("mock-token")),
            rates: Ok(sample_rates()),
            shipment: Ok(sample_shipment()),
            address: None,
            authenticate_calls: AtomicUsize::new(0),
            rate_calls: AtomicUsize::new(0),
            shipment_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
            last_rate_query: Mutex::new(None),
            last_order: Mutex::new(None),
        }
    }

    pub fn with_rates(mut self, rates: Vec<RateOffer>) -> Self {
        self.rates = Ok(rates);
        self
    }

    pub fn failing_rates(mut self, message: &str) -> Self {
        self.rates = Err(CarrierError::RateFetch(message.to_string()));
        self
    }

    pub fn failing_auth(mut self, message: &str) -> Self {
        self.auth = Err(CarrierError::Auth(message.to_string()));
        self
    }

    pub fn with_shipment(mut self, shipment: ShipmentResult) -> Self {
        self.shipment = Ok(shipment);
        self
    }

    pub fn failing_shipment(mut self, error: CarrierError) -> Self {
        self.shipment = Err(error);
        self
    }

    /// Answer address validation with this result instead of echoing input.
    pub fn with_validated_address(mut self, result: Result<Address, CarrierError>) -> Self {
        self.address = Some(result);
        self
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            authenticate: self.authenticate_calls.load(Ordering::SeqCst),
            fetch_rates: self.rate_calls.load(Ordering::SeqCst),
            create_shipment: self.shipment_calls.load(Ordering::SeqCst),
            validate_address: self.validate_calls.load(Ordering::SeqCst),
        }
    }

    /// The most recent rate query received.
    pub fn last_rate_query(&self) -> Option<RateQuery> {
        self.last_rate_query
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// The most recent shipment order received.
    pub fn last_order(&self) -> Option<ShipmentOrder> {
        self.last_order.lock().ok().and_then(|guard| guard.clone())
    }
}

/// Two sample offers in carrier order.
pub fn sample_rates() -> Vec<RateOffer> {
    let offer = |code: &str, name: &str, days: u32, cents: i64| RateOffer {
        service_code: code.to_string(),
        service_desc: String::new(),
        service_name: name.to_string(),
        transit_time: days,
        estimated_arrival_date: "January 15, 2025".to_string(),
        estimated_arrival_time: "11:00 PM".to_string(),
        dayofweek: "WED".to_string(),
        total_charges: Money::from_cents(cents).unwrap_or(Money::ZERO),
    };
    vec![
        offer("03", "UPS Ground", 3, 1595),
        offer("02", "UPS 2nd Day Air", 2, 3480),
    ]
}

/// A sample successful shipment without a label.
pub fn sample_shipment() -> ShipmentResult {
    ShipmentResult {
        shipment_id: "1ZMOCK0000000001".to_string(),
        tracking_number: "1ZMOCK0000000001".to_string(),
        total_charges: Money::from_cents(1595).ok(),
        base_service_charge: Money::from_cents(1400).ok(),
        residential_surcharge: None,
        label: None,
    }
}

#[async_trait]
impl CarrierGateway for MockCarrier {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<AccessToken, CarrierError> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        self.auth.clone()
    }

    async fn fetch_rates(
        &self,
        _token: &AccessToken,
        query: &RateQuery,
    ) -> Result<Vec<RateOffer>, CarrierError> {
        self.rate_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_rate_query.lock() {
            *last = Some(query.clone());
        }
        self.rates.clone()
    }

    async fn create_shipment(
        &self,
        _token: &AccessToken,
        order: &ShipmentOrder,
    ) -> Result<ShipmentResult, CarrierError> {
        self.shipment_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_order.lock() {
            *last = Some(order.clone());
        }
        self.shipment.clone()
    }

    async fn validate_address(
        &self,
        _token: &AccessToken,
        address: &Address,
    ) -> Result<Address, CarrierError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        match &self.address {
            Some(result) => result.clone(),
            None => Ok(address.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::request::fixtures::{address, package, rate_query};

    #[tokio::test]
    async fn counts_calls_and_records_queries() {
        let mock = MockCarrier::new();
        let token = mock.authenticate(&Credentials::new("a", "b")).await.unwrap();
        let query = rate_query(package("Pallet", "5", "10", "8", "2"));
        let rates = mock.fetch_rates(&token, &query).await.unwrap();

        assert_eq!(rates, sample_rates());
        assert_eq!(mock.last_rate_query(), Some(query));
        assert_eq!(
            mock.calls(),
            CallCounts {
                authenticate: 1,
                fetch_rates: 1,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn scripted_failures() {
        let mock = MockCarrier::new()
            .failing_auth("bad secret")
            .failing_rates("boom");
        assert!(matches!(
            mock.authenticate(&Credentials::new("a", "b")).await,
            Err(CarrierError::Auth(_))
        ));
        let query = rate_query(package("Pallet", "5", "10", "8", "2"));
        assert!(matches!(
            mock.fetch_rates(&AccessToken::new("t"), &query).await,
            Err(CarrierError::RateFetch(_))
        ));
    }

    #[tokio::test]
    async fn address_echoes_by_default() {
        let mock = MockCarrier::new();
        let a = address("Receiver", "Fresno", "93650");
        let validated = mock
            .validate_address(&AccessToken::new("t"), &a)
            .await
            .unwrap();
        assert_eq!(validated, a);
        assert_eq!(mock.calls().total(), 1);
    }
}
