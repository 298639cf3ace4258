//! Carrier HTTP client.
//!
//! Provides async methods for the carrier's OAuth, rating, shipping and
//! address validation endpoints. Every request carries an explicit timeout
//! and a semaphore caps the number of requests in flight.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{Address, RateOffer, ShipmentResult};

use super::convert::{convert_address_candidate, convert_rates, convert_shipment};
use super::error::{CarrierError, TransportError};
use super::gateway::{AccessToken, CarrierGateway, Credentials};
use super::label::LabelStore;
use super::request::{
    RateQuery, ShipmentOrder, build_address_validation, build_rate_request,
    build_shipment_request,
};
use super::types::{
    ErrorEnvelope, RateResponseEnvelope, ShipmentResponseEnvelope, TokenResponse,
    XavResponseEnvelope,
};

/// Default base URL for the carrier API.
pub const DEFAULT_BASE_URL: &str = "https://onlinetools.ups.com";

const TOKEN_PATH: &str = "/security/v1/oauth/token";
const RATE_PATH: &str = "/api/rating/v2409/Shoptimeintransit";
const SHIP_PATH: &str = "/api/shipments/v2409/ship";
const XAV_PATH: &str = "/api/addressvalidation/v2/3";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// How much of an unparseable body to keep for the error message.
const BODY_EXCERPT_CHARS: usize = 500;

/// Configuration for the carrier client.
#[derive(Debug, Clone)]
pub struct CarrierConfig {
    /// Base URL for all endpoints (defaults to production)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Value of the `transactionSrc` header
    pub transaction_source: String,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            transaction_source: "booking-server".to_string(),
        }
    }
}

impl CarrierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom base URL (for testing or the sandbox).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_transaction_source(mut self, source: impl Into<String>) -> Self {
        self.transaction_source = source.into();
        self
    }
}

/// Carrier API client.
#[derive(Debug, Clone)]
pub struct CarrierClient {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
    semaphore: Arc<Semaphore>,
    labels: LabelStore,
}

impl CarrierClient {
    /// Create a new client. Labels from created shipments go to `labels`.
    pub fn new(config: CarrierConfig, labels: LabelStore) -> Result<Self, CarrierError> {
        let mut headers = HeaderMap::new();
        let source = HeaderValue::from_str(&config.transaction_source)
            .map_err(|_| CarrierError::Config("invalid transaction source".to_string()))?;
        headers.insert("transactionSrc", source);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CarrierError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url,
            timeout_secs: config.timeout_secs,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            labels,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout_secs)
        } else {
            TransportError::Http(err)
        }
    }

    /// Send a request and decode the JSON body.
    async fn send<R: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<R, TransportError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| TransportError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let response = request.send().await.map_err(|e| self.transport(e))?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TransportError::Unauthorized);
        }

        let body = response.text().await.map_err(|e| self.transport(e))?;

        if !status.is_success() {
            return Err(TransportError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(BODY_EXCERPT_CHARS).collect()),
        })
    }

    async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        token: &AccessToken,
        path: &str,
        body: &B,
    ) -> Result<R, TransportError> {
        let request = self
            .http
            .post(self.url(path))
            .bearer_auth(token.as_str())
            .header("transId", Uuid::new_v4().simple().to_string())
            .json(body);
        self.send(request).await
    }
}

/// Pull readable messages out of a carrier error body.
fn error_message(body: &str) -> String {
    let messages: Vec<String> = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.response)
        .map(|r| r.errors)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|e| match (e.code, e.message) {
            (Some(code), Some(message)) => Some(format!("{code}: {message}")),
            (None, Some(message)) => Some(message),
            _ => None,
        })
        .collect();

    if messages.is_empty() {
        body.chars().take(BODY_EXCERPT_CHARS).collect()
    } else {
        messages.join("; ")
    }
}

#[async_trait]
impl CarrierGateway for CarrierClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, CarrierError> {
        let basic = STANDARD.encode(format!(
            "{}:{}",
            credentials.client_id, credentials.client_secret
        ));

        let request = self
            .http
            .post(self.url(TOKEN_PATH))
            .header(AUTHORIZATION, format!("Basic {basic}"))
            .form(&[("grant_type", "client_credentials")]);

        let response: TokenResponse = self
            .send(request)
            .await
            .map_err(|e| CarrierError::Auth(e.to_string()))?;

        let token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CarrierError::Auth("no access_token in response".to_string()))?;

        debug!(client_id = %credentials.client_id, "obtained carrier access token");
        Ok(AccessToken::new(token))
    }

    async fn fetch_rates(
        &self,
        token: &AccessToken,
        query: &RateQuery,
    ) -> Result<Vec<RateOffer>, CarrierError> {
        let body = build_rate_request(query);
        let response: RateResponseEnvelope = self
            .post_json(token, RATE_PATH, &body)
            .await
            .map_err(|e| CarrierError::RateFetch(e.to_string()))?;

        let offers = convert_rates(response);
        info!(offers = offers.len(), "carrier returned rates");
        Ok(offers)
    }

    async fn create_shipment(
        &self,
        token: &AccessToken,
        order: &ShipmentOrder,
    ) -> Result<ShipmentResult, CarrierError> {
        let body = build_shipment_request(order);
        let response: ShipmentResponseEnvelope = self
            .post_json(token, SHIP_PATH, &body)
            .await
            .map_err(CarrierError::shipment)?;

        let shipment = convert_shipment(response).map_err(|partial| {
            warn!(?partial, "ship response has no tracking number");
            CarrierError::ShipmentCreation {
                message: "carrier returned no tracking number".to_string(),
                partial,
            }
        })?;

        let label = match &shipment.label_image {
            Some(image) => self.labels.save(&shipment.shipment_id, image).await,
            None => {
                warn!(shipment_id = %shipment.shipment_id, "ship response has no label");
                None
            }
        };

        Ok(ShipmentResult {
            shipment_id: shipment.shipment_id,
            tracking_number: shipment.tracking_number,
            total_charges: shipment.total_charges,
            base_service_charge: shipment.base_service_charge,
            residential_surcharge: shipment.residential_surcharge,
            label,
        })
    }

    async fn validate_address(
        &self,
        token: &AccessToken,
        address: &Address,
    ) -> Result<Address, CarrierError> {
        if address.state().is_empty() {
            return Err(CarrierError::Validation(
                "state is required for address validation".to_string(),
            ));
        }

        let body = build_address_validation(address);
        let request = self
            .http
            .post(self.url(XAV_PATH))
            .bearer_auth(token.as_str())
            .query(&[("maximumcandidatelistsize", "1")])
            .json(&body);

        let response: XavResponseEnvelope = self
            .send(request)
            .await
            .map_err(|e| CarrierError::Validation(e.to_string()))?;

        convert_address_candidate(response, address)
            .map_err(|e| CarrierError::Validation(e.to_string()))
    }
}
