//! The carrier gateway seam.

use std::fmt;

use async_trait::async_trait;

use crate::domain::{Address, RateOffer, ShipmentResult};

use super::error::CarrierError;
use super::request::{RateQuery, ShipmentOrder};

/// OAuth client credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Bearer token from the client-credentials exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Everything the workflows need from the carrier.
///
/// Implemented by the HTTP client, the token cache wrapper and the mock
/// used in tests.
#[async_trait]
pub trait CarrierGateway: Send + Sync {
    /// Exchange client credentials for a bearer token.
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, CarrierError>;

    /// Shop all services for one package. Malformed offers are skipped.
    async fn fetch_rates(
        &self,
        token: &AccessToken,
        query: &RateQuery,
    ) -> Result<Vec<RateOffer>, CarrierError>;

    /// Create a shipment and save its label, if any.
    async fn create_shipment(
        &self,
        token: &AccessToken,
        order: &ShipmentOrder,
    ) -> Result<ShipmentResult, CarrierError>;

    /// Return the carrier's best candidate for an address.
    async fn validate_address(
        &self,
        token: &AccessToken,
        address: &Address,
    ) -> Result<Address, CarrierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_not_in_debug_output() {
        let creds = Credentials::new("id-123", "hunter2");
        let shown = format!("{creds:?}");
        assert!(shown.contains("id-123"));
        assert!(!shown.contains("hunter2"));

        let token = AccessToken::new("eyJ.secret");
        assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
        assert_eq!(token.as_str(), "eyJ.secret");
    }
}
