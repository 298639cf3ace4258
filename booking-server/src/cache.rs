//! Caching layer for carrier access tokens.
//!
//! Tokens are cached per client id. The TTL must stay below the carrier's
//! token lifetime.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::carrier::{
    AccessToken, CarrierError, CarrierGateway, Credentials, RateQuery, ShipmentOrder,
};
use crate::domain::{Address, RateOffer, ShipmentResult};

/// Configuration for the token cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached tokens.
    pub ttl: Duration,

    /// Maximum number of cached tokens (one per client id).
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(50 * 60),
            max_capacity: 16,
        }
    }
}

/// Carrier gateway with token caching.
///
/// Wraps another gateway. `authenticate` is served from cache when a token
/// for the same client id is still fresh; failed exchanges are not cached.
/// All other operations pass straight through.
pub struct CachedGateway {
    inner: Arc<dyn CarrierGateway>,
    tokens: MokaCache<String, AccessToken>,
}

impl CachedGateway {
    pub fn new(inner: Arc<dyn CarrierGateway>, config: &CacheConfig) -> Self {
        let tokens = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, tokens }
    }

    /// Drop all cached tokens.
    pub fn invalidate_all(&self) {
        self.tokens.invalidate_all();
    }
}

#[async_trait]
impl CarrierGateway for CachedGateway {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, CarrierError> {
        if let Some(token) = self.tokens.get(&credentials.client_id).await {
            debug!(client_id = %credentials.client_id, "using cached access token");
            return Ok(token);
        }

        let token = self.inner.authenticate(credentials).await?;
        self.tokens
            .insert(credentials.client_id.clone(), token.clone())
            .await;
        Ok(token)
    }

    async fn fetch_rates(
        &self,
        token: &AccessToken,
        query: &RateQuery,
    ) -> Result<Vec<RateOffer>, CarrierError> {
        self.inner.fetch_rates(token, query).await
    }

    async fn create_shipment(
        &self,
        token: &AccessToken,
        order: &ShipmentOrder,
    ) -> Result<ShipmentResult, CarrierError> {
        self.inner.create_shipment(token, order).await
    }

    async fn validate_address(
        &self,
        token: &AccessToken,
        address: &Address,
    ) -> Result<Address, CarrierError> {
        self.inner.validate_address(token, address).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::carrier::fixtures::{address, package, shipper};
    use crate::carrier::{MockCarrier, sample_shipment};

    #[tokio::test]
    async fn token_reused_within_ttl() {
        let mock = Arc::new(MockCarrier::new());
        let cached = CachedGateway::new(mock.clone(), &CacheConfig::default());
        let creds = Credentials::new("client", "secret");

        let a = cached.authenticate(&creds).await.unwrap();
        let b = cached.authenticate(&creds).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(mock.calls().authenticate, 1);
    }

    #[tokio::test]
    async fn separate_clients_get_separate_tokens() {
        let mock = Arc::new(MockCarrier::new());
        let cached = CachedGateway::new(mock.clone(), &CacheConfig::default());

        cached
            .authenticate(&Credentials::new("one", "s"))
            .await
            .unwrap();
        cached
            .authenticate(&Credentials::new("two", "s"))
            .await
            .unwrap();

        assert_eq!(mock.calls().authenticate, 2);
    }

    #[tokio::test]
    async fn failures_not_cached() {
        let mock = Arc::new(MockCarrier::new().failing_auth("denied"));
        let cached = CachedGateway::new(mock.clone(), &CacheConfig::default());
        let creds = Credentials::new("client", "secret");

        assert!(cached.authenticate(&creds).await.is_err());
        assert!(cached.authenticate(&creds).await.is_err());
        assert_eq!(mock.calls().authenticate, 2);
    }

    #[tokio::test]
    async fn invalidate_forces_new_exchange() {
        let mock = Arc::new(MockCarrier::new());
        let cached = CachedGateway::new(mock.clone(), &CacheConfig::default());
        let creds = Credentials::new("client", "secret");

        cached.authenticate(&creds).await.unwrap();
        cached.invalidate_all();
        cached.authenticate(&creds).await.unwrap();

        assert_eq!(mock.calls().authenticate, 2);
    }

    #[tokio::test]
    async fn validation_passes_through() {
        let corrected = address("Receiver", "Fresno", "93650-1234");
        let mock = Arc::new(MockCarrier::new().with_validated_address(Ok(corrected.clone())));
        let cached = CachedGateway::new(mock.clone(), &CacheConfig::default());

        let validated = cached
            .validate_address(&AccessToken::new("t"), &address("Receiver", "Fresno", "93650"))
            .await
            .unwrap();

        assert_eq!(validated, corrected);
        assert_eq!(mock.calls().validate_address, 1);
        assert_eq!(mock.calls().authenticate, 0);
    }

    #[tokio::test]
    async fn shipment_passes_through() {
        let scripted = ShipmentResult {
            tracking_number: "1Z999AA10123456784".into(),
            ..sample_shipment()
        };
        let mock = Arc::new(MockCarrier::new().with_shipment(scripted.clone()));
        let cached = CachedGateway::new(mock.clone(), &CacheConfig::default());
        let order = ShipmentOrder {
            shipper: shipper(),
            ship_from: address("Sender", "Oxnard", "93030"),
            ship_to: address("Receiver", "Fresno", "93650"),
            packages: vec![package("Parcel", "5", "10", "8", "2")],
            service_code: "03".into(),
            description: "Shipment".into(),
            pickup_date: NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            pickup_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        };

        let result = cached
            .create_shipment(&AccessToken::new("t"), &order)
            .await
            .unwrap();

        assert_eq!(result, scripted);
        assert_eq!(mock.last_order(), Some(order));
    }
}
