//! Server configuration read from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::CacheConfig;
use crate::carrier::{CarrierConfig, Credentials, ShipperProfile};
use crate::domain::{Address, AddressFields, DomainError};
use crate::workflow::CarrierAccount;

/// Error building the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set but unusable
    #[error("{var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// The shipper address is incomplete
    #[error("shipper address: {0}")]
    Shipper(#[from] DomainError),
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Where decoded shipping labels are written and served from.
    pub label_dir: PathBuf,
    pub carrier: CarrierConfig,
    pub token_cache: CacheConfig,
    pub account: CarrierAccount,
    /// Answer carrier calls from the scripted mock instead of the network.
    pub mock_carrier: bool,
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mock_carrier = get("CARRIER_MOCK").is_some_and(|v| matches!(v.as_str(), "1" | "true"));

        let mut carrier = CarrierConfig::new();
        if let Some(url) = get("CARRIER_BASE_URL") {
            carrier = carrier.with_base_url(url);
        }
        if let Some(secs) = parsed::<u64>(&get, "CARRIER_TIMEOUT_SECS")? {
            carrier = carrier.with_timeout(secs);
        }
        if let Some(n) = parsed::<usize>(&get, "CARRIER_MAX_CONCURRENT")? {
            carrier = carrier.with_max_concurrent(n);
        }

        let mut token_cache = CacheConfig::default();
        if let Some(secs) = parsed::<u64>(&get, "CARRIER_TOKEN_TTL_SECS")? {
            token_cache.ttl = Duration::from_secs(secs);
        }

        let client_id = get("CARRIER_CLIENT_ID").unwrap_or_else(|| {
            if !mock_carrier {
                warn!("CARRIER_CLIENT_ID not set, carrier calls will fail");
            }
            String::new()
        });
        let client_secret = get("CARRIER_CLIENT_SECRET").unwrap_or_default();

        let shipper_number = match get("CARRIER_SHIPPER_NUMBER") {
            Some(n) => n,
            None if mock_carrier => "MOCK00".to_string(),
            None => return Err(ConfigError::Missing("CARRIER_SHIPPER_NUMBER")),
        };
        let shipper = ShipperProfile {
            account_number: get("CARRIER_ACCOUNT_NUMBER").unwrap_or_else(|| shipper_number.clone()),
            shipper_number,
            address: shipper_address(&get, mock_carrier)?,
        };

        Ok(Self {
            bind_addr: parsed(&get, "BIND_ADDR")?
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000))),
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite://booking.db".to_string()),
            database_max_connections: parsed(&get, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(5),
            label_dir: get("LABEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("shipment_labels")),
            carrier,
            token_cache,
            account: CarrierAccount {
                credentials: Credentials::new(client_id, client_secret),
                shipper,
                carrier_name: get("CARRIER_NAME").unwrap_or_else(|| "UPS".to_string()),
            },
            mock_carrier,
        })
    }
}

fn parsed<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(var)
        .map(|value| {
            value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

fn shipper_address(
    get: &impl Fn(&str) -> Option<String>,
    mock_carrier: bool,
) -> Result<Address, ConfigError> {
    let name = get("SHIPPER_NAME");
    if name.is_none() && mock_carrier {
        return Ok(Address::new(AddressFields {
            name: "Mock Shipper".into(),
            address: "1 Depot Road".into(),
            city: "Simi Valley".into(),
            state: "CA".into(),
            postal_code: "93063".into(),
            country: "US".into(),
            ..Default::default()
        })?);
    }

    Ok(Address::new(AddressFields {
        name: name.unwrap_or_default(),
        mobile: get("SHIPPER_PHONE"),
        email: get("SHIPPER_EMAIL"),
        address: get("SHIPPER_ADDRESS").unwrap_or_default(),
        city: get("SHIPPER_CITY").unwrap_or_default(),
        state: get("SHIPPER_STATE").unwrap_or_default(),
        postal_code: get("SHIPPER_POSTAL_CODE").unwrap_or_default(),
        country: get("SHIPPER_COUNTRY").unwrap_or_default(),
    })?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn full() -> Vec<(&'static str, &'static str)> {
        vec![
            ("CARRIER_CLIENT_ID", "client"),
            ("CARRIER_CLIENT_SECRET", "secret"),
            ("CARRIER_SHIPPER_NUMBER", "RC6604"),
            ("SHIPPER_NAME", "Thisai"),
            ("SHIPPER_ADDRESS", "1834 Blazewood Street"),
            ("SHIPPER_CITY", "Simi Valley"),
            ("SHIPPER_STATE", "CA"),
            ("SHIPPER_POSTAL_CODE", "93063"),
            ("SHIPPER_COUNTRY", "US"),
        ]
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::from_lookup(lookup(&full())).unwrap();

        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(config.database_url, "sqlite://booking.db");
        assert_eq!(config.carrier.timeout_secs, 20);
        assert_eq!(config.carrier.max_concurrent, 5);
        assert_eq!(config.token_cache.ttl, Duration::from_secs(50 * 60));
        assert_eq!(config.account.shipper.account_number, "RC6604");
        assert_eq!(config.account.carrier_name, "UPS");
        assert!(!config.mock_carrier);
    }

    #[test]
    fn overrides() {
        let mut vars = full();
        vars.extend([
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("CARRIER_BASE_URL", "https://wwwcie.ups.com/"),
            ("CARRIER_TIMEOUT_SECS", "5"),
            ("CARRIER_MAX_CONCURRENT", "0"),
            ("CARRIER_TOKEN_TTL_SECS", "60"),
        ]);
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.carrier.base_url, "https://wwwcie.ups.com");
        assert_eq!(config.carrier.timeout_secs, 5);
        assert_eq!(config.carrier.max_concurrent, 1);
        assert_eq!(config.token_cache.ttl, Duration::from_secs(60));
    }

    #[test]
    fn bad_number_rejected() {
        let mut vars = full();
        vars.push(("CARRIER_TIMEOUT_SECS", "soon"));
        let err = ServerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "CARRIER_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn shipper_required_unless_mocked() {
        let err = ServerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CARRIER_SHIPPER_NUMBER")));

        let mut vars = full();
        vars.retain(|(k, _)| *k != "SHIPPER_CITY");
        let err = ServerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Shipper(DomainError::MissingField("city"))
        ));

        let config = ServerConfig::from_lookup(lookup(&[("CARRIER_MOCK", "1")])).unwrap();
        assert!(config.mock_carrier);
        assert_eq!(config.account.shipper.address.country(), "US");
    }
}
