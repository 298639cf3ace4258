//! Quotation documents and their status lifecycle.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Address, DomainError, Money, PackageSpec};

/// Opaque quotation identifier, generated when the draft is created.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotationId(Uuid);

impl QuotationId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        QuotationId(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(s.trim())
            .map(QuotationId)
            .map_err(|_| DomainError::Invalid {
                field: "quotation_id",
                reason: format!("{s:?} is not a quotation id"),
            })
    }
}

impl fmt::Debug for QuotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuotationId({})", self.0)
    }
}

impl fmt::Display for QuotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle status of a quotation. Only moves forward.
///
/// Older documents carry `"unsaved"`/`"Unsaved"`, which read as `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuotationStatus {
    #[serde(alias = "unsaved", alias = "Unsaved")]
    Draft,
    Rated,
    #[serde(alias = "saved")]
    Saved,
}

/// What a status change does to the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Write the new status (and any fields that go with it).
    Apply,
    /// Already there; nothing to write.
    Unchanged,
}

impl QuotationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QuotationStatus::Draft => "Draft",
            QuotationStatus::Rated => "Rated",
            QuotationStatus::Saved => "Saved",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "Draft" | "unsaved" | "Unsaved" => Ok(QuotationStatus::Draft),
            "Rated" => Ok(QuotationStatus::Rated),
            "Saved" | "saved" => Ok(QuotationStatus::Saved),
            other => Err(DomainError::Invalid {
                field: "status",
                reason: format!("unknown quotation status {other:?}"),
            }),
        }
    }

    /// The single forward-only transition rule.
    ///
    /// * moving forward is applied;
    /// * `Rated -> Rated` is applied too, replacing the attached rates;
    /// * any other same-state move is a no-op;
    /// * moving backward is refused. A `Saved` quotation therefore
    ///   never accepts new rates.
    pub fn transition_to(self, next: QuotationStatus) -> Result<StatusChange, DomainError> {
        use std::cmp::Ordering;

        match next.cmp(&self) {
            Ordering::Greater => Ok(StatusChange::Apply),
            Ordering::Equal if next == QuotationStatus::Rated => Ok(StatusChange::Apply),
            Ordering::Equal => Ok(StatusChange::Unchanged),
            Ordering::Less => Err(DomainError::BackwardTransition {
                from: self,
                to: next,
            }),
        }
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One carrier service option attached to a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateOffer {
    pub service_code: String,
    pub service_desc: String,
    pub service_name: String,
    /// Business days in transit.
    pub transit_time: u32,
    /// e.g. `"January 15, 2025"`
    pub estimated_arrival_date: String,
    /// e.g. `"02:30 PM"`
    pub estimated_arrival_time: String,
    pub dayofweek: String,
    pub total_charges: Money,
}

/// Origin and destination of a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationAddresses {
    pub ship_to: Address,
    pub ship_from: Address,
}

/// A validated request for shipping rates.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    address: QuotationAddresses,
    packages: Vec<PackageSpec>,
    pickup_date: NaiveDate,
    pickup_time: NaiveTime,
    package_count: u32,
}

impl QuoteRequest {
    pub fn new(
        ship_to: Address,
        ship_from: Address,
        packages: Vec<PackageSpec>,
        pickup_date: NaiveDate,
        pickup_time: NaiveTime,
        package_count: u32,
    ) -> Result<Self, DomainError> {
        if packages.is_empty() {
            return Err(DomainError::NoPackages);
        }
        if package_count == 0 {
            return Err(DomainError::Invalid {
                field: "package_count",
                reason: "must be at least 1".into(),
            });
        }
        Ok(Self {
            address: QuotationAddresses { ship_to, ship_from },
            packages,
            pickup_date,
            pickup_time,
            package_count,
        })
    }

    pub fn ship_to(&self) -> &Address {
        &self.address.ship_to
    }

    pub fn ship_from(&self) -> &Address {
        &self.address.ship_from
    }

    pub fn packages(&self) -> &[PackageSpec] {
        &self.packages
    }

    pub fn pickup_date(&self) -> NaiveDate {
        self.pickup_date
    }

    pub fn pickup_time(&self) -> NaiveTime {
        self.pickup_time
    }

    pub fn package_count(&self) -> u32 {
        self.package_count
    }
}

/// A quotation document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: QuotationId,
    pub address: QuotationAddresses,
    pub package_details: Vec<PackageSpec>,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub package_count: u32,
    pub status: QuotationStatus,
    #[serde(default)]
    pub shipping_rates: Vec<RateOffer>,
    pub created_at: DateTime<Utc>,
}

impl Quotation {
    /// A new draft with a freshly generated id and no rates.
    pub fn draft(request: &QuoteRequest) -> Self {
        Self {
            id: QuotationId::generate(),
            address: request.address.clone(),
            package_details: request.packages.clone(),
            pickup_date: request.pickup_date,
            pickup_time: request.pickup_time,
            package_count: request.package_count,
            status: QuotationStatus::Draft,
            shipping_rates: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use QuotationStatus::*;

    #[test]
    fn forward_moves_apply() {
        assert_eq!(Draft.transition_to(Rated), Ok(StatusChange::Apply));
        assert_eq!(Rated.transition_to(Saved), Ok(StatusChange::Apply));
        assert_eq!(Draft.transition_to(Saved), Ok(StatusChange::Apply));
    }

    #[test]
    fn rerating_replaces_rates() {
        assert_eq!(Rated.transition_to(Rated), Ok(StatusChange::Apply));
    }

    #[test]
    fn saving_twice_is_a_no_op() {
        assert_eq!(Saved.transition_to(Saved), Ok(StatusChange::Unchanged));
    }

    #[test]
    fn backward_moves_refused() {
        assert!(Saved.transition_to(Rated).is_err());
        assert!(Saved.transition_to(Draft).is_err());
        assert!(Rated.transition_to(Draft).is_err());
    }

    #[test]
    fn legacy_status_strings() {
        let s: QuotationStatus = serde_json::from_str("\"unsaved\"").unwrap();
        assert_eq!(s, Draft);
        let s: QuotationStatus = serde_json::from_str("\"Unsaved\"").unwrap();
        assert_eq!(s, Draft);
        assert_eq!(QuotationStatus::parse("Saved").unwrap(), Saved);
        assert!(QuotationStatus::parse("Archived").is_err());
        assert_eq!(serde_json::to_string(&Rated).unwrap(), "\"Rated\"");
    }

    #[test]
    fn quotation_id_parse() {
        let id = QuotationId::generate();
        assert_eq!(QuotationId::parse(&id.to_string()).unwrap(), id);
        assert!(QuotationId::parse("not-an-id").is_err());
    }
}
