//! Raw workflow inputs and their validation into domain values.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::domain::{
    Address, AddressFields, BookingItem, CustomerId, DimensionUnit, Dimensions, DomainError,
    Measure, Money, PackageSpec, QuotationId, QuoteRequest, Weight, WeightUnit,
};

fn default_count() -> u32 {
    1
}

/// Parse a pickup date, `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| DomainError::Invalid {
        field: "pickup_date",
        reason: format!("{raw:?} is not a YYYY-MM-DD date"),
    })
}

/// Parse a pickup time, `HH:MM` or `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, DomainError> {
    let raw_trimmed = raw.trim();
    NaiveTime::parse_from_str(raw_trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw_trimmed, "%H:%M:%S"))
        .map_err(|_| DomainError::Invalid {
            field: "pickup_time",
            reason: format!("{raw:?} is not an HH:MM time"),
        })
}

/// One package as sent by a caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageInput {
    #[serde(default)]
    pub package_type: String,
    pub weight: Option<Measure>,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    pub length: Option<Measure>,
    pub width: Option<Measure>,
    pub height: Option<Measure>,
    #[serde(default)]
    pub dimension_unit: DimensionUnit,
    /// Only used for booking items.
    pub cost: Option<Money>,
}

impl PackageInput {
    pub fn to_spec(&self) -> Result<PackageSpec, DomainError> {
        let weight = self.weight.map(|value| Weight {
            value,
            unit: self.weight_unit,
        });
        let dimensions = match (self.length, self.width, self.height) {
            (Some(length), Some(width), Some(height)) => Some(Dimensions {
                length,
                width,
                height,
                unit: self.dimension_unit,
            }),
            _ => None,
        };
        PackageSpec::new(self.package_type.clone(), weight, dimensions)
    }

    fn to_item(&self) -> Result<BookingItem, DomainError> {
        Ok(BookingItem {
            package: self.to_spec()?,
            cost: self.cost.ok_or(DomainError::MissingField("cost"))?,
        })
    }
}

/// A rate request as sent by a caller.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteInput {
    pub ship_to: AddressFields,
    pub ship_from: AddressFields,
    #[serde(default)]
    pub package_details: Vec<PackageInput>,
    pub pickup_date: String,
    pub pickup_time: String,
    #[serde(default = "default_count")]
    pub package_count: u32,
}

impl QuoteInput {
    /// Check every field and build the domain request.
    pub fn validate(self) -> Result<QuoteRequest, DomainError> {
        if self.package_details.is_empty() {
            return Err(DomainError::NoPackages);
        }
        let packages = self
            .package_details
            .iter()
            .map(PackageInput::to_spec)
            .collect::<Result<Vec<_>, _>>()?;

        QuoteRequest::new(
            Address::new(self.ship_to)?,
            Address::new(self.ship_from)?,
            packages,
            parse_date(&self.pickup_date)?,
            parse_time(&self.pickup_time)?,
            self.package_count,
        )
    }
}

/// A booking request as sent by a caller.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingInput {
    pub customer_id: i64,
    pub origin: AddressFields,
    pub destination: AddressFields,
    pub service_code: String,
    #[serde(default)]
    pub items: Vec<PackageInput>,
    pub pickup_date: String,
    pub pickup_time: String,
    pub est_delivery_date: Option<String>,
    pub est_cost: Option<Money>,
    pub total_cost: Option<Money>,
    pub quotation_id: Option<String>,
    pub description: Option<String>,
}

/// A booking request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub customer_id: CustomerId,
    pub origin: Address,
    pub destination: Address,
    pub service_code: String,
    pub items: Vec<BookingItem>,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub est_delivery_date: Option<String>,
    pub est_cost: Option<Money>,
    pub total_cost: Option<Money>,
    pub quotation_id: Option<QuotationId>,
    pub description: Option<String>,
}

impl BookingInput {
    /// Check every field. An empty item list is left for the store to
    /// refuse, so it is rejected inside the insert transaction.
    pub fn validate(self) -> Result<ValidBooking, DomainError> {
        let service_code = self.service_code.trim().to_string();
        if service_code.is_empty() {
            return Err(DomainError::MissingField("service_code"));
        }
        let items = self
            .items
            .iter()
            .map(PackageInput::to_item)
            .collect::<Result<Vec<_>, _>>()?;
        let quotation_id = self
            .quotation_id
            .as_deref()
            .map(QuotationId::parse)
            .transpose()?;

        Ok(ValidBooking {
            customer_id: CustomerId(self.customer_id),
            origin: Address::new(self.origin)?,
            destination: Address::new(self.destination)?,
            service_code,
            items,
            pickup_date: parse_date(&self.pickup_date)?,
            pickup_time: parse_time(&self.pickup_time)?,
            est_delivery_date: self.est_delivery_date.filter(|d| !d.trim().is_empty()),
            est_cost: self.est_cost,
            total_cost: self.total_cost,
            quotation_id,
            description: self.description.filter(|d| !d.trim().is_empty()),
        })
    }
}
