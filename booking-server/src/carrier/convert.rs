//! Conversion from carrier DTOs to domain types.
//!
//! Rated shipments are converted one at a time. A malformed entry is
//! logged and skipped so that one bad service does not discard the rest.

use chrono::{NaiveDate, NaiveTime};
use tracing::warn;

use crate::domain::{Address, AddressFields, Money, PartialShipment, RateOffer};

use super::types::{
    AddressKeyFormat, Monetary, RateResponseEnvelope, RatedShipment, ShipmentResponseEnvelope,
    XavResponseEnvelope,
};

/// Itemized charge code for the residential surcharge.
const RESIDENTIAL_SURCHARGE_CODE: &str = "270";

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Failed to parse a date
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Failed to parse a time
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// Failed to parse an amount or count
    #[error("invalid number in {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },

    /// The entry did not have the expected structure
    #[error("malformed entry: {0}")]
    Malformed(String),
}

/// A created shipment before its label has been written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedShipment {
    pub shipment_id: String,
    pub tracking_number: String,
    pub total_charges: Option<Money>,
    pub base_service_charge: Option<Money>,
    pub residential_surcharge: Option<Money>,
    /// Base64 label image, shipment-level first, then first package.
    pub label_image: Option<String>,
}

/// `20250115` -> `January 15, 2025`
pub fn format_arrival_date(raw: &str) -> Result<String, ConversionError> {
    let date = NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map_err(|_| ConversionError::InvalidDate(raw.to_string()))?;
    Ok(date.format("%B %d, %Y").to_string())
}

/// `143000` -> `02:30 PM`
pub fn format_arrival_time(raw: &str) -> Result<String, ConversionError> {
    let time = NaiveTime::parse_from_str(raw, "%H%M%S")
        .map_err(|_| ConversionError::InvalidTime(raw.to_string()))?;
    Ok(time.format("%I:%M %p").to_string())
}

fn money(m: Option<&Monetary>, field: &'static str) -> Result<Option<Money>, ConversionError> {
    let Some(value) = m.and_then(|m| m.monetary_value.as_ref()) else {
        return Ok(None);
    };
    let text = value.to_text();
    Money::parse(&text)
        .map(Some)
        .map_err(|_| ConversionError::InvalidNumber { field, value: text })
}

/// Convert a rate response, skipping malformed offers. Carrier order is kept.
pub fn convert_rates(response: RateResponseEnvelope) -> Vec<RateOffer> {
    let entries = response
        .rate_response
        .and_then(|r| r.rated_shipment)
        .map(|r| r.into_vec())
        .unwrap_or_default();

    let mut offers = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        match convert_rated_shipment(entry) {
            Ok(offer) => offers.push(offer),
            Err(e) => warn!(index, error = %e, "skipping malformed rate offer"),
        }
    }

    offers
}

/// Convert one rated shipment entry.
pub fn convert_rated_shipment(entry: serde_json::Value) -> Result<RateOffer, ConversionError> {
    let shipment: RatedShipment =
        serde_json::from_value(entry).map_err(|e| ConversionError::Malformed(e.to_string()))?;

    let service = shipment
        .service
        .ok_or(ConversionError::MissingField("Service"))?;
    let service_desc = service
        .description
        .ok_or(ConversionError::MissingField("Service.Description"))?;

    let summary = shipment
        .time_in_transit
        .and_then(|t| t.service_summary)
        .ok_or(ConversionError::MissingField("TimeInTransit.ServiceSummary"))?;

    let service_name = summary
        .service
        .and_then(|s| s.description)
        .ok_or(ConversionError::MissingField("ServiceSummary.Service.Description"))?;

    let arrival = summary
        .estimated_arrival
        .ok_or(ConversionError::MissingField("EstimatedArrival"))?;

    let days = arrival
        .business_days_in_transit
        .ok_or(ConversionError::MissingField("BusinessDaysInTransit"))?
        .to_text();
    let transit_time = days
        .trim()
        .parse::<u32>()
        .map_err(|_| ConversionError::InvalidNumber {
            field: "BusinessDaysInTransit",
            value: days.clone(),
        })?;

    let moment = arrival
        .arrival
        .ok_or(ConversionError::MissingField("EstimatedArrival.Arrival"))?;
    let date = moment
        .date
        .ok_or(ConversionError::MissingField("Arrival.Date"))?;
    let time = moment
        .time
        .ok_or(ConversionError::MissingField("Arrival.Time"))?;

    let dayofweek = arrival
        .day_of_week
        .ok_or(ConversionError::MissingField("DayOfWeek"))?;

    let total_charges = money(shipment.total_charges.as_ref(), "TotalCharges")?
        .ok_or(ConversionError::MissingField("TotalCharges.MonetaryValue"))?;

    Ok(RateOffer {
        service_code: service.code,
        service_desc,
        service_name,
        transit_time,
        estimated_arrival_date: format_arrival_date(&date)?,
        estimated_arrival_time: format_arrival_time(&time)?,
        dayofweek,
        total_charges,
    })
}

/// Convert a ship response.
///
/// A response without a tracking number is a failure; whatever shipment
/// fields were present are returned so the caller can report them.
pub fn convert_shipment(
    response: ShipmentResponseEnvelope,
) -> Result<ConvertedShipment, PartialShipment> {
    let Some(results) = response.shipment_response.and_then(|r| r.shipment_results) else {
        return Err(PartialShipment::default());
    };

    let packages = results
        .package_results
        .map(|p| p.into_vec())
        .unwrap_or_default();
    let first = packages.into_iter().next();

    let charges = results.shipment_charges.as_ref();
    let total_charges = money(charges.and_then(|c| c.total_charges.as_ref()), "TotalCharges")
        .unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable total charge");
            None
        });

    let package_base = first.as_ref().and_then(|p| p.base_service_charge.as_ref());
    let base_service_charge = money(
        package_base.or(charges.and_then(|c| c.base_service_charge.as_ref())),
        "BaseServiceCharge",
    )
    .unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable base service charge");
        None
    });

    let residential_surcharge = first
        .as_ref()
        .and_then(|p| p.itemized_charges.clone())
        .map(|c| c.into_vec())
        .unwrap_or_default()
        .into_iter()
        .find(|c| c.code.as_deref() == Some(RESIDENTIAL_SURCHARGE_CODE))
        .and_then(|c| c.monetary_value)
        .and_then(|v| Money::parse(&v.to_text()).ok());

    let partial = PartialShipment {
        shipment_id: results.shipment_identification_number.clone(),
        total_charges,
        base_service_charge,
        residential_surcharge,
    };

    let Some(tracking_number) = first
        .as_ref()
        .and_then(|p| p.tracking_number.clone())
        .filter(|t| !t.trim().is_empty())
    else {
        return Err(partial);
    };

    let Some(shipment_id) = results.shipment_identification_number else {
        return Err(partial);
    };

    let label_image = results
        .shipping_label
        .and_then(|l| l.graphic_image)
        .or_else(|| {
            first
                .and_then(|p| p.shipping_label)
                .and_then(|l| l.graphic_image)
        });

    Ok(ConvertedShipment {
        shipment_id,
        tracking_number,
        total_charges,
        base_service_charge,
        residential_surcharge,
        label_image,
    })
}

fn candidate_address(akf: AddressKeyFormat, original: &Address) -> Result<Address, ConversionError> {
    let address = akf
        .address_line
        .map(|l| l.joined())
        .ok_or(ConversionError::MissingField("AddressLine"))?;

    Address::new(AddressFields {
        name: akf
            .consignee_name
            .unwrap_or_else(|| original.name().to_string()),
        mobile: original.mobile().map(str::to_string),
        email: original.email().map(str::to_string),
        address,
        city: akf
            .political_division2
            .ok_or(ConversionError::MissingField("PoliticalDivision2"))?,
        state: akf.political_division1.unwrap_or_default(),
        postal_code: akf
            .postcode_primary_low
            .ok_or(ConversionError::MissingField("PostcodePrimaryLow"))?,
        country: akf
            .country_code
            .unwrap_or_else(|| original.country().to_string()),
    })
    .map_err(|e| ConversionError::Malformed(e.to_string()))
}

/// Take the first candidate from an address validation response.
///
/// Contact details the carrier does not echo back are kept from the
/// submitted address.
pub fn convert_address_candidate(
    response: XavResponseEnvelope,
    original: &Address,
) -> Result<Address, ConversionError> {
    let candidate = response
        .xav_response
        .and_then(|r| r.candidate)
        .and_then(|c| c.into_vec().into_iter().next())
        .and_then(|c| c.address_key_format)
        .ok_or(ConversionError::MissingField("Candidate"))?;

    candidate_address(candidate, original)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::carrier::request::fixtures::address;

    fn offer_json(code: &str, charge: &str) -> serde_json::Value {
        json!({
            "Service": {"Code": code, "Description": ""},
            "TotalCharges": {"CurrencyCode": "USD", "MonetaryValue": charge},
            "TimeInTransit": {
                "ServiceSummary": {
                    "Service": {"Description": format!("UPS Service {code}")},
                    "EstimatedArrival": {
                        "Arrival": {"Date": "20250115", "Time": "143000"},
                        "BusinessDaysInTransit": "2",
                        "DayOfWeek": "WED"
                    }
                }
            }
        })
    }

    fn envelope(entries: serde_json::Value) -> RateResponseEnvelope {
        serde_json::from_value(json!({"RateResponse": {"RatedShipment": entries}})).unwrap()
    }

    #[test]
    fn arrival_formatting() {
        assert_eq!(format_arrival_date("20250115").unwrap(), "January 15, 2025");
        assert_eq!(format_arrival_time("143000").unwrap(), "02:30 PM");
        assert_eq!(format_arrival_time("090500").unwrap(), "09:05 AM");
        assert!(format_arrival_date("2025-01-15").is_err());
        assert!(format_arrival_time("2500").is_err());
    }

    #[test]
    fn converts_well_formed_offer() {
        let offer = convert_rated_shipment(offer_json("03", "12.3")).unwrap();
        assert_eq!(offer.service_code, "03");
        assert_eq!(offer.service_name, "UPS Service 03");
        assert_eq!(offer.transit_time, 2);
        assert_eq!(offer.estimated_arrival_date, "January 15, 2025");
        assert_eq!(offer.estimated_arrival_time, "02:30 PM");
        assert_eq!(offer.dayofweek, "WED");
        assert_eq!(offer.total_charges.cents(), 1230);
    }

    #[test]
    fn malformed_offers_skipped_in_order() {
        let mut missing_arrival = offer_json("02", "20.00");
        missing_arrival["TimeInTransit"]["ServiceSummary"]["EstimatedArrival"]
            .as_object_mut()
            .unwrap()
            .remove("Arrival");
        let mut bad_charge = offer_json("13", "lots");
        bad_charge["Service"]["Description"] = json!("");
        let wrong_shape = json!({"Service": "03"});

        let offers = convert_rates(envelope(json!([
            offer_json("03", "10.00"),
            missing_arrival,
            offer_json("12", "15.50"),
            bad_charge,
            wrong_shape,
            offer_json("01", "40.25"),
        ])));

        let codes: Vec<_> = offers.iter().map(|o| o.service_code.as_str()).collect();
        assert_eq!(codes, vec!["03", "12", "01"]);
    }

    #[test]
    fn single_object_response() {
        let offers = convert_rates(envelope(offer_json("03", "9.99")));
        assert_eq!(offers.len(), 1);
    }

    #[test]
    fn empty_response_yields_no_offers() {
        let env: RateResponseEnvelope = serde_json::from_value(json!({})).unwrap();
        assert!(convert_rates(env).is_empty());
    }

    fn shipment_json(tracking: Option<&str>) -> ShipmentResponseEnvelope {
        let mut package = json!({
            "BaseServiceCharge": {"MonetaryValue": "18.40"},
            "ItemizedCharges": [
                {"Code": "375", "MonetaryValue": "1.00"},
                {"Code": "270", "MonetaryValue": "5.55"}
            ],
            "ShippingLabel": {"GraphicImage": "aGVsbG8="}
        });
        if let Some(t) = tracking {
            package["TrackingNumber"] = json!(t);
        }
        serde_json::from_value(json!({
            "ShipmentResponse": {
                "ShipmentResults": {
                    "ShipmentIdentificationNumber": "1ZSHIP01",
                    "ShipmentCharges": {"TotalCharges": {"MonetaryValue": "24.95"}},
                    "PackageResults": [package]
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn converts_created_shipment() {
        let s = convert_shipment(shipment_json(Some("1Z999AA10123456784"))).unwrap();
        assert_eq!(s.shipment_id, "1ZSHIP01");
        assert_eq!(s.tracking_number, "1Z999AA10123456784");
        assert_eq!(s.total_charges.unwrap().to_string(), "24.95");
        assert_eq!(s.base_service_charge.unwrap().to_string(), "18.40");
        assert_eq!(s.residential_surcharge.unwrap().to_string(), "5.55");
        assert_eq!(s.label_image.as_deref(), Some("aGVsbG8="));
    }

    #[test]
    fn missing_tracking_number_returns_partial() {
        let partial = convert_shipment(shipment_json(None)).unwrap_err();
        assert_eq!(partial.shipment_id.as_deref(), Some("1ZSHIP01"));
        assert_eq!(partial.base_service_charge.unwrap().to_string(), "18.40");
        assert_eq!(partial.total_charges.unwrap().to_string(), "24.95");
    }

    #[test]
    fn empty_shipment_response_is_failure() {
        let env: ShipmentResponseEnvelope = serde_json::from_value(json!({})).unwrap();
        assert!(convert_shipment(env).unwrap_err().is_empty());
    }

    #[test]
    fn address_candidate() {
        let original = address("Receiver", "Fresno", "93650");
        let env: XavResponseEnvelope = serde_json::from_value(json!({
            "XAVResponse": {
                "Candidate": {
                    "AddressKeyFormat": {
                        "AddressLine": ["93650 MAIN ST"],
                        "PoliticalDivision2": "FRESNO",
                        "PoliticalDivision1": "CA",
                        "PostcodePrimaryLow": "93650",
                        "CountryCode": "US"
                    }
                }
            }
        }))
        .unwrap();

        let validated = convert_address_candidate(env, &original).unwrap();
        assert_eq!(validated.address(), "93650 MAIN ST");
        assert_eq!(validated.city(), "FRESNO");
        assert_eq!(validated.name(), "Receiver");
        assert_eq!(validated.mobile(), original.mobile());
    }

    #[test]
    fn no_candidate_is_error() {
        let original = address("Receiver", "Fresno", "93650");
        let env: XavResponseEnvelope =
            serde_json::from_value(json!({"XAVResponse": {"NoCandidatesIndicator": ""}})).unwrap();
        assert_eq!(
            convert_address_candidate(env, &original),
            Err(ConversionError::MissingField("Candidate"))
        );
    }
}
