//! Building carrier request bodies from domain types.
//!
//! Everything here is pure. Package classification is applied to each
//! package on its own, so a document and a parcel in the same shipment
//! each get their own packaging code and measurements.

use chrono::{NaiveDate, NaiveTime};

use crate::domain::{Address, PackageKind, PackageSpec};

use super::types::{
    AddressKeyFormat, BillShipper, Code, CodeDescription, DeliveryTimeInformation,
    LabelSpecification, OneOrManyText, PackageWeight, Party, PaymentDetails, PaymentInformation,
    Phone, PickupWindow, RatePackage, RateRequest, RateRequestEnvelope, RateShipment, RequestInfo,
    ShipPackage, ShipShipment, ShipmentCharge, ShipmentRequest, ShipmentRequestEnvelope,
    TransactionReference, WireAddress, WireDimensions, XavRequest, XavRequestEnvelope,
};

/// Pickup type "06": one-time pickup.
const PICKUP_TYPE_ONE_TIME: &str = "06";

/// Shipment charge type "01": transportation.
const CHARGE_TYPE_TRANSPORTATION: &str = "01";

const SHIP_SUB_VERSION: &str = "1801";
const SHIP_REQUEST_OPTION: &str = "nonvalidate";
const LABEL_FORMAT: &str = "PNG";

/// The account that ships and pays for everything.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipperProfile {
    pub shipper_number: String,
    pub account_number: String,
    pub address: Address,
}

/// Inputs to a rate-shopping call.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuery {
    pub shipper: ShipperProfile,
    pub ship_from: Address,
    pub ship_to: Address,
    pub packages: Vec<PackageSpec>,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub piece_count: u32,
}

/// Inputs to a shipment-creation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentOrder {
    pub shipper: ShipperProfile,
    pub ship_from: Address,
    pub ship_to: Address,
    pub packages: Vec<PackageSpec>,
    pub service_code: String,
    pub description: String,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
}

fn wire_address(address: &Address) -> WireAddress {
    WireAddress {
        address_line: vec![address.address().to_string()],
        city: address.city().to_string(),
        state_province_code: address.state().to_string(),
        postal_code: address.postal_code().to_string(),
        country_code: address.country().to_string(),
    }
}

fn party(address: &Address) -> Party {
    Party {
        name: address.name().to_string(),
        shipper_number: None,
        phone: address.mobile().map(|n| Phone {
            number: n.to_string(),
        }),
        address: wire_address(address),
    }
}

fn shipper_party(shipper: &ShipperProfile) -> Party {
    Party {
        shipper_number: Some(shipper.shipper_number.clone()),
        ..party(&shipper.address)
    }
}

fn bill_shipper(shipper: &ShipperProfile) -> Vec<ShipmentCharge> {
    vec![ShipmentCharge {
        charge_type: CHARGE_TYPE_TRANSPORTATION.to_string(),
        bill_shipper: BillShipper {
            account_number: shipper.account_number.clone(),
        },
    }]
}

fn pickup_window(date: NaiveDate, time: NaiveTime) -> PickupWindow {
    PickupWindow {
        date: date.format("%Y%m%d").to_string(),
        time: time.format("%H%M").to_string(),
    }
}

fn packaging(kind: PackageKind) -> CodeDescription {
    CodeDescription {
        code: kind.packaging_code().to_string(),
        description: Some(kind.packaging_description().to_string()),
    }
}

/// Dimensions and weight, present only for kinds that send them.
fn measurements(package: &PackageSpec) -> (Option<WireDimensions>, Option<PackageWeight>) {
    if !package.kind().sends_measurements() {
        return (None, None);
    }

    let dimensions = package.dimensions().map(|d| WireDimensions {
        unit_of_measurement: CodeDescription {
            code: d.unit.code().to_string(),
            description: Some(d.unit.description().to_string()),
        },
        length: d.length.to_string(),
        width: d.width.to_string(),
        height: d.height.to_string(),
    });

    let weight = package.weight().map(|w| PackageWeight {
        unit_of_measurement: CodeDescription {
            code: w.unit.code().to_string(),
            description: Some(w.unit.description().to_string()),
        },
        weight: w.value.to_string(),
    });

    (dimensions, weight)
}

/// Package block for the rating call.
pub fn rate_package(package: &PackageSpec) -> RatePackage {
    let (dimensions, package_weight) = measurements(package);
    RatePackage {
        packaging_type: packaging(package.kind()),
        dimensions,
        package_weight,
    }
}

/// Package block for the ship call.
pub fn ship_package(package: &PackageSpec) -> ShipPackage {
    let (dimensions, package_weight) = measurements(package);
    ShipPackage {
        packaging: packaging(package.kind()),
        dimensions,
        package_weight,
    }
}

/// Documents-only billing applies when every package is a document.
fn shipment_kind(packages: &[PackageSpec]) -> PackageKind {
    if !packages.is_empty() && packages.iter().all(|p| p.kind() == PackageKind::Document) {
        PackageKind::Document
    } else {
        PackageKind::NonDocument
    }
}

/// Build the `Shoptimeintransit` rate request. Every package is sent.
pub fn build_rate_request(query: &RateQuery) -> RateRequestEnvelope {
    let kind = shipment_kind(&query.packages);

    RateRequestEnvelope {
        rate_request: RateRequest {
            request: RequestInfo {
                sub_version: None,
                request_option: None,
                transaction_reference: TransactionReference {
                    customer_context: "rate".to_string(),
                },
            },
            shipment: RateShipment {
                shipper: shipper_party(&query.shipper),
                ship_to: party(&query.ship_to),
                ship_from: party(&query.ship_from),
                payment_details: PaymentDetails {
                    shipment_charge: bill_shipper(&query.shipper),
                },
                pickup_type: Code {
                    code: PICKUP_TYPE_ONE_TIME.to_string(),
                },
                delivery_time_information: DeliveryTimeInformation {
                    package_bill_type: kind.bill_type().to_string(),
                    pickup: pickup_window(query.pickup_date, query.pickup_time),
                },
                num_of_pieces: query.piece_count.to_string(),
                documents_only_indicator: match kind {
                    PackageKind::Document => Some(kind.as_str().to_string()),
                    PackageKind::NonDocument => None,
                },
                package: query.packages.iter().map(rate_package).collect(),
            },
        },
    }
}

/// Build the ship request. Each package is classified on its own.
pub fn build_shipment_request(order: &ShipmentOrder) -> ShipmentRequestEnvelope {
    ShipmentRequestEnvelope {
        shipment_request: ShipmentRequest {
            request: RequestInfo {
                sub_version: Some(SHIP_SUB_VERSION.to_string()),
                request_option: Some(SHIP_REQUEST_OPTION.to_string()),
                transaction_reference: TransactionReference {
                    customer_context: "ship".to_string(),
                },
            },
            shipment: ShipShipment {
                description: order.description.clone(),
                shipper: shipper_party(&order.shipper),
                ship_from: party(&order.ship_from),
                ship_to: party(&order.ship_to),
                package: order.packages.iter().map(ship_package).collect(),
                service: Code {
                    code: order.service_code.clone(),
                },
                payment_information: PaymentInformation {
                    shipment_charge: bill_shipper(&order.shipper),
                },
            },
            pickup: pickup_window(order.pickup_date, order.pickup_time),
            label_specification: LabelSpecification {
                label_image_format: Code {
                    code: LABEL_FORMAT.to_string(),
                },
            },
        },
    }
}

/// Build the street-level address validation request.
pub fn build_address_validation(address: &Address) -> XavRequestEnvelope {
    XavRequestEnvelope {
        xav_request: XavRequest {
            address_key_format: AddressKeyFormat {
                consignee_name: Some(address.name().to_string()),
                address_line: Some(OneOrManyText::Many(vec![address.address().to_string()])),
                political_division2: Some(address.city().to_string()),
                political_division1: Some(address.state().to_string()),
                postcode_primary_low: Some(address.postal_code().to_string()),
                country_code: Some(address.country().to_string()),
            },
        },
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::{
        Address, AddressFields, DimensionUnit, Dimensions, Measure, PackageSpec, Weight,
        WeightUnit,
    };

    use super::*;

    pub fn address(name: &str, city: &str, postal: &str) -> Address {
        Address::new(AddressFields {
            name: name.into(),
            mobile: Some("8055550100".into()),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            address: format!("{postal} Main Street"),
            city: city.into(),
            state: "CA".into(),
            postal_code: postal.into(),
            country: "US".into(),
        })
        .unwrap()
    }

    pub fn shipper() -> ShipperProfile {
        ShipperProfile {
            shipper_number: "RC6604".into(),
            account_number: "RC6604".into(),
            address: address("Thisai", "Simi Valley", "93063"),
        }
    }

    pub fn package(package_type: &str, weight: &str, l: &str, w: &str, h: &str) -> PackageSpec {
        PackageSpec::new(
            package_type,
            Some(Weight {
                value: Measure::parse(weight).unwrap(),
                unit: WeightUnit::Lbs,
            }),
            Some(Dimensions {
                length: Measure::parse(l).unwrap(),
                width: Measure::parse(w).unwrap(),
                height: Measure::parse(h).unwrap(),
                unit: DimensionUnit::In,
            }),
        )
        .unwrap()
    }

    pub fn rate_query(package: PackageSpec) -> RateQuery {
        RateQuery {
            shipper: shipper(),
            ship_from: address("Sender", "Oxnard", "93030"),
            ship_to: address("Receiver", "Fresno", "93650"),
            packages: vec![package],
            pickup_date: NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            pickup_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            piece_count: 1,
        }
    }
}
