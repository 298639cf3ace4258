//! Carrier API request and response types.
//!
//! These map the carrier's JSON directly. Requests are fully typed.
//! Responses use `Option` liberally since the carrier omits fields
//! freely and sometimes sends a single object where a list is expected.

use serde::{Deserialize, Serialize};

/// A field the carrier sends as either a single object or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

/// A scalar the carrier sends as either a string or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Text(s) => s.clone(),
            Scalar::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Code {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeDescription {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_option: Option<String>,
    pub transaction_reference: TransactionReference,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionReference {
    pub customer_context: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireAddress {
    pub address_line: Vec<String>,
    pub city: String,
    pub state_province_code: String,
    pub postal_code: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Phone {
    pub number: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Party {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipper_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,
    pub address: WireAddress,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillShipper {
    pub account_number: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShipmentCharge {
    #[serde(rename = "Type")]
    pub charge_type: String,
    pub bill_shipper: BillShipper,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireDimensions {
    pub unit_of_measurement: CodeDescription,
    pub length: String,
    pub width: String,
    pub height: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageWeight {
    pub unit_of_measurement: CodeDescription,
    pub weight: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PickupWindow {
    pub date: String,
    pub time: String,
}

/// OAuth client-credentials token response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<Scalar>,
}

/// Body of the `Shoptimeintransit` rating call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RateRequestEnvelope {
    pub rate_request: RateRequest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RateRequest {
    pub request: RequestInfo,
    pub shipment: RateShipment,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentDetails {
    pub shipment_charge: Vec<ShipmentCharge>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryTimeInformation {
    pub package_bill_type: String,
    pub pickup: PickupWindow,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RateShipment {
    pub shipper: Party,
    pub ship_to: Party,
    pub ship_from: Party,
    pub payment_details: PaymentDetails,
    pub pickup_type: Code,
    pub delivery_time_information: DeliveryTimeInformation,
    pub num_of_pieces: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_only_indicator: Option<String>,
    pub package: Vec<RatePackage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RatePackage {
    pub packaging_type: CodeDescription,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<WireDimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_weight: Option<PackageWeight>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RateResponseEnvelope {
    pub rate_response: Option<RateResponse>,
}

/// Rated shipments are kept as raw JSON so that one malformed entry
/// cannot fail deserialization of the whole response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RateResponse {
    pub rated_shipment: Option<OneOrMany<serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RatedShipment {
    pub service: Option<CodeDescription>,
    pub time_in_transit: Option<TimeInTransit>,
    pub total_charges: Option<Monetary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeInTransit {
    pub service_summary: Option<ServiceSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceSummary {
    pub service: Option<ServiceName>,
    pub estimated_arrival: Option<EstimatedArrival>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceName {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EstimatedArrival {
    pub arrival: Option<ArrivalMoment>,
    pub business_days_in_transit: Option<Scalar>,
    pub day_of_week: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArrivalMoment {
    /// `YYYYMMDD`
    pub date: Option<String>,
    /// `HHMMSS`
    pub time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Monetary {
    pub currency_code: Option<String>,
    pub monetary_value: Option<Scalar>,
}

/// Body of the ship call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShipmentRequestEnvelope {
    pub shipment_request: ShipmentRequest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShipmentRequest {
    pub request: RequestInfo,
    pub shipment: ShipShipment,
    pub pickup: PickupWindow,
    pub label_specification: LabelSpecification,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShipShipment {
    pub description: String,
    pub shipper: Party,
    pub ship_from: Party,
    pub ship_to: Party,
    pub package: Vec<ShipPackage>,
    pub service: Code,
    pub payment_information: PaymentInformation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShipPackage {
    pub packaging: CodeDescription,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<WireDimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_weight: Option<PackageWeight>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentInformation {
    pub shipment_charge: Vec<ShipmentCharge>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LabelSpecification {
    pub label_image_format: Code,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShipmentResponseEnvelope {
    pub shipment_response: Option<ShipmentResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShipmentResponse {
    pub shipment_results: Option<ShipmentResults>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShipmentResults {
    pub shipment_identification_number: Option<String>,
    pub shipment_charges: Option<ShipmentCharges>,
    pub package_results: Option<OneOrMany<PackageResult>>,
    pub shipping_label: Option<ShippingLabel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShipmentCharges {
    pub total_charges: Option<Monetary>,
    pub base_service_charge: Option<Monetary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageResult {
    pub tracking_number: Option<String>,
    pub base_service_charge: Option<Monetary>,
    pub itemized_charges: Option<OneOrMany<ItemizedCharge>>,
    pub shipping_label: Option<ShippingLabel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemizedCharge {
    pub code: Option<String>,
    pub monetary_value: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShippingLabel {
    pub image_format: Option<CodeDescription>,
    /// Base64-encoded image.
    pub graphic_image: Option<String>,
}

/// Street-level address validation request.
#[derive(Debug, Clone, Serialize)]
pub struct XavRequestEnvelope {
    #[serde(rename = "XAVRequest")]
    pub xav_request: XavRequest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct XavRequest {
    pub address_key_format: AddressKeyFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressKeyFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consignee_name: Option<String>,
    #[serde(default)]
    pub address_line: Option<OneOrManyText>,
    /// City
    #[serde(default, rename = "PoliticalDivision2")]
    pub political_division2: Option<String>,
    /// State or province
    #[serde(default, rename = "PoliticalDivision1")]
    pub political_division1: Option<String>,
    #[serde(default)]
    pub postcode_primary_low: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// Address lines: the carrier answers with a string or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrManyText {
    Many(Vec<String>),
    One(String),
}

impl OneOrManyText {
    pub fn joined(&self) -> String {
        match self {
            OneOrManyText::Many(lines) => lines.join(", "),
            OneOrManyText::One(line) => line.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct XavResponseEnvelope {
    #[serde(rename = "XAVResponse")]
    pub xav_response: Option<XavResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XavResponse {
    pub candidate: Option<OneOrMany<Candidate>>,
    pub no_candidates_indicator: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Candidate {
    pub address_key_format: Option<AddressKeyFormat>,
}

/// Error body the carrier returns with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub response: Option<ErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}
