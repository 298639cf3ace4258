//! Package descriptors and the document/non-document classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// The package type token that selects document handling.
pub const DOCUMENT_TOKEN: &str = "Document";

/// Carrier classification of a package.
///
/// Only the exact token `"Document"` selects [`PackageKind::Document`].
/// Every other value, including unknown ones like `"Pallet"`, is treated as
/// [`PackageKind::NonDocument`]. This permissive default is deliberate and
/// can mask typos in caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    Document,
    NonDocument,
}

impl PackageKind {
    /// Classify a raw package type string.
    pub fn classify(raw: &str) -> Self {
        if raw == DOCUMENT_TOKEN {
            PackageKind::Document
        } else {
            PackageKind::NonDocument
        }
    }

    /// Carrier packaging type code ("01" letter, "02" customer packaging).
    pub fn packaging_code(self) -> &'static str {
        match self {
            PackageKind::Document => "01",
            PackageKind::NonDocument => "02",
        }
    }

    pub fn packaging_description(self) -> &'static str {
        match self {
            PackageKind::Document => "UPS Letter",
            PackageKind::NonDocument => "Customer Supplied Package",
        }
    }

    /// Bill type used in the time-in-transit block.
    pub fn bill_type(self) -> &'static str {
        match self {
            PackageKind::Document => "02",
            PackageKind::NonDocument => "03",
        }
    }

    /// Whether the carrier expects dimensions and weight for this kind.
    pub fn sends_measurements(self) -> bool {
        matches!(self, PackageKind::NonDocument)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackageKind::Document => "Document",
            PackageKind::NonDocument => "Non-Document",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strictly positive, finite measurement (length, weight, ...).
///
/// Accepts either a JSON number or a numeric string on input, since
/// callers send both. Formats without a trailing `.0`, so `5.0` renders
/// as `"5"` in carrier payloads.
#[derive(Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "MeasureRepr", into = "f64")]
pub struct Measure(f64);

#[derive(Deserialize)]
#[serde(untagged)]
enum MeasureRepr {
    Number(f64),
    Text(String),
}

impl Measure {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(DomainError::Invalid {
                field: "measurement",
                reason: format!("{value} is not a positive number"),
            });
        }
        Ok(Measure(value))
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let value: f64 = s.trim().parse().map_err(|_| DomainError::Invalid {
            field: "measurement",
            reason: format!("{s:?} is not a number"),
        })?;
        Measure::new(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<MeasureRepr> for Measure {
    type Error = DomainError;

    fn try_from(repr: MeasureRepr) -> Result<Self, Self::Error> {
        match repr {
            MeasureRepr::Number(n) => Measure::new(n),
            MeasureRepr::Text(s) => Measure::parse(&s),
        }
    }
}

impl From<Measure> for f64 {
    fn from(m: Measure) -> Self {
        m.0
    }
}

impl fmt::Debug for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Measure({})", self.0)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unit for package weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeightUnit {
    #[default]
    Lbs,
    Kgs,
}

impl WeightUnit {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LBS" => Some(WeightUnit::Lbs),
            "KGS" => Some(WeightUnit::Kgs),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            WeightUnit::Lbs => "LBS",
            WeightUnit::Kgs => "KGS",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WeightUnit::Lbs => "Pounds",
            WeightUnit::Kgs => "Kilograms",
        }
    }
}

/// Unit for package dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DimensionUnit {
    #[default]
    In,
    Cm,
}

impl DimensionUnit {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "IN" => Some(DimensionUnit::In),
            "CM" => Some(DimensionUnit::Cm),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DimensionUnit::In => "IN",
            DimensionUnit::Cm => "CM",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DimensionUnit::In => "Inches",
            DimensionUnit::Cm => "Centimeters",
        }
    }
}

/// Physical dimensions of a package.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: Measure,
    pub width: Measure,
    pub height: Measure,
    #[serde(default)]
    pub unit: DimensionUnit,
}

/// Package weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub value: Measure,
    #[serde(default)]
    pub unit: WeightUnit,
}

/// One package in a quotation or booking.
///
/// The raw `package_type` is kept alongside its classification so the
/// stored document reflects what the caller sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    package_type: String,
    weight: Option<Weight>,
    dimensions: Option<Dimensions>,
}

impl PackageSpec {
    /// Build a package descriptor.
    ///
    /// The package type must be present. Non-document packages also need a
    /// weight and dimensions, since the carrier request includes them.
    pub fn new(
        package_type: impl Into<String>,
        weight: Option<Weight>,
        dimensions: Option<Dimensions>,
    ) -> Result<Self, DomainError> {
        let package_type = package_type.into();
        if package_type.trim().is_empty() {
            return Err(DomainError::MissingField("package_type"));
        }

        if PackageKind::classify(&package_type).sends_measurements() {
            if weight.is_none() {
                return Err(DomainError::MissingField("weight"));
            }
            if dimensions.is_none() {
                return Err(DomainError::MissingField("dimensions"));
            }
        }

        Ok(Self {
            package_type,
            weight,
            dimensions,
        })
    }

    pub fn package_type(&self) -> &str {
        &self.package_type
    }

    pub fn kind(&self) -> PackageKind {
        PackageKind::classify(&self.package_type)
    }

    pub fn weight(&self) -> Option<&Weight> {
        self.weight.as_ref()
    }

    pub fn dimensions(&self) -> Option<&Dimensions> {
        self.dimensions.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dims() -> Dimensions {
        Dimensions {
            length: Measure::new(10.0).unwrap(),
            width: Measure::new(8.0).unwrap(),
            height: Measure::new(2.0).unwrap(),
            unit: DimensionUnit::In,
        }
    }

    fn weight() -> Weight {
        Weight {
            value: Measure::new(5.0).unwrap(),
            unit: WeightUnit::Lbs,
        }
    }

    #[test]
    fn classify_document() {
        assert_eq!(PackageKind::classify("Document"), PackageKind::Document);
    }

    #[test]
    fn unknown_types_are_non_document() {
        assert_eq!(PackageKind::classify("Pallet"), PackageKind::NonDocument);
        assert_eq!(PackageKind::classify("Non-Document"), PackageKind::NonDocument);
        assert_eq!(PackageKind::classify("document"), PackageKind::NonDocument);
        assert_eq!(PackageKind::classify("Document "), PackageKind::NonDocument);
    }

    #[test]
    fn carrier_codes() {
        assert_eq!(PackageKind::Document.packaging_code(), "01");
        assert_eq!(PackageKind::Document.bill_type(), "02");
        assert_eq!(PackageKind::NonDocument.packaging_code(), "02");
        assert_eq!(PackageKind::NonDocument.bill_type(), "03");
    }

    #[test]
    fn measure_formats_without_trailing_zero() {
        assert_eq!(Measure::new(5.0).unwrap().to_string(), "5");
        assert_eq!(Measure::new(2.5).unwrap().to_string(), "2.5");
    }

    #[test]
    fn measure_accepts_number_or_string() {
        let a: Measure = serde_json::from_str("5").unwrap();
        let b: Measure = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Measure>("\"0\"").is_err());
        assert!(serde_json::from_str::<Measure>("\"heavy\"").is_err());
        assert!(serde_json::from_str::<Measure>("-2").is_err());
    }

    #[test]
    fn package_type_required() {
        let err = PackageSpec::new("", Some(weight()), Some(dims())).unwrap_err();
        assert!(matches!(err, DomainError::MissingField("package_type")));
    }

    #[test]
    fn document_needs_no_measurements() {
        let p = PackageSpec::new("Document", None, None).unwrap();
        assert_eq!(p.kind(), PackageKind::Document);
    }

    #[test]
    fn non_document_needs_measurements() {
        assert!(matches!(
            PackageSpec::new("Pallet", None, Some(dims())),
            Err(DomainError::MissingField("weight"))
        ));
        assert!(matches!(
            PackageSpec::new("Pallet", Some(weight()), None),
            Err(DomainError::MissingField("dimensions"))
        ));
        assert!(PackageSpec::new("Pallet", Some(weight()), Some(dims())).is_ok());
    }

    proptest! {
        #[test]
        fn only_exact_token_is_document(s in "\\PC{0,12}") {
            let kind = PackageKind::classify(&s);
            prop_assert_eq!(kind == PackageKind::Document, s == DOCUMENT_TOKEN);
        }
    }
}
