//! Contact and postal address blocks.

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Raw address fields as received from callers or storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressFields {
    pub name: String,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// A validated contact and postal address.
///
/// Name, street address, city, postal code and a two-letter country code
/// are required. State may be empty for countries without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AddressFields")]
pub struct Address {
    name: String,
    mobile: Option<String>,
    email: Option<String>,
    address: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
}

fn required(value: String, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Address {
    pub fn new(fields: AddressFields) -> Result<Self, DomainError> {
        let country = required(fields.country, "country")?.to_ascii_uppercase();
        if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(DomainError::Invalid {
                field: "country",
                reason: format!("{country:?} is not a two-letter country code"),
            });
        }

        Ok(Self {
            name: required(fields.name, "name")?,
            mobile: optional(fields.mobile),
            email: optional(fields.email),
            address: required(fields.address, "address")?,
            city: required(fields.city, "city")?,
            state: fields.state.trim().to_string(),
            postal_code: required(fields.postal_code, "postal_code")?,
            country,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mobile(&self) -> Option<&str> {
        self.mobile.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

impl TryFrom<AddressFields> for Address {
    type Error = DomainError;

    fn try_from(fields: AddressFields) -> Result<Self, Self::Error> {
        Address::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> AddressFields {
        AddressFields {
            name: "Asha Rao".into(),
            mobile: Some("5551234".into()),
            email: None,
            address: "1834 Blazewood Street".into(),
            city: "Simi Valley".into(),
            state: "CA".into(),
            postal_code: "93063".into(),
            country: "us".into(),
        }
    }

    #[test]
    fn valid_address_normalizes_country() {
        let a = Address::new(fields()).unwrap();
        assert_eq!(a.country(), "US");
        assert_eq!(a.city(), "Simi Valley");
    }

    #[test]
    fn missing_city_rejected() {
        let mut f = fields();
        f.city = "  ".into();
        assert!(matches!(
            Address::new(f),
            Err(DomainError::MissingField("city"))
        ));
    }

    #[test]
    fn bad_country_rejected() {
        let mut f = fields();
        f.country = "USA".into();
        assert!(matches!(
            Address::new(f),
            Err(DomainError::Invalid { field: "country", .. })
        ));
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let mut f = fields();
        f.email = Some("   ".into());
        let a = Address::new(f).unwrap();
        assert_eq!(a.email(), None);
        assert_eq!(a.mobile(), Some("5551234"));
    }

    #[test]
    fn deserialize_validates() {
        let json = r#"{"name":"A","address":"1 Road","city":"X","postal_code":"1","country":""}"#;
        assert!(serde_json::from_str::<Address>(json).is_err());
    }
}
