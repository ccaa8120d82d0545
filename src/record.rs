use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, NormalizedText};

/// One organization record as extracted upstream (patent assignee blocks,
/// procurement award vendors, publication affiliations). Only `name` is
/// expected to be present; fields that are `None` simply never match.
///
/// The serde aliases absorb the header spellings that show up in real
/// extraction feeds ("state", "zip", "address", ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default, alias = "org_name", alias = "organization")]
    pub name: String,
    #[serde(default, alias = "country_code")]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "province", alias = "state")]
    pub province_or_state: Option<String>,
    #[serde(default, alias = "address", alias = "street")]
    pub address_line: Option<String>,
    #[serde(default, alias = "postal", alias = "zip", alias = "zipcode")]
    pub postal_code: Option<String>,
}

impl EntityRecord {
    pub fn named(name: &str) -> Self {
        EntityRecord {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    pub fn with_province(mut self, province: &str) -> Self {
        self.province_or_state = Some(province.to_string());
        self
    }

    pub fn with_address(mut self, address_line: &str) -> Self {
        self.address_line = Some(address_line.to_string());
        self
    }

    pub fn with_postal(mut self, postal_code: &str) -> Self {
        self.postal_code = Some(postal_code.to_string());
        self
    }
}

/// The record fields a rule can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Name,
    Country,
    City,
    ProvinceOrState,
    AddressLine,
    PostalCode,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Name => "name",
            FieldKind::Country => "country",
            FieldKind::City => "city",
            FieldKind::ProvinceOrState => "province_or_state",
            FieldKind::AddressLine => "address_line",
            FieldKind::PostalCode => "postal_code",
        }
    }
}

/// Per-field normalized view of a record, computed once per classification
/// so no matcher ever re-normalizes the same text.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRecord {
    pub name: NormalizedText,
    pub country: NormalizedText,
    pub city: NormalizedText,
    pub province_or_state: NormalizedText,
    pub address_line: NormalizedText,
    pub postal_code: NormalizedText,
}

impl NormalizedRecord {
    pub fn from_record(record: &EntityRecord) -> Self {
        let norm_opt = |field: &Option<String>| {
            field.as_deref().map(normalize).unwrap_or_default()
        };
        NormalizedRecord {
            name: normalize(&record.name),
            country: norm_opt(&record.country),
            city: norm_opt(&record.city),
            province_or_state: norm_opt(&record.province_or_state),
            address_line: norm_opt(&record.address_line),
            postal_code: norm_opt(&record.postal_code),
        }
    }

    pub fn field(&self, kind: FieldKind) -> &NormalizedText {
        match kind {
            FieldKind::Name => &self.name,
            FieldKind::Country => &self.country,
            FieldKind::City => &self.city,
            FieldKind::ProvinceOrState => &self.province_or_state,
            FieldKind::AddressLine => &self.address_line,
            FieldKind::PostalCode => &self.postal_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fills_fields() {
        let record = EntityRecord::named("Huawei Technologies Co., Ltd.")
            .with_country("CN")
            .with_city("Shenzhen")
            .with_postal("518129");
        assert_eq!(record.name, "Huawei Technologies Co., Ltd.");
        assert_eq!(record.country.as_deref(), Some("CN"));
        assert_eq!(record.city.as_deref(), Some("Shenzhen"));
        assert!(record.province_or_state.is_none());
        assert!(record.address_line.is_none());
    }

    #[test]
    fn test_normalized_record_covers_every_field() {
        let record = EntityRecord::named("Tencent Holdings")
            .with_country("P.R. China")
            .with_city("Shenzhen")
            .with_province("Guangdong")
            .with_address("Binhai Dadao 33")
            .with_postal("518054");
        let norm = NormalizedRecord::from_record(&record);
        assert_eq!(norm.field(FieldKind::Name).plain, "TENCENT HOLDINGS");
        assert_eq!(norm.field(FieldKind::Country).plain, "P R CHINA");
        assert_eq!(norm.field(FieldKind::City).plain, "SHENZHEN");
        assert_eq!(norm.field(FieldKind::ProvinceOrState).plain, "GUANGDONG");
        assert_eq!(norm.field(FieldKind::AddressLine).plain, "BINHAI DADAO 33");
        assert_eq!(norm.field(FieldKind::PostalCode).plain, "518054");
    }

    #[test]
    fn test_missing_fields_normalize_empty() {
        let norm = NormalizedRecord::from_record(&EntityRecord::named("Acme"));
        assert!(norm.country.is_empty());
        assert!(norm.postal_code.is_empty());
        assert!(!norm.name.is_empty());
    }

    #[test]
    fn test_record_deserializes_with_aliases() {
        let json = r#"{"name": "Foo Ltd", "state": "Jiangsu", "zip": "210000"}"#;
        let record: EntityRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.province_or_state.as_deref(), Some("Jiangsu"));
        assert_eq!(record.postal_code.as_deref(), Some("210000"));
        assert!(record.country.is_none());
    }
}
