use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound on the number of countries a user may keep selected.
pub const MAX_SELECTED_COUNTRIES: usize = 5;

/// Code used for seeding when neither the caller nor the location resolver supplied one.
pub const DEFAULT_COUNTRY_CODE: &str = "IN";

/// ISO 3166-1 alpha-2 code as delivered by the country API (e.g. `"IN"`).
///
/// Matching is exact; the API only ever emits upper-case codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Builds a code from untrusted input (e.g. a reverse-geocoded placemark),
    /// trimming whitespace and upper-casing.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let code = raw.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::MalformedCountryCode(raw.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn default_code() -> Self {
        Self(DEFAULT_COUNTRY_CODE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CountryCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    #[serde(default)]
    pub svg: Option<String>,
    #[serde(default)]
    pub png: Option<String>,
}

/// One catalog entry. The wire shape matches the remote API so that a cached
/// file and a fresh response decode through the same type.
///
/// Identity is the `name`: two records with equal names are the same country
/// even if other fields differ. Use [`Country::same_entity`] for that check;
/// `PartialEq` compares every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub flags: Option<Flags>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub currencies: Vec<Currency>,
    #[serde(rename = "alpha2Code")]
    pub country_code: CountryCode,
}

impl Country {
    pub fn id(&self) -> &str {
        &self.name
    }

    pub fn same_entity(&self, other: &Country) -> bool {
        self.name == other.name
    }

    pub fn flag_image_url(&self) -> Option<&str> {
        self.flags.as_ref().and_then(|flags| flags.png.as_deref())
    }

    pub fn flag_vector_url(&self) -> Option<&str> {
        self.flags.as_ref().and_then(|flags| flags.svg.as_deref())
    }

    /// Case-insensitive substring match on the country name.
    pub fn name_matches(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Currency>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Currency>>::deserialize(deserializer)?.unwrap_or_default())
}
