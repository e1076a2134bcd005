//! Render-ready data for the country detail screen.

use shared::domain::Country;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryDetail {
    pub name: String,
    pub flag_image_url: Option<String>,
    pub capital: String,
    pub region: String,
    /// `"{name} ({symbol})"` per currency, in catalog order.
    pub currencies: Vec<String>,
}

impl CountryDetail {
    pub fn removal_prompt(&self) -> String {
        if self.name.is_empty() {
            "Are you sure you want to remove this country?".to_string()
        } else {
            format!("Are you sure you want to remove {}?", self.name)
        }
    }
}

impl From<&Country> for CountryDetail {
    fn from(country: &Country) -> Self {
        Self {
            name: country.name.clone(),
            flag_image_url: country.flag_image_url().map(str::to_string),
            capital: country
                .capital
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            region: country
                .region
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            currencies: country
                .currencies
                .iter()
                .map(|currency| format!("{} ({})", currency.name, currency.symbol))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{CountryCode, Currency, Flags};

    #[test]
    fn fills_placeholders_for_missing_fields() {
        let country = Country {
            name: "Antarctica".into(),
            capital: None,
            flags: None,
            region: None,
            currencies: Vec::new(),
            country_code: CountryCode::new("AQ"),
        };

        let detail = CountryDetail::from(&country);

        assert_eq!(detail.capital, "N/A");
        assert_eq!(detail.region, "N/A");
        assert!(detail.currencies.is_empty());
        assert_eq!(detail.flag_image_url, None);
        assert_eq!(
            detail.removal_prompt(),
            "Are you sure you want to remove Antarctica?"
        );
    }

    #[test]
    fn formats_currency_lines() {
        let country = Country {
            name: "Switzerland".into(),
            capital: Some("Bern".into()),
            flags: Some(Flags {
                svg: Some("https://flagcdn.com/ch.svg".into()),
                png: Some("https://flagcdn.com/w320/ch.png".into()),
            }),
            region: Some("Europe".into()),
            currencies: vec![
                Currency {
                    code: "CHF".into(),
                    name: "Swiss franc".into(),
                    symbol: "Fr.".into(),
                },
                Currency {
                    code: "XXX".into(),
                    name: "No symbol".into(),
                    symbol: String::new(),
                },
            ],
            country_code: CountryCode::new("CH"),
        };

        let detail = CountryDetail::from(&country);

        assert_eq!(detail.currencies, vec!["Swiss franc (Fr.)", "No symbol ()"]);
        assert_eq!(
            detail.flag_image_url.as_deref(),
            Some("https://flagcdn.com/w320/ch.png")
        );
    }

    #[test]
    fn nameless_country_gets_generic_prompt() {
        let detail = CountryDetail {
            name: String::new(),
            flag_image_url: None,
            capital: NOT_AVAILABLE.into(),
            region: NOT_AVAILABLE.into(),
            currencies: Vec::new(),
        };
        assert_eq!(
            detail.removal_prompt(),
            "Are you sure you want to remove this country?"
        );
    }
}
