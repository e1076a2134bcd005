pub mod domain;
pub mod error;

pub use domain::{
    Country, CountryCode, Currency, Flags, DEFAULT_COUNTRY_CODE, MAX_SELECTED_COUNTRIES,
};
