//! Country catalog and favorite-selection core consumed by presentation layers.
//!
//! [`SelectionController`] owns the observable state; [`CountrySource`],
//! [`storage::CatalogCache`] and [`location_integration::LocationResolver`] are
//! the seams to the network, the disk and the device.

pub mod config;
pub mod controller;
pub mod detail;
pub mod error;
pub mod session;
pub mod source;

pub use config::{load_settings, Settings};
pub use controller::{
    AddOutcome, CatalogSource, LoadState, SelectionController, SelectionEvent, SelectionPhase,
    SelectionSnapshot, SubmitOutcome, LIMIT_REACHED_MESSAGE,
};
pub use detail::CountryDetail;
pub use error::FetchError;
pub use session::{build_controller, start_session, CountrySession};
pub use source::{CountrySource, HttpCountrySource, MissingCountrySource};
