//! Device location contract used to seed the initial country selection.
//!
//! Platform layers (CoreLocation, Android fused location, IP geolocation, ...)
//! implement [`LocationResolver`]. Everything downstream only ever sees a
//! country code: failures collapse into [`DEFAULT_COUNTRY_CODE`] through
//! [`resolve_or_fallback`].

use async_trait::async_trait;
use shared::domain::{CountryCode, DEFAULT_COUNTRY_CODE};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location access restricted")]
    Restricted,
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Resolves the device's current ISO alpha-2 country code. May suspend on
    /// permission prompts, a location fix, and reverse geocoding.
    async fn resolve_country_code(&self) -> Result<CountryCode, LocationError>;
}

/// Resolver for hosts with no location stack at all.
pub struct MissingLocationResolver;

#[async_trait]
impl LocationResolver for MissingLocationResolver {
    async fn resolve_country_code(&self) -> Result<CountryCode, LocationError> {
        Err(LocationError::Unavailable(
            "no location provider is configured".to_string(),
        ))
    }
}

/// Resolver that always reports the same code, e.g. from a user profile or a test.
#[derive(Debug, Clone)]
pub struct FixedLocationResolver {
    code: CountryCode,
}

impl FixedLocationResolver {
    pub fn new(code: impl Into<CountryCode>) -> Self {
        Self { code: code.into() }
    }
}

#[async_trait]
impl LocationResolver for FixedLocationResolver {
    async fn resolve_country_code(&self) -> Result<CountryCode, LocationError> {
        Ok(self.code.clone())
    }
}

/// Resolver fed by a platform callback (location delegate, geocoder completion).
///
/// The platform side keeps a [`LocationFeed`] and publishes into it; resolving
/// waits for the first published outcome. Later publishes are visible through
/// [`LocationFeed::subscribe`].
pub struct PushLocationResolver {
    rx: watch::Receiver<Option<Result<CountryCode, LocationError>>>,
}

#[derive(Clone)]
pub struct LocationFeed {
    latest: std::sync::Arc<watch::Sender<Option<Result<CountryCode, LocationError>>>>,
    updates: broadcast::Sender<CountryCode>,
}

impl LocationFeed {
    pub fn channel() -> (Self, PushLocationResolver) {
        let (latest, rx) = watch::channel(None);
        let (updates, _) = broadcast::channel(16);
        (
            Self {
                latest: std::sync::Arc::new(latest),
                updates,
            },
            PushLocationResolver { rx },
        )
    }

    pub fn publish_code(&self, code: CountryCode) {
        debug!(code = %code, "location feed published code");
        let _ = self.updates.send(code.clone());
        self.latest.send_replace(Some(Ok(code)));
    }

    /// Publishes a raw code from a reverse-geocoded placemark. Malformed codes
    /// are published as a failure.
    pub fn publish_placemark_code(&self, raw: &str) {
        match CountryCode::parse(raw) {
            Ok(code) => self.publish_code(code),
            Err(err) => self.publish_failure(LocationError::Unavailable(err.to_string())),
        }
    }

    /// Records a failure. Subscribers see the fallback code so every report
    /// still carries a usable value.
    pub fn publish_failure(&self, err: LocationError) {
        warn!("location feed published failure: {err}");
        let _ = self.updates.send(CountryCode::default_code());
        self.latest.send_replace(Some(Err(err)));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CountryCode> {
        self.updates.subscribe()
    }
}

#[async_trait]
impl LocationResolver for PushLocationResolver {
    async fn resolve_country_code(&self) -> Result<CountryCode, LocationError> {
        let mut rx = self.rx.clone();
        let outcome = rx
            .wait_for(|value| value.is_some())
            .await
            .map_err(|_| LocationError::Unavailable("location feed closed".to_string()))?;
        match &*outcome {
            Some(result) => result.clone(),
            None => Err(LocationError::Unavailable("location feed empty".to_string())),
        }
    }
}

/// Resolves a code, substituting [`DEFAULT_COUNTRY_CODE`] on denial, restriction
/// or any other failure.
pub async fn resolve_or_fallback(resolver: &dyn LocationResolver) -> CountryCode {
    match resolver.resolve_country_code().await {
        Ok(code) => {
            debug!(code = %code, "location resolved");
            code
        }
        Err(err) => {
            warn!("location lookup failed, falling back to {DEFAULT_COUNTRY_CODE}: {err}");
            CountryCode::default_code()
        }
    }
}
