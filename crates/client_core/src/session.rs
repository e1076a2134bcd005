use std::sync::Arc;

use anyhow::{Context, Result};
use location_integration::LocationResolver;
use storage::JsonFileCache;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{config::Settings, controller::SelectionController, source::HttpCountrySource};

/// Builds a controller wired to the HTTP source and the on-disk JSON cache
/// described by `settings`.
pub fn build_controller(settings: &Settings) -> Result<Arc<SelectionController>> {
    settings
        .validate()
        .context("invalid country client settings")?;
    let source = HttpCountrySource::new(settings.countries_endpoint.clone());
    let cache = JsonFileCache::new(settings.cache_path());
    info!(
        endpoint = %source.endpoint(),
        cache = %settings.cache_path().display(),
        "country controller configured"
    );
    Ok(SelectionController::new(Arc::new(source), Arc::new(cache)))
}

/// A running app session: the catalog load and the location lookup proceed
/// independently of each other. Whichever finishes second seeds the selection,
/// so a location that resolves before the catalog is still applied.
pub struct CountrySession {
    controller: Arc<SelectionController>,
    load_task: JoinHandle<()>,
    location_task: JoinHandle<()>,
}

pub fn start_session(
    controller: Arc<SelectionController>,
    resolver: Arc<dyn LocationResolver>,
) -> CountrySession {
    let location_task = controller.spawn_location_seeding(resolver);
    let loader = Arc::clone(&controller);
    let load_task = tokio::spawn(async move {
        loader.load().await;
        loader.seed_from_reported_location().await;
    });
    CountrySession {
        controller,
        load_task,
        location_task,
    }
}

impl CountrySession {
    pub fn controller(&self) -> &Arc<SelectionController> {
        &self.controller
    }

    /// Waits for both background tasks to finish and hands back the controller.
    pub async fn settle(self) -> Arc<SelectionController> {
        if let Err(err) = self.load_task.await {
            warn!("catalog load task ended abnormally: {err}");
        }
        if let Err(err) = self.location_task.await {
            warn!("location task ended abnormally: {err}");
        }
        self.controller
    }
}
