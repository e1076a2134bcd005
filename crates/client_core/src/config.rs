use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use storage::DEFAULT_CACHE_FILE_NAME;
use url::Url;

use crate::source::DEFAULT_COUNTRIES_ENDPOINT;

const APP_DIR_NAME: &str = "country_picker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub countries_endpoint: String,
    pub cache_dir: PathBuf,
    pub cache_file_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            countries_endpoint: DEFAULT_COUNTRIES_ENDPOINT.into(),
            cache_dir: default_cache_dir(),
            cache_file_name: DEFAULT_CACHE_FILE_NAME.into(),
        }
    }
}

impl Settings {
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(&self.cache_file_name)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let endpoint = Url::parse(&self.countries_endpoint).with_context(|| {
            format!(
                "countries_endpoint '{}' is not a valid url",
                self.countries_endpoint
            )
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            bail!(
                "countries_endpoint must use http or https, got '{}'",
                endpoint.scheme()
            );
        }

        let file_name = self.cache_file_name.trim();
        if file_name.is_empty() {
            bail!("cache_file_name must not be empty");
        }
        if file_name.contains(['/', '\\']) {
            bail!("cache_file_name '{file_name}' must be a bare file name");
        }

        Ok(())
    }
}

/// Documents directory first (what a phone app backs up), then the platform
/// data directory, then the working directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::data_dir)
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Defaults overlaid with whatever keys the optional TOML file provides.
/// An absent or unparsable file yields the defaults.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    let Ok(raw) = fs::read_to_string(path) else {
        return settings;
    };
    let file_cfg = match toml::from_str::<HashMap<String, String>>(&raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            tracing::warn!(
                "ignoring unparsable settings file '{}': {err}",
                path.display()
            );
            return settings;
        }
    };

    if let Some(v) = file_cfg.get("countries_endpoint") {
        settings.countries_endpoint = v.clone();
    }
    if let Some(v) = file_cfg.get("cache_dir") {
        settings.cache_dir = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("cache_file_name") {
        settings.cache_file_name = v.clone();
    }

    settings
}
