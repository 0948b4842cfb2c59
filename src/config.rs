use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use tracing::info;

use crate::booking::BookingEngine;
use crate::models::Settings;
use crate::store::JsonFileStore;

/// Read the settings file. A missing file means all defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        info!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let settings: Settings =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(settings)
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow!("Unknown timezone '{}': {}", name, e))
}

/// Engine over the JSON file layout rooted at `storage.data_dir`.
pub fn open_engine(settings: &Settings) -> Result<BookingEngine> {
    let tz = parse_timezone(&settings.service.timezone)?;
    let store = JsonFileStore::new(&settings.storage.data_dir);
    info!(
        "Storage at {} (timezone {})",
        store.root().display(),
        tz.name()
    );
    Ok(BookingEngine::new(Arc::new(store), tz))
}
