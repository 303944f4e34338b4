//! Shared application settings (matching thresholds, scrape pacing).
//!
//! Every command reads the same file, `~/.config/meeple-scout/settings.toml`,
//! so threshold tweaks apply to batch planning and single-game lookups alike.
//! CLI flags override individual values per run.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Canonical path to the settings file: `~/.config/meeple-scout/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("meeple-scout").join("settings.toml")
}

/// Tunable knobs consumed by the enricher and the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minimum similarity for a publisher/exhibitor candidate match.
    pub publisher_threshold: f64,

    /// Minimum similarity for a product-title confirmation.
    pub product_threshold: f64,

    /// Lower bound of the randomized inter-request delay, in seconds.
    pub delay_min: f64,

    /// Upper bound of the randomized inter-request delay, in seconds.
    pub delay_max: f64,

    /// Default collection export path used when no `--collection` flag is given.
    pub collection_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            publisher_threshold: 0.80,
            product_threshold: 0.85,
            delay_min: 1.0,
            delay_max: 3.0,
            collection_path: None,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file is missing.
    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring malformed settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&settings_path())
    }

    /// Write atomically so a crash mid-save never leaves a torn file.
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(io::Error::other)?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &serialized)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Resolve the collection path using a priority chain:
    ///
    /// 1. CLI override (if `Some`)
    /// 2. `collection_path` in `settings.toml`
    /// 3. `collection.csv` in the current directory
    pub fn resolve_collection_path(&self, cli_override: Option<PathBuf>) -> PathBuf {
        if let Some(p) = cli_override {
            return p;
        }
        if let Some(p) = &self.collection_path {
            return p.clone();
        }
        PathBuf::from("collection.csv")
    }
}
