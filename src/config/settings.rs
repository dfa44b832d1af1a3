//! Settlement settings loaded from `settlement.toml`.
//!
//! Every field has a default, and a missing file yields [`Settings::default`],
//! so a fresh checkout runs without any configuration.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "settlement.toml";

/// Top-level structure of `settlement.toml`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Aggregation and payout policy
    pub settlement: SettlementPolicy,
    /// Settlement document rendering
    pub export: ExportSettings,
}

/// Policy switches for aggregation and payout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettlementPolicy {
    /// Upper bound on one aggregation run, in seconds
    pub query_timeout_secs: u64,
    /// Fail aggregation when a record references an unregistered route
    /// instead of pricing it at zero
    pub reject_unpriced_routes: bool,
    /// Reject negative deduction or freshback entries
    pub reject_negative_deductions: bool,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            query_timeout_secs: 30,
            reject_unpriced_routes: false,
            reject_negative_deductions: false,
        }
    }
}

impl SettlementPolicy {
    /// The aggregation bound as a [`Duration`].
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// Settings for PDF export.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// TrueType font with Hangul glyphs. Without it documents use a built-in
    /// Latin font and English labels.
    pub font_path: Option<PathBuf>,
    /// Directory where generated documents are written
    pub output_dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            font_path: None,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or is not valid TOML.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    debug!("Loading settings from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

/// Loads settings from `ITKOO_CONFIG` (or [`DEFAULT_CONFIG_PATH`]), falling back
/// to defaults when the file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var("ITKOO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        load_settings(&path)
    } else {
        info!("{path} not found, using default settings");
        Ok(Settings::default())
    }
}
