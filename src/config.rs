//! Planner configuration loaded from JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_EXPORT_FILE_NAME: &str = "medical-room-design.png";
pub const DEFAULT_CUSTOM_ASSET_MAX_SIDE: f64 = 200.0;
pub const DEFAULT_EXPORT_SETTLE_MS: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_CONFIG_PARSE",
            Self::Invalid(_) => "E_CONFIG_INVALID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// File name offered for the exported PNG.
    pub export_file_name: String,
    /// Rasterize without a background fill.
    pub transparent_background: bool,
    /// Longest side, in surface units, of a freshly imported custom asset.
    pub custom_asset_max_side: f64,
    /// MIME types accepted by the custom asset import.
    pub accepted_asset_types: Vec<String>,
    /// Delay between deselecting and rasterizing, in milliseconds.
    pub export_settle_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            transparent_background: true,
            custom_asset_max_side: DEFAULT_CUSTOM_ASSET_MAX_SIDE,
            accepted_asset_types: vec!["image/png".to_string()],
            export_settle_ms: DEFAULT_EXPORT_SETTLE_MS,
        }
    }
}

impl PlannerConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed JSON and `Invalid` when a value is out of
    /// range (see [`PlannerConfig::validate`]).
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the max side is not a positive number, the export
    /// file name is empty or not a `.png`, or no asset type is accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.custom_asset_max_side.is_finite() && self.custom_asset_max_side > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "custom_asset_max_side must be positive, got {}",
                self.custom_asset_max_side
            )));
        }
        let name = self.export_file_name.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid("export_file_name is empty".into()));
        }
        if !name.to_ascii_lowercase().ends_with(".png") || name.len() == ".png".len() {
            return Err(ConfigError::Invalid(format!("export_file_name must name a .png file, got '{name}'")));
        }
        if self.accepted_asset_types.is_empty() {
            return Err(ConfigError::Invalid("accepted_asset_types is empty".into()));
        }
        Ok(())
    }

    /// Whether a custom asset of this MIME type may be imported.
    #[must_use]
    pub fn accepts(&self, mime_type: &str) -> bool {
        self.accepted_asset_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(mime_type.trim()))
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.export_settle_ms)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
