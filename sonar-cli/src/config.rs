//! Configuration loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sonar_decoder::TelemetryConfig;
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from config.toml)
///
/// Every section is optional; missing values fall back to the firmware
/// deployment defaults. Command-line flags override whatever is loaded
/// here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub decoder: DecoderSection,
    #[serde(default)]
    pub tracking: TrackingSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Serial port device; discovered automatically when absent
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DecoderSection {
    /// Amplitude bins per frame; must match the firmware build exactly
    pub num_samples: Option<usize>,
    pub read_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackingSection {
    pub threshold: Option<u16>,
    pub consistency_window: Option<usize>,
    pub position_tolerance: Option<usize>,
}

impl AppConfig {
    /// Collapse the file sections into the shared telemetry configuration,
    /// leaving firmware defaults in place for anything unset
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        let mut config = TelemetryConfig::new();
        if let Some(baud) = self.connection.baud_rate {
            config = config.with_baud_rate(baud);
        }
        if let Some(n) = self.decoder.num_samples {
            config = config.with_num_samples(n);
        }
        if let Some(t) = self.decoder.read_timeout_ms {
            config = config.with_read_timeout_ms(t);
        }
        if let Some(t) = self.tracking.threshold {
            config = config.with_threshold(t);
        }
        if let Some(w) = self.tracking.consistency_window {
            config = config.with_consistency_window(w);
        }
        if let Some(t) = self.tracking.position_tolerance {
            config = config.with_position_tolerance(t);
        }
        config
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
