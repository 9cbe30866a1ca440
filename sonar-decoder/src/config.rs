//! Telemetry configuration types
//!
//! One immutable configuration struct is shared by the frame decoder and the
//! peak tracker so that cross-cutting values (the sample count in
//! particular) cannot drift apart between the two. The struct is
//! serde-friendly so applications can load it from a config file and
//! override individual fields from the command line.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};

/// Configuration shared by the frame decoder and the peak tracker
///
/// `num_samples` must match the value compiled into the sensor firmware
/// exactly. A mismatch is not detectable in-band: every frame's payload
/// length is wrong, so decoding manifests as a stream of checksum failures
/// rather than an explicit error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Number of amplitude bins per frame (900 or 1800 depending on
    /// firmware build)
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,

    /// Serial line rate in baud
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Minimum amplitude for a sample to count as a peak
    #[serde(default = "default_threshold")]
    pub threshold: u16,

    /// Number of consecutive frames a peak must appear in to be consistent
    #[serde(default = "default_consistency_window")]
    pub consistency_window: usize,

    /// Maximum index displacement (either direction) still considered the
    /// same peak across frames
    #[serde(default = "default_position_tolerance")]
    pub position_tolerance: usize,

    /// Read timeout applied to the byte source, in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_num_samples() -> usize {
    900
}

fn default_baud_rate() -> u32 {
    250_000
}

fn default_threshold() -> u16 {
    50
}

fn default_consistency_window() -> usize {
    3
}

fn default_position_tolerance() -> usize {
    5
}

fn default_read_timeout_ms() -> u64 {
    1000
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            num_samples: default_num_samples(),
            baud_rate: default_baud_rate(),
            threshold: default_threshold(),
            consistency_window: default_consistency_window(),
            position_tolerance: default_position_tolerance(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl TelemetryConfig {
    /// Create a configuration with the default firmware deployment values
    /// (N=900, 250000 baud, threshold 50, window 3, tolerance 5)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the per-frame sample count
    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// Builder method: set the serial baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Builder method: set the peak amplitude threshold
    pub fn with_threshold(mut self, threshold: u16) -> Self {
        self.threshold = threshold;
        self
    }

    /// Builder method: set the consistency window depth
    pub fn with_consistency_window(mut self, window: usize) -> Self {
        self.consistency_window = window;
        self
    }

    /// Builder method: set the position tolerance
    pub fn with_position_tolerance(mut self, tolerance: usize) -> Self {
        self.position_tolerance = tolerance;
        self
    }

    /// Builder method: set the source read timeout in milliseconds
    pub fn with_read_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    /// Validate cross-consistency of the configuration
    ///
    /// The tracker's tolerance clamp depends on `num_samples`, so the two
    /// are checked together here rather than at each use site.
    pub fn validate(&self) -> Result<()> {
        if self.num_samples == 0 {
            return Err(DecoderError::InvalidConfig(
                "num_samples must be at least 1".to_string(),
            ));
        }
        if self.consistency_window == 0 {
            return Err(DecoderError::InvalidConfig(
                "consistency_window must be at least 1".to_string(),
            ));
        }
        if self.position_tolerance >= self.num_samples {
            return Err(DecoderError::InvalidConfig(format!(
                "position_tolerance ({}) must be smaller than num_samples ({})",
                self.position_tolerance, self.num_samples
            )));
        }
        if self.baud_rate == 0 {
            return Err(DecoderError::InvalidConfig(
                "baud_rate must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
