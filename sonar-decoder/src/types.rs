//! Core types for the sonar telemetry decoder library
//!
//! This module defines the packet model the decoder emits, the physical
//! conversion constants shared with the sensor firmware, and the error
//! taxonomy. Transient framing problems (bad header, short read, checksum
//! mismatch) are not errors - the decoder reports them as "no packet this
//! call" and the caller retries. The error enum covers only conditions that
//! terminate the read loop.

use serde::Serialize;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Header marker byte that starts every frame on the wire
pub const HEADER_BYTE: u8 = 0xAA;

/// Speed of sound used by the firmware for range conversion, in m/s
pub const SPEED_OF_SOUND: f64 = 330.0;

/// Sampling period of the amplitude ADC, in seconds
pub const SAMPLE_TIME: f64 = 13.2e-6;

/// Centimetres of range covered by one sample bin (round trip halved)
pub const SAMPLE_RESOLUTION: f64 = (SPEED_OF_SOUND * SAMPLE_TIME * 100.0) / 2.0;

/// Number of payload bytes preceding the sample vector (depth, temp, vDrv)
pub const FIXED_FIELDS_LEN: usize = 6;

/// Total payload length in bytes for a given sample count
pub const fn payload_len(num_samples: usize) -> usize {
    FIXED_FIELDS_LEN + 2 * num_samples
}

/// One decoded unit of sensor telemetry
///
/// A `Packet` is immutable once produced: the decoder either yields a fully
/// populated, checksum-verified packet or nothing at all. `samples.len()`
/// always equals the configured sample count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Packet {
    /// Raw ranging bin index reported by the firmware
    pub depth_index: u16,
    /// Range in centimetres (`depth_index * SAMPLE_RESOLUTION`)
    pub depth_cm: f64,
    /// Transducer temperature in degrees Celsius
    pub temperature_c: f64,
    /// Driver supply voltage in volts
    pub drive_voltage_v: f64,
    /// Amplitude samples in bin order, fixed length
    pub samples: Vec<u16>,
}

impl Packet {
    /// Build a packet from the raw wire fields, applying the firmware's
    /// fixed-point scaling (temperature and voltage carry two decimal
    /// places; depth is a bin index).
    pub fn from_raw(depth_index: u16, temp_scaled: i16, vdrv_scaled: u16, samples: Vec<u16>) -> Self {
        Self {
            depth_index,
            depth_cm: depth_index as f64 * SAMPLE_RESOLUTION,
            temperature_c: temp_scaled as f64 / 100.0,
            drive_voltage_v: vdrv_scaled as f64 / 100.0,
            samples,
        }
    }

    /// Number of amplitude samples in this packet
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }
}

/// Errors that terminate the decoding loop
///
/// Everything recoverable by resynchronizing on the byte stream stays inside
/// the decoder; these variants are the unrecoverable remainder.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to open serial port '{port}': {source}")]
    PortOpen {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Byte source I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Byte source closed")]
    SourceClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// XOR-fold of a payload, as computed by the sensor firmware
///
/// The checksum covers every payload byte; the header marker and the
/// checksum byte itself are excluded.
pub fn xor_checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, b| acc ^ b)
}
