//! Sonar Telemetry Decoder Library
//!
//! A small, focused library for decoding the framed binary telemetry stream
//! of an ultrasonic ranging sensor and extracting stable echo peaks from
//! the noisy amplitude data over time.
//!
//! # Architecture
//!
//! Two pieces carry all the logic:
//! - [`FrameDecoder`] resynchronizes on the byte stream, validates length
//!   and checksum, and unpacks each frame into a [`Packet`]
//! - [`PeakTracker`] consumes successive sample vectors and reports the
//!   peak indices corroborated across a sliding window of frames
//!
//! The library does NOT:
//! - Enumerate or select serial ports
//! - Render anything (console, plots, highlighting)
//! - Spawn threads or own a read loop
//!
//! All of that is in the application layer (sonar-cli), which feeds the
//! decoder from a [`FrameSource`] and hands `(Packet, consistent indices)`
//! pairs to its presentation code.
//!
//! # Example Usage
//!
//! ```no_run
//! use sonar_decoder::{FrameDecoder, PeakTracker, SerialSource, TelemetryConfig};
//!
//! let config = TelemetryConfig::new().with_num_samples(900);
//! let source = SerialSource::open("/dev/ttyACM0", &config).unwrap();
//! let mut decoder = FrameDecoder::new(source, config.clone()).unwrap();
//! let mut tracker = PeakTracker::new(&config).unwrap();
//!
//! loop {
//!     match decoder.read_frame() {
//!         Ok(Some(packet)) => {
//!             let peaks = tracker.update(&packet.samples);
//!             println!("depth {:.1} cm, {} consistent peaks", packet.depth_cm, peaks.len());
//!         }
//!         Ok(None) => continue, // transient framing failure, retry
//!         Err(e) => {
//!             eprintln!("source failed: {e}");
//!             break;
//!         }
//!     }
//! }
//! ```

// Public modules
pub mod config;
pub mod frame;
pub mod source;
pub mod tracker;
pub mod types;

// Re-export main types for convenience
pub use config::TelemetryConfig;
pub use frame::{DecodeStats, FrameDecoder};
pub use source::{CaptureSource, FrameSource, SerialSource};
pub use tracker::PeakTracker;
pub use types::{DecoderError, Packet, Result, HEADER_BYTE, SAMPLE_RESOLUTION};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
