//! Replay a captured raw byte stream through the decoder and tracker
//!
//! Usage:
//!   replay_capture <capture.bin> [num_samples]
//!
//! The capture file is the raw bytes as read from the serial port. Decoder
//! statistics and the consistent peak set of each frame are printed.

use sonar_decoder::{CaptureSource, DecoderError, FrameDecoder, PeakTracker, TelemetryConfig};
use std::env;
use std::fs;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("Usage: replay_capture <capture.bin> [num_samples]");
            std::process::exit(1);
        }
    };
    let num_samples: usize = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(900);

    let data = match fs::read(&path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to read capture '{}': {}", path, e);
            std::process::exit(1);
        }
    };
    println!("Replaying {} bytes from {}", data.len(), path);

    let config = TelemetryConfig::new().with_num_samples(num_samples);
    let mut decoder = match FrameDecoder::new(CaptureSource::new(data), config.clone()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Bad configuration: {}", e);
            std::process::exit(1);
        }
    };
    let mut tracker = match PeakTracker::new(&config) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Bad configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut frame_no = 0usize;
    loop {
        match decoder.read_frame() {
            Ok(Some(packet)) => {
                frame_no += 1;
                let peaks = tracker.update(&packet.samples);
                println!(
                    "frame {:4}: depth {:7.1} cm  temp {:5.1} C  vdrv {:5.1} V  consistent {:?}",
                    frame_no, packet.depth_cm, packet.temperature_c, packet.drive_voltage_v, peaks
                );
            }
            Ok(None) => continue,
            Err(DecoderError::SourceClosed) => break,
            Err(e) => {
                eprintln!("Source error: {}", e);
                std::process::exit(1);
            }
        }
    }

    let stats = decoder.stats();
    println!("\n=== REPLAY SUMMARY ===");
    println!("Frames decoded:     {}", stats.frames_ok);
    println!("Header misses:      {}", stats.bad_header);
    println!("Short reads:        {}", stats.short_read);
    println!("Checksum mismatches: {}", stats.checksum_mismatch);
}
