//! Sonar Telemetry Console
//!
//! Command-line front end for the sonar-decoder library. It adds:
//! - Serial port discovery and selection
//! - TOML configuration with command-line overrides
//! - A reader thread feeding decoded packets through a bounded channel
//! - Highlighted console output of consistent echo peaks
//! - Replay of captured raw byte streams (no hardware required)

use anyhow::{bail, Context, Result};
use clap::Parser;
use sonar_decoder::{
    CaptureSource, DecodeStats, DecoderError, FrameDecoder, FrameSource, Packet, PeakTracker,
    SerialSource, TelemetryConfig,
};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

mod config;
mod ports;
mod render;

/// Decoded packets buffered between the reader thread and the console
const CHANNEL_DEPTH: usize = 8;

/// Pause between unsuccessful read attempts on a live port
const IDLE_DELAY: Duration = Duration::from_millis(5);

/// Sonar Telemetry Console - decode and track ultrasonic ranging frames
#[derive(Parser, Debug)]
#[command(name = "sonar-cli")]
#[command(about = "Decode ultrasonic ranging telemetry and track consistent echo peaks", long_about = None)]
#[command(version)]
struct Args {
    /// Serial port device (default: first discovered port)
    #[arg(short, long, value_name = "DEVICE")]
    port: Option<String>,

    /// Replay a captured raw byte stream instead of opening a port
    #[arg(short, long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial baud rate
    #[arg(long, value_name = "BAUD")]
    baud: Option<u32>,

    /// Amplitude bins per frame (must match the firmware build)
    #[arg(long, value_name = "N")]
    samples: Option<usize>,

    /// Minimum amplitude for a sample to count as a peak
    #[arg(long, value_name = "VALUE")]
    threshold: Option<u16>,

    /// Number of consecutive frames a peak must appear in
    #[arg(long, value_name = "FRAMES")]
    window: Option<usize>,

    /// Peak position tolerance in bins
    #[arg(long, value_name = "BINS")]
    tolerance: Option<usize>,

    /// Stop after this many decoded frames
    #[arg(long, value_name = "COUNT")]
    max_frames: Option<usize>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Sonar Telemetry Console v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", sonar_decoder::VERSION);

    if args.list_ports {
        let ports = ports::list_ports()?;
        if ports.is_empty() {
            println!("No serial ports found");
        } else {
            for port in ports {
                println!("{}", port);
            }
        }
        return Ok(());
    }

    // Config file first, command-line flags on top
    let app_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::AppConfig::default(),
    };

    let mut telemetry = app_config.to_telemetry_config();
    if let Some(baud) = args.baud {
        telemetry = telemetry.with_baud_rate(baud);
    }
    if let Some(n) = args.samples {
        telemetry = telemetry.with_num_samples(n);
    }
    if let Some(t) = args.threshold {
        telemetry = telemetry.with_threshold(t);
    }
    if let Some(w) = args.window {
        telemetry = telemetry.with_consistency_window(w);
    }
    if let Some(t) = args.tolerance {
        telemetry = telemetry.with_position_tolerance(t);
    }
    telemetry.validate().context("Invalid configuration")?;

    println!(
        "Tracking: threshold={}, window={}, tolerance={}",
        telemetry.threshold, telemetry.consistency_window, telemetry.position_tolerance
    );

    if let Some(capture) = &args.replay {
        println!("Replaying capture: {:?}", capture);
        let data = std::fs::read(capture)
            .with_context(|| format!("Failed to read capture file: {:?}", capture))?;
        let source = CaptureSource::new(data);
        // A capture never stalls, so there is nothing to idle between attempts
        run_session(source, telemetry, args.max_frames, Duration::ZERO)
    } else {
        let port = ports::select_port(
            args.port
                .as_deref()
                .or(app_config.connection.port.as_deref()),
        )?;
        println!("Connecting to {} @ {} baud...", port, telemetry.baud_rate);
        let source = SerialSource::open(&port, &telemetry)?;
        println!("Connected. Reading data...");
        run_session(source, telemetry, args.max_frames, IDLE_DELAY)
    }
}

/// Run one telemetry session: a reader thread decodes packets and sends
/// them through a bounded channel; this thread consumes them in arrival
/// order, updates the tracker, and renders each frame.
///
/// The single-producer/single-consumer handoff keeps tracker updates
/// strictly ordered without sharing any mutable state with the decoder.
fn run_session<S>(
    source: S,
    telemetry: TelemetryConfig,
    max_frames: Option<usize>,
    idle_delay: Duration,
) -> Result<()>
where
    S: FrameSource + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<Packet>(CHANNEL_DEPTH);

    let reader_config = telemetry.clone();
    let reader = thread::spawn(move || -> std::result::Result<DecodeStats, DecoderError> {
        let mut decoder = FrameDecoder::new(source, reader_config)?;
        loop {
            match decoder.read_frame() {
                Ok(Some(packet)) => {
                    // A send error means the consumer hung up; stop quietly
                    if tx.send(packet).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    if !idle_delay.is_zero() {
                        thread::sleep(idle_delay);
                    }
                }
                Err(DecoderError::SourceClosed) => {
                    log::info!("Byte source closed, ending session");
                    break;
                }
                Err(e) => {
                    log::error!("Fatal source error after {:?}", decoder.stats());
                    return Err(e);
                }
            }
        }
        Ok(decoder.stats())
    });

    let mut tracker = PeakTracker::new(&telemetry)?;
    let mut frames = 0usize;

    for packet in rx.iter() {
        let consistent = tracker.update(&packet.samples);
        println!(
            "{}",
            render::render_frame(&packet, consistent, telemetry.threshold)
        );

        frames += 1;
        if let Some(max) = max_frames {
            if frames >= max {
                log::info!("Reached --max-frames ({}), stopping", max);
                break;
            }
        }
    }
    // Dropping the receiver unblocks the reader's next send
    drop(rx);

    match reader.join() {
        Ok(Ok(stats)) => {
            log::info!(
                "Session ended: {} frames ok, {} header misses, {} short reads, {} checksum mismatches",
                stats.frames_ok,
                stats.bad_header,
                stats.short_read,
                stats.checksum_mismatch
            );
            Ok(())
        }
        Ok(Err(e)) => Err(e).context("Telemetry session failed"),
        Err(_) => bail!("Reader thread panicked"),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
