//! Serial port discovery and selection

use anyhow::{Context, Result};

/// Fallback device when nothing is discovered and nothing was specified
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Enumerate available serial ports by device name
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().context("Failed to enumerate serial ports")?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Pick the port to use: explicit choice first, then the first discovered
/// port, then the documented default (with a warning)
pub fn select_port(explicit: Option<&str>) -> Result<String> {
    if let Some(port) = explicit {
        return Ok(port.to_string());
    }

    let ports = list_ports()?;
    match ports.first() {
        Some(port) => {
            log::info!("Found available serial ports: {:?}", ports);
            Ok(port.clone())
        }
        None => {
            log::warn!("No serial ports found, defaulting to '{}'", DEFAULT_PORT);
            Ok(DEFAULT_PORT.to_string())
        }
    }
}
