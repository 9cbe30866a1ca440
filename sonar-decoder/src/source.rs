//! Byte sources feeding the frame decoder
//!
//! The decoder only needs two things from its input: a bounded-timeout read
//! and a way to discard buffered input after a failed framing attempt. The
//! [`FrameSource`] trait captures that seam, with one implementation over a
//! live serial port and one that replays a captured byte stream (used by
//! tests and the CLI's replay mode).

use crate::config::TelemetryConfig;
use crate::types::{DecoderError, Result};
use serialport::{ClearBuffer, SerialPort};
use std::io::Read;
use std::time::Duration;

/// A readable byte stream with bounded-timeout semantics
///
/// Implementations must never block indefinitely: `read` returns after the
/// source's configured timeout at the latest, possibly having filled only
/// part of the buffer. A short fill is a transient condition (the caller
/// abandons the current framing attempt); only hard source failures are
/// returned as errors.
pub trait FrameSource {
    /// Fill as much of `buf` as arrives before the timeout
    ///
    /// Returns the number of bytes written, which may be less than
    /// `buf.len()` (timeout) or the full length. Errors are reserved for
    /// unrecoverable source conditions.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Discard any buffered-but-unread input
    ///
    /// Called after a failed framing attempt so the next attempt starts
    /// from a clean byte boundary instead of inheriting misaligned data.
    fn discard_input(&mut self) -> Result<()>;
}

/// Live serial port source
pub struct SerialSource {
    port: Box<dyn SerialPort>,
}

impl SerialSource {
    /// Open a serial port with the baud rate and read timeout from `config`
    pub fn open(port_name: &str, config: &TelemetryConfig) -> Result<Self> {
        log::info!(
            "Opening serial port '{}' @ {} baud (timeout {} ms)",
            port_name,
            config.baud_rate,
            config.read_timeout_ms
        );

        let port = serialport::new(port_name, config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .map_err(|source| DecoderError::PortOpen {
                port: port_name.to_string(),
                source,
            })?;

        Ok(Self { port })
    }

    /// Wrap an already-open serial port
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl FrameSource for SerialSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                // Timeout mid-fill is a short read, not a failure
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(DecoderError::Io(e)),
            }
        }
        Ok(filled)
    }

    fn discard_input(&mut self) -> Result<()> {
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| DecoderError::Io(e.into()))
    }
}

/// Replays a captured raw byte stream
///
/// Reads return the next bytes of the capture; once the capture is
/// exhausted, further reads fail with [`DecoderError::SourceClosed`] so a
/// replay session terminates instead of polling forever. Discarding input
/// is a no-op: a capture has no device-side buffer, and resynchronization
/// by header scan works on the recorded bytes as-is.
pub struct CaptureSource {
    data: Vec<u8>,
    position: usize,
}

impl CaptureSource {
    /// Replay the given bytes from the start
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl FrameSource for CaptureSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.position >= self.data.len() {
            return Err(DecoderError::SourceClosed);
        }
        let n = buf.len().min(self.data.len() - self.position);
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }

    fn discard_input(&mut self) -> Result<()> {
        Ok(())
    }
}
