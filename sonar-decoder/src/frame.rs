//! Frame decoder for the sensor's serial wire format
//!
//! Every frame on the wire is `0xAA`, a big-endian payload of
//! `6 + 2 * num_samples` bytes (depth index, scaled temperature, scaled
//! drive voltage, then the amplitude samples), and a trailing XOR-fold
//! checksum over the payload. The decoder resynchronizes byte-by-byte on
//! the header marker and yields at most one packet per call.
//!
//! All framing failures are transient: the decoder discards what it read,
//! flushes the source where that helps realignment, and reports "no packet"
//! so the caller can retry. Only source-level failures (port gone, capture
//! exhausted) surface as errors.

use crate::config::TelemetryConfig;
use crate::source::FrameSource;
use crate::types::{payload_len, xor_checksum, DecoderError, Packet, Result, HEADER_BYTE};
use byteorder::{BigEndian, ReadBytesExt};

/// Diagnostic counters kept across the decoder's lifetime
///
/// A healthy link shows `frames_ok` climbing with occasional `bad_header`
/// hits around connection start. A stream of `checksum_mismatch` with no
/// good frames usually means `num_samples` disagrees with the firmware
/// build, which misaligns every frame and is not detectable in-band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Frames decoded and checksum-verified
    pub frames_ok: u64,
    /// Bytes discarded while hunting for the header marker
    pub bad_header: u64,
    /// Attempts abandoned because the source timed out mid-frame
    pub short_read: u64,
    /// Complete frames rejected by the checksum
    pub checksum_mismatch: u64,
}

/// Decodes validated packets from a byte source
///
/// The payload buffer is allocated once and reused across calls, so steady
/// state decoding does not allocate beyond the sample vector handed out
/// inside each `Packet`.
pub struct FrameDecoder<S: FrameSource> {
    source: S,
    config: TelemetryConfig,
    payload: Vec<u8>,
    stats: DecodeStats,
}

impl<S: FrameSource> FrameDecoder<S> {
    /// Create a decoder over `source` with the given configuration
    ///
    /// Fails if the configuration is internally inconsistent (see
    /// [`TelemetryConfig::validate`]).
    pub fn new(source: S, config: TelemetryConfig) -> Result<Self> {
        config.validate()?;
        let payload = vec![0u8; payload_len(config.num_samples)];
        Ok(Self {
            source,
            config,
            payload,
            stats: DecodeStats::default(),
        })
    }

    /// Read at most one packet from the source
    ///
    /// # Returns
    /// * `Ok(Some(packet))` - a complete, checksum-verified packet
    /// * `Ok(None)` - no packet this call (bad header byte, source timeout
    ///   mid-frame, or checksum mismatch); the caller should retry
    /// * `Err(..)` - the source failed unrecoverably
    pub fn read_frame(&mut self) -> Result<Option<Packet>> {
        // 1. Hunt for the header marker, one byte at a time
        let mut header = [0u8; 1];
        let n = self.source.read(&mut header)?;
        if n == 0 {
            // Nothing arrived within the timeout
            self.stats.short_read += 1;
            return Ok(None);
        }
        if header[0] != HEADER_BYTE {
            // Discard the stray byte and flush whatever follows it, so the
            // next attempt starts at a clean boundary instead of inheriting
            // the tail of a corrupted frame
            self.stats.bad_header += 1;
            log::trace!("Discarding non-header byte 0x{:02X}", header[0]);
            self.source.discard_input()?;
            return Ok(None);
        }

        // 2. Read payload and checksum
        let want = self.payload.len();
        let got = self.source.read(&mut self.payload)?;
        if got < want {
            self.stats.short_read += 1;
            log::debug!("Short payload read ({} of {} bytes), resyncing", got, want);
            self.source.discard_input()?;
            return Ok(None);
        }

        let mut checksum = [0u8; 1];
        if self.source.read(&mut checksum)? < 1 {
            self.stats.short_read += 1;
            log::debug!("Timed out waiting for checksum byte, resyncing");
            self.source.discard_input()?;
            return Ok(None);
        }

        // 3. Verify the XOR-fold over the payload
        let computed = xor_checksum(&self.payload);
        if computed != checksum[0] {
            self.stats.checksum_mismatch += 1;
            log::debug!(
                "Checksum mismatch (computed 0x{:02X}, received 0x{:02X})",
                computed,
                checksum[0]
            );
            if self.stats.checksum_mismatch % 50 == 0 && self.stats.frames_ok == 0 {
                log::warn!(
                    "{} checksum failures and no good frames yet; \
                     check that num_samples ({}) matches the firmware build",
                    self.stats.checksum_mismatch,
                    self.config.num_samples
                );
            }
            return Ok(None);
        }

        // 4. Unpack the big-endian payload
        let packet = self.unpack_payload()?;
        self.stats.frames_ok += 1;
        Ok(Some(packet))
    }

    fn unpack_payload(&self) -> Result<Packet> {
        let mut cursor = &self.payload[..];
        let depth_index = cursor.read_u16::<BigEndian>()?;
        let temp_scaled = cursor.read_i16::<BigEndian>()?;
        let vdrv_scaled = cursor.read_u16::<BigEndian>()?;

        let mut samples = Vec::with_capacity(self.config.num_samples);
        for _ in 0..self.config.num_samples {
            samples.push(cursor.read_u16::<BigEndian>()?);
        }

        Ok(Packet::from_raw(depth_index, temp_scaled, vdrv_scaled, samples))
    }

    /// Diagnostic counters accumulated so far
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// The configuration this decoder was built with
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Consume the decoder and return the underlying source
    pub fn into_source(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::CaptureSource;
    use crate::types::SAMPLE_RESOLUTION;

    fn test_config(num_samples: usize) -> TelemetryConfig {
        TelemetryConfig::new()
            .with_num_samples(num_samples)
            .with_position_tolerance(1)
    }

    /// Encode one wire frame the way the firmware does
    fn encode_frame(depth_index: u16, temp_scaled: i16, vdrv_scaled: u16, samples: &[u16]) -> Vec<u8> {
        let mut payload = Vec::with_capacity(payload_len(samples.len()));
        payload.extend_from_slice(&depth_index.to_be_bytes());
        payload.extend_from_slice(&temp_scaled.to_be_bytes());
        payload.extend_from_slice(&vdrv_scaled.to_be_bytes());
        for s in samples {
            payload.extend_from_slice(&s.to_be_bytes());
        }

        let mut frame = vec![HEADER_BYTE];
        let checksum = xor_checksum(&payload);
        frame.extend_from_slice(&payload);
        frame.push(checksum);
        frame
    }

    /// Source wrapper that counts `discard_input` calls
    struct TrackingSource {
        inner: CaptureSource,
        discards: usize,
    }

    impl TrackingSource {
        fn new(data: Vec<u8>) -> Self {
            Self {
                inner: CaptureSource::new(data),
                discards: 0,
            }
        }
    }

    impl FrameSource for TrackingSource {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.inner.read(buf)
        }

        fn discard_input(&mut self) -> Result<()> {
            self.discards += 1;
            self.inner.discard_input()
        }
    }

    #[test]
    fn test_decodes_valid_frame() {
        let samples = [10u16, 20, 30, 40];
        let stream = encode_frame(100, -532, 1210, &samples);
        let mut decoder =
            FrameDecoder::new(CaptureSource::new(stream), test_config(4)).unwrap();

        let packet = decoder.read_frame().unwrap().expect("packet");
        assert_eq!(packet.depth_index, 100);
        assert!((packet.depth_cm - 100.0 * SAMPLE_RESOLUTION).abs() < 1e-9);
        assert!((packet.temperature_c - (-5.32)).abs() < 1e-9);
        assert!((packet.drive_voltage_v - 12.10).abs() < 1e-9);
        assert_eq!(packet.samples, samples);
        assert_eq!(decoder.stats().frames_ok, 1);
    }

    #[test]
    fn test_samples_length_always_matches_config() {
        for n in [1usize, 4, 16] {
            let samples: Vec<u16> = (0..n as u16).collect();
            let stream = encode_frame(1, 0, 0, &samples);
            let mut decoder =
                FrameDecoder::new(CaptureSource::new(stream), test_config(n)).unwrap();
            let packet = decoder.read_frame().unwrap().expect("packet");
            assert_eq!(packet.num_samples(), n);
        }
    }

    #[test]
    fn test_bad_header_discards_and_flushes() {
        let mut stream = vec![0x55];
        stream.extend(encode_frame(7, 0, 0, &[1, 2, 3, 4]));
        let mut decoder =
            FrameDecoder::new(TrackingSource::new(stream), test_config(4)).unwrap();

        // The stray byte costs one attempt and triggers an input flush
        assert!(decoder.read_frame().unwrap().is_none());
        assert_eq!(decoder.stats().bad_header, 1);

        let packet = decoder.read_frame().unwrap().expect("packet");
        assert_eq!(packet.depth_index, 7);

        let source = decoder.into_source();
        assert_eq!(source.discards, 1);
    }

    #[test]
    fn test_checksum_mismatch_rejects_frame() {
        let mut stream = encode_frame(9, 0, 0, &[5, 6, 7, 8]);
        let last = stream.len() - 1;
        stream[last] ^= 0x01;
        let mut decoder =
            FrameDecoder::new(CaptureSource::new(stream), test_config(4)).unwrap();

        assert!(decoder.read_frame().unwrap().is_none());
        assert_eq!(decoder.stats().checksum_mismatch, 1);
        assert_eq!(decoder.stats().frames_ok, 0);
    }

    #[test]
    fn test_corrupted_payload_byte_rejects_frame() {
        let mut stream = encode_frame(9, 0, 0, &[5, 6, 7, 8]);
        stream[3] ^= 0x80;
        let mut decoder =
            FrameDecoder::new(CaptureSource::new(stream), test_config(4)).unwrap();
        assert!(decoder.read_frame().unwrap().is_none());
        assert_eq!(decoder.stats().checksum_mismatch, 1);
    }

    #[test]
    fn test_short_read_reports_no_packet() {
        // Header plus half a payload, then nothing
        let full = encode_frame(3, 0, 0, &[1, 2, 3, 4]);
        let stream = full[..6].to_vec();
        let mut decoder =
            FrameDecoder::new(CaptureSource::new(stream), test_config(4)).unwrap();

        assert!(decoder.read_frame().unwrap().is_none());
        assert_eq!(decoder.stats().short_read, 1);
        // The capture is now exhausted, which is a source-level condition
        assert!(matches!(
            decoder.read_frame(),
            Err(DecoderError::SourceClosed)
        ));
    }

    #[test]
    fn test_resync_past_spurious_header_byte() {
        // A stream that starts mid-frame at a byte that happens to be 0xAA:
        // the decoder consumes a bogus frame-sized window, rejects it on
        // checksum, and realigns on the next true header.
        let mut stream = vec![HEADER_BYTE];
        let bogus_len = payload_len(4) + 1;
        let mut bogus: Vec<u8> = (0..bogus_len as u8).collect();
        // Make sure the trailing byte cannot accidentally validate
        let last = bogus.len() - 1;
        bogus[last] = xor_checksum(&bogus[..last]) ^ 0xFF;
        stream.extend_from_slice(&bogus);
        stream.extend(encode_frame(42, 100, 200, &[0xAAAA, 2, 3, 4]));

        let mut decoder =
            FrameDecoder::new(CaptureSource::new(stream), test_config(4)).unwrap();

        // First attempt eats the spurious frame and fails validation
        assert!(decoder.read_frame().unwrap().is_none());
        assert_eq!(decoder.stats().checksum_mismatch, 1);

        // Next attempt lands on the true header
        let packet = decoder.read_frame().unwrap().expect("packet");
        assert_eq!(packet.depth_index, 42);
        assert_eq!(packet.samples[0], 0xAAAA);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut stream = encode_frame(1, 0, 0, &[1, 1, 1, 1]);
        stream.extend(encode_frame(2, 0, 0, &[2, 2, 2, 2]));
        let mut decoder =
            FrameDecoder::new(CaptureSource::new(stream), test_config(4)).unwrap();

        assert_eq!(decoder.read_frame().unwrap().unwrap().depth_index, 1);
        assert_eq!(decoder.read_frame().unwrap().unwrap().depth_index, 2);
        assert_eq!(decoder.stats().frames_ok, 2);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = FrameDecoder::new(
            CaptureSource::new(vec![]),
            TelemetryConfig::new().with_num_samples(0),
        );
        assert!(matches!(result, Err(DecoderError::InvalidConfig(_))));
    }
}
