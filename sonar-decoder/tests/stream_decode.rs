//! End-to-end decode of a synthetic capture: noisy byte stream in,
//! consistent peak sets out.

use sonar_decoder::{
    CaptureSource, DecoderError, FrameDecoder, PeakTracker, TelemetryConfig, HEADER_BYTE,
};

const NUM_SAMPLES: usize = 16;

fn config() -> TelemetryConfig {
    TelemetryConfig::new()
        .with_num_samples(NUM_SAMPLES)
        .with_threshold(50)
        .with_position_tolerance(1)
        .with_consistency_window(3)
}

fn xor(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, b| acc ^ b)
}

fn encode_frame(depth_index: u16, samples: &[u16; NUM_SAMPLES]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&depth_index.to_be_bytes());
    payload.extend_from_slice(&250i16.to_be_bytes()); // 2.5 C
    payload.extend_from_slice(&1200u16.to_be_bytes()); // 12.0 V
    for s in samples {
        payload.extend_from_slice(&s.to_be_bytes());
    }

    let mut frame = vec![HEADER_BYTE];
    let checksum = xor(&payload);
    frame.extend_from_slice(&payload);
    frame.push(checksum);
    frame
}

fn samples_with_peak(index: usize) -> [u16; NUM_SAMPLES] {
    let mut samples = [5u16; NUM_SAMPLES];
    samples[index] = 120;
    samples
}

#[test]
fn decodes_noisy_capture_and_tracks_consistent_peak() {
    // Four frames with an echo wandering around bin 8, separated by line
    // noise and one frame with a corrupted checksum.
    let mut stream = Vec::new();
    stream.extend_from_slice(&[0x00, 0x17, 0x42]); // line noise before sync
    stream.extend(encode_frame(8, &samples_with_peak(8)));

    let mut corrupted = encode_frame(8, &samples_with_peak(3));
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0xFF;
    stream.extend(corrupted);

    stream.extend(encode_frame(9, &samples_with_peak(9)));
    stream.extend(encode_frame(8, &samples_with_peak(8)));
    stream.extend(encode_frame(8, &samples_with_peak(7)));

    let mut decoder = FrameDecoder::new(CaptureSource::new(stream), config()).unwrap();
    let mut tracker = PeakTracker::new(&config()).unwrap();

    let mut results: Vec<Vec<usize>> = Vec::new();
    loop {
        match decoder.read_frame() {
            Ok(Some(packet)) => {
                assert_eq!(packet.num_samples(), NUM_SAMPLES);
                results.push(tracker.update(&packet.samples).iter().copied().collect());
            }
            Ok(None) => continue,
            Err(DecoderError::SourceClosed) => break,
            Err(e) => panic!("unexpected source error: {e}"),
        }
    }

    // The corrupted frame never reaches the tracker: four good frames total
    assert_eq!(results.len(), 4);
    assert_eq!(decoder.stats().frames_ok, 4);
    assert_eq!(decoder.stats().checksum_mismatch, 1);
    assert!(decoder.stats().bad_header >= 1);

    // Warm-up: first two updates are empty claims
    assert!(results[0].is_empty());
    assert!(results[1].is_empty());
    // Window {8},{9},{8}: bin 8 corroborated within tolerance 1
    assert_eq!(results[2], vec![8]);
    // Window {9},{8},{7}: bin 7 is within reach of 8 but not 9, so the
    // drifted echo is dropped until it stabilizes again
    assert!(results[3].is_empty());
}

#[test]
fn pure_noise_yields_no_packets() {
    let noise: Vec<u8> = (0u16..512).map(|i| (i % 251) as u8).collect();
    // Keep 0xAA out of the noise so every byte is a header miss
    let noise: Vec<u8> = noise
        .into_iter()
        .map(|b| if b == HEADER_BYTE { 0x00 } else { b })
        .collect();

    let mut decoder = FrameDecoder::new(CaptureSource::new(noise), config()).unwrap();
    loop {
        match decoder.read_frame() {
            Ok(Some(p)) => panic!("decoded a packet from noise: {p:?}"),
            Ok(None) => continue,
            Err(DecoderError::SourceClosed) => break,
            Err(e) => panic!("unexpected source error: {e}"),
        }
    }
    assert_eq!(decoder.stats().frames_ok, 0);
}
