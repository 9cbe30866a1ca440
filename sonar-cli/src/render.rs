//! Console rendering of decoded frames
//!
//! Builds the per-frame banner and the highlighted sample row: consistent
//! peaks print their amplitude, above-threshold samples that have not yet
//! proven consistent print a dot marker, everything else stays blank so the
//! echoes stand out against a quiet background.

use chrono::{DateTime, Local};
use sonar_decoder::Packet;
use std::collections::BTreeSet;

const RULE_WIDTH: usize = 100;

/// Banner line with timestamp and the physical measurements of one frame
pub fn frame_banner(packet: &Packet, time: DateTime<Local>) -> String {
    format!(
        "Time: {} | Depth: {:.1} cm | Temp: {:.1} \u{00B0}C | Vdrv: {:.1} V",
        time.format("%H:%M:%S"),
        packet.depth_cm,
        packet.temperature_c,
        packet.drive_voltage_v
    )
}

/// Sample row with consistent peaks highlighted
///
/// Each sample takes four columns: the amplitude for a consistent peak, a
/// centred dot for an inconsistent one, blanks below threshold.
pub fn sample_row(samples: &[u16], consistent: &BTreeSet<usize>, threshold: u16) -> String {
    let mut row = String::with_capacity(samples.len() * 4);
    for (i, &value) in samples.iter().enumerate() {
        if consistent.contains(&i) && value >= threshold {
            row.push_str(&format!("{:4}", value));
        } else if value >= threshold {
            row.push_str(" .  ");
        } else {
            row.push_str("    ");
        }
    }
    row
}

/// Full frame block as printed by the console loop
pub fn render_frame(packet: &Packet, consistent: &BTreeSet<usize>, threshold: u16) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str(&frame_banner(packet, Local::now()));
    out.push('\n');
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str("Consistent peaks (value) | Inconsistent peaks (.) | Background (blank)\n");
    out.push_str(&sample_row(&packet.samples, consistent, threshold));
    out
}
