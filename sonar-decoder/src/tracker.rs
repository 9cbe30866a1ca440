//! Temporal consistency tracking over amplitude frames
//!
//! A single noisy frame cannot distinguish a real echo from a transient
//! spike. The tracker keeps the peak positions of the last few frames and
//! reports only those current peaks that are corroborated - within a small
//! positional tolerance - by every buffered frame. It is a sequential state
//! machine: one `update` per received packet, in arrival order, never
//! concurrently.

use crate::config::TelemetryConfig;
use crate::types::Result;
use std::collections::{BTreeSet, VecDeque};

/// Tracks peak positions across a bounded window of frames
///
/// With a window of 1 the warm-up gate fills after a single update, after
/// which every current peak is reported consistent with no historical
/// corroboration at all. That boundary behavior matches the deployed
/// firmware tooling and is kept deliberately.
pub struct PeakTracker {
    /// Peak-index sets of the most recent frames, oldest first
    history: VecDeque<Vec<usize>>,
    capacity: usize,
    threshold: u16,
    tolerance: usize,
    num_samples: usize,
    /// Result of the last update, fully replaced each call
    consistent: BTreeSet<usize>,
}

impl PeakTracker {
    /// Create a tracker from the shared telemetry configuration
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            history: VecDeque::with_capacity(config.consistency_window),
            capacity: config.consistency_window,
            threshold: config.threshold,
            tolerance: config.position_tolerance,
            num_samples: config.num_samples,
            consistent: BTreeSet::new(),
        })
    }

    /// Feed one frame of amplitude samples and get the consistent peaks
    ///
    /// A returned index is a peak in the *current* frame (its canonical
    /// position; no averaging over history) that every prior frame in the
    /// window corroborates with a peak within `position_tolerance` bins.
    /// Until the window has filled, the result is empty: no consistency
    /// claim can be made during warm-up.
    pub fn update(&mut self, samples: &[u16]) -> &BTreeSet<usize> {
        debug_assert_eq!(samples.len(), self.num_samples);

        // 1. Threshold the current frame
        let current_peaks: Vec<usize> = samples
            .iter()
            .enumerate()
            .filter(|(_, &v)| v >= self.threshold)
            .map(|(i, _)| i)
            .collect();

        // 2. Push into the window, strict FIFO
        self.history.push_back(current_peaks);
        if self.history.len() > self.capacity {
            self.history.pop_front();
        }

        // 3. Warm-up gate
        if self.history.len() < self.capacity {
            self.consistent = BTreeSet::new();
            return &self.consistent;
        }

        // 4. A current peak is consistent iff every prior frame has at
        //    least one peak inside its tolerance window
        let current = self
            .history
            .back()
            .map(|v| v.as_slice())
            .unwrap_or_default();
        let mut consistent = BTreeSet::new();

        for &index in current {
            let lo = index.saturating_sub(self.tolerance);
            let hi = (index + self.tolerance).min(self.num_samples - 1);

            let corroborated = self
                .history
                .iter()
                .take(self.history.len() - 1)
                .all(|past| past.iter().any(|&p| lo <= p && p <= hi));

            if corroborated {
                consistent.insert(index);
            }
        }

        self.consistent = consistent;
        &self.consistent
    }

    /// The result of the most recent update
    pub fn consistent_indices(&self) -> &BTreeSet<usize> {
        &self.consistent
    }

    /// Number of frames currently buffered
    pub fn frames_buffered(&self) -> usize {
        self.history.len()
    }
}
