//! Per-frame and per-session class counts.

use std::collections::BTreeMap;
use std::fmt;

use crate::detect::Detection;
use crate::labels::PpeClass;

/// Text shown when a frame has no detections.
pub const NO_DETECTIONS: &str = "No PPE detected";

/// Count of detections by class for a single frame.
///
/// Entries iterate in class-index order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameTally {
    counts: BTreeMap<PpeClass, usize>,
}

impl FrameTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally built from scratch for one frame's detections.
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut tally = Self::new();
        for det in detections {
            tally.record(det.class);
        }
        tally
    }

    pub fn record(&mut self, class: PpeClass) {
        *self.counts.entry(class).or_insert(0) += 1;
    }

    pub fn get(&self, class: PpeClass) -> usize {
        self.counts.get(&class).copied().unwrap_or(0)
    }

    /// Number of distinct classes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PpeClass, usize)> + '_ {
        self.counts.iter().map(|(class, count)| (*class, *count))
    }

    /// Count of "NO-*" detections.
    pub fn violations(&self) -> usize {
        self.iter()
            .filter(|(class, _)| class.is_violation())
            .map(|(_, count)| count)
            .sum()
    }

    /// `label: count` lines, or the no-detections indicator.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return NO_DETECTIONS.to_string();
        }
        self.iter()
            .map(|(class, count)| format!("{}: {}", class, count))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for FrameTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (class, count)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", class, count)?;
        }
        f.write_str("}")
    }
}

/// Session-wide totals, accumulated alongside the per-frame tallies.
///
/// This never feeds back into a frame's own tally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionTally {
    totals: FrameTally,
    frames_with_detections: u64,
}

impl SessionTally {
    pub fn absorb(&mut self, frame: &FrameTally) {
        if frame.is_empty() {
            return;
        }
        self.frames_with_detections += 1;
        for (class, count) in frame.iter() {
            *self.totals.counts.entry(class).or_insert(0) += count;
        }
    }

    pub fn totals(&self) -> &FrameTally {
        &self.totals
    }

    pub fn frames_with_detections(&self) -> u64 {
        self.frames_with_detections
    }
}
