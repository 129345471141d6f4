//! The in-memory fixation collection of a recording.

use crate::error::Error;
use crate::fixation::Fixation;
use crate::timeline::{TimeWindow, Timeline};

/// A capability for looking up the fixations shown on a given world frame.
///
/// The corrector only ever needs this single query, which lets it be driven by
/// a real recording ([`RecordingWindow`]) or by anything else that can answer it.
pub trait FixationWindow {
    /// Returns the fixations that temporally enclose the frame at `frame_index`.
    ///
    /// An unknown frame yields an empty list.
    fn fixations_at(&self, frame_index: usize) -> Vec<&Fixation>;
}

/// An ordered collection of fixations, each with a start and stop timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixationSet {
    fixations: Vec<Fixation>,
    start_timestamps: Vec<f64>,
    stop_timestamps: Vec<f64>,
}

impl FixationSet {
    /// Create a new `FixationSet`.
    ///
    /// Returns an error if the number of start or stop timestamps differs from the
    /// number of fixations.
    pub fn new(
        fixations: Vec<Fixation>,
        start_timestamps: Vec<f64>,
        stop_timestamps: Vec<f64>,
    ) -> Result<Self, Error> {
        for timestamps in [&start_timestamps, &stop_timestamps] {
            if timestamps.len() != fixations.len() {
                return Err(Error::TimestampCountMismatch {
                    fixations: fixations.len(),
                    timestamps: timestamps.len(),
                });
            }
        }
        Ok(FixationSet { fixations, start_timestamps, stop_timestamps })
    }

    /// The number of fixations in the collection.
    pub fn len(&self) -> usize {
        self.fixations.len()
    }

    /// `true` if there are no fixations.
    pub fn is_empty(&self) -> bool {
        self.fixations.is_empty()
    }

    /// Returns the fixation at `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<&Fixation> {
        self.fixations.get(index)
    }

    /// Iterate over all fixations, in order.
    pub fn iter(&self) -> impl Iterator<Item = &Fixation> {
        self.fixations.iter()
    }

    /// The start timestamp of each fixation.
    pub fn start_timestamps(&self) -> &[f64] {
        &self.start_timestamps
    }

    /// The stop timestamp of each fixation.
    pub fn stop_timestamps(&self) -> &[f64] {
        &self.stop_timestamps
    }

    /// Returns all fixations that overlap `window`.
    pub fn by_ts_window(&self, window: TimeWindow) -> Vec<&Fixation> {
        self.fixations
            .iter()
            .zip(self.start_timestamps.iter().zip(&self.stop_timestamps))
            .filter(|(_, (start, stop))| window.overlaps(**start, **stop))
            .map(|(fixation, _)| fixation)
            .collect()
    }
}

impl<'a> IntoIterator for &'a FixationSet {
    type Item = &'a Fixation;
    type IntoIter = std::slice::Iter<'a, Fixation>;

    fn into_iter(self) -> Self::IntoIter {
        self.fixations.iter()
    }
}

/// Answers [`FixationWindow`] queries from a recording's world timeline and
/// its fixations.
#[derive(Debug, Clone, Copy)]
pub struct RecordingWindow<'a> {
    timeline: &'a Timeline,
    fixations: &'a FixationSet,
}

impl<'a> RecordingWindow<'a> {
    /// Returns a new `RecordingWindow`.
    pub fn new(timeline: &'a Timeline, fixations: &'a FixationSet) -> Self {
        RecordingWindow { timeline, fixations }
    }
}

impl FixationWindow for RecordingWindow<'_> {
    fn fixations_at(&self, frame_index: usize) -> Vec<&Fixation> {
        match self.timeline.enclosing_window(frame_index) {
            Some(window) => self.fixations.by_ts_window(window),
            None => Vec::new(),
        }
    }
}
