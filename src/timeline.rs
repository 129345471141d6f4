//! World-frame timestamps and the temporal windows they imply.

/// A half-open interval of recording time, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    /// Inclusive start of the window.
    pub start: f64,
    /// Exclusive end of the window.
    pub end: f64,
}

impl TimeWindow {
    /// Returns a new `TimeWindow`.
    pub fn new(start: f64, end: f64) -> Self {
        TimeWindow { start, end }
    }

    /// `true` if the closed interval `[start, stop]` overlaps this window.
    pub fn overlaps(&self, start: f64, stop: f64) -> bool {
        stop >= self.start && start < self.end
    }
}

/// A single world video frame, as handed to the corrector by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Index of the frame in the world video.
    pub index: usize,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl Frame {
    /// Returns a new `Frame`.
    pub fn new(index: usize, width: u32, height: u32) -> Self {
        Frame { index, width, height }
    }
}

/// The timestamps of every world frame in a recording, in ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    timestamps: Vec<f64>,
}

impl Timeline {
    /// Returns a new `Timeline`.
    pub fn new(timestamps: Vec<f64>) -> Self {
        Timeline { timestamps }
    }

    /// The number of frames.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// `true` if the timeline has no frames.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The frame timestamps.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Returns the window of time that belongs to the frame at `index`.
    ///
    /// The window reaches halfway to the neighbouring frames on either side; the
    /// first and last frames extend to negative and positive infinity.
    /// Returns `None` if `index` is out of bounds.
    pub fn enclosing_window(&self, index: usize) -> Option<TimeWindow> {
        let now = *self.timestamps.get(index)?;
        let before = match index {
            0 => f64::NEG_INFINITY,
            _ => self.timestamps[index - 1],
        };
        let after = self.timestamps.get(index + 1).copied().unwrap_or(f64::INFINITY);
        Some(TimeWindow { start: (now + before) / 2.0, end: (after + now) / 2.0 })
    }
}
