//! Configuration for a [`FixationCorrector`].
//!
//! [`FixationCorrector`]: crate::FixationCorrector

use crate::shared_types::{Color, Offset};

/// The bounds and granularity of the correction sliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
    /// Values are snapped to multiples of this step. Zero disables snapping.
    pub step: f64,
}

impl Default for SliderRange {
    fn default() -> Self {
        SliderRange { min: -0.2, max: 0.2, step: 0.001 }
    }
}

impl SliderRange {
    /// Clamp `value` into the range and snap it to the nearest step.
    ///
    /// Non-finite values are treated as zero.
    pub fn constrain(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0f64.clamp(self.min, self.max);
        }
        let snapped = match self.step {
            step if step > 0.0 => (value / step).round() * step,
            _ => value,
        };
        snapped.clamp(self.min, self.max)
    }
}

/// How corrected fixations are drawn on top of the world video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    /// Circle radius in pixels.
    pub radius: f64,
    /// Fill color of the circle.
    pub fill: Color,
    /// Outline color of the circle.
    pub stroke: Color,
    /// Outline width in pixels.
    pub stroke_width: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        MarkerStyle {
            radius: 20.0,
            fill: Color::rgba(0.0, 0.3, 1.0, 0.1),
            stroke: Color::rgba(0.0, 0.3, 1.0, 0.5),
            stroke_width: 1.0,
        }
    }
}

/// Options for a [`FixationCorrector`].
///
/// You construct `CorrectorOptions` using builder semantics:
///
/// ```
/// use fixcorr::{CorrectorOptions, SliderRange};
///
/// let options = CorrectorOptions::default()
///     .min_confidence(0.8)
///     .slider(SliderRange { min: -0.1, max: 0.1, step: 0.0005 });
/// ```
///
/// [`FixationCorrector`]: crate::FixationCorrector
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct CorrectorOptions {
    /// Fixations below this confidence are not drawn.
    pub min_confidence: f64,
    /// Bounds of the pending correction.
    pub slider: SliderRange,
    /// Appearance of the overlay markers.
    pub marker: MarkerStyle,
}

impl Default for CorrectorOptions {
    fn default() -> Self {
        CorrectorOptions {
            min_confidence: 0.6,
            slider: SliderRange::default(),
            marker: MarkerStyle::default(),
        }
    }
}

impl CorrectorOptions {
    /// Builder-style method to set the minimum confidence of drawn fixations.
    pub fn min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Builder-style method to set the slider bounds.
    pub fn slider(mut self, slider: SliderRange) -> Self {
        self.slider = slider;
        self
    }

    /// Builder-style method to set the marker appearance.
    pub fn marker(mut self, marker: MarkerStyle) -> Self {
        self.marker = marker;
        self
    }
}

/// The state a host keeps to restore a corrector between sessions.
///
/// A pending correction is accepted when restoring, but never written out:
/// it only lives for the duration of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectorSettings {
    /// Pending horizontal correction.
    #[serde(default, skip_serializing)]
    pub x_corr: f64,
    /// Pending vertical correction.
    #[serde(default, skip_serializing)]
    pub y_corr: f64,
}

impl CorrectorSettings {
    pub(crate) fn pending(&self) -> Offset {
        Offset::new(self.x_corr, self.y_corr)
    }
}
