//! Projecting corrected fixations onto the world video.

use crate::fixation::Fixation;
use crate::ledger::CorrectionLedger;
use crate::options::MarkerStyle;
use crate::shared_types::{NormPos, Offset};
use crate::timeline::Frame;

/// A position in frame pixels, origin at the top left.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenPoint {
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
}

/// Map a normalized position to pixels in a `width` x `height` frame.
///
/// Normalized coordinates grow upwards; with `flip_y` the result is in image
/// coordinates, which grow downwards.
pub fn denormalize(pos: NormPos, width: f64, height: f64, flip_y: bool) -> ScreenPoint {
    let y = if flip_y { 1.0 - pos.y } else { pos.y };
    ScreenPoint { x: pos.x * width, y: y * height }
}

/// Compute where each fixation in `window` should be drawn.
///
/// The display position of a fixation is its recorded position plus its
/// ledger correction plus the `pending` correction. Fixations with a confidence
/// below `min_confidence` are skipped.
pub fn overlay_points<'a>(
    frame: &Frame,
    window: impl IntoIterator<Item = &'a Fixation>,
    ledger: &CorrectionLedger,
    pending: Offset,
    min_confidence: f64,
) -> Vec<ScreenPoint> {
    let (width, height) = (frame.width as f64, frame.height as f64);
    window
        .into_iter()
        .filter(|fixation| fixation.confidence >= min_confidence)
        .map(|fixation| {
            let pos = fixation.norm_pos + pending + ledger.get(fixation.id);
            denormalize(pos, width, height, true)
        })
        .collect()
}

#[cfg(feature = "kurbo")]
impl From<ScreenPoint> for kurbo::Point {
    fn from(src: ScreenPoint) -> kurbo::Point {
        kurbo::Point::new(src.x, src.y)
    }
}

#[cfg(feature = "kurbo")]
impl MarkerStyle {
    /// The circle to draw for a marker at `point`.
    pub fn circle_at(&self, point: ScreenPoint) -> kurbo::Circle {
        kurbo::Circle::new(point, self.radius)
    }
}

impl MarkerStyle {
    /// `true` if `pixel` falls inside the marker drawn at `center`.
    pub fn contains(&self, center: ScreenPoint, pixel: ScreenPoint) -> bool {
        let (dx, dy) = (pixel.x - center.x, pixel.y - center.y);
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_vertical_axis() {
        let point = denormalize(NormPos::new(0.25, 0.25), 1280.0, 720.0, true);
        assert_eq!(point, ScreenPoint { x: 320.0, y: 540.0 });
        let point = denormalize(NormPos::new(0.25, 0.25), 1280.0, 720.0, false);
        assert_eq!(point, ScreenPoint { x: 320.0, y: 180.0 });
    }

    #[test]
    fn points_include_pending_and_ledger() {
        let frame = Frame::new(0, 100, 100);
        let fixations = vec![
            Fixation::new(0, NormPos::new(0.5, 0.5), 0.9),
            Fixation::new(1, NormPos::new(0.25, 0.75), 0.9),
            Fixation::new(2, NormPos::new(0.5, 0.5), 0.3),
        ];
        let mut ledger = CorrectionLedger::new();
        ledger.add(1, Offset::new(0.25, 0.0));

        let points = overlay_points(&frame, &fixations, &ledger, Offset::new(0.0, 0.25), 0.6);
        assert_eq!(points, vec![ScreenPoint { x: 50.0, y: 25.0 }, ScreenPoint { x: 50.0, y: 0.0 }]);
    }

    #[test]
    fn marker_hit_test() {
        let style = MarkerStyle::default();
        let center = ScreenPoint { x: 100.0, y: 100.0 };
        assert!(style.contains(center, ScreenPoint { x: 112.0, y: 116.0 }));
        assert!(!style.contains(center, ScreenPoint { x: 121.0, y: 100.0 }));
    }

    #[cfg(feature = "kurbo")]
    #[test]
    fn kurbo_circle() {
        let circle = MarkerStyle::default().circle_at(ScreenPoint { x: 3.0, y: 4.0 });
        assert_eq!(circle.center, kurbo::Point::new(3.0, 4.0));
        assert_eq!(circle.radius, 20.0);
    }
}
