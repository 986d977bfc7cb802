//! Eye and mouth aspect ratios
//!
//! Both ratios divide vertical spans by a horizontal reference span. A
//! horizontal span of (near) zero makes the ratio meaningless, so both
//! functions return `None` for degenerate contours.

use crate::landmarks::Point;

/// Horizontal spans shorter than this are treated as degenerate
const MIN_HORIZONTAL_SPAN: f64 = 1e-9;

/// Eye Aspect Ratio over a 6-point eye contour.
///
/// `(|p1 - p5| + |p2 - p4|) / (2 * |p0 - p3|)`; shrinks toward 0 as the
/// eye closes.
pub fn eye_aspect_ratio(eye: &[Point; 6]) -> Option<f64> {
    let vertical_a = eye[1].distance(&eye[5]);
    let vertical_b = eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);

    ratio(vertical_a + vertical_b, 2.0 * horizontal)
}

/// Mouth Aspect Ratio over a 9-point mouth contour.
///
/// Mean of the three lip-pair distances (2-6, 3-7, 4-8) divided by the
/// corner-to-corner distance (0-1); grows as the mouth opens.
pub fn mouth_aspect_ratio(mouth: &[Point; 9]) -> Option<f64> {
    let vertical = mouth[2].distance(&mouth[6])
        + mouth[3].distance(&mouth[7])
        + mouth[4].distance(&mouth[8]);
    let horizontal = mouth[0].distance(&mouth[1]);

    ratio(vertical, 3.0 * horizontal)
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if !denominator.is_finite() || denominator < MIN_HORIZONTAL_SPAN {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}
