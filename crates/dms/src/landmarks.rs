//! Facial landmark frames

use serde::{Deserialize, Serialize};

use crate::config::LandmarkIndices;
use crate::DmsError;

/// Normalized 2-D image point (x, y in [0, 1])
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// Landmarks for one video frame, indexed by the face mesh topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    points: Vec<Point>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Gather the points at `indices`, in order
    pub fn select<const N: usize>(&self, indices: &[usize; N]) -> Result<[Point; N], DmsError> {
        let mut out = [Point::default(); N];
        for (slot, &idx) in out.iter_mut().zip(indices.iter()) {
            *slot = *self.points.get(idx).ok_or(DmsError::LandmarksMissing {
                index: idx,
                available: self.points.len(),
            })?;
        }
        Ok(out)
    }

    /// Eye and mouth contours for the configured topology
    pub fn contours(&self, indices: &LandmarkIndices) -> Result<FaceContours, DmsError> {
        Ok(FaceContours {
            left_eye: self.select(&indices.left_eye)?,
            right_eye: self.select(&indices.right_eye)?,
            mouth: self.select(&indices.mouth)?,
        })
    }
}

/// Contours extracted from one landmark frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceContours {
    pub left_eye: [Point; 6],
    pub right_eye: [Point; 6],
    pub mouth: [Point; 9],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_in_order() {
        let frame = LandmarkFrame::new((0..10).map(|i| Point::new(i as f32, 0.0)).collect());
        let picked = frame.select(&[3, 1, 7]).unwrap();
        assert_eq!(picked[0].x, 3.0);
        assert_eq!(picked[1].x, 1.0);
        assert_eq!(picked[2].x, 7.0);
    }

    #[test]
    fn test_select_out_of_range() {
        let frame = LandmarkFrame::new(vec![Point::default(); 10]);
        let err = frame.select(&[2, 10]).unwrap_err();
        assert!(matches!(
            err,
            DmsError::LandmarksMissing {
                index: 10,
                available: 10
            }
        ));
    }

    #[test]
    fn test_short_frame_has_no_contours() {
        let frame = LandmarkFrame::new(vec![Point::default(); 100]);
        assert!(frame.contours(&LandmarkIndices::default()).is_err());
    }
}
