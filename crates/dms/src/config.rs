//! DMS configuration

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Number of points in the face mesh topology the landmark indices refer to
pub const FACE_MESH_POINTS: usize = 468;

/// Landmark indices for the eye and mouth contours.
///
/// Eye contours are ordered outer corner, two upper-lid points, inner
/// corner, two lower-lid points, so that point 1 pairs with point 5 and
/// point 2 with point 4. The mouth contour is the two corners, three
/// upper-lip points, one unpaired centre point, then the three lower-lip
/// points paired with the upper ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkIndices {
    pub left_eye: [usize; 6],
    pub right_eye: [usize; 6],
    pub mouth: [usize; 9],
}

impl Default for LandmarkIndices {
    fn default() -> Self {
        Self {
            left_eye: [362, 385, 387, 263, 373, 380],
            right_eye: [33, 160, 158, 133, 153, 144],
            mouth: [61, 291, 13, 14, 17, 18, 308, 402, 317],
        }
    }
}

impl LandmarkIndices {
    /// Highest index referenced by any contour
    pub fn max_index(&self) -> usize {
        self.left_eye
            .iter()
            .chain(self.right_eye.iter())
            .chain(self.mouth.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Eye aspect ratio below which an eye counts as closed
    pub eye_closed_ear: f64,

    /// Mouth aspect ratio above which the mouth counts as yawning
    pub yawn_mar: f64,

    /// Confidence reported for frames where a face was found
    pub detected_confidence: f32,

    /// Contour indices into the landmark frame
    pub landmarks: LandmarkIndices,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            eye_closed_ear: 0.18,
            yawn_mar: 0.42,
            detected_confidence: 0.95,
            landmarks: LandmarkIndices::default(),
        }
    }
}

impl DmsConfig {
    /// Create strict config (eyes count as closed earlier, smaller yawns count)
    pub fn strict() -> Self {
        Self {
            eye_closed_ear: 0.20,
            yawn_mar: 0.38,
            ..Default::default()
        }
    }

    /// Create lenient config (only clearly closed eyes and wide yawns count)
    pub fn lenient() -> Self {
        Self {
            eye_closed_ear: 0.16,
            yawn_mar: 0.48,
            ..Default::default()
        }
    }

    /// Check thresholds and confidence are usable
    pub fn validate(&self) -> Result<(), DmsError> {
        if !(self.eye_closed_ear.is_finite() && self.eye_closed_ear > 0.0) {
            return Err(DmsError::Config(format!(
                "eye_closed_ear must be positive, got {}",
                self.eye_closed_ear
            )));
        }
        if !(self.yawn_mar.is_finite() && self.yawn_mar > 0.0) {
            return Err(DmsError::Config(format!(
                "yawn_mar must be positive, got {}",
                self.yawn_mar
            )));
        }
        if !(0.0..=1.0).contains(&self.detected_confidence) {
            return Err(DmsError::Config(format!(
                "detected_confidence must be within [0, 1], got {}",
                self.detected_confidence
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_indices_fit_face_mesh() {
        let indices = LandmarkIndices::default();
        assert!(indices.max_index() < FACE_MESH_POINTS);
    }

    #[test]
    fn test_presets_validate() {
        assert!(DmsConfig::default().validate().is_ok());
        assert!(DmsConfig::strict().validate().is_ok());
        assert!(DmsConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_confidence() {
        let config = DmsConfig {
            detected_confidence: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DmsError::Config(_))));
    }
}
