//! Per-frame eye and mouth classification

use tracing::debug;

use crate::geometry::{eye_aspect_ratio, mouth_aspect_ratio};
use crate::landmarks::LandmarkFrame;
use crate::observation::{EyeState, FaceRatios, Observation};
use crate::{DmsConfig, DmsError};

/// Turns one landmark frame into an [`Observation`]
#[derive(Debug, Clone)]
pub struct FrameClassifier {
    config: DmsConfig,
}

impl FrameClassifier {
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    /// Classify a frame's landmarks.
    ///
    /// A degenerate eye contour counts as open and a degenerate mouth as
    /// not yawning, so bad geometry never pushes toward an alert.
    pub fn classify(
        &self,
        landmarks: &LandmarkFrame,
        timestamp_ms: u64,
    ) -> Result<Observation, DmsError> {
        let contours = landmarks.contours(&self.config.landmarks)?;

        let left_ear = eye_aspect_ratio(&contours.left_eye);
        let right_ear = eye_aspect_ratio(&contours.right_eye);
        let mar = mouth_aspect_ratio(&contours.mouth);

        let threshold = self.config.eye_closed_ear;
        let left_closed = left_ear.is_some_and(|ear| ear < threshold);
        let right_closed = right_ear.is_some_and(|ear| ear < threshold);
        let both_closed = match (left_ear, right_ear) {
            (Some(l), Some(r)) => (l + r) / 2.0 < threshold,
            _ => false,
        };
        let is_yawning = mar.is_some_and(|m| m > self.config.yawn_mar);

        if both_closed || is_yawning {
            debug!(
                left_ear = ?left_ear,
                right_ear = ?right_ear,
                mar = ?mar,
                both_closed,
                is_yawning,
                "Drowsiness cue in frame"
            );
        }

        Ok(Observation {
            face_detected: true,
            eye_state: EyeState {
                left_closed,
                right_closed,
                both_closed,
                confidence: self.config.detected_confidence,
                is_yawning,
            },
            timestamp_ms,
            ratios: Some(FaceRatios {
                left_ear,
                right_ear,
                mar,
            }),
        })
    }
}

impl Default for FrameClassifier {
    fn default() -> Self {
        Self {
            config: DmsConfig::default(),
        }
    }
}
