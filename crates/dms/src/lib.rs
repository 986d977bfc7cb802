//! Driver Monitoring System (DMS)
//!
//! Per-frame driver state from facial landmarks:
//! - Eye and mouth aspect ratios
//! - Eye closure and yawn classification
//! - Sentinel observations when no face can be assessed
//! - Smoothed alertness tracking

pub mod classifier;
pub mod config;
pub mod detector;
pub mod geometry;
pub mod landmarks;
pub mod observation;
pub mod state;
pub mod synthetic;

pub use classifier::FrameClassifier;
pub use config::{DmsConfig, LandmarkIndices};
pub use detector::FaceLandmarker;
pub use landmarks::{LandmarkFrame, Point};
pub use observation::{EyeAssessment, EyeState, FaceRatios, Observation};
pub use state::{AlertnessLevel, AlertnessTracker};

use ring_buffer::RingBuffer;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Bounded history of a session's observations
pub type DetectionHistory = RingBuffer<Observation>;

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Landmark model not ready")]
    NotReady,

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Landmark {index} missing (frame has {available} points)")]
    LandmarksMissing { index: usize, available: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Driver monitoring module: landmarker plus frame classifier
///
/// Every call to [`DmsModule::analyze`] yields an observation. Anything
/// that prevents an assessment (model still loading, inference failure,
/// no face) produces the sentinel instead of an error.
pub struct DmsModule<L: FaceLandmarker> {
    landmarker: L,
    classifier: FrameClassifier,
    /// Consecutive frames without a usable face
    face_absent_frames: u32,
    /// Consecutive frames where the landmarker failed or was not ready
    unavailable_frames: u32,
}

impl<L: FaceLandmarker> DmsModule<L> {
    /// Create a new DMS module with configuration
    pub fn new(landmarker: L, config: DmsConfig) -> Result<Self, DmsError> {
        Ok(Self {
            landmarker,
            classifier: FrameClassifier::new(config)?,
            face_absent_frames: 0,
            unavailable_frames: 0,
        })
    }

    /// Analyze a single frame for driver state
    pub async fn analyze(&mut self, frame: &L::Frame, timestamp_ms: u64) -> Observation {
        if !self.landmarker.is_ready() {
            self.note_unavailable(&DmsError::NotReady);
            return Observation::no_face(timestamp_ms);
        }

        let landmarks = match self.landmarker.detect(frame, timestamp_ms).await {
            Ok(landmarks) => landmarks,
            Err(e) => {
                self.note_unavailable(&e);
                return Observation::no_face(timestamp_ms);
            }
        };
        if self.unavailable_frames > 0 {
            info!("Landmarker recovered after {} frames", self.unavailable_frames);
            self.unavailable_frames = 0;
        }

        let Some(landmarks) = landmarks else {
            self.face_absent_frames += 1;
            debug!("No face in frame ({} consecutive)", self.face_absent_frames);
            return Observation::no_face(timestamp_ms);
        };

        match self.classifier.classify(&landmarks, timestamp_ms) {
            Ok(observation) => {
                self.face_absent_frames = 0;
                observation
            }
            Err(e) => {
                self.face_absent_frames += 1;
                warn!("Unusable landmark frame: {}", e);
                Observation::no_face(timestamp_ms)
            }
        }
    }

    fn note_unavailable(&mut self, error: &DmsError) {
        self.unavailable_frames += 1;
        if self.unavailable_frames == 1 {
            warn!("Landmarker unavailable, yielding empty observations: {}", error);
        } else {
            debug!("Landmarker still unavailable ({} frames): {}", self.unavailable_frames, error);
        }
    }

    /// Frames in a row without a usable face
    pub fn face_absent_frames(&self) -> u32 {
        self.face_absent_frames
    }

    pub fn landmarker(&self) -> &L {
        &self.landmarker
    }

    /// Reset per-driver counters
    pub fn reset_state(&mut self) {
        self.face_absent_frames = 0;
        self.unavailable_frames = 0;
    }

    /// Release the landmarker
    pub fn release(&mut self) {
        info!("Releasing landmark model");
        self.landmarker.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{FacePose, ScriptStep, ScriptedLandmarker};

    fn module(script: Vec<ScriptStep>) -> DmsModule<ScriptedLandmarker> {
        let config = DmsConfig::default();
        let landmarker = ScriptedLandmarker::new(config.landmarks.clone(), script);
        DmsModule::new(landmarker, config).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_face() {
        let mut dms = module(vec![ScriptStep::Face(FacePose::eyes_closed())]);
        let obs = dms.analyze(&(), 300).await;
        assert_eq!(obs.eyes(), EyeAssessment::Closed);
        assert_eq!(obs.timestamp_ms, 300);
    }

    #[tokio::test]
    async fn test_no_face_and_failure_yield_sentinel() {
        let mut dms = module(vec![
            ScriptStep::Absent,
            ScriptStep::Failure,
            ScriptStep::Face(FacePose::alert()),
        ]);

        let obs = dms.analyze(&(), 0).await;
        assert_eq!(obs, Observation::no_face(0));
        assert_eq!(dms.face_absent_frames(), 1);

        let obs = dms.analyze(&(), 300).await;
        assert_eq!(obs, Observation::no_face(300));

        let obs = dms.analyze(&(), 600).await;
        assert_eq!(obs.eyes(), EyeAssessment::Open);
        assert_eq!(dms.face_absent_frames(), 0);
    }

    #[tokio::test]
    async fn test_not_ready_yields_sentinel() {
        let config = DmsConfig::default();
        let landmarker = ScriptedLandmarker::new(
            config.landmarks.clone(),
            [ScriptStep::Face(FacePose::eyes_closed())],
        )
        .with_warmup(1);
        let mut dms = DmsModule::new(landmarker, config).unwrap();

        assert!(!dms.analyze(&(), 0).await.face_detected);
        assert!(dms.analyze(&(), 300).await.face_detected);
    }

    #[tokio::test]
    async fn test_release() {
        let mut dms = module(vec![ScriptStep::Face(FacePose::alert())]);
        dms.release();
        assert!(dms.landmarker().is_released());
        assert!(!dms.analyze(&(), 0).await.face_detected);
    }
}
