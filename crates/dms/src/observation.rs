//! Per-frame observations

use ring_buffer::Timestamped;
use serde::{Deserialize, Serialize};

/// Eye and mouth state for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EyeState {
    /// Left eye closed
    pub left_closed: bool,
    /// Right eye closed
    pub right_closed: bool,
    /// Mean of both eye ratios below the closed threshold
    pub both_closed: bool,
    /// Detection confidence (0-1), 0 when no face was found
    pub confidence: f32,
    /// Mouth open wide enough to count as a yawn
    pub is_yawning: bool,
}

/// Raw ratios behind a classification, kept for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRatios {
    pub left_ear: Option<f64>,
    pub right_ear: Option<f64>,
    pub mar: Option<f64>,
}

/// What one observation says about the eyes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeAssessment {
    /// No face in the frame, or the landmarker produced nothing
    NoData,
    /// Face found and eyes judged open
    Open,
    /// Face found and both eyes judged closed
    Closed,
}

/// Classification of one processed frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Whether a face was detected
    pub face_detected: bool,

    /// Eye state (all false for a sentinel)
    pub eye_state: EyeState,

    /// Capture time (ms on the session clock)
    pub timestamp_ms: u64,

    /// Ratios the state was derived from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratios: Option<FaceRatios>,
}

impl Observation {
    /// Sentinel for frames without usable landmarks
    pub fn no_face(timestamp_ms: u64) -> Self {
        Self {
            face_detected: false,
            eye_state: EyeState::default(),
            timestamp_ms,
            ratios: None,
        }
    }

    /// Distinguish "no data" from "detected open"
    pub fn eyes(&self) -> EyeAssessment {
        if !self.face_detected {
            EyeAssessment::NoData
        } else if self.eye_state.both_closed {
            EyeAssessment::Closed
        } else {
            EyeAssessment::Open
        }
    }

    /// Face found and mouth open wide
    pub fn is_yawning(&self) -> bool {
        self.face_detected && self.eye_state.is_yawning
    }
}

impl Timestamped for Observation {
    fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}
