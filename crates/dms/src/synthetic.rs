//! Synthetic landmark frames and a scripted landmarker
//!
//! Stands in for a real face-landmark model in tests and in the demo
//! binary. Frames are laid out so that EAR = 0.30 × eye openness and
//! MAR = 0.05 + 0.65 × mouth openness.

use std::collections::VecDeque;
use std::future::Future;

use crate::config::{LandmarkIndices, FACE_MESH_POINTS};
use crate::detector::FaceLandmarker;
use crate::landmarks::{LandmarkFrame, Point};
use crate::DmsError;

const EYE_WIDTH: f32 = 0.06;
const MAX_EAR: f32 = 0.30;
const MOUTH_WIDTH: f32 = 0.20;
const MIN_MAR: f32 = 0.05;
const MAR_RANGE: f32 = 0.65;

/// Openness of each eye and the mouth, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePose {
    pub left_eye_openness: f32,
    pub right_eye_openness: f32,
    pub mouth_openness: f32,
}

impl FacePose {
    pub fn alert() -> Self {
        Self {
            left_eye_openness: 1.0,
            right_eye_openness: 1.0,
            mouth_openness: 0.0,
        }
    }

    pub fn eyes_closed() -> Self {
        Self {
            left_eye_openness: 0.15,
            right_eye_openness: 0.15,
            mouth_openness: 0.0,
        }
    }

    pub fn yawning() -> Self {
        Self {
            mouth_openness: 0.9,
            ..Self::alert()
        }
    }
}

/// Build a full face-mesh frame for `pose` using the given topology
pub fn synthetic_face(indices: &LandmarkIndices, pose: FacePose) -> LandmarkFrame {
    let size = FACE_MESH_POINTS.max(indices.max_index() + 1);
    let mut points = vec![Point::new(0.5, 0.5); size];

    place_eye(&mut points, &indices.left_eye, 0.62, 0.40, pose.left_eye_openness);
    place_eye(&mut points, &indices.right_eye, 0.38, 0.40, pose.right_eye_openness);
    place_mouth(&mut points, &indices.mouth, 0.50, 0.72, pose.mouth_openness);

    LandmarkFrame::new(points)
}

fn place_eye(points: &mut [Point], idx: &[usize; 6], cx: f32, cy: f32, openness: f32) {
    let half_w = EYE_WIDTH / 2.0;
    let half_h = MAX_EAR * EYE_WIDTH * openness.clamp(0.0, 1.0) / 2.0;
    let inner_x = EYE_WIDTH / 6.0;

    points[idx[0]] = Point::new(cx - half_w, cy);
    points[idx[1]] = Point::new(cx - inner_x, cy - half_h);
    points[idx[2]] = Point::new(cx + inner_x, cy - half_h);
    points[idx[3]] = Point::new(cx + half_w, cy);
    points[idx[4]] = Point::new(cx + inner_x, cy + half_h);
    points[idx[5]] = Point::new(cx - inner_x, cy + half_h);
}

fn place_mouth(points: &mut [Point], idx: &[usize; 9], cx: f32, cy: f32, openness: f32) {
    let half_w = MOUTH_WIDTH / 2.0;
    let mar = MIN_MAR + MAR_RANGE * openness.clamp(0.0, 1.0);
    let half_gap = mar * MOUTH_WIDTH / 2.0;
    let quarter = MOUTH_WIDTH / 4.0;

    points[idx[0]] = Point::new(cx - half_w, cy);
    points[idx[1]] = Point::new(cx + half_w, cy);
    for (k, dx) in [-quarter, 0.0, quarter].into_iter().enumerate() {
        points[idx[2 + k]] = Point::new(cx + dx, cy - half_gap);
        points[idx[6 + k]] = Point::new(cx + dx, cy + half_gap);
    }
}

/// What the scripted landmarker returns for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptStep {
    /// A face in the given pose
    Face(FacePose),
    /// No face in view
    Absent,
    /// The landmarker fails for this frame
    Failure,
}

/// Landmarker that replays a fixed script, one step per `detect` call
#[derive(Debug, Clone)]
pub struct ScriptedLandmarker {
    indices: LandmarkIndices,
    script: VecDeque<ScriptStep>,
    /// Step repeated once the script runs out
    tail: ScriptStep,
    /// Calls that report not-ready before the script starts
    warmup_calls: u32,
    released: bool,
}

impl ScriptedLandmarker {
    pub fn new(indices: LandmarkIndices, script: impl IntoIterator<Item = ScriptStep>) -> Self {
        let script: VecDeque<_> = script.into_iter().collect();
        let tail = script.back().copied().unwrap_or(ScriptStep::Absent);
        Self {
            indices,
            script,
            tail,
            warmup_calls: 0,
            released: false,
        }
    }

    /// Report not-ready for the first `calls` readiness checks
    pub fn with_warmup(mut self, calls: u32) -> Self {
        self.warmup_calls = calls;
        self
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn next_step(&mut self) -> ScriptStep {
        self.script.pop_front().unwrap_or(self.tail)
    }
}

impl FaceLandmarker for ScriptedLandmarker {
    type Frame = ();

    fn is_ready(&mut self) -> bool {
        if self.released {
            return false;
        }
        if self.warmup_calls > 0 {
            self.warmup_calls -= 1;
            return false;
        }
        true
    }

    fn detect(
        &mut self,
        _frame: &Self::Frame,
        timestamp_ms: u64,
    ) -> impl Future<Output = Result<Option<LandmarkFrame>, DmsError>> + Send {
        let result = match self.next_step() {
            ScriptStep::Face(pose) => Ok(Some(synthetic_face(&self.indices, pose))),
            ScriptStep::Absent => Ok(None),
            ScriptStep::Failure => Err(DmsError::Inference(format!(
                "scripted failure at {}ms",
                timestamp_ms
            ))),
        };
        std::future::ready(result)
    }

    fn release(&mut self) {
        self.released = true;
    }
}
