//! Scripted driver behaviour for simulated sessions

use dms::synthetic::{FacePose, ScriptStep};
use serde::{Deserialize, Serialize};

/// Frames per scripted blink cycle in the alert scenario
const BLINK_EVERY: usize = 12;
/// Frames with eyes open before the drowsy driver nods off
const DROWSY_ONSET: usize = 10;
/// Frames of a yawn cycle spent alert, then yawning
const YAWN_CYCLE: (usize, usize) = (10, 8);

/// Simulated driver behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Eyes open with short, regular blinks
    Alert,
    /// Alert at first, then eyes stay closed
    #[default]
    Drowsy,
    /// Eyes toggling every frame
    Alternating,
    /// Repeated yawns with the eyes squeezed shut
    Yawning,
}

impl Scenario {
    /// Per-frame script of the given length
    pub fn script(&self, frames: usize) -> Vec<ScriptStep> {
        (0..frames).map(|k| ScriptStep::Face(self.pose(k))).collect()
    }

    fn pose(&self, frame: usize) -> FacePose {
        match self {
            Scenario::Alert if frame % BLINK_EVERY == BLINK_EVERY - 1 => FacePose::eyes_closed(),
            Scenario::Alert => FacePose::alert(),
            Scenario::Drowsy if frame < DROWSY_ONSET => FacePose::alert(),
            Scenario::Drowsy => FacePose::eyes_closed(),
            Scenario::Alternating if frame % 2 == 1 => FacePose::eyes_closed(),
            Scenario::Alternating => FacePose::alert(),
            Scenario::Yawning => {
                let (alert, yawning) = YAWN_CYCLE;
                if frame % (alert + yawning) < alert {
                    FacePose::alert()
                } else {
                    FacePose {
                        mouth_openness: 0.9,
                        ..FacePose::eyes_closed()
                    }
                }
            }
        }
    }
}
