//! Inference boundary for facial landmarks

use std::future::Future;

use crate::landmarks::LandmarkFrame;
use crate::DmsError;

/// A face-landmark model, treated as a black box.
///
/// Given one video frame it yields zero or one sets of normalized landmarks
/// in the face-mesh topology. Implementations may be slow; `detect` is
/// awaited once per polling tick.
pub trait FaceLandmarker: Send {
    /// Handle to the frame being analyzed
    type Frame: Send + Sync;

    /// Whether the model finished initializing
    fn is_ready(&mut self) -> bool;

    /// Detect landmarks on one frame; `Ok(None)` means no face in view
    fn detect(
        &mut self,
        frame: &Self::Frame,
        timestamp_ms: u64,
    ) -> impl Future<Output = Result<Option<LandmarkFrame>, DmsError>> + Send;

    /// Release the model and any capture resources
    fn release(&mut self) {}
}
