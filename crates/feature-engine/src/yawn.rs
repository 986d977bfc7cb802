//! Sustained yawn detection

use dms::Observation;

use crate::assessed;

/// Flags yawning across a meaningful share of a window
#[derive(Debug, Clone, Copy)]
pub struct YawnDetector {
    /// Percentage of assessed frames that must show a yawn (exclusive)
    pub threshold_pct: f64,
}

impl YawnDetector {
    pub fn new(threshold_pct: f64) -> Self {
        Self { threshold_pct }
    }

    /// Percentage of assessed observations showing a yawn
    pub fn percentage(window: &[Observation]) -> f64 {
        let (yawning, total) = assessed(window).fold((0usize, 0usize), |(yawning, total), o| {
            (yawning + usize::from(o.eye_state.is_yawning), total + 1)
        });

        if total == 0 {
            return 0.0;
        }
        100.0 * yawning as f64 / total as f64
    }

    pub fn is_sustained(&self, window: &[Observation]) -> bool {
        Self::percentage(window) > self.threshold_pct
    }
}

impl Default for YawnDetector {
    fn default() -> Self {
        Self::new(25.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::observation;

    #[test]
    fn test_single_frame_is_noise() {
        let mut window: Vec<_> = (0..10).map(|i| observation(i * 100, false, false)).collect();
        window[4].eye_state.is_yawning = true;
        assert!(!YawnDetector::default().is_sustained(&window));
    }

    #[test]
    fn test_quarter_is_not_enough() {
        // Exactly 25% does not pass the strict threshold
        let window: Vec<_> = (0..8)
            .map(|i| observation(i * 100, false, i < 2))
            .collect();
        assert_eq!(YawnDetector::percentage(&window), 25.0);
        assert!(!YawnDetector::default().is_sustained(&window));
    }

    #[test]
    fn test_sustained() {
        let window: Vec<_> = (0..10)
            .map(|i| observation(i * 100, false, i >= 6))
            .collect();
        assert!(YawnDetector::default().is_sustained(&window));
    }

    #[test]
    fn test_empty_window() {
        assert!(!YawnDetector::default().is_sustained(&[]));
    }
}
