//! Eye closure percentage (PERCLOS-style)

use dms::Observation;

use crate::assessed;

/// Share of a window spent with both eyes closed
#[derive(Debug, Clone, Copy)]
pub struct EyeClosure;

impl EyeClosure {
    /// `100 × closed / assessed`; 0 for a window without assessments
    pub fn percentage(window: &[Observation]) -> f64 {
        let (closed, total) = assessed(window).fold((0usize, 0usize), |(closed, total), o| {
            (closed + usize::from(o.eye_state.both_closed), total + 1)
        });

        if total == 0 {
            return 0.0;
        }
        100.0 * closed as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::observation;

    #[test]
    fn test_all_closed() {
        let window: Vec<_> = (0..7).map(|i| observation(i * 100, true, false)).collect();
        assert_eq!(EyeClosure::percentage(&window), 100.0);
    }

    #[test]
    fn test_all_open() {
        let window: Vec<_> = (0..7).map(|i| observation(i * 100, false, false)).collect();
        assert_eq!(EyeClosure::percentage(&window), 0.0);
    }

    #[test]
    fn test_empty() {
        let pct = EyeClosure::percentage(&[]);
        assert_eq!(pct, 0.0);
        assert!(!pct.is_nan());
    }

    #[test]
    fn test_sentinels_do_not_count() {
        let window = vec![
            observation(0, true, false),
            Observation::no_face(100),
            Observation::no_face(200),
            observation(300, false, false),
        ];
        assert_eq!(EyeClosure::percentage(&window), 50.0);

        let only_sentinels = vec![Observation::no_face(0), Observation::no_face(100)];
        assert_eq!(EyeClosure::percentage(&only_sentinels), 0.0);
    }
}
