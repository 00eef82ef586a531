// Linear mapping between two closed numeric intervals
// Used to translate between the public volume scale and the engine scale

use crate::error::{PlayerError, Result};

/// Maps values from a source interval onto a target interval.
///
/// The map is exact at both interval boundaries. Values outside the source
/// interval extrapolate linearly; callers that need clamping clamp the
/// result themselves.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    source_min: f64,
    source_max: f64,
    target_min: f64,
    target_max: f64,
}

impl Normalizer {
    /// Create a normalizer for `[source_min, source_max] -> [target_min, target_max]`.
    ///
    /// Fails when the source interval is empty or inverted, or when the
    /// target interval is inverted.
    pub fn new(source_min: f64, source_max: f64, target_min: f64, target_max: f64) -> Result<Self> {
        if source_min >= source_max {
            return Err(PlayerError::InvalidArgument(format!(
                "source interval [{}, {}] is empty or inverted",
                source_min, source_max
            )));
        }
        if target_min > target_max {
            return Err(PlayerError::InvalidArgument(format!(
                "target interval [{}, {}] is inverted",
                target_min, target_max
            )));
        }
        Ok(Self {
            source_min,
            source_max,
            target_min,
            target_max,
        })
    }

    pub fn normalize(&self, value: f64) -> f64 {
        let t = (value - self.source_min) / (self.source_max - self.source_min);
        self.target_min * (1.0 - t) + self.target_max * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_map_exactly() {
        let n = Normalizer::new(0.0, 100.0, 0.0, 1.0).unwrap();
        assert_eq!(n.normalize(0.0), 0.0);
        assert_eq!(n.normalize(100.0), 1.0);

        let n = Normalizer::new(-100.0, 100.0, -1.0, 1.0).unwrap();
        assert_eq!(n.normalize(-100.0), -1.0);
        assert_eq!(n.normalize(100.0), 1.0);
    }

    #[test]
    fn midpoint_maps_to_midpoint() {
        let n = Normalizer::new(0.0, 100.0, 0.0, 1.0).unwrap();
        assert!((n.normalize(50.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn reverse_direction_round_trips() {
        let forward = Normalizer::new(0.0, 100.0, 0.0, 1.0).unwrap();
        let back = Normalizer::new(0.0, 1.0, 0.0, 100.0).unwrap();
        for volume in 0..=100 {
            let engine = forward.normalize(volume as f64);
            let restored = back.normalize(engine).round() as i64;
            assert_eq!(restored, volume);
        }
    }

    #[test]
    fn empty_source_interval_is_rejected() {
        assert!(Normalizer::new(5.0, 5.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn inverted_intervals_are_rejected() {
        assert!(Normalizer::new(10.0, 0.0, 0.0, 1.0).is_err());
        assert!(Normalizer::new(0.0, 10.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn values_outside_the_source_interval_extrapolate() {
        let n = Normalizer::new(0.0, 100.0, 0.0, 1.0).unwrap();
        assert!(n.normalize(150.0) > 1.0);
        assert!(n.normalize(-50.0) < 0.0);
    }
}
