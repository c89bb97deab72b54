//! Peak amplitude scaling

use ndarray::{Array, ArrayBase, Data, Dimension};
use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, Result};

/// Default canonical peak applied before inference
pub const DEFAULT_TARGET_PEAK: f32 = 0.05;

/// Target peak absolute sample value after scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    #[serde(default = "default_target_peak")]
    pub target_peak: f32,
}

fn default_target_peak() -> f32 {
    DEFAULT_TARGET_PEAK
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            target_peak: DEFAULT_TARGET_PEAK,
        }
    }
}

impl ScalingPolicy {
    pub fn new(target_peak: f32) -> Self {
        Self { target_peak }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_peak.is_finite() || self.target_peak <= 0.0 {
            return Err(AlignError::InvalidLength {
                reason: format!("target peak must be positive, got {}", self.target_peak),
            });
        }
        Ok(())
    }

    pub fn apply<A, S, D>(&self, x: &ArrayBase<S, D>) -> Result<Array<A, D>>
    where
        A: Float,
        S: Data<Elem = A>,
        D: Dimension,
    {
        let target_peak = A::from(self.target_peak).ok_or_else(|| AlignError::InvalidLength {
            reason: format!("target peak {} is not representable", self.target_peak),
        })?;
        max_abs_scale(x, target_peak)
    }
}

/// Rescale so the largest absolute sample equals `target_peak`
///
/// # Errors
/// * `DivideByZero` - If the buffer is empty, silent, or its peak is not finite
pub fn max_abs_scale<A, S, D>(x: &ArrayBase<S, D>, target_peak: A) -> Result<Array<A, D>>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    // NaN propagates through the fold so it is caught below
    let peak = x
        .iter()
        .fold(A::zero(), |acc, &s| if s.is_nan() || acc.is_nan() { A::nan() } else { acc.max(s.abs()) });

    if peak.is_zero() || !peak.is_finite() {
        return Err(AlignError::DivideByZero {
            peak: peak.to_f64().unwrap_or(f64::NAN),
        });
    }

    Ok(x.mapv(|s| s / peak * target_peak))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1, Array3};

    fn peak_of(x: &Array3<f32>) -> f32 {
        x.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }

    #[test]
    fn test_scales_to_default_peak() {
        let x = Array3::from_shape_fn((1, 2, 64), |(_, c, t)| ((t as f32) * 0.1).sin() * (c as f32 + 1.0));
        let scaled = ScalingPolicy::default().apply(&x).unwrap();
        assert_relative_eq!(peak_of(&scaled), 0.05, epsilon = 1e-7);
    }

    #[test]
    fn test_negative_peak_preserves_sign() {
        let x = array![0.5f64, -2.0, 1.0];
        let scaled = max_abs_scale(&x, 1.0).unwrap();
        assert_relative_eq!(scaled[1], -1.0);
        assert_relative_eq!(scaled[0], 0.25);
    }

    #[test]
    fn test_input_is_untouched() {
        let x = array![0.2f32, -0.4];
        let _ = max_abs_scale(&x, 0.05).unwrap();
        assert_eq!(x, array![0.2f32, -0.4]);
    }

    #[test]
    fn test_all_zero_fails() {
        let x = Array1::<f32>::zeros(16);
        assert!(matches!(
            max_abs_scale(&x, 0.05),
            Err(AlignError::DivideByZero { .. })
        ));
    }

    #[test]
    fn test_empty_fails() {
        let x = Array1::<f32>::zeros(0);
        assert!(matches!(
            max_abs_scale(&x, 0.05),
            Err(AlignError::DivideByZero { .. })
        ));
    }

    #[test]
    fn test_nan_peak_fails() {
        let x = array![0.5f32, f32::NAN, 0.1];
        assert!(matches!(
            max_abs_scale(&x, 0.05),
            Err(AlignError::DivideByZero { .. })
        ));
    }

    #[test]
    fn test_policy_validation() {
        assert!(ScalingPolicy::default().validate().is_ok());
        assert!(ScalingPolicy::new(0.0).validate().is_err());
        assert!(ScalingPolicy::new(f32::INFINITY).validate().is_err());
    }

    #[test]
    fn test_policy_deserialize_default() {
        let policy: ScalingPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, ScalingPolicy::default());
    }
}
