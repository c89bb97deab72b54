//! Egress denormalization
//!
//! Converts a (batch, channel, time) model output into a playable
//! `(time, channel)` host array of the requested length.

use ndarray::{Array2, ArrayView, Dimension, Ix3};
use num_traits::Zero;

use crate::engine::align::fit_time_axis;
use crate::error::{AlignError, Result};

/// Denormalize a model output
///
/// The time axis is padded or cropped to `target_length` at the edge chosen
/// by `pad_end`. Batches are then folded into the time axis with row index
/// `t * batch + b`, so for a single batch the result is simply the
/// transposed `(time, channel)` waveform.
///
/// # Errors
/// * `Shape` - If `output` is not three-dimensional
pub fn denormalize_from_model<A, D>(
    output: ArrayView<'_, A, D>,
    target_length: usize,
    pad_end: bool,
) -> Result<Array2<A>>
where
    A: Clone + Zero,
    D: Dimension,
{
    let ndim = output.ndim();
    let output = output
        .into_dyn()
        .into_dimensionality::<Ix3>()
        .map_err(|_| AlignError::Shape {
            reason: format!(
                "model output must be (batch, channel, time), got {} axes",
                ndim
            ),
        })?;

    let fitted = fit_time_axis(&output, target_length, pad_end)?;
    let (batch, channels, length) = fitted.dim();

    let frames = fitted
        .permuted_axes([2, 0, 1])
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((length * batch, channels))
        .map_err(|e| AlignError::Shape {
            reason: format!("cannot fold batch into time: {}", e),
        })?;

    log::debug!(
        "egress: ({}, {}, {}) -> ({}, {})",
        batch,
        channels,
        length,
        frames.nrows(),
        frames.ncols()
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array3, Array4};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mono_to_time_channel() {
        let output = array![[[0.1f32, 0.2, 0.3]]];
        let raw = denormalize_from_model(output.view(), 3, true).unwrap();
        assert_eq!(raw, array![[0.1f32], [0.2], [0.3]]);
    }

    #[test]
    fn test_stereo_is_channel_last() {
        let output = array![[[1, 2, 3], [4, 5, 6]]];
        let raw = denormalize_from_model(output.view(), 3, true).unwrap();
        assert_eq!(raw, array![[1, 4], [2, 5], [3, 6]]);
    }

    #[test]
    fn test_crop_end() {
        let output = array![[[1, 2, 3, 4, 5]]];
        let raw = denormalize_from_model(output.view(), 2, true).unwrap();
        assert_eq!(raw, array![[1], [2]]);
    }

    #[test]
    fn test_crop_start() {
        let output = array![[[1, 2, 3, 4, 5]]];
        let raw = denormalize_from_model(output.view(), 2, false).unwrap();
        assert_eq!(raw, array![[4], [5]]);
    }

    #[test]
    fn test_pad_when_target_is_longer() {
        let output = array![[[7, 8]]];
        assert_eq!(
            denormalize_from_model(output.view(), 4, true).unwrap(),
            array![[7], [8], [0], [0]]
        );
        assert_eq!(
            denormalize_from_model(output.view(), 4, false).unwrap(),
            array![[0], [0], [7], [8]]
        );
    }

    #[test]
    fn test_batch_folds_time_major() {
        // batch 0 = [1, 2], batch 1 = [10, 20]
        let output = array![[[1, 2]], [[10, 20]]];
        let raw = denormalize_from_model(output.view(), 2, true).unwrap();
        assert_eq!(raw, array![[1], [10], [2], [20]]);
    }

    #[test]
    fn test_rejects_non_3d() {
        let flat = Array1::<f32>::zeros(4);
        assert!(matches!(
            denormalize_from_model(flat.view(), 4, true),
            Err(AlignError::Shape { .. })
        ));

        let deep = Array4::<f32>::zeros((1, 1, 1, 4));
        assert!(matches!(
            denormalize_from_model(deep.view(), 4, true),
            Err(AlignError::Shape { .. })
        ));
    }

    #[test]
    fn test_accepts_dynamic_dimension() {
        let output = Array3::<f32>::ones((1, 2, 4)).into_dyn();
        let raw = denormalize_from_model(output.view(), 4, true).unwrap();
        assert_eq!(raw.dim(), (4, 2));
    }
}
