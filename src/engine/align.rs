//! Length alignment for strided models
//!
//! A model that frames audio with a hop of `hop_length` samples and then
//! halves the frame axis `num_downsamples` times can only consume lengths
//! whose frame count is a multiple of `2^num_downsamples`. This module
//! computes such lengths and pads or crops buffers along their time axis,
//! which is always the last axis.

use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Slice};
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, Result};

/// Framing parameters of the target model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentSpec {
    /// Samples between successive analysis frames
    pub hop_length: usize,
    /// Number of stride-2 reductions applied to the frame axis
    pub num_downsamples: u32,
    /// Pad or crop at the trailing edge (`true`) or the leading edge
    #[serde(default = "default_pad_end")]
    pub pad_end: bool,
}

fn default_pad_end() -> bool {
    true
}

impl Default for AlignmentSpec {
    fn default() -> Self {
        Self {
            hop_length: 256,
            num_downsamples: 6,
            pad_end: true,
        }
    }
}

impl AlignmentSpec {
    pub fn new(hop_length: usize, num_downsamples: u32, pad_end: bool) -> Self {
        Self {
            hop_length,
            num_downsamples,
            pad_end,
        }
    }

    /// Divisible length for `length` with these framing parameters
    pub fn divisible_length(&self, length: usize) -> Result<usize> {
        compute_divisible_length(length, self.hop_length, self.num_downsamples)
    }

    /// Check that `length` already satisfies the divisibility invariant
    pub fn is_aligned(&self, length: usize) -> bool {
        self.divisible_length(length)
            .map(|target| target == length)
            .unwrap_or(false)
    }

    pub fn validate(&self) -> Result<()> {
        self.divisible_length(0).map(|_| ())
    }
}

/// Compute the divisible length for a raw sample count
///
/// `length` covers `floor(length / hop_length) + 1` hop-framed steps. The
/// step count is rounded up to a multiple of `2^num_downsamples` and mapped
/// back to samples as `(frames - 1) * hop_length`.
///
/// The result can be shorter than `length` when `hop_length` does not
/// divide it: `compute_divisible_length(1000, 256, 2)` is 768.
pub fn compute_divisible_length(
    length: usize,
    hop_length: usize,
    num_downsamples: u32,
) -> Result<usize> {
    if hop_length == 0 {
        return Err(AlignError::InvalidLength {
            reason: "hop length must be greater than zero".to_string(),
        });
    }

    let factor = 1usize
        .checked_shl(num_downsamples)
        .ok_or_else(|| AlignError::InvalidLength {
            reason: format!("2^{} downsamples overflows usize", num_downsamples),
        })?;

    let num_frames = length / hop_length + 1;
    num_frames
        .div_ceil(factor)
        .checked_mul(factor)
        .and_then(|frames| (frames - 1).checked_mul(hop_length))
        .ok_or_else(|| AlignError::InvalidLength {
            reason: format!(
                "divisible length for {} samples (hop {}, {} downsamples) overflows",
                length, hop_length, num_downsamples
            ),
        })
}

/// Pad a buffer with silence so its time axis has the divisible length
///
/// Silence is appended when `pad_end` is set, otherwise prepended. A buffer
/// longer than its own divisible length is rejected rather than cropped.
pub fn pad_to_divisible_length<A, S, D>(
    x: &ArrayBase<S, D>,
    hop_length: usize,
    num_downsamples: u32,
    pad_end: bool,
) -> Result<Array<A, D>>
where
    A: Clone + Zero,
    S: Data<Elem = A>,
    D: Dimension,
{
    let axis = time_axis(x)?;
    let current = x.len_of(axis);
    let target = compute_divisible_length(current, hop_length, num_downsamples)?;

    if target < current {
        return Err(AlignError::InvalidLength {
            reason: format!(
                "{} samples exceed their divisible length {} (hop {}, {} downsamples)",
                current, target, hop_length, num_downsamples
            ),
        });
    }

    Ok(pad_time_axis(x, axis, target - current, pad_end))
}

/// Pad or crop the time axis to exactly `target_length` samples
///
/// Growing pads with silence at the edge selected by `pad_end`. Shrinking
/// keeps the first `target_length` samples when `pad_end` is set and the
/// last `target_length` samples otherwise.
pub fn fit_time_axis<A, S, D>(
    x: &ArrayBase<S, D>,
    target_length: usize,
    pad_end: bool,
) -> Result<Array<A, D>>
where
    A: Clone + Zero,
    S: Data<Elem = A>,
    D: Dimension,
{
    let axis = time_axis(x)?;
    let current = x.len_of(axis);

    if target_length >= current {
        return Ok(pad_time_axis(x, axis, target_length - current, pad_end));
    }

    log::warn!(
        "cropping {} samples from the {} edge",
        current - target_length,
        if pad_end { "trailing" } else { "leading" }
    );
    let range = if pad_end {
        0..target_length
    } else {
        current - target_length..current
    };
    Ok(x.slice_axis(axis, Slice::from(range)).to_owned())
}

fn time_axis<S: Data, D: Dimension>(x: &ArrayBase<S, D>) -> Result<Axis> {
    match x.ndim() {
        0 => Err(AlignError::Shape {
            reason: "a zero-dimensional array has no time axis".to_string(),
        }),
        ndim => Ok(Axis(ndim - 1)),
    }
}

fn pad_time_axis<A, S, D>(x: &ArrayBase<S, D>, axis: Axis, amount: usize, pad_end: bool) -> Array<A, D>
where
    A: Clone + Zero,
    S: Data<Elem = A>,
    D: Dimension,
{
    if amount == 0 {
        return x.to_owned();
    }

    let current = x.len_of(axis);
    let mut shape = x.raw_dim();
    shape[axis.index()] = current + amount;

    let mut padded = Array::zeros(shape);
    let offset = if pad_end { 0 } else { amount };
    padded
        .slice_axis_mut(axis, Slice::from(offset..offset + current))
        .assign(x);
    padded
}

// ============================================================================
// Tests
// ============================================================================
