//! Ingest normalization
//!
//! Turns a raw time-first array into the (batch, channel, time) buffer the
//! model consumes: unit range, model sample rate, requested length, aligned
//! to the model's stride, and cast to the model's precision.

use ndarray::{Array3, ArrayView, Axis, Dimension, Ix1, Ix2};

use crate::engine::align::{fit_time_axis, pad_to_divisible_length, AlignmentSpec};
use crate::engine::buffer::{AudioBuffer, Device, RawSample, WithDType, TIME_AXIS};
use crate::engine::cast::{HostCast, TensorCast};
use crate::engine::resample::{Resampler, SincResampler};
use crate::error::{AlignError, Result};

/// Parameters of a single ingest call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestRequest {
    /// Sample rate of the raw input
    pub src_rate: u32,
    /// Sample rate the model expects
    pub target_rate: u32,
    /// Requested length in samples at `src_rate`
    pub target_length: usize,
    pub alignment: AlignmentSpec,
    pub device: Device,
}

impl IngestRequest {
    /// Requested length expressed at `target_rate`
    pub fn rescaled_target_length(&self) -> Result<usize> {
        self.validate_rates()?;
        (self.target_length as u64)
            .checked_mul(self.target_rate as u64)
            .map(|scaled| scaled / self.src_rate as u64)
            .and_then(|scaled| usize::try_from(scaled).ok())
            .ok_or_else(|| AlignError::InvalidLength {
                reason: format!(
                    "target length {} at {} Hz overflows when rescaled to {} Hz",
                    self.target_length, self.src_rate, self.target_rate
                ),
            })
    }

    fn validate_rates(&self) -> Result<()> {
        if self.src_rate == 0 {
            return Err(AlignError::InvalidRate {
                rate: self.src_rate,
                context: "source audio",
            });
        }
        if self.target_rate == 0 {
            return Err(AlignError::InvalidRate {
                rate: self.target_rate,
                context: "target audio",
            });
        }
        Ok(())
    }
}

const MAX_ALIGNMENT_STEPS: usize = 256;

/// Smallest source-domain target length that ingests without error
///
/// Returns a `target_length` of at least `length` samples at `src_rate`
/// whose rescaled length at `target_rate` already satisfies `alignment`.
pub fn aligned_target_length(
    length: usize,
    src_rate: u32,
    target_rate: u32,
    alignment: &AlignmentSpec,
) -> Result<usize> {
    let request = IngestRequest {
        src_rate,
        target_rate,
        target_length: length,
        alignment: *alignment,
        device: Device::Cpu,
    };
    let rescaled = request.rescaled_target_length()?;

    let overflow = || AlignError::InvalidLength {
        reason: format!("no aligned target length at or above {} samples", length),
    };

    // Aligned lengths are spaced one full block of frames apart
    let block = alignment
        .divisible_length(0)?
        .checked_add(alignment.hop_length)
        .ok_or_else(overflow)?;
    let mut aligned = alignment.divisible_length(rescaled)?;
    if aligned < rescaled {
        aligned = aligned.checked_add(block).ok_or_else(overflow)?;
    }

    let (src, dst) = (src_rate as u64, target_rate as u64);
    for _ in 0..MAX_ALIGNMENT_STEPS {
        let candidate = (aligned as u64)
            .checked_mul(src)
            .ok_or_else(overflow)?
            .div_ceil(dst)
            .max(length as u64);
        let rescaled_candidate = candidate.checked_mul(dst).ok_or_else(overflow)? / src;
        if rescaled_candidate == aligned as u64 {
            return usize::try_from(candidate).map_err(|_| overflow());
        }
        aligned = aligned.checked_add(block).ok_or_else(overflow)?;
    }

    Err(AlignError::InvalidLength {
        reason: format!(
            "no aligned target length within {} blocks of {} samples at {} -> {} Hz",
            MAX_ALIGNMENT_STEPS, length, src_rate, target_rate
        ),
    })
}

/// Normalize raw audio with the default resampler and host cast
pub fn normalize_for_model<A, T, D>(raw: ArrayView<'_, T, D>, request: &IngestRequest) -> Result<AudioBuffer<A>>
where
    A: WithDType,
    T: RawSample,
    D: Dimension,
{
    normalize_for_model_with(raw, request, &SincResampler::default(), &HostCast)
}

/// Normalize raw audio with injected resampling and cast capabilities
///
/// # Errors
/// * `Shape` - If `raw` is not `(time,)` or `(time, channel)`
/// * `InvalidRate` - If either sample rate is zero
/// * `InvalidLength` - If the requested length cannot be aligned
/// * `UnsupportedDevice` - If the cast cannot reach `request.device`
pub fn normalize_for_model_with<A, T, D, R, C>(
    raw: ArrayView<'_, T, D>,
    request: &IngestRequest,
    resampler: &R,
    cast: &C,
) -> Result<AudioBuffer<A>>
where
    A: WithDType,
    T: RawSample,
    D: Dimension,
    R: Resampler + ?Sized,
    C: TensorCast,
{
    request.validate_rates()?;
    let alignment = request.alignment;

    // Reject unrepresentable lengths before any buffer is allocated
    let target_length = request.rescaled_target_length()?;
    alignment.divisible_length(target_length)?;

    let unit = to_model_layout(raw.view())?;
    log::debug!(
        "ingest: {:?} raw {:?} -> model layout {:?}",
        T::DTYPE_CLASS,
        raw.shape(),
        unit.dim()
    );

    let resampled = resampler.resample(unit.view(), request.src_rate, request.target_rate)?;

    let fitted = fit_time_axis(&resampled, target_length, alignment.pad_end)?;

    let aligned = pad_to_divisible_length(
        &fitted,
        alignment.hop_length,
        alignment.num_downsamples,
        alignment.pad_end,
    )?;
    log::debug!(
        "ingest: {} samples at {} Hz aligned to {} (hop {}, {} downsamples)",
        target_length,
        request.target_rate,
        aligned.len_of(TIME_AXIS),
        alignment.hop_length,
        alignment.num_downsamples
    );

    let data = cast.cast::<A>(aligned, request.device)?;
    Ok(AudioBuffer::new(data, request.target_rate, request.device))
}

/// Scale to unit range and reshape to (1, channel, time)
fn to_model_layout<T, D>(raw: ArrayView<'_, T, D>) -> Result<Array3<f32>>
where
    T: RawSample,
    D: Dimension,
{
    let raw = raw.into_dyn();
    match raw.ndim() {
        1 => {
            let mono = raw
                .into_dimensionality::<Ix1>()
                .map_err(|e| shape_error(e.to_string()))?;
            Ok(mono.mapv(T::to_unit).insert_axis(Axis(0)).insert_axis(Axis(0)))
        }
        2 => {
            let frames = raw
                .into_dimensionality::<Ix2>()
                .map_err(|e| shape_error(e.to_string()))?;
            let channel_first = frames.t().mapv(T::to_unit);
            Ok(channel_first.insert_axis(Axis(0)))
        }
        ndim => Err(shape_error(format!(
            "raw audio must be (time,) or (time, channel), got {} axes",
            ndim
        ))),
    }
}

fn shape_error(reason: String) -> AlignError {
    AlignError::Shape { reason }
}
