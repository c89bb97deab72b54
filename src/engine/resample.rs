//! Sample rate conversion
//!
//! The pipeline only depends on the `Resampler` contract: batch and channel
//! axes are preserved and the time axis is scaled by `dst_rate / src_rate`.
//! `SincResampler` is the default implementation.

use ndarray::{Array3, ArrayView1, ArrayView3, Axis};
use rubato::{
    calculate_cutoff, Resampler as _, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::engine::buffer::{CHANNEL_AXIS, TIME_AXIS};
use crate::error::{AlignError, Result};

/// Resampling primitive used by the ingest normalizer
pub trait Resampler {
    /// Resample every (batch, channel) lane from `src_rate` to `dst_rate`
    fn resample(&self, input: ArrayView3<'_, f32>, src_rate: u32, dst_rate: u32) -> Result<Array3<f32>>;
}

/// Length of a lane of `len` samples after resampling
///
/// Rounds up, so any non-empty input yields at least one sample.
pub fn resampled_length(len: usize, src_rate: u32, dst_rate: u32) -> Result<usize> {
    if src_rate == 0 {
        return Err(AlignError::InvalidRate {
            rate: src_rate,
            context: "resampler input",
        });
    }
    (len as u64)
        .checked_mul(dst_rate as u64)
        .map(|scaled| scaled.div_ceil(src_rate as u64))
        .and_then(|scaled| usize::try_from(scaled).ok())
        .ok_or_else(|| AlignError::InvalidLength {
            reason: format!(
                "{} samples resampled from {} to {} Hz overflows",
                len, src_rate, dst_rate
            ),
        })
}

const DEFAULT_SINC_LEN: usize = 128;
const DEFAULT_CHUNK_SIZE: usize = 1024;
const OVERSAMPLING_FACTOR: usize = 256;

/// Band-limited windowed-sinc resampler
///
/// Each batch item is resampled as one multi-channel stream. The filter
/// delay is removed, so sample `i` of the output lines up with time
/// `i / dst_rate` of the input.
#[derive(Debug, Clone, Copy)]
pub struct SincResampler {
    sinc_len: usize,
    chunk_size: usize,
}

impl Default for SincResampler {
    fn default() -> Self {
        Self::new(DEFAULT_SINC_LEN, DEFAULT_CHUNK_SIZE)
    }
}

impl SincResampler {
    /// `sinc_len` taps per filter, fed `chunk_size` input frames at a time
    pub fn new(sinc_len: usize, chunk_size: usize) -> Self {
        Self {
            sinc_len: sinc_len.max(2),
            chunk_size: chunk_size.max(1),
        }
    }

    fn parameters(&self) -> SincInterpolationParameters {
        let window = WindowFunction::Blackman2;
        SincInterpolationParameters {
            sinc_len: self.sinc_len,
            f_cutoff: calculate_cutoff(self.sinc_len, window),
            interpolation: SincInterpolationType::Quadratic,
            oversampling_factor: OVERSAMPLING_FACTOR,
            window,
        }
    }

    /// Resample equal-length channels to exactly `target_len` frames each
    fn resample_channels(
        &self,
        channels: &[Vec<f32>],
        src_rate: u32,
        dst_rate: u32,
        target_len: usize,
    ) -> Result<Vec<Vec<f32>>> {
        let ratio = dst_rate as f64 / src_rate as f64;
        let mut resampler =
            SincFixedIn::<f32>::new(ratio, 1.1, self.parameters(), self.chunk_size, channels.len())
                .map_err(|e| resample_error(src_rate, dst_rate, e))?;

        let delay = resampler.output_delay();
        let needed = delay + target_len;
        let len = channels.first().map_or(0, Vec::len);

        let mut collected: Vec<Vec<f32>> = vec![Vec::with_capacity(needed); channels.len()];
        let mut buffer = vec![vec![0.0f32; resampler.output_frames_max()]; channels.len()];
        let mut pos = 0;

        while len - pos >= resampler.input_frames_next() {
            let slices: Vec<&[f32]> = channels.iter().map(|c| &c[pos..]).collect();
            let (consumed, produced) = resampler
                .process_into_buffer(&slices, &mut buffer, None)
                .map_err(|e| resample_error(src_rate, dst_rate, e))?;
            pos += consumed;
            append_frames(&mut collected, &buffer, produced);
        }

        if pos < len {
            let slices: Vec<&[f32]> = channels.iter().map(|c| &c[pos..]).collect();
            let (_, produced) = resampler
                .process_partial_into_buffer(Some(slices.as_slice()), &mut buffer, None)
                .map_err(|e| resample_error(src_rate, dst_rate, e))?;
            append_frames(&mut collected, &buffer, produced);
        }

        // Flush the filter tail until the delayed output covers the target
        let no_input: Option<&[&[f32]]> = None;
        while collected.first().map_or(0, Vec::len) < needed {
            let (_, produced) = resampler
                .process_partial_into_buffer(no_input, &mut buffer, None)
                .map_err(|e| resample_error(src_rate, dst_rate, e))?;
            if produced == 0 {
                break;
            }
            append_frames(&mut collected, &buffer, produced);
        }

        Ok(collected
            .into_iter()
            .map(|mut lane| {
                lane.resize(needed.max(lane.len()), 0.0);
                lane.drain(..delay);
                lane.truncate(target_len);
                lane
            })
            .collect())
    }
}

impl Resampler for SincResampler {
    fn resample(&self, input: ArrayView3<'_, f32>, src_rate: u32, dst_rate: u32) -> Result<Array3<f32>> {
        if src_rate == 0 {
            return Err(AlignError::InvalidRate {
                rate: src_rate,
                context: "resampler input",
            });
        }
        if dst_rate == 0 {
            return Err(AlignError::InvalidRate {
                rate: dst_rate,
                context: "resampler output",
            });
        }
        if src_rate == dst_rate {
            return Ok(input.to_owned());
        }

        let (batch, channels, len) = input.dim();
        let target_len = resampled_length(len, src_rate, dst_rate)?;
        let mut output = Array3::<f32>::zeros((batch, channels, target_len));
        if len == 0 || channels == 0 {
            return Ok(output);
        }

        for (item, mut out_item) in input.axis_iter(Axis(0)).zip(output.axis_iter_mut(Axis(0))) {
            let lanes: Vec<Vec<f32>> = item.lanes(Axis(1)).into_iter().map(|l| l.to_vec()).collect();
            let resampled = self.resample_channels(&lanes, src_rate, dst_rate, target_len)?;
            for (lane, mut out_lane) in resampled.iter().zip(out_item.axis_iter_mut(Axis(0))) {
                out_lane.assign(&ArrayView1::from(lane.as_slice()));
            }
        }

        log::debug!(
            "resampled {} -> {} Hz: {} -> {} samples x {} channels",
            src_rate,
            dst_rate,
            len,
            output.len_of(TIME_AXIS),
            output.len_of(CHANNEL_AXIS)
        );
        Ok(output)
    }
}

fn append_frames(collected: &mut [Vec<f32>], buffer: &[Vec<f32>], frames: usize) {
    for (lane, chunk) in collected.iter_mut().zip(buffer) {
        lane.extend_from_slice(&chunk[..frames]);
    }
}

fn resample_error(src_rate: u32, dst_rate: u32, e: impl std::fmt::Display) -> AlignError {
    AlignError::InvalidAudio {
        reason: format!("resampling {} -> {} Hz failed: {}", src_rate, dst_rate, e),
        source: None,
    }
}
