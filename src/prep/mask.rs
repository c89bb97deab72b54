//! Time-interval masks
//!
//! A mask spec is a comma-separated list of `<start>-<end>` whole-second
//! intervals, e.g. `0-1,3-4`. Applied to a time-first raw array it yields
//! a same-shaped mask that is zero inside every interval and one elsewhere.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Slice};
use num_traits::{One, Zero};

use crate::error::{AlignError, Result};

/// A half-open `[start_sec, end_sec)` interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskInterval {
    pub start_sec: u64,
    pub end_sec: u64,
}

impl MaskInterval {
    /// Sample range covered at `sample_rate`, before clipping
    pub fn sample_range(&self, sample_rate: u32) -> Range<usize> {
        let to_index = |sec: u64| sec.saturating_mul(sample_rate as u64) as usize;
        to_index(self.start_sec)..to_index(self.end_sec)
    }
}

/// Parsed mask specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskSpec {
    intervals: Vec<MaskInterval>,
}

impl MaskSpec {
    pub fn intervals(&self) -> &[MaskInterval] {
        &self.intervals
    }

    /// Sample ranges clipped to a buffer of `length` samples
    ///
    /// Intervals that start at or past `length`, or whose end does not
    /// exceed their start, produce empty ranges.
    pub fn sample_ranges(&self, sample_rate: u32, length: usize) -> Vec<Range<usize>> {
        self.intervals
            .iter()
            .map(|interval| {
                let range = interval.sample_range(sample_rate);
                let start = range.start.min(length);
                let end = range.end.clamp(start, length);
                start..end
            })
            .collect()
    }

    /// Build a mask shaped like `audio`, with axis 0 as the time axis
    pub fn apply<A, S, D>(&self, audio: &ArrayBase<S, D>, sample_rate: u32) -> Result<Array<A, D>>
    where
        A: Clone + Zero + One,
        S: Data,
        D: Dimension,
    {
        if audio.ndim() == 0 {
            return Err(AlignError::Shape {
                reason: "cannot mask a zero-dimensional array".to_string(),
            });
        }

        let length = audio.len_of(Axis(0));
        let mut mask = Array::from_elem(audio.raw_dim(), A::one());
        for range in self.sample_ranges(sample_rate, length) {
            if range.is_empty() {
                continue;
            }
            mask.slice_axis_mut(Axis(0), Slice::from(range))
                .fill(A::zero());
        }
        Ok(mask)
    }
}

impl FromStr for MaskSpec {
    type Err = AlignError;

    fn from_str(spec: &str) -> Result<Self> {
        let intervals = spec
            .split(',')
            .map(parse_interval)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { intervals })
    }
}

impl fmt::Display for MaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}-{}", interval.start_sec, interval.end_sec)?;
        }
        Ok(())
    }
}

fn parse_interval(entry: &str) -> Result<MaskInterval> {
    let parse_error = |reason: &str| AlignError::Parse {
        entry: entry.to_string(),
        reason: reason.to_string(),
    };

    let (start, end) = entry
        .split_once('-')
        .ok_or_else(|| parse_error("expected <start>-<end>"))?;
    if end.contains('-') {
        return Err(parse_error("more than one '-' separator"));
    }

    let start_sec = start
        .parse::<u64>()
        .map_err(|_| parse_error("start is not a whole number of seconds"))?;
    let end_sec = end
        .parse::<u64>()
        .map_err(|_| parse_error("end is not a whole number of seconds"))?;

    Ok(MaskInterval { start_sec, end_sec })
}

/// Parse `spec` and build a mask shaped like `audio`
///
/// # Errors
/// * `Parse` - If any entry of `spec` is malformed
/// * `Shape` - If `audio` is zero-dimensional
pub fn generate_mask<A, S, D>(audio: &ArrayBase<S, D>, sample_rate: u32, spec: &str) -> Result<Array<A, D>>
where
    A: Clone + Zero + One,
    S: Data,
    D: Dimension,
{
    spec.parse::<MaskSpec>()?.apply(audio, sample_rate)
}
