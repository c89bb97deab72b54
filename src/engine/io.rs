//! WAV file I/O for the command-line front end
//!
//! Files are read into time-first raw arrays that keep their integer or
//! float encoding, so the ingest normalizer sees exactly what the file holds.
//! Output is always written as 32-bit float.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use ndarray::{Array2, ArrayD, ArrayView2, IxDyn};

use crate::error::{AlignError, Result};

/// Decoded WAV samples in time-first layout
///
/// Mono files are `(time,)`, multi-channel files `(time, channel)`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAudio {
    /// 8 and 16-bit PCM (8-bit widened to 16-bit scale)
    I16(ArrayD<i16>),
    /// 24 and 32-bit PCM (24-bit widened to 32-bit scale)
    I32(ArrayD<i32>),
    /// 32-bit float
    F32(ArrayD<f32>),
}

impl RawAudio {
    /// Number of samples per channel
    pub fn sample_count(&self) -> usize {
        match self {
            RawAudio::I16(a) => a.shape()[0],
            RawAudio::I32(a) => a.shape()[0],
            RawAudio::F32(a) => a.shape()[0],
        }
    }

    pub fn channel_count(&self) -> usize {
        let shape = match self {
            RawAudio::I16(a) => a.shape(),
            RawAudio::I32(a) => a.shape(),
            RawAudio::F32(a) => a.shape(),
        };
        shape.get(1).copied().unwrap_or(1)
    }
}

/// Read a WAV file
///
/// # Returns
/// The raw samples and the file's sample rate
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a valid WAV file
/// * `UnsupportedFormat` - If the bit depth has no raw representation
pub fn read_wav(path: &Path) -> Result<(RawAudio, u32)> {
    if !path.exists() {
        return Err(AlignError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| AlignError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AlignError::InvalidAudio {
            reason: "WAV header declares zero channels".to_string(),
            source: None,
        });
    }

    let raw = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => RawAudio::F32(collect_samples(reader, channels, |v: f32| v)?),
        (SampleFormat::Int, 8) => RawAudio::I16(collect_samples(reader, channels, |v: i8| (v as i16) << 8)?),
        (SampleFormat::Int, 16) => RawAudio::I16(collect_samples(reader, channels, |v: i16| v)?),
        (SampleFormat::Int, 24) => RawAudio::I32(collect_samples(reader, channels, |v: i32| v << 8)?),
        (SampleFormat::Int, 32) => RawAudio::I32(collect_samples(reader, channels, |v: i32| v)?),
        (format, bits) => {
            return Err(AlignError::UnsupportedFormat {
                format: format!("{}-bit {:?} audio", bits, format),
            })
        }
    };

    log::debug!(
        "read {}: {} samples x {} channels at {} Hz",
        path.display(),
        raw.sample_count(),
        channels,
        spec.sample_rate
    );
    Ok((raw, spec.sample_rate))
}

/// Write a `(time, channel)` array as a 32-bit float WAV file
pub fn write_wav(path: &Path, samples: ArrayView2<'_, f32>, sample_rate: u32) -> Result<()> {
    let channels = samples.ncols();
    if channels == 0 || channels > u16::MAX as usize {
        return Err(AlignError::Shape {
            reason: format!("cannot write {} channels to WAV", channels),
        });
    }

    let spec = WavSpec {
        channels: channels as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec).map_err(hound_to_io)?;
    // Row-major iteration over (time, channel) yields interleaved frames
    for &sample in samples.iter() {
        writer.write_sample(sample).map_err(hound_to_io)?;
    }
    writer.finalize().map_err(hound_to_io)?;

    Ok(())
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Read every sample and reshape to time-first layout
fn collect_samples<R, S, T, F>(mut reader: WavReader<R>, channels: usize, convert: F) -> Result<ArrayD<T>>
where
    R: std::io::Read,
    S: hound::Sample,
    F: Fn(S) -> T,
{
    let interleaved = reader
        .samples::<S>()
        .map(|s| s.map(&convert))
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| AlignError::InvalidAudio {
            reason: format!("Failed to read samples: {}", e),
            source: Some(Box::new(e)),
        })?;

    let frames = interleaved.len() / channels;
    let shape = if channels == 1 {
        IxDyn(&[frames])
    } else {
        IxDyn(&[frames, channels])
    };

    ArrayD::from_shape_vec(shape, interleaved).map_err(|e| AlignError::InvalidAudio {
        reason: format!("Sample count is not a whole number of frames: {}", e),
        source: Some(Box::new(e)),
    })
}

fn hound_to_io(e: hound::Error) -> AlignError {
    match e {
        hound::Error::IoError(io) => AlignError::Io(io),
        other => AlignError::Io(std::io::Error::new(std::io::ErrorKind::Other, other.to_string())),
    }
}

/// Generate a `(time, channel)` sine test tone
///
/// Every channel carries the same tone at `amplitude`.
pub fn generate_test_tone(
    frequency: f32,
    amplitude: f32,
    num_samples: usize,
    channels: usize,
    sample_rate: u32,
) -> Array2<f32> {
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    Array2::from_shape_fn((num_samples, channels), |(i, _)| {
        amplitude * (angular_freq * i as f32).sin()
    })
}

// ============================================================================
// Tests
// ============================================================================
