//! Model Buffer Types
//!
//! Provides the (batch, channel, time) audio buffer handed to the model,
//! the precision and device tags that travel with it, and the raw sample
//! trait used to read arbitrary integer or float input.

use std::fmt;

use ndarray::{Array3, ArrayView3, Axis};
use num_traits::Float;
use serde::{Deserialize, Serialize};

// ============================================================================
// Axis Layout
// ============================================================================

/// Batch axis of a model buffer
pub const BATCH_AXIS: Axis = Axis(0);

/// Channel axis of a model buffer
pub const CHANNEL_AXIS: Axis = Axis(1);

/// Time axis of a model buffer
pub const TIME_AXIS: Axis = Axis(2);

// ============================================================================
// Precision
// ============================================================================

/// Numeric precision of a model buffer
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    F32,
    F64,
}

impl DType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
        }
    }
}

/// Floating element types a model buffer can be cast to
pub trait WithDType: Float + fmt::Debug + Send + Sync + 'static {
    const DTYPE: DType;

    fn from_f32(value: f32) -> Self;
}

impl WithDType for f32 {
    const DTYPE: DType = DType::F32;

    fn from_f32(value: f32) -> Self {
        value
    }
}

impl WithDType for f64 {
    const DTYPE: DType = DType::F64;

    fn from_f32(value: f32) -> Self {
        value as f64
    }
}

// ============================================================================
// Device
// ============================================================================

/// Compute target a buffer is placed on
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host memory
    #[default]
    Cpu,
    /// CUDA device with the given ordinal
    Cuda(usize),
}

impl Device {
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
        }
    }
}

// ============================================================================
// Raw Samples
// ============================================================================

/// Whether raw samples are integer PCM or floating point
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DtypeClass {
    Integral,
    Floating,
}

/// Element types accepted as raw input audio
///
/// Integral samples are mapped to [-1, 1] by dividing by the type's
/// maximum value; floating samples are assumed to be normalized already.
pub trait RawSample: Copy + 'static {
    const DTYPE_CLASS: DtypeClass;

    /// Convert to a normalized floating sample
    fn to_unit(self) -> f32;
}

macro_rules! impl_integral_sample {
    ($($t:ty),*) => {
        $(
            impl RawSample for $t {
                const DTYPE_CLASS: DtypeClass = DtypeClass::Integral;

                #[inline]
                fn to_unit(self) -> f32 {
                    (self as f64 / <$t>::MAX as f64) as f32
                }
            }
        )*
    };
}

impl_integral_sample!(i8, i16, i32);

impl RawSample for f32 {
    const DTYPE_CLASS: DtypeClass = DtypeClass::Floating;

    #[inline]
    fn to_unit(self) -> f32 {
        self
    }
}

impl RawSample for f64 {
    const DTYPE_CLASS: DtypeClass = DtypeClass::Floating;

    #[inline]
    fn to_unit(self) -> f32 {
        self as f32
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Model-facing audio buffer
///
/// Samples are stored as a (batch, channel, time) array. Once produced by
/// the ingest normalizer the values lie in [-1, 1] and the batch size is 1.
///
/// # Example
/// ```
/// use ndarray::Array3;
/// use stride_align::engine::{AudioBuffer, Device};
///
/// let buffer = AudioBuffer::new(Array3::<f32>::zeros((1, 2, 480)), 48000, Device::Cpu);
/// assert_eq!(buffer.channel_count(), 2);
/// assert_eq!(buffer.sample_count(), 480);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer<A = f32> {
    data: Array3<A>,
    sample_rate: u32,
    device: Device,
}

impl<A: WithDType> AudioBuffer<A> {
    pub fn new(data: Array3<A>, sample_rate: u32, device: Device) -> Self {
        Self {
            data,
            sample_rate,
            device,
        }
    }

    /// Number of independent requests stacked in the buffer
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.data.len_of(BATCH_AXIS)
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.data.len_of(CHANNEL_AXIS)
    }

    /// Length of the time axis
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.data.len_of(TIME_AXIS)
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn device(&self) -> Device {
        self.device
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        A::DTYPE
    }

    /// Get the duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count() as f64 / self.sample_rate as f64
    }

    pub fn view(&self) -> ArrayView3<'_, A> {
        self.data.view()
    }

    pub fn data(&self) -> &Array3<A> {
        &self.data
    }

    pub fn into_data(self) -> Array3<A> {
        self.data
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> A {
        self.data.iter().fold(A::zero(), |acc, &s| acc.max(s.abs()))
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|s| s.is_finite())
    }

    /// Replace the samples, keeping rate and device
    pub fn with_data(&self, data: Array3<A>) -> Self {
        Self {
            data,
            sample_rate: self.sample_rate,
            device: self.device,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
