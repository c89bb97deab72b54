//! Audio Engine Module
//!
//! Core buffer handling including:
//! - Model buffer, precision and device types
//! - Divisible-length arithmetic and time-axis padding
//! - Resampling and precision/device cast capabilities
//! - WAV file I/O

pub mod align;
pub mod buffer;
pub mod cast;
pub mod io;
pub mod resample;

pub use align::{compute_divisible_length, fit_time_axis, pad_to_divisible_length, AlignmentSpec};
pub use buffer::{AudioBuffer, DType, Device, DtypeClass, RawSample, WithDType};
pub use cast::{HostCast, TensorCast};
pub use io::{generate_test_tone, read_wav, write_wav, RawAudio};
pub use resample::{resampled_length, Resampler, SincResampler};
