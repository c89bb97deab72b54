//! Stride Align - audio preparation for strided generative models
//!
//! Wraps an opaque generative audio model with the conversions it needs on
//! both sides of inference:
//! 1. Ingest - raw time-first arrays become unit-range (batch, channel, time)
//!    buffers at the model rate, padded so the model's downsampling stack
//!    divides the frame count
//! 2. Egress - model buffers become playable (time, channel) arrays of the
//!    requested length
//!
//! Masks for inpainting and peak scaling are prepared alongside.
//!
//! # Example
//!
//! ```
//! use ndarray::Array1;
//! use stride_align::neural::IdentityModel;
//! use stride_align::pipeline::{Pipeline, PipelineConfig, PipelineOutput};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default(), IdentityModel::new()).unwrap();
//! let raw = Array1::<i16>::zeros(44100);
//! let target = pipeline.aligned_target_length(raw.len(), 44100).unwrap();
//! let output: PipelineOutput<f32> = pipeline.run(raw.view(), 44100, target, None).unwrap();
//! assert_eq!(output.samples.nrows(), target);
//! ```

pub mod cli;
pub mod engine;
pub mod error;
pub mod neural;
pub mod pipeline;
pub mod prep;

pub use engine::{compute_divisible_length, pad_to_divisible_length, AlignmentSpec, AudioBuffer, DType, Device};
pub use error::{AlignError, Result};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput};
pub use prep::{denormalize_from_model, generate_mask, max_abs_scale, normalize_for_model, MaskSpec};
