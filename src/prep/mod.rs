//! Pre- and post-processing around model inference
//!
//! - Ingest normalization of raw arrays into model buffers
//! - Egress denormalization of model outputs into playable arrays
//! - Time-interval masks
//! - Peak amplitude scaling

pub mod egress;
pub mod ingest;
pub mod mask;
pub mod scale;

pub use egress::denormalize_from_model;
pub use ingest::{aligned_target_length, normalize_for_model, normalize_for_model_with, IngestRequest};
pub use mask::{generate_mask, MaskInterval, MaskSpec};
pub use scale::{max_abs_scale, ScalingPolicy, DEFAULT_TARGET_PEAK};
