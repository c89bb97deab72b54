//! Model interfaces and implementations
//!
//! This module provides:
//! - `AudioModel` trait for the injected generative model
//! - Mock implementations for testing

mod mock;
mod model;

pub use mock::*;
pub use model::{check_mask_shape, AudioModel, ModelInfo};
