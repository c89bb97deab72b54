//! Precision and device cast
//!
//! Final step of ingest: the normalized f32 samples are converted to the
//! model's element type and placed on its compute target.

use ndarray::Array3;

use crate::engine::buffer::{Device, WithDType};
use crate::error::{AlignError, Result};

/// Cast capability handed to the ingest normalizer
pub trait TensorCast {
    fn cast<A: WithDType>(&self, data: Array3<f32>, device: Device) -> Result<Array3<A>>;
}

/// Host-memory cast; only `Device::Cpu` is reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCast;

impl TensorCast for HostCast {
    fn cast<A: WithDType>(&self, data: Array3<f32>, device: Device) -> Result<Array3<A>> {
        if !device.is_cpu() {
            return Err(AlignError::UnsupportedDevice {
                device: device.to_string(),
            });
        }
        Ok(data.mapv(A::from_f32))
    }
}
