//! Neural model trait and core types
//!
//! Defines the interface a generative model exposes to the pipeline. The
//! model is opaque: it receives an aligned (batch, channel, time) buffer
//! and an optional same-shaped mask, and returns a buffer of the same
//! shape class.

use serde::{Deserialize, Serialize};

use crate::engine::buffer::{AudioBuffer, WithDType};
use crate::error::{AlignError, Result};

/// Information about a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier (e.g., "identity", "gain")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Description of what the model does
    pub description: String,

    /// Whether the model reads the inpainting mask
    pub uses_mask: bool,
}

impl ModelInfo {
    pub fn new(id: &str, name: &str, description: &str, uses_mask: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            uses_mask,
        }
    }
}

/// Trait that all models must implement
pub trait AudioModel: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Run a forward pass
    ///
    /// # Arguments
    /// * `input` - Aligned model buffer
    /// * `mask` - Optional mask with the input's shape; zero marks samples to regenerate
    fn infer<A: WithDType>(
        &self,
        input: &AudioBuffer<A>,
        mask: Option<&AudioBuffer<A>>,
    ) -> Result<AudioBuffer<A>>;

    /// Get model ID (convenience method)
    fn id(&self) -> &str {
        &self.info().id
    }
}

/// Check that a mask matches the buffer it applies to
pub fn check_mask_shape<A: WithDType>(
    model: &str,
    input: &AudioBuffer<A>,
    mask: &AudioBuffer<A>,
) -> Result<()> {
    if input.data().shape() != mask.data().shape() {
        return Err(AlignError::Shape {
            reason: format!(
                "mask {:?} does not match {} input {:?}",
                mask.data().shape(),
                model,
                input.data().shape()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Device;
    use ndarray::Array3;

    #[test]
    fn test_model_info_serializes() {
        let info = ModelInfo::new("identity", "Identity", "Returns its input", false);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["id"], "identity");
        assert_eq!(json["uses_mask"], false);
    }

    #[test]
    fn test_check_mask_shape() {
        let input = AudioBuffer::new(Array3::<f32>::zeros((1, 2, 8)), 16000, Device::Cpu);
        let good = AudioBuffer::new(Array3::<f32>::ones((1, 2, 8)), 16000, Device::Cpu);
        let bad = AudioBuffer::new(Array3::<f32>::ones((1, 1, 8)), 16000, Device::Cpu);

        assert!(check_mask_shape("test", &input, &good).is_ok());
        assert!(matches!(
            check_mask_shape("test", &input, &bad),
            Err(AlignError::Shape { .. })
        ));
    }
}
