//! Mock model implementations for testing
//!
//! These models don't run a network but transform audio in simple,
//! verifiable ways so the pipeline can be exercised end to end.

use ndarray::Zip;

use super::model::{check_mask_shape, AudioModel, ModelInfo};
use crate::engine::buffer::{AudioBuffer, WithDType};
use crate::error::{AlignError, Result};

/// Returns its input unchanged
pub struct IdentityModel {
    info: ModelInfo,
}

impl IdentityModel {
    pub fn new() -> Self {
        Self {
            info: ModelInfo::new("identity", "Identity", "Returns its input unchanged (MOCK)", false),
        }
    }
}

impl Default for IdentityModel {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioModel for IdentityModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn infer<A: WithDType>(
        &self,
        input: &AudioBuffer<A>,
        mask: Option<&AudioBuffer<A>>,
    ) -> Result<AudioBuffer<A>> {
        if let Some(mask) = mask {
            check_mask_shape(self.id(), input, mask)?;
        }
        Ok(input.clone())
    }
}

/// Multiplies every sample by a fixed gain
pub struct GainModel {
    info: ModelInfo,
    gain: f32,
}

impl GainModel {
    pub fn new(gain: f32) -> Self {
        Self {
            info: ModelInfo::new("gain", "Gain", "Applies a linear gain (MOCK)", false),
            gain,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl AudioModel for GainModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn infer<A: WithDType>(
        &self,
        input: &AudioBuffer<A>,
        mask: Option<&AudioBuffer<A>>,
    ) -> Result<AudioBuffer<A>> {
        if let Some(mask) = mask {
            check_mask_shape(self.id(), input, mask)?;
        }
        let gain = A::from_f32(self.gain);
        let output = input.with_data(input.data().mapv(|s| s * gain));
        if !output.is_finite() {
            return Err(AlignError::Inference {
                model: self.id().to_string(),
                reason: "gain produced non-finite samples".to_string(),
            });
        }
        Ok(output)
    }
}

/// Writes a fill value wherever the mask is zero
///
/// Stands in for an inpainting model: unmasked samples pass through and
/// masked samples are regenerated as `fill`.
pub struct MaskFillModel {
    info: ModelInfo,
    fill: f32,
}

impl MaskFillModel {
    pub fn new(fill: f32) -> Self {
        Self {
            info: ModelInfo::new(
                "mask-fill",
                "Mask Fill",
                "Replaces masked samples with a constant (MOCK)",
                true,
            ),
            fill,
        }
    }
}

impl AudioModel for MaskFillModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn infer<A: WithDType>(
        &self,
        input: &AudioBuffer<A>,
        mask: Option<&AudioBuffer<A>>,
    ) -> Result<AudioBuffer<A>> {
        let Some(mask) = mask else {
            return Ok(input.clone());
        };
        check_mask_shape(self.id(), input, mask)?;

        let fill = A::from_f32(self.fill);
        let mut data = input.data().clone();
        Zip::from(&mut data)
            .and(mask.data())
            .for_each(|s, &m| {
                if m.is_zero() {
                    *s = fill;
                }
            });
        Ok(input.with_data(data))
    }
}
