//! End-to-end model pipeline
//!
//! Wires the ingest normalizer, optional input scaling, mask preparation,
//! the injected model, and the egress denormalizer into one call. The
//! pipeline holds no per-request state; one instance can serve any number
//! of requests.

use std::path::Path;

use ndarray::{Array, Array2, ArrayView, Dimension};
use serde::{Deserialize, Serialize};

use crate::engine::align::AlignmentSpec;
use crate::engine::buffer::{AudioBuffer, Device, RawSample, WithDType};
use crate::engine::cast::{HostCast, TensorCast};
use crate::engine::resample::{Resampler, SincResampler};
use crate::error::{AlignError, Result};
use crate::neural::AudioModel;
use crate::prep::{
    aligned_target_length, denormalize_from_model, generate_mask, normalize_for_model_with,
    IngestRequest, ScalingPolicy,
};

/// Default model sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

/// Pipeline configuration
///
/// Every field has a default, so `{}` is a valid JSON config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Sample rate the model expects
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Model framing and padding edge
    #[serde(default)]
    pub alignment: AlignmentSpec,

    /// Compute target for the model buffer
    #[serde(default)]
    pub device: Device,

    /// Peak scaling applied to the model input, if any
    #[serde(default)]
    pub input_scaling: Option<ScalingPolicy>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            alignment: AlignmentSpec::default(),
            device: Device::Cpu,
            input_scaling: None,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AlignError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AlignError::InvalidRate {
                rate: self.sample_rate,
                context: "model",
            });
        }
        self.alignment.validate()?;
        if let Some(policy) = &self.input_scaling {
            policy.validate()?;
        }
        Ok(())
    }
}

/// Denormalized model output
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput<A> {
    /// `(time, channel)` samples
    pub samples: Array2<A>,
    /// Rate of `samples`, i.e. the model rate
    pub sample_rate: u32,
}

/// Pre-processing, inference and post-processing for one model
pub struct Pipeline<M, R = SincResampler, C = HostCast> {
    config: PipelineConfig,
    model: M,
    resampler: R,
    cast: C,
}

impl<M: AudioModel> Pipeline<M> {
    /// Create a pipeline with the default resampler and host cast
    pub fn new(config: PipelineConfig, model: M) -> Result<Self> {
        Self::with_components(config, model, SincResampler::default(), HostCast)
    }
}

impl<M, R, C> Pipeline<M, R, C>
where
    M: AudioModel,
    R: Resampler,
    C: TensorCast,
{
    pub fn with_components(config: PipelineConfig, model: M, resampler: R, cast: C) -> Result<Self> {
        config.validate()?;
        log::debug!("pipeline for model '{}': {:?}", model.id(), config);
        Ok(Self {
            config,
            model,
            resampler,
            cast,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn request(&self, src_rate: u32, target_length: usize) -> IngestRequest {
        IngestRequest {
            src_rate,
            target_rate: self.config.sample_rate,
            target_length,
            alignment: self.config.alignment,
            device: self.config.device,
        }
    }

    /// Smallest target length covering `length` input samples that this
    /// pipeline can align without failing
    pub fn aligned_target_length(&self, length: usize, src_rate: u32) -> Result<usize> {
        aligned_target_length(length, src_rate, self.config.sample_rate, &self.config.alignment)
    }

    /// Normalize raw audio into a model buffer, scaling it if configured
    ///
    /// `target_length` is a sample count at `src_rate`.
    pub fn prepare<A, T, D>(
        &self,
        raw: ArrayView<'_, T, D>,
        src_rate: u32,
        target_length: usize,
    ) -> Result<AudioBuffer<A>>
    where
        A: WithDType,
        T: RawSample,
        D: Dimension,
    {
        let request = self.request(src_rate, target_length);
        let buffer = normalize_for_model_with(raw, &request, &self.resampler, &self.cast)?;

        match &self.config.input_scaling {
            Some(policy) => {
                let scaled = policy.apply(buffer.data())?;
                Ok(buffer.with_data(scaled))
            }
            None => Ok(buffer),
        }
    }

    /// Build a mask over `raw` and bring it into the model buffer layout
    ///
    /// The mask goes through the same ingest path as the audio, so padding
    /// added for alignment is masked too. Values are rounded back to exact
    /// zeros and ones after resampling.
    pub fn prepare_mask<A, T, D>(
        &self,
        raw: ArrayView<'_, T, D>,
        src_rate: u32,
        target_length: usize,
        spec: &str,
    ) -> Result<AudioBuffer<A>>
    where
        A: WithDType,
        T: RawSample,
        D: Dimension,
    {
        let mask: Array<f32, D> = generate_mask(&raw, src_rate, spec)?;
        let request = self.request(src_rate, target_length);
        let buffer: AudioBuffer<A> =
            normalize_for_model_with(mask.view(), &request, &self.resampler, &self.cast)?;
        let binary = buffer.data().mapv(|m| m.round());
        Ok(buffer.with_data(binary))
    }

    /// Run the full pipeline on one raw array
    ///
    /// The output has `target_length` rescaled to the model rate samples per
    /// channel, in `(time, channel)` layout.
    pub fn run<A, T, D>(
        &self,
        raw: ArrayView<'_, T, D>,
        src_rate: u32,
        target_length: usize,
        mask_spec: Option<&str>,
    ) -> Result<PipelineOutput<A>>
    where
        A: WithDType,
        T: RawSample,
        D: Dimension,
    {
        let input: AudioBuffer<A> = self.prepare(raw.view(), src_rate, target_length)?;
        let mask = mask_spec
            .map(|spec| self.prepare_mask::<A, T, D>(raw.view(), src_rate, target_length, spec))
            .transpose()?;

        log::debug!(
            "running '{}' on {} x {} samples at {} Hz{}",
            self.model.id(),
            input.channel_count(),
            input.sample_count(),
            input.sample_rate(),
            if mask.is_some() { " with mask" } else { "" }
        );
        let output = self.model.infer(&input, mask.as_ref())?;

        let model_length = self.request(src_rate, target_length).rescaled_target_length()?;
        let samples = denormalize_from_model(output.view(), model_length, self.config.alignment.pad_end)?;

        Ok(PipelineOutput {
            samples,
            sample_rate: output.sample_rate(),
        })
    }
}
