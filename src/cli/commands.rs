//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::PathBuf;

use log::{info, warn};
use ndarray::{ArrayView, Dimension};

use crate::engine::{compute_divisible_length, read_wav, write_wav, RawAudio, RawSample};
use crate::error::Result;
use crate::neural::{AudioModel, IdentityModel};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineOutput};
use crate::prep::{MaskSpec, ScalingPolicy};

/// Print the divisible length for a raw sample count.
pub fn align(length: usize, hop: usize, downsamples: u32) -> Result<()> {
    let aligned = compute_divisible_length(length, hop, downsamples)?;
    info!(
        "{} samples at hop {} with {} downsamples -> {}",
        length, hop, downsamples, aligned
    );
    if aligned < length {
        warn!("divisible length is shorter than the input; pad before aligning");
    }

    println!("{}", aligned);
    Ok(())
}

/// Print the sample ranges covered by a mask spec.
pub fn mask(spec: &str, sample_rate: u32, length: Option<usize>) -> Result<()> {
    let parsed: MaskSpec = spec.parse()?;
    let ranges = match length {
        Some(length) => parsed.sample_ranges(sample_rate, length),
        None => parsed
            .intervals()
            .iter()
            .map(|interval| interval.sample_range(sample_rate))
            .collect(),
    };

    println!("Mask: {}", parsed);
    for range in ranges {
        println!("  samples {}..{}", range.start, range.end);
    }
    Ok(())
}

/// Options for the `process` command
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub sample_rate: Option<u32>,
    pub hop: Option<usize>,
    pub downsamples: Option<u32>,
    pub pad_start: bool,
    pub target_length: Option<usize>,
    pub mask: Option<String>,
    pub peak: Option<f32>,
}

impl ProcessOptions {
    /// Resolve the pipeline config: file (or defaults), then CLI overrides
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(hop) = self.hop {
            config.alignment.hop_length = hop;
        }
        if let Some(downsamples) = self.downsamples {
            config.alignment.num_downsamples = downsamples;
        }
        if self.pad_start {
            config.alignment.pad_end = false;
        }
        if let Some(peak) = self.peak {
            config.input_scaling = Some(ScalingPolicy::new(peak));
        }

        config.validate()?;
        Ok(config)
    }
}

/// Run a WAV file through the pipeline with the identity model.
pub fn process(options: &ProcessOptions) -> Result<()> {
    info!("Processing: {}", options.input.display());

    let config = options.pipeline_config()?;
    let pipeline = Pipeline::new(config, IdentityModel::new())?;
    info!(
        "Model '{}' at {} Hz on {}",
        pipeline.model().id(),
        pipeline.config().sample_rate,
        pipeline.config().device
    );

    let (raw, src_rate) = read_wav(&options.input)?;
    info!(
        "Loaded {} samples x {} channels at {} Hz",
        raw.sample_count(),
        raw.channel_count(),
        src_rate
    );

    let target_length = match options.target_length {
        Some(length) => length,
        None => pipeline.aligned_target_length(raw.sample_count(), src_rate)?,
    };
    let mask = options.mask.as_deref();

    let output = match &raw {
        RawAudio::I16(samples) => run_identity(&pipeline, samples.view(), src_rate, target_length, mask)?,
        RawAudio::I32(samples) => run_identity(&pipeline, samples.view(), src_rate, target_length, mask)?,
        RawAudio::F32(samples) => run_identity(&pipeline, samples.view(), src_rate, target_length, mask)?,
    };

    write_wav(&options.output, output.samples.view(), output.sample_rate)?;

    println!(
        "Wrote {} samples x {} channels at {} Hz to {}",
        output.samples.nrows(),
        output.samples.ncols(),
        output.sample_rate,
        options.output.display()
    );
    Ok(())
}

fn run_identity<T, D>(
    pipeline: &Pipeline<IdentityModel>,
    raw: ArrayView<'_, T, D>,
    src_rate: u32,
    target_length: usize,
    mask: Option<&str>,
) -> Result<PipelineOutput<f32>>
where
    T: RawSample,
    D: Dimension,
{
    pipeline.run::<f32, T, D>(raw, src_rate, target_length, mask)
}
