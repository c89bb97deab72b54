//! CLI Module
//!
//! Command-line interface for stride-align.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stride Align - prepare audio for strided generative models
#[derive(Parser, Debug)]
#[command(name = "stride-align")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the divisible length for a sample count
    #[command(name = "align")]
    Align {
        /// Raw length in samples
        #[arg(short, long)]
        length: usize,

        /// Hop length in samples
        #[arg(long, default_value_t = 256)]
        hop: usize,

        /// Number of stride-2 downsampling stages
        #[arg(short, long, default_value_t = 6)]
        downsamples: u32,
    },

    /// Print the sample ranges a mask spec covers
    #[command(name = "mask")]
    Mask {
        /// Intervals in whole seconds, e.g. 0-1,3-4
        #[arg(short, long)]
        spec: String,

        /// Sample rate used to convert seconds to samples
        #[arg(short = 'r', long)]
        sample_rate: u32,

        /// Clip ranges to a buffer of this many samples
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Run a WAV file through the pipeline with a pass-through model
    #[command(name = "process")]
    Process {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output WAV file (32-bit float)
        #[arg(short, long)]
        output: PathBuf,

        /// JSON pipeline config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Model sample rate (overrides config)
        #[arg(short = 'r', long)]
        sample_rate: Option<u32>,

        /// Hop length (overrides config)
        #[arg(long)]
        hop: Option<usize>,

        /// Downsampling stages (overrides config)
        #[arg(short, long)]
        downsamples: Option<u32>,

        /// Pad and crop at the leading edge instead of the trailing edge
        #[arg(long)]
        pad_start: bool,

        /// Target length in input samples (defaults to the shortest aligned length covering the input)
        #[arg(short, long)]
        target_length: Option<usize>,

        /// Mask spec passed to the model, e.g. 0-1,3-4
        #[arg(short, long)]
        mask: Option<String>,

        /// Scale the model input to this peak (overrides config)
        #[arg(short, long)]
        peak: Option<f32>,
    },
}
