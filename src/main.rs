//! Stride Align CLI
//!
//! Command-line interface for the stride-align audio pipeline.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use stride_align::cli::commands::{self, ProcessOptions};
use stride_align::cli::{Cli, Commands};
use stride_align::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Stride Align v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Stride Align v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[{}] {}", e.error_code(), e);
            for hint in e.recovery_suggestions() {
                eprintln!("  hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Align {
            length,
            hop,
            downsamples,
        } => commands::align(length, hop, downsamples),
        Commands::Mask {
            spec,
            sample_rate,
            length,
        } => commands::mask(&spec, sample_rate, length),
        Commands::Process {
            input,
            output,
            config,
            sample_rate,
            hop,
            downsamples,
            pad_start,
            target_length,
            mask,
            peak,
        } => commands::process(&ProcessOptions {
            input,
            output,
            config,
            sample_rate,
            hop,
            downsamples,
            pad_start,
            target_length,
            mask,
            peak,
        }),
    }
}
