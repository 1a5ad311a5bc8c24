// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod files;
pub mod serve;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::ServiceConfig;

/// Diagram analysis service
#[derive(Parser, Debug)]
#[command(name = "diagram-analyzer")]
#[command(version)]
#[command(about = "OCR, node detection and vision-LLM analysis of diagrams", long_about = None)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(serve::ServeArgs),

    /// Print the text blocks of a local image as JSON
    Ocr(files::FileArgs),

    /// Print detector output for a local image as JSON
    Detect(files::FileArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = ServiceConfig::from_env()?;
    config.validate()?;

    match cli.command {
        None => serve::run(serve::ServeArgs::default(), config).await,
        Some(Commands::Serve(args)) => serve::run(args, config).await,
        Some(Commands::Ocr(args)) => files::run_ocr(args, &config).await,
        Some(Commands::Detect(args)) => files::run_detect(args, &config).await,
    }
}
