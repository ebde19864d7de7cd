//! Statica - static file collection, cache-busting, and dev serving.

mod cli;
mod collect;
mod config;
mod finder;
mod ignore;
mod logger;
mod storage;
mod utils;
mod walk;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::StaticConfig;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = StaticConfig::load(cli)?;

    match &cli.command {
        Commands::Collect { args } => cli::collect::run_collect(args, &config),
        Commands::Find { args } => cli::find::run_find(args, &config),
        Commands::Serve { .. } => cli::serve::run_serve(&config),
    }
}
