//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Statica static file collector CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: statica.toml)
    #[arg(short = 'C', long, default_value = "statica.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Collect static files into the destination directory
    #[command(visible_alias = "c")]
    Collect {
        #[command(flatten)]
        args: CollectArgs,
    },

    /// Resolve logical paths to their source files
    #[command(visible_alias = "f")]
    Find {
        #[command(flatten)]
        args: FindArgs,
    },

    /// Serve static files for development
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Allow serving from a release build
        #[arg(long)]
        insecure: bool,
    },
}

/// Collect command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct CollectArgs {
    /// Do everything except modify the filesystem
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Create a symbolic link to each file instead of copying
    #[arg(short, long)]
    pub link: bool,

    /// Do NOT prompt the user for input of any kind
    #[arg(long)]
    pub noinput: bool,

    /// Extra glob-style ignore pattern. Use multiple times to add more
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Drop the default ignore patterns (CVS, .*, *~)
    #[arg(long)]
    pub no_default_ignored: bool,

    /// Leave the extra-directory sources out of this run
    #[arg(long)]
    pub skip_dirs: bool,
}

/// Find command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct FindArgs {
    /// Logical paths to resolve
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,

    /// Print only the first match per path
    #[arg(long)]
    pub first: bool,
}
