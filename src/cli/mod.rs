//! Command-line interface implementation
//!
//! This module parses arguments and dispatches to the command
//! implementations in [`build`].

mod build;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// assetpack - Concatenate packages and generate sprite sheets
#[derive(Parser)]
#[command(name = "assetpack")]
#[command(about = "Concatenate asset packages and generate CSS sprite sheets")]
#[command(version)]
pub struct Cli {
    /// Path to assetpack.toml (default: search upward from the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build sprites and packages
    Build {
        /// Only build this package (repeatable)
        #[arg(long = "package", value_name = "NAME")]
        packages: Vec<String>,

        /// Only build this sprite (repeatable)
        #[arg(long = "sprite", value_name = "NAME")]
        sprites: Vec<String>,

        /// Only build targets matching a filter such as "sprite:*" (repeatable)
        #[arg(long = "target", value_name = "FILTER")]
        targets: Vec<String>,

        /// Rebuild even when outputs are up to date
        #[arg(short, long)]
        force: bool,

        /// Override output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Override source directory
        #[arg(long)]
        src: Option<PathBuf>,
    },

    /// Validate the configuration and list stale sprites
    Check,

    /// Show which sprite a source image belongs to
    Which {
        /// Image path, relative to the current directory or the source root
        path: PathBuf,
    },
}

/// Target filters selected by the `build` flags.
pub(crate) fn target_filters(
    packages: &[String],
    sprites: &[String],
    targets: &[String],
) -> Vec<String> {
    let packages = packages.iter().map(|n| format!("package:{}", n));
    let sprites = sprites.iter().map(|n| format!("sprite:{}", n));
    packages.chain(sprites).chain(targets.iter().cloned()).collect()
}

/// Parse arguments, run the selected command and map the outcome to an exit
/// code.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    crate::logging::init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Build { packages, sprites, targets, force, out, src } => {
            let filters = target_filters(&packages, &sprites, &targets);
            build::run_build(config, out, src, filters, force, cli.verbose)
        }
        Commands::Check => build::run_check(config, cli.verbose),
        Commands::Which { path } => build::run_which(config, &path),
    }
}
