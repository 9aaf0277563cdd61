//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Render page templates into a static site, optionally watching and serving it
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output directory [default: `build.output` from the config, or dist]
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Watch sources, rebuild on change and serve the output over HTTP
    #[arg(long)]
    pub dev: bool,

    /// Config file path [default: site.toml, if present]
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}
