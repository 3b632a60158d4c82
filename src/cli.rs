use clap::Parser;
use std::path::PathBuf;

/// Command-line interface for the traffic collector.
#[derive(Debug, Parser)]
#[command(author, version, about = "GitHub repository traffic collector and chart generator", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file (defaults to ./git-traffik.toml if present).
    #[arg(long, value_name = "FILE")]
    pub config_path: Option<PathBuf>,
    /// Update the CSV history without rendering the chart image.
    #[arg(long)]
    pub skip_chart: bool,
}
