use clap::Parser;
use std::path::PathBuf;

use graviton_validator::application::dto::ExecutionMode;
use graviton_validator::application::factories::FormatterType;

/// Validate SBOM components for ARM64 (Graviton) compatibility
#[derive(Parser, Debug)]
#[command(name = "graviton-validator")]
#[command(version)]
#[command(
    about = "Validate SBOM components for ARM64 (Graviton) compatibility",
    long_about = None
)]
pub struct Args {
    /// Normalized components JSON file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Compatibility knowledge base (JSON). Can be specified multiple times
    #[arg(short = 'k', long = "knowledge-base", value_name = "FILE")]
    pub knowledge_bases: Vec<PathBuf>,

    /// Deny list (JSON). Can be specified multiple times
    #[arg(short = 'd', long = "deny-list", value_name = "FILE")]
    pub deny_lists: Vec<PathBuf>,

    /// Report file path (if not specified, outputs to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Config file (defaults to graviton-validator.config.yml in the current directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Probe inconclusive components with their package manager
    #[arg(long)]
    pub runtime: bool,

    /// Where probes run: auto, native or container
    #[arg(long, value_name = "MODE")]
    pub execution_mode: Option<ExecutionMode>,

    /// Directory for generated manifests and per-runtime result files
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// SBOM name used in the report and result file names
    #[arg(long, value_name = "NAME")]
    pub sbom_name: Option<String>,

    /// Operating system, skipping detection from package URLs
    #[arg(long, value_name = "NAME")]
    pub os: Option<String>,

    /// Keep probe directories and container images after the run
    #[arg(long)]
    pub keep_temp: bool,

    /// Debug logging and verbose package-manager output
    #[arg(short, long)]
    pub verbose: bool,

    /// Exit with code 1 when incompatible components are found
    #[arg(long)]
    pub fail_on_incompatible: bool,

    /// Write the report as single-line JSON
    #[arg(long)]
    pub compact: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn formatter_type(&self) -> FormatterType {
        if self.compact {
            FormatterType::CompactJson
        } else {
            FormatterType::Json
        }
    }
}
