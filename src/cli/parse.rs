//! CLI parse: clap types for ideagen. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ideagen - structured ideation from a brief
#[derive(Parser)]
#[command(name = "ideagen")]
#[command(about = "Generate concepts, opportunity spaces, insights and personas from a brief")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (holds config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Brief file; read from stdin when omitted
    #[arg(long, global = true)]
    pub brief: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Five detailed concepts for the opportunity in the brief
    Concepts,
    /// Insights from the brief, then four opportunity spaces over them
    Opportunities,
    /// Four research insights from the brief
    Insights {
        /// Print agent output as it arrives
        #[arg(long)]
        stream: bool,
    },
    /// Five persona cards from the brief
    Personas {
        /// Also generate a headshot per persona
        #[arg(long)]
        headshots: bool,
    },
    /// Two opportunities with three or four concepts each
    Project,
    /// Validate the concept in the brief against markets
    Validate {
        /// Market id or name (repeatable)
        #[arg(long = "market", required = true)]
        markets: Vec<String>,
    },
}
