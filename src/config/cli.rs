use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "reddit-gateway")]
#[command(about = "Run Reddit API work items and flatten the results")]
pub struct CliConfig {
    /// JSON file containing an array of work items
    #[arg(short, long)]
    pub input: String,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override [output].output_path from the config
    #[arg(long)]
    pub output_path: Option<String>,

    /// Resolve every item and print its request without calling the API
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines instead of the compact format
    #[arg(long)]
    pub json_logs: bool,
}
