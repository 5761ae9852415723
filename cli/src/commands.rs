//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Which backend answers the labeling requests
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendKind {
    /// Local Ollama-style server
    Ollama,
    /// Hosted chat-completions API
    Openai,
}

/// CLI arguments for nepho
#[derive(Parser, Debug)]
#[command(name = "nepho")]
#[command(author, version, about = "Label weather-radar reflectivity images with vision LLMs")]
#[command(long_about = r#"
Nepho sends rendered radar reflectivity images to a vision-capable chat model
and maps each free-text answer onto a fixed set of precipitation categories.

Configuration files are loaded from (in priority order):
1. NEPHO_* environment variables
2. --config <path>      Explicit config file
3. ./nepho.toml         Project-level config
4. ~/.config/nepho/config.toml   Global config

Example:
  nepho scan renders/ -o labels.csv
  nepho label labels.csv --backend ollama --model llava:13b --raw-dir raw/
  nepho models
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Label every record in a dataset CSV
    Label {
        /// Dataset CSV (columns: file_path, time, label, llm_label)
        labels: PathBuf,

        /// Where to write the labeled CSV (defaults to in-place)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Backend to query
        #[arg(short, long, value_enum, default_value = "ollama")]
        backend: BackendKind,

        /// Model name (defaults to the configured model for the backend)
        #[arg(short, long, value_name = "MODEL")]
        model: Option<String>,

        /// Directory for verbatim raw model responses (one .txt per image)
        #[arg(long, value_name = "DIR")]
        raw_dir: Option<PathBuf>,

        /// Radar site identifier restated in the prompt
        #[arg(long, value_name = "SITE")]
        site: Option<String>,

        /// Skip failing records instead of aborting the run
        #[arg(long)]
        continue_on_error: bool,

        /// Maximum in-flight requests (1 = strict sequential)
        #[arg(long, value_name = "N")]
        max_concurrency: Option<usize>,
    },

    /// Build a dataset CSV from a directory of rendered radar images
    Scan {
        /// Directory containing rendered .png radar images
        images_dir: PathBuf,

        /// Output CSV path
        #[arg(short, long, default_value = "labels.csv")]
        output: PathBuf,
    },

    /// List models installed on the local server
    Models,
}
