//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::Analysis;
use crate::error::DashboardError;
use crate::qa::ModelBackend;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// salesdash - sales analytics dashboard for the terminal
///
/// Compare sales across quarters and custom periods, break sales down by
/// product, region and customer demographics, and ask questions about the
/// table in plain language.
///
/// Examples:
///   salesdash --analysis compare-periods --periods Q1,Q2 --years 2023,2024
///   salesdash --analysis compare-periods --add-period Holiday=11,12 --periods Holiday --years 2023
///   salesdash --analysis product-sales --format json --output products.json
///   salesdash --analysis ask-question --question "Which region sold the most?"
///   salesdash --interactive
///   salesdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Analysis to run once and exit
    #[arg(short, long, value_enum, value_name = "NAME", conflicts_with = "interactive")]
    pub analysis: Option<Analysis>,

    /// Periods to compare (comma-separated)
    ///
    /// Example: --periods Q1,Q2,Holiday
    #[arg(short, long, value_name = "NAMES", value_delimiter = ',')]
    pub periods: Vec<String>,

    /// Years to compare (comma-separated)
    ///
    /// Example: --years 2023,2024
    #[arg(short, long, value_name = "YEARS", value_delimiter = ',')]
    pub years: Vec<i32>,

    /// Question to ask about the sales table
    #[arg(long, value_name = "TEXT")]
    pub question: Option<String>,

    /// Define a custom period for this run (repeatable)
    ///
    /// Overrides a default quarter when the name matches.
    /// Example: --add-period Holiday=11,12
    #[arg(long, value_name = "NAME=MM,MM")]
    pub add_period: Vec<PeriodSpec>,

    /// URL or path of the sales CSV
    ///
    /// Can also be set via SALESDASH_DATASET env var or .salesdash.toml config.
    #[arg(short, long, value_name = "SOURCE", env = "SALESDASH_DATASET")]
    pub dataset: Option<String>,

    /// Question-answering backend
    #[arg(long, value_enum, value_name = "BACKEND")]
    pub backend: Option<ModelBackend>,

    /// Question-answering model name
    #[arg(short, long, value_name = "MODEL", env = "SALESDASH_MODEL")]
    pub model: Option<String>,

    /// Question-answering API base URL
    #[arg(long, value_name = "URL", env = "SALESDASH_MODEL_URL")]
    pub model_url: Option<String>,

    /// Model request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format (markdown, json)
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .salesdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(long)]
    pub quiet: bool,

    /// List available periods and exit
    #[arg(long)]
    pub list_periods: bool,

    /// List years present in the dataset and exit
    #[arg(long)]
    pub list_years: bool,

    /// Start an interactive session reading commands from stdin
    #[arg(short, long)]
    pub interactive: bool,

    /// Generate a default .salesdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// A `NAME=MM,MM` custom period given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSpec {
    pub name: String,
    pub months: Vec<String>,
}

impl FromStr for PeriodSpec {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, months) = crate::session::parse_period_spec(s)?;
        Ok(Self { name, months })
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.analysis.is_none() && !self.interactive && !self.list_periods && !self.list_years
        {
            return Err(
                "Nothing to do: pass --analysis, --interactive, --list-periods or --list-years"
                    .to_string(),
            );
        }

        if let Some(ref url) = self.model_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Model URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.interactive && self.output.is_some() {
            return Err("--output cannot be used with --interactive".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
