//! salesdash - sales analytics dashboard
//!
//! Loads a sales table once, then compares quarters and custom periods,
//! breaks sales down by product, region and demographics, and answers
//! questions about the table through an extractive QA model.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (data load, model failure, configuration, I/O)
//!   2 - Invalid selection in one-shot mode

mod analysis;
mod cli;
mod comparison;
mod config;
mod dataset;
mod error;
mod models;
mod periods;
mod qa;
mod repl;
mod report;
mod session;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use dataset::{Dataset, LoadOptions};
use error::DashboardError;
use models::Output;
use report::{Report, ReportMetadata};
use session::{Selection, Session};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging starts so `[general] verbose` can apply
    let config = match load_config(&args).and_then(|mut config| {
        config.merge_with_args(&args);
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("salesdash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            let code = match e.downcast_ref::<DashboardError>() {
                Some(DashboardError::Validation(_)) => 2,
                _ => 1,
            };
            std::process::exit(code);
        }
    }
}

/// Handle --init-config: generate a default .salesdash.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    println!("Edit it to set the dataset source, model and custom periods.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only results.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(args: Args, config: Config) -> Result<()> {
    let load_options = LoadOptions {
        timeout: Duration::from_secs(config.dataset.timeout_seconds),
        show_progress: !args.quiet,
    };
    let dataset = Dataset::load(&config.dataset.source, &load_options).await?;
    if dataset.is_empty() {
        warn!("Dataset {} has no records", dataset.source());
    } else {
        info!("Loaded {} records", dataset.len());
    }

    let answerer = qa::build_answerer(&config.model)?;
    let mut ask_options = qa::AskOptions::from(&config.model);
    ask_options.show_progress = !args.quiet;
    let mut session = Session::new(Arc::new(dataset), answerer, ask_options);

    for (name, months) in &config.periods {
        // a bad config file is a configuration failure, not a user selection error
        session
            .add_period(name, months)
            .map_err(|e| anyhow::anyhow!("Invalid period '{}' in config: {}", name, e))?;
    }
    for spec in &args.add_period {
        session.add_period(&spec.name, &spec.months)?;
    }

    if args.interactive {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        return repl::run(&mut session, stdin, &mut stdout).await;
    }

    let (label, output) = if args.list_periods {
        ("Periods".to_string(), Output::Periods(session.all_periods()))
    } else if args.list_years {
        ("Years".to_string(), Output::Years(session.years()))
    } else if let Some(analysis) = args.analysis {
        let selection = Selection {
            periods: args.periods.clone(),
            years: args.years.clone(),
            question: args.question.clone(),
        };
        (
            analysis.label().to_string(),
            session.run(analysis, &selection).await?,
        )
    } else {
        return Ok(());
    };

    emit(&args, &config, &session, label, output)
}

/// Print or save a one-shot result.
fn emit(
    args: &Args,
    config: &Config,
    session: &Session,
    label: String,
    output: Output,
) -> Result<()> {
    let Some(ref path) = args.output else {
        let content = match config.general.format {
            OutputFormat::Json => report::render_json(&output)?,
            OutputFormat::Markdown => report::render_markdown(&output),
        };
        println!("{}", content);
        return Ok(());
    };

    let report = Report {
        metadata: ReportMetadata {
            dataset_source: session.dataset().source().to_string(),
            records: session.dataset().len(),
            analysis: label,
            generated_at: Utc::now(),
        },
        output,
    };

    let content = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };
    report::write_report(&content, path)?;

    info!("Report saved to: {}", path.display());
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("Warning: failed to load {}: {:#}", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
