pub mod config;
pub mod dataset;
pub mod export;
pub mod extract;
pub mod filter;
pub mod llm;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod synth;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use dataset::Dataset;
use export::{ExportFormat, ExportOptions, ResultView};
use extract::{FilterExtractor, LlmExtractor, RuleExtractor};
use llm::{LanguageModel, OpenAiClient};
use pipeline::{Pipeline, SearchOutcome};
use synth::LlmSynthesizer;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "propsearch",
    version,
    about = "Natural-language search over real-estate listings"
)]
pub struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/propsearch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Cleaned listings CSV (overrides dataset.path)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a question about the listings
    Ask {
        query: String,

        /// Use the rule-based extractor and print results instead of a model answer
        #[arg(long)]
        offline: bool,
    },
    /// Print the listings matching a query
    Search {
        query: String,

        /// Use the rule-based extractor instead of the model
        #[arg(long)]
        offline: bool,

        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,

        /// Maximum rows to print (0 = all)
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the filters extracted from a query as JSON
    Extract {
        query: String,

        /// Use the rule-based extractor instead of the model
        #[arg(long)]
        offline: bool,
    },
    /// Join the raw project tables into the cleaned listings CSV
    Prepare {
        /// Directory holding project.csv, ProjectAddress.csv,
        /// ProjectConfiguration.csv and ProjectConfigurationVariant.csv
        #[arg(long)]
        input_dir: PathBuf,

        /// Output CSV (defaults to the configured dataset path)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::load().context("loading config")?,
    };
    if let Some(data) = &cli.data {
        config.dataset.path = data.clone();
    }

    match cli.command {
        Commands::Ask { query, offline } => run_ask(&config, &query, offline).await,
        Commands::Search {
            query,
            offline,
            format,
            limit,
        } => run_search(&config, &query, offline, format, limit).await,
        Commands::Extract { query, offline } => run_extract(&config, &query, offline).await,
        Commands::Prepare { input_dir, output } => {
            let output = output.unwrap_or_else(|| config.dataset.path.clone());
            run_prepare(&input_dir, &output)
        }
    }
}

/// Log to stderr so stdout carries only results.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn language_model(config: &AppConfig) -> Result<Arc<dyn LanguageModel>> {
    let api_key = config.llm.api_key()?;
    let client = OpenAiClient::new(
        &config.llm.base_url,
        &config.llm.model,
        api_key,
        config.llm.timeout(),
    )
    .context("building model client")?;
    Ok(Arc::new(client))
}

fn extractor(config: &AppConfig, offline: bool) -> Result<Arc<dyn FilterExtractor>> {
    if offline {
        return Ok(Arc::new(RuleExtractor::new()));
    }
    let model = language_model(config)?;
    Ok(Arc::new(
        LlmExtractor::new(model).with_temperature(config.llm.temperature),
    ))
}

fn load_dataset(config: &AppConfig) -> Result<Arc<Dataset>> {
    let dataset = Dataset::load(&config.dataset.path)
        .with_context(|| format!("loading dataset {}", config.dataset.path.display()))?;
    Ok(Arc::new(dataset))
}

fn render(
    pipeline: &Pipeline,
    outcome: &SearchOutcome,
    query: &str,
    format: ExportFormat,
    limit: usize,
) -> String {
    let view = ResultView {
        filters: &outcome.filters,
        records: outcome.records(pipeline.dataset()),
        constrained: outcome.results.is_constrained(),
    };
    let options = ExportOptions {
        query: Some(query.to_string()),
        max_rows: limit,
        ..Default::default()
    };
    export::export_results(&view, format, &options)
}

async fn run_ask(config: &AppConfig, query: &str, offline: bool) -> Result<()> {
    let dataset = load_dataset(config)?;

    if offline {
        let pipeline = Pipeline::new(dataset, extractor(config, true)?);
        let outcome = pipeline.search(query).await?;
        println!(
            "{}",
            render(&pipeline, &outcome, query, ExportFormat::PlainText, 10)
        );
        return Ok(());
    }

    let model = language_model(config)?;
    let extractor = LlmExtractor::new(Arc::clone(&model)).with_temperature(config.llm.temperature);
    let synthesizer = LlmSynthesizer::new(model)
        .with_max_records(config.synthesis.max_records)
        .with_temperature(config.synthesis.temperature);
    let pipeline =
        Pipeline::new(dataset, Arc::new(extractor)).with_synthesizer(Arc::new(synthesizer));

    let answer = pipeline.answer(query).await?;
    println!("{}", answer.text);
    Ok(())
}

async fn run_search(
    config: &AppConfig,
    query: &str,
    offline: bool,
    format: ExportFormat,
    limit: usize,
) -> Result<()> {
    let dataset = load_dataset(config)?;
    let pipeline = Pipeline::new(dataset, extractor(config, offline)?);
    let outcome = pipeline.search(query).await?;
    println!("{}", render(&pipeline, &outcome, query, format, limit));
    Ok(())
}

async fn run_extract(config: &AppConfig, query: &str, offline: bool) -> Result<()> {
    let filters = extractor(config, offline)?.extract(query).await?;
    println!("{}", serde_json::to_string_pretty(&filters.to_json())?);
    Ok(())
}

fn run_prepare(input_dir: &Path, output: &Path) -> Result<()> {
    let summary = dataset::prepare::prepare(input_dir, output)
        .with_context(|| format!("preparing dataset from {}", input_dir.display()))?;
    if !summary.missing_columns.is_empty() {
        eprintln!(
            "warning: columns missing from source tables: {}",
            summary.missing_columns.join(", ")
        );
    }
    println!("wrote {} rows to {}", summary.rows, output.display());
    Ok(())
}
