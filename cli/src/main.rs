//! CLI entrypoint for nepho
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod progress;

use anyhow::{Context, Result, bail};
use clap::Parser;
use commands::{BackendKind, Cli, Command};
use nepho_application::{
    ChatBackend, LabelDatasetUseCase, LabelRunOptions, LabelStore, NoProgress,
};
use nepho_domain::{LabelPromptTemplate, Model};
use nepho_infrastructure::{
    ConfigLoader, CsvLabelStore, FileConfig, OllamaBackend, OpenAiBackend, SidecarWriter,
    scan_images,
};
use progress::ProgressReporter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };
    for issue in config.validate() {
        warn!("config: {issue}");
    }

    match cli.command {
        Command::Label {
            labels,
            output,
            backend,
            model,
            raw_dir,
            site,
            continue_on_error,
            max_concurrency,
        } => {
            run_label(
                &config,
                LabelArgs {
                    labels,
                    output,
                    backend,
                    model,
                    raw_dir,
                    site,
                    continue_on_error,
                    max_concurrency,
                    quiet: cli.quiet,
                    verbose: cli.verbose,
                },
            )
            .await
        }
        Command::Scan { images_dir, output } => run_scan(&images_dir, &output),
        Command::Models => run_models(&config).await,
    }
}

struct LabelArgs {
    labels: PathBuf,
    output: Option<PathBuf>,
    backend: BackendKind,
    model: Option<String>,
    raw_dir: Option<PathBuf>,
    site: Option<String>,
    continue_on_error: bool,
    max_concurrency: Option<usize>,
    quiet: bool,
    verbose: u8,
}

/// Build the requested backend from the configuration.
///
/// The labeling loop only sees the `ChatBackend` capability; which serving
/// system is behind it is decided here, once, at construction.
fn build_backend(
    kind: BackendKind,
    model: Option<String>,
    config: &FileConfig,
) -> Result<Arc<dyn ChatBackend>> {
    let gate = config.image_gate();
    let timeout = config.request_timeout();
    match kind {
        BackendKind::Openai => {
            let model = model
                .map(Model::new)
                .unwrap_or_else(|| config.models.openai_model());
            let backend = OpenAiBackend::new(
                model,
                config.openai.resolve_api_key(),
                config.openai.base_url.as_str(),
                gate,
                timeout,
            )?;
            Ok(Arc::new(backend))
        }
        BackendKind::Ollama => {
            let model = model
                .map(Model::new)
                .unwrap_or_else(|| config.models.ollama_model());
            let backend = OllamaBackend::new(
                model,
                config.ollama.base_url.as_str(),
                gate,
                timeout,
                config.ollama.non_vision_image_policy,
            )?;
            Ok(Arc::new(backend))
        }
    }
}

async fn run_label(config: &FileConfig, args: LabelArgs) -> Result<()> {
    let store = CsvLabelStore::new(&args.labels);
    let mut records = store
        .load()
        .with_context(|| format!("failed to load dataset {}", args.labels.display()))?;
    if records.is_empty() {
        bail!("no records in {}", args.labels.display());
    }

    let backend = build_backend(args.backend, args.model, config)?;
    info!(model = %backend.model(), records = records.len(), "labeling dataset");

    let mut use_case = LabelDatasetUseCase::new(backend);
    if let Some(dir) = &args.raw_dir {
        let sink = SidecarWriter::new(dir)
            .with_context(|| format!("cannot create raw output directory {}", dir.display()))?;
        use_case = use_case.with_raw_sink(Arc::new(sink));
    }

    let taxonomy = config.labeling.taxonomy()?;
    let template = match args.site {
        Some(site) => {
            LabelPromptTemplate::new(site, (config.labeling.vmin, config.labeling.vmax))
        }
        None => config.labeling.template(),
    };
    let options = LabelRunOptions {
        max_concurrency: args
            .max_concurrency
            .unwrap_or(config.labeling.max_concurrency)
            .max(1),
        continue_on_error: args.continue_on_error || config.labeling.continue_on_error,
    };

    if args.quiet {
        use_case
            .execute_with_progress(&mut records, &taxonomy, &template, &options, &NoProgress)
            .await?;
    } else {
        let reporter = ProgressReporter::new(args.verbose > 0);
        use_case
            .execute_with_progress(&mut records, &taxonomy, &template, &options, &reporter)
            .await?;
    }

    let out_store = match args.output {
        Some(path) => CsvLabelStore::new(path),
        None => store,
    };
    out_store.save(&records)?;

    let labeled = records.iter().filter(|r| r.llm_label.is_some()).count();
    println!(
        "Labeled {labeled}/{} records -> {}",
        records.len(),
        out_store.path().display()
    );
    Ok(())
}

fn run_scan(images_dir: &PathBuf, output: &PathBuf) -> Result<()> {
    let records = scan_images(images_dir)
        .with_context(|| format!("failed to scan {}", images_dir.display()))?;
    if records.is_empty() {
        bail!("no radar images found in {}", images_dir.display());
    }

    CsvLabelStore::new(output).save(&records)?;
    println!("Found {} images -> {}", records.len(), output.display());
    Ok(())
}

async fn run_models(config: &FileConfig) -> Result<()> {
    let backend = OllamaBackend::new(
        config.models.ollama_model(),
        config.ollama.base_url.as_str(),
        config.image_gate(),
        config.request_timeout(),
        config.ollama.non_vision_image_policy,
    )?;

    let models = backend.list_models().await;
    if models.is_empty() {
        println!("No models installed (is the server at {} up?)", config.ollama.base_url);
        return Ok(());
    }
    for name in models {
        let model = Model::new(name.as_str());
        if model.supports_vision() {
            println!("{name} (vision)");
        } else {
            println!("{name}");
        }
    }
    Ok(())
}
