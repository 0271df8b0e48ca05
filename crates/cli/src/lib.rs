use airmark_core::{CommandWrapper, EditorConfig};
use airmark_model::Document;
use airmark_storage::{read_document, write_document, JsonDocumentWriter, Storage};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub mod script;

#[derive(Debug, Parser)]
#[command(name = "airmark")]
#[command(about = "Annotation editing with undo/redo")]
pub struct Cli {
    #[command(flatten)]
    options: GlobalOptions,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct GlobalOptions {
    /// Editor configuration file (JSON) used instead of the stored one.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Directory holding the stored configuration.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Maximum number of undo entries.
    #[arg(long, global = true, value_name = "N")]
    history_limit: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write an empty document.
    New {
        #[arg(long, default_value_t = 1)]
        pages: usize,
        #[arg(long, value_name = "FILE", default_value = "document.json")]
        output: PathBuf,
    },
    /// Print machine-readable document metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Replay an edit script against a document and save the result.
    Apply {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "SCRIPT")]
        script: PathBuf,
        /// Defaults to overwriting FILE.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the effective editor configuration.
    Config {
        /// Store the effective configuration for later runs.
        #[arg(long)]
        save: bool,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: usize,
    annotation_count: usize,
    pages: Vec<PageOutput>,
}

#[derive(Debug, Serialize)]
struct PageOutput {
    width: f32,
    height: f32,
    annotations: usize,
}

#[derive(Debug, Serialize)]
struct ApplyOutput {
    output: String,
    steps: usize,
    succeeded: usize,
    annotation_count: usize,
    undo_depth: usize,
    redo_depth: usize,
    undo_title: String,
    redo_title: String,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::New { pages, output } => run_new(pages, &output),
        Commands::Info { file } => run_info(&file),
        Commands::Apply { file, script, output } => {
            let config = resolve_config(&cli.options)?;
            run_apply(&file, &script, output.as_deref(), config)
        }
        Commands::Config { save } => run_config(&cli.options, save),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_new(pages: usize, output: &Path) -> Result<()> {
    let document = Document::with_blank_pages(pages);
    write_document(&document, output)
        .with_context(|| format!("failed to write document to {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn run_info(file: &Path) -> Result<()> {
    let document = open_document(file)?;

    let pages = document
        .pages
        .iter()
        .map(|page| PageOutput {
            width: page.size.width_pt,
            height: page.size.height_pt,
            annotations: page.annotations.len(),
        })
        .collect();
    let payload = InfoOutput {
        path: file.display().to_string(),
        page_count: document.page_count(),
        annotation_count: document.annotation_count(),
        pages,
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");
    Ok(())
}

fn run_apply(file: &Path, script: &Path, output: Option<&Path>, config: EditorConfig) -> Result<()> {
    let document = open_document(file)?;
    let source =
        fs::read(script).with_context(|| format!("failed to read script {}", script.display()))?;
    let steps = script::parse(&source)
        .with_context(|| format!("invalid script {}", script.display()))?;

    let mut engine = CommandWrapper::with_config(document, config).with_writer(JsonDocumentWriter);
    let succeeded = steps.iter().filter(|step| script::run_step(&mut engine, step)).count();
    tracing::info!(steps = steps.len(), succeeded, "script applied");

    let output = output.unwrap_or(file);
    write_document(engine.document(), output)
        .with_context(|| format!("failed to write document to {}", output.display()))?;

    let payload = ApplyOutput {
        output: output.display().to_string(),
        steps: steps.len(),
        succeeded,
        annotation_count: engine.document().annotation_count(),
        undo_depth: engine.undo_count(),
        redo_depth: engine.redo_count(),
        undo_title: engine.suggested_undo_title(),
        redo_title: engine.suggested_redo_title(),
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");
    Ok(())
}

fn run_config(options: &GlobalOptions, save: bool) -> Result<()> {
    let config = resolve_config(options)?;

    if save {
        let storage = storage_for(options)?;
        storage.save_config(&config).with_context(|| {
            format!("failed to store configuration in {}", storage.root().display())
        })?;
    }

    let json = serde_json::to_string_pretty(&config)?;
    println!("{json}");
    Ok(())
}

/// Stored (or `--config`) configuration, then environment, then flags.
fn resolve_config(options: &GlobalOptions) -> Result<EditorConfig> {
    let base: EditorConfig = match &options.config {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_slice(&bytes)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => storage_for(options)?.load_config().context("failed to load stored configuration")?,
    };

    let mut config = base.with_env_overrides().context("invalid configuration in environment")?;
    if let Some(limit) = options.history_limit {
        config.history_limit = Some(limit);
    }
    Ok(config)
}

fn storage_for(options: &GlobalOptions) -> Result<Storage> {
    match &options.data_dir {
        Some(dir) => Ok(Storage::with_root(dir)),
        None => Storage::from_default_project().context("no data directory for stored configuration"),
    }
}

fn open_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    read_document(path).with_context(|| format!("failed to open document {}", path.display()))
}
