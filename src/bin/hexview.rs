use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use hexview::plugin::registry::PluginResolver;
use hexview::{logging, log_error, DocumentSession, PluginCatalog, ProgressSink, ViewSinks, ViewerConfig};

#[derive(Parser)]
#[command(name = "hexview")]
#[command(version, about = "Dump a file as address, hex and ascii columns")]
struct Cli {
    /// Print hex digits in uppercase
    #[arg(long)]
    uppercase: bool,

    /// Load a plugin; may be repeated
    #[arg(long = "plugin", value_name = "NAME")]
    plugins: Vec<String>,

    /// Configuration file (key=value lines, or JSON with a .json extension)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Read buffer size in bytes
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<usize>,

    /// List the built-in plugins and exit
    #[arg(long)]
    list_plugins: bool,

    /// File to view, "-" for stdin
    #[arg(required_unless_present = "list_plugins")]
    file: Option<PathBuf>,
}

/// Progress goes to the log; stdout carries the dump.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn set_determinate(&mut self, fraction: f64, label: &str) {
        debug!(fraction, label, "Progress");
    }

    fn pulse(&mut self) {
        debug!("Progress (unknown size)");
    }

    fn finish(&mut self) {
        debug!("Progress finished");
    }
}

fn build_config(cli: &Cli) -> Result<ViewerConfig> {
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .map_err(|e| log_error!(e, "loading configuration"))
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    config.uppercase |= cli.uppercase;
    for name in &cli.plugins {
        if !config.plugins.contains(name) {
            config.plugins.push(name.clone());
        }
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    config.validate().context("Invalid options")?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.json_logs {
        logging::init_tracing_json();
    } else {
        logging::init_tracing();
    }

    if cli.list_plugins {
        for name in PluginCatalog::builtin().available() {
            println!("{name}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = build_config(&cli)?;
    let (sinks, views) = ViewSinks::in_memory();
    let mut session = DocumentSession::builder()
        .with_config(config)
        .with_views(sinks)
        .with_progress(LogProgress)
        .build()?;

    // Failures below were already reported by the session
    if session.load_configured_plugins().is_err() {
        return Ok(ExitCode::FAILURE);
    }
    let Some(file) = cli.file.as_ref() else {
        return Ok(ExitCode::SUCCESS);
    };
    if session.open(file).is_err() {
        return Ok(ExitCode::FAILURE);
    }
    if session.drive().await.is_err() {
        return Ok(ExitCode::FAILURE);
    }

    let mut out = std::io::stdout().lock();
    out.write_all(views.render_columns().as_bytes())?;
    for entry in session.plugins().entries() {
        if let Some(report) = entry.plugin().report() {
            let summary = json!({ "plugin": entry.name(), "report": report });
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
    }
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}
