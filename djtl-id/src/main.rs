//! djtl-id - DJ set tracklist identifier
//!
//! Subcommands:
//! - `identify`: download/segment/recognize a recording and export its tracklist
//! - `consolidate`: run the consolidation engine over saved detection records
//! - `serve`: HTTP API
//! - `recognizers`: list recognition backends

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use djtl_common::config::{load_config, TomlConfig};
use djtl_id::consolidation::{run_pipeline, BackendRecords};
use djtl_id::export::{self, console, ExportContext, ExportFormat};
use djtl_id::models::{RawDetection, TracklistEntry};
use djtl_id::recognition::available_recognizers;
use djtl_id::session::IdentificationSession;
use djtl_id::{AppState, Settings};

const DEFAULT_FORMATS: &str = "txt,json,html,cue";

/// Command-line arguments for djtl-id
#[derive(Parser, Debug)]
#[command(name = "djtl-id")]
#[command(about = "Identify the tracks in a DJ set recording")]
#[command(version)]
struct Cli {
    /// Configuration file (overrides DJTL_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Identify a recording from a URL or local audio file
    Identify {
        /// URL (YouTube, SoundCloud, Mixcloud, ...) or path to an audio file
        url: String,

        /// Comma-separated backends, e.g. "shazam,acoustid"
        #[arg(long, value_delimiter = ',')]
        recognizers: Option<Vec<String>>,

        /// Segment length in seconds
        #[arg(long)]
        chunk_duration: Option<f64>,

        /// Look up release metadata on MusicBrainz
        #[arg(long)]
        enrich: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Consolidate saved detection records (JSON) without recognizing anything
    Consolidate {
        /// JSON file: an array of `{source, records}` objects or a flat array of records
        records: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the HTTP API
    Serve {
        #[arg(long, env = "DJTL_HOST")]
        host: Option<String>,

        #[arg(short, long, env = "DJTL_PORT")]
        port: Option<u16>,
    },

    /// List available recognition backends
    Recognizers,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Comma-separated export formats (txt, json, cue, html)
    #[arg(long, default_value = DEFAULT_FORMATS)]
    formats: String,

    /// Directory for exported files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

/// Accepted shapes of a records file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    Backends(Vec<BackendRecords>),
    Records(Vec<RawDetection>),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let toml_config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&toml_config);

    match cli.command {
        Command::Identify {
            url,
            recognizers,
            chunk_duration,
            enrich,
            output,
        } => {
            let mut settings = Settings::from_toml(&toml_config)?;
            if let Some(names) = recognizers.filter(|n| !n.is_empty()) {
                settings.recognizers = names;
            }
            if let Some(chunk_duration) = chunk_duration {
                settings.chunk_duration = chunk_duration;
            }
            settings.enrich |= enrich;
            if let Some(dir) = output.output_dir.clone() {
                settings.output_dir = dir;
            }
            settings.validate()?;
            identify(settings, &url, &output.formats).await
        }
        Command::Consolidate { records, output } => {
            let mut settings = Settings::from_toml(&toml_config)?;
            if let Some(dir) = output.output_dir.clone() {
                settings.output_dir = dir;
            }
            consolidate(&settings, &records, &output.formats)
        }
        Command::Serve { host, port } => {
            let mut settings = Settings::from_toml(&toml_config)?;
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            serve(settings).await
        }
        Command::Recognizers => {
            for name in available_recognizers() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

/// RUST_LOG wins; otherwise the configured level
fn init_tracing(config: &TomlConfig) {
    let default_filter = format!("djtl_id={level},djtl_common={level},tower_http=info", level = config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn identify(settings: Settings, url: &str, formats: &str) -> Result<()> {
    let output_dir = settings.output_dir.clone();
    let session = IdentificationSession::new(settings);

    let cancel = session.cancellation_token();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding recognition calls");
            cancel.cancel();
        }
    });

    let report = session
        .run(url)
        .await
        .with_context(|| format!("Identification failed for {}", url))?;

    for (backend, error) in &report.errors {
        warn!(recognizer = %backend, "{}", error);
    }

    report
        .persist(&output_dir)
        .context("Failed to save session report")?;

    let ctx = ExportContext {
        audio_file: report.title.as_ref().map(|t| format!("{}.mp3", t)),
        title: report.title.clone(),
        source_url: Some(url.to_string()),
        ..ExportContext::default()
    };
    write_outputs(&report.combined_results, formats, &ctx, &output_dir)
}

fn consolidate(settings: &Settings, path: &Path, formats: &str) -> Result<()> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let backends = match serde_json::from_str::<RecordsFile>(&body)
        .with_context(|| format!("Failed to parse records in {}", path.display()))?
    {
        RecordsFile::Backends(backends) => backends,
        RecordsFile::Records(records) => BackendRecords::group(records),
    };

    info!(file = %path.display(), backends = backends.len(), "Consolidating saved records");
    let tracks = run_pipeline(&backends, &settings.consolidation)?;

    let ctx = ExportContext {
        title: path.file_stem().map(|s| s.to_string_lossy().into_owned()),
        ..ExportContext::default()
    };
    write_outputs(&TracklistEntry::from_tracks(tracks), formats, &ctx, &settings.output_dir)
}

/// Print the console tracklist and write every requested file format
fn write_outputs(entries: &[TracklistEntry], formats: &str, ctx: &ExportContext, output_dir: &Path) -> Result<()> {
    println!("{}", console::render(entries));

    let formats = ExportFormat::parse_list(formats);
    let base_name = export::default_base_name(ctx);
    let written = export::export_all(entries, &formats, ctx, output_dir, &base_name)
        .context("Failed to export tracklist")?;
    for path in written {
        println!("Saved {}", path.display());
    }
    Ok(())
}

async fn serve(settings: Settings) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                settings.server.host, settings.server.port
            )
        })?;

    info!("Starting djtl-id HTTP API");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Recognizers: {}", settings.recognizers.join(", "));

    let app = djtl_id::build_router(AppState::new(settings));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
