//! # agrolink
//!
//! AgroLink command-line client — uploads crop images and watches the
//! multi-agent analysis stream live over WebSocket.

#![deny(unsafe_code)]

use std::path::PathBuf;

use agrolink_client::store::AgentResultStore;
use agrolink_client::{ApiClient, ClientConfig, ClientEvent, ClientHandle, ConnectionManager};
use agrolink_core::{ClientCommand, ConnectionStatus};
use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// AgroLink analysis client.
#[derive(Parser, Debug)]
#[command(name = "agrolink", about = "AgroLink crop analysis client")]
struct Cli {
    /// Base URL of the analysis backend.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server: String,

    /// WebSocket endpoint (derived from --server when omitted).
    #[arg(long)]
    ws_url: Option<String>,

    /// Log filter (overridden by `RUST_LOG`).
    #[arg(long, default_value = "agrolink=info,agrolink_client=info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect and print every event the backend emits until Ctrl-C.
    Watch,
    /// Upload an image and stream its analysis to completion.
    Analyze {
        /// Path to the image file.
        path: PathBuf,
        /// Free-text description of the growing environment.
        #[arg(long, default_value = "")]
        environment: String,
    },
    /// Run a hypothetical scenario without an image upload.
    Scenario {
        /// Description of the imagined crop image.
        #[arg(long)]
        image: String,
        /// Description of the growing environment.
        #[arg(long, default_value = "")]
        environment: String,
    },
    /// Upload an image over HTTP without starting the live stream.
    Upload {
        /// Path to the image file.
        path: PathBuf,
    },
    /// List recent analyses.
    History {
        /// Maximum number of rows.
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Show one historical analysis with its per-agent results.
    Show {
        /// Analysis identifier.
        id: i64,
    },
    /// Check backend health.
    Health,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let ws_url = self
            .ws_url
            .clone()
            .unwrap_or_else(|| derive_ws_url(&self.server));
        ClientConfig {
            ws_url,
            api_base_url: self.server.clone(),
            ..ClientConfig::default()
        }
    }
}

/// Derive the WebSocket endpoint from the HTTP base URL.
fn derive_ws_url(server: &str) -> String {
    let base = server.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_owned()
    };
    format!("{ws_base}/ws")
}

fn stamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Render one event to the terminal.
fn render(event: &ClientEvent) {
    match event {
        ClientEvent::StatusChanged(state) => {
            let error = state
                .last_error
                .as_deref()
                .map(|e| format!(" ({e})"))
                .unwrap_or_default();
            println!("[{}] connection: {}{error}", stamp(), state.status);
        }
        ClientEvent::AgentResult { agent, data } => {
            let pretty = serde_json::to_string_pretty(data)
                .unwrap_or_else(|_| data.to_string());
            println!("[{}] {agent}:\n{pretty}", stamp());
        }
        ClientEvent::StatusText { message } => {
            println!("[{}] {message}", stamp());
        }
        ClientEvent::AnalysisComplete => {
            println!("[{}] analysis complete", stamp());
        }
        ClientEvent::Scenario { data } => {
            println!("[{}] scenario: {data}", stamp());
        }
        ClientEvent::BackendError { message } => {
            eprintln!("[{}] backend error: {message}", stamp());
        }
    }
}

/// Drain events until the connection reports `Connected`.
///
/// Fails fast on `Failed`: the retry ceiling was reached and nothing
/// further will happen without a manual reconnect.
async fn wait_connected(events: &mut mpsc::UnboundedReceiver<ClientEvent>) -> Result<()> {
    while let Some(event) = events.recv().await {
        render(&event);
        if let ClientEvent::StatusChanged(state) = &event {
            match state.status {
                ConnectionStatus::Connected => return Ok(()),
                ConnectionStatus::Failed => {
                    bail!(
                        "could not reach the backend: {}",
                        state.last_error.as_deref().unwrap_or("unknown error")
                    );
                }
                _ => {}
            }
        }
    }
    bail!("event stream closed before the connection opened");
}

/// Stream events until the analysis completes or the connection dies.
async fn watch_until_complete(events: &mut mpsc::UnboundedReceiver<ClientEvent>) -> Result<()> {
    while let Some(event) = events.recv().await {
        render(&event);
        match &event {
            ClientEvent::AnalysisComplete => return Ok(()),
            ClientEvent::StatusChanged(state) if state.status == ConnectionStatus::Failed => {
                bail!(
                    "connection lost: {}",
                    state.last_error.as_deref().unwrap_or("unknown error")
                );
            }
            _ => {}
        }
    }
    bail!("event stream closed before the analysis completed");
}

/// Stream events until Ctrl-C.
async fn watch_forever(events: &mut mpsc::UnboundedReceiver<ClientEvent>) -> Result<()> {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => render(&event),
                None => return Ok(()),
            },
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for ctrl-c")?;
                println!();
                return Ok(());
            }
        }
    }
}

fn read_image(path: &PathBuf) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read image: {}", path.display()))
}

fn connect(config: ClientConfig) -> (ClientHandle, mpsc::UnboundedReceiver<ClientEvent>) {
    ConnectionManager::spawn(config, AgentResultStore::new())
}

#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)),
        )
        .with_target(false)
        .init();

    let config = args.client_config();
    let api = ApiClient::new(&config.api_base_url).context("invalid server URL")?;

    match args.command {
        Command::Watch => {
            let (handle, mut events) = connect(config);
            wait_connected(&mut events).await?;
            watch_forever(&mut events).await?;
            handle.shutdown().await;
        }

        Command::Analyze { path, environment } => {
            let bytes = read_image(&path)?;
            let image_data = BASE64.encode(&bytes);

            let (handle, mut events) = connect(config);
            wait_connected(&mut events).await?;
            handle
                .gateway()
                .send(&ClientCommand::ImageAnalysis {
                    image_data,
                    environment_description: environment,
                })
                .context("failed to submit the analysis request")?;
            println!("[{}] image submitted, streaming results...", stamp());
            watch_until_complete(&mut events).await?;
            handle.shutdown().await;
        }

        Command::Scenario { image, environment } => {
            let (handle, mut events) = connect(config);
            wait_connected(&mut events).await?;
            handle
                .gateway()
                .send(&ClientCommand::CustomScenario {
                    image_description: image,
                    environment_description: environment,
                })
                .context("failed to submit the scenario request")?;
            watch_until_complete(&mut events).await?;
            handle.shutdown().await;
        }

        Command::Upload { path } => {
            let bytes = read_image(&path)?;
            let filename = path
                .file_name()
                .map_or_else(|| "image".to_owned(), |n| n.to_string_lossy().into_owned());
            let response = api
                .upload_image(&filename, bytes)
                .await
                .context("upload failed")?;
            println!(
                "uploaded as analysis {} ({})",
                response.analysis_id,
                response.filename.as_deref().unwrap_or(&filename)
            );
        }

        Command::History { limit } => {
            let rows = api
                .list_analyses(limit)
                .await
                .context("failed to fetch history")?;
            if rows.is_empty() {
                println!("no analyses yet");
            }
            for row in rows {
                println!(
                    "{:>6}  {:<12}  {}  {}",
                    row.id,
                    row.status,
                    row.analysis_date.as_deref().unwrap_or("-"),
                    row.filename.as_deref().unwrap_or("-"),
                );
            }
        }

        Command::Show { id } => {
            let detail = api
                .get_analysis(id)
                .await
                .with_context(|| format!("failed to fetch analysis {id}"))?;
            println!("analysis {} ({})", detail.id, detail.status);
            for result in detail.results {
                let pretty = serde_json::to_string_pretty(&result.data)
                    .unwrap_or_else(|_| result.data.to_string());
                println!("\n{}:\n{pretty}", result.agent);
            }
        }

        Command::Health => {
            let health = api.health().await.context("health check failed")?;
            println!(
                "backend: {}  ollama: {}",
                health.status,
                health.ollama.as_deref().unwrap_or("unknown")
            );
        }
    }

    Ok(())
}
