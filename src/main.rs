// Image caption viewer
//
// `caption-viewer serve` hosts the upload form for a browser;
// `caption-viewer caption <FILE>` runs one pick + submit from the terminal.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use caption_viewer::client::caption_once;
use caption_viewer::config::{BIND_ADDRESS_VAR, ENDPOINT_URL_VAR};
use caption_viewer::{render, web, HttpCaptionClient, PreviewStore, SelectedFile, ViewerConfig};

#[derive(Parser)]
#[command(name = "caption-viewer")]
#[command(about = "Upload an image and view its generated caption and colors")]
struct Cli {
    /// Captioning endpoint, e.g. http://localhost:8080/upload_image.
    /// Overrides CAPTION_ENDPOINT_URL.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the viewer page (default).
    Serve {
        /// Address to bind to. Overrides VIEWER_BIND_ADDRESS.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Caption a single image file and print the result.
    Caption {
        /// Image file to upload.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let command = cli.command.unwrap_or(Command::Serve { bind: None });
    let bind = match &command {
        Command::Serve { bind } => bind.clone(),
        Command::Caption { .. } => None,
    };

    let config = ViewerConfig::from_env_with(|key| match key {
        ENDPOINT_URL_VAR => cli.endpoint.clone(),
        BIND_ADDRESS_VAR => bind.clone(),
        _ => None,
    })?;

    match command {
        Command::Serve { .. } => {
            println!("🚀 Viewer running on http://{}", config.bind_address);
            println!("📸 Open in your browser to start captioning!");
            web::serve(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Caption { file } => caption_file(&config, &file).await,
    }
}

async fn caption_file(config: &ViewerConfig, path: &Path) -> anyhow::Result<ExitCode> {
    let file = SelectedFile::from_path(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let previews = PreviewStore::new();
    let client = HttpCaptionClient::new(config);
    let state = caption_once(&client, file, &previews).await;

    print!("{}", render::render_text(&state));

    Ok(if state.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
