//! Lampo command-line entry point
//!
//! Runs a single storage operation against a local root or a configured
//! backend and logs the emitted event.
//!
//! Payload commands read DATA from stdin when it is not given.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lampo::{BackendConfig, Lampo, LampoConfig};

const DEFAULT_ROOT: &str = "./data";

/// Observable file storage over local, memory and S3 backends.
#[derive(Parser, Debug)]
#[command(name = "lampo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Local storage root directory
    #[arg(global = true, short, long, conflicts_with = "config")]
    root: Option<PathBuf>,

    /// JSON backend configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Print an object to stdout
    Read { path: String },

    /// Create an object; fails if it already exists
    Write {
        path: String,
        #[arg(allow_hyphen_values = true)]
        data: Option<String>,
    },

    /// Create or replace an object
    Put {
        path: String,
        #[arg(allow_hyphen_values = true)]
        data: Option<String>,
    },

    /// Remove an object
    Delete { path: String },

    /// Append to an object, creating it if absent
    Append {
        path: String,
        #[arg(allow_hyphen_values = true)]
        data: Option<String>,
    },

    /// Prepend to an object, creating it if absent
    Prepend {
        path: String,
        #[arg(allow_hyphen_values = true)]
        data: Option<String>,
    },
}

impl Cli {
    fn backend_config(&self) -> lampo::Result<LampoConfig> {
        match &self.config {
            Some(file) => LampoConfig::from_file(file),
            None => Ok(LampoConfig {
                backend: BackendConfig::Local {
                    root: self
                        .root
                        .as_deref()
                        .unwrap_or(Path::new(DEFAULT_ROOT))
                        .to_string_lossy()
                        .to_string(),
                },
            }),
        }
    }
}

async fn payload(data: Option<String>) -> std::io::Result<Bytes> {
    match data {
        Some(data) => Ok(Bytes::from(data)),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            Ok(Bytes::from(buf))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lampo=info,storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.backend_config()?;

    let lampo = Lampo::from_config(&config).await?;
    lampo.on(|event| match serde_json::to_string(event) {
        Ok(json) => tracing::info!(event = %json, "Storage event"),
        Err(e) => tracing::warn!(error = %e, "Failed to encode event"),
    });

    match cli.command {
        Commands::Read { path } => {
            let mut reader = lampo.read(&path).await?;
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut reader, &mut stdout).await?;
            stdout.flush().await?;
        }
        Commands::Delete { path } => lampo.delete(&path).await?,
        Commands::Write { path, data } => lampo.write(&path, payload(data).await?).await?,
        Commands::Put { path, data } => lampo.put(&path, payload(data).await?).await?,
        Commands::Append { path, data } => {
            lampo.update(&path, payload(data).await?, false).await?
        }
        Commands::Prepend { path, data } => {
            lampo.update(&path, payload(data).await?, true).await?
        }
    }

    Ok(())
}
