use std::{path::PathBuf, time::Duration};

use ::tracing::{error, info, warn};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use objstorage::{ObjectStorageClient, StorageConfig};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

mod tracing;
use tracing::setup_tracing;

/// Upload, download, delete and presign objects on AWS S3, GCS or Azure.
///
/// Connection settings come from the optional config file, overridden by
/// `S3_PROVIDER`, `S3_ENDPOINT`, `S3_ACCESS_KEY`, `S3_SECRET_KEY`,
/// `S3_REGION` and `S3_SECURE`.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "config file", help = "Path to config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Emit logs as JSON lines")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a local file as an object
    Upload {
        bucket: String,
        key: String,
        file: PathBuf,
    },
    /// Download an object to a file, or stdout
    Download {
        bucket: String,
        key: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete an object
    Delete { bucket: String, key: String },
    /// Print a presigned upload URL for an object
    Presign {
        bucket: String,
        key: String,
        #[arg(long, default_value_t = 900)]
        expires_secs: u64,
    },
    /// Create a bucket unless it already exists
    MakeBucket { bucket: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = setup_tracing(cli.json_logs) {
        eprintln!("Error setting up tracing: {:?}", err);
    }

    if let Err(err) = run(cli).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config: StorageConfig = StorageConfig::figment(cli.config.as_deref())
        .extract()
        .context("failed to load storage config")?;
    let client = ObjectStorageClient::new(config).context("failed to create storage client")?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling operation");
            interrupt.cancel();
        }
    });

    match cli.command {
        Command::Upload { bucket, key, file } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let size = data.len();
            client.upload(&cancel, &bucket, &key, data).await?;
            info!(bucket = %bucket, key = %key, size, "Uploaded object");
        }
        Command::Download {
            bucket,
            key,
            output,
        } => {
            let data = client.download(&cancel, &bucket, &key).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &data)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(bucket = %bucket, key = %key, size = data.len(), "Downloaded object");
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&data).await?;
                    stdout.flush().await?;
                }
            }
        }
        Command::Delete { bucket, key } => {
            client.delete(&cancel, &bucket, &key).await?;
            info!(bucket = %bucket, key = %key, "Deleted object");
        }
        Command::Presign {
            bucket,
            key,
            expires_secs,
        } => {
            let url = client
                .presigned_url(&cancel, &bucket, &key, Duration::from_secs(expires_secs))
                .await?;
            println!("{}", url);
        }
        Command::MakeBucket { bucket } => {
            client.make_bucket(&cancel, &bucket).await?;
            info!(bucket = %bucket, "Bucket ready");
        }
    }

    Ok(())
}
