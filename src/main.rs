use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use rust_file_client::utils::validation::{
    file_name_from_path, is_allowed_type, type_for_extension, validate_file_size,
};
use rust_file_client::{
    CancellationToken, ClientConfig, FileClient, ListFilesOptions, ProcessingContext,
    UploadRequest,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "rust-file-client",
    version,
    about = "Upload and manage files on the file service"
)]
struct Cli {
    /// Overrides RUSTFILE_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a file and wait for processing
    Upload {
        path: PathBuf,

        #[arg(long, default_value = "general")]
        context: ProcessingContext,

        /// Declared media type; detected from content or extension when omitted
        #[arg(long = "type")]
        file_type: Option<String>,

        /// Repeatable key=value tag
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,

        #[arg(long)]
        webhook: Option<String>,

        /// Return as soon as the bytes are transferred
        #[arg(long)]
        no_wait: bool,
    },
    /// Show one file
    Get { id: String },
    /// List files
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        cursor: Option<String>,
        #[arg(long)]
        context: Option<ProcessingContext>,
        #[arg(long = "file-type")]
        file_type: Option<String>,
        /// Follow cursors until every page has been read
        #[arg(long)]
        all: bool,
    },
    /// Delete a file
    Delete { id: String },
    /// Show storage quota
    Quota,
    /// Show tenant details
    Tenant,
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_file_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config = config.with_base_url(base_url)?;
    }
    info!("🔗 Using {}", config.base_url);

    let client = FileClient::new(config)?;

    match cli.command {
        Command::Upload {
            path,
            context,
            file_type,
            tags,
            webhook,
            no_wait,
        } => {
            let record = upload(&client, &path, context, file_type, tags, webhook, no_wait).await?;
            print_json(&record)?;
        }
        Command::Get { id } => print_json(&client.get_file(&id).await?)?,
        Command::List {
            limit,
            cursor,
            context,
            file_type,
            all,
        } => {
            let options = ListFilesOptions {
                limit,
                cursor,
                context,
                file_type,
            };
            if all {
                print_json(&client.list_all_files(&options).await?)?;
            } else {
                print_json(&client.list_files(&options).await?)?;
            }
        }
        Command::Delete { id } => {
            client.delete_file(&id).await?;
            info!("🗑️  Deleted {}", id);
        }
        Command::Quota => print_json(&client.get_quota().await?)?,
        Command::Tenant => print_json(&client.get_tenant_info().await?)?,
    }

    Ok(())
}

async fn upload(
    client: &FileClient,
    path: &Path,
    context: ProcessingContext,
    file_type: Option<String>,
    tags: Vec<(String, String)>,
    webhook: Option<String>,
    no_wait: bool,
) -> anyhow::Result<rust_file_client::FileRecord> {
    let size = tokio::fs::metadata(path).await?.len();
    validate_file_size(size)?;

    let data = tokio::fs::read(path).await?;
    let file_name = file_name_from_path(path)?;
    let file_type = file_type.unwrap_or_else(|| detect_media_type(path, &data));

    let token = CancellationToken::new();
    let on_ctrl_c = token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("⌨️  Ctrl+C received, cancelling upload...");
            on_ctrl_c.cancel();
        }
    });

    let mut request = UploadRequest::new(data, file_name, file_type, context)
        .with_cancellation(token)
        .on_progress(|percent| info!("Progress: {}%", percent));
    if !tags.is_empty() {
        request = request.with_tags(tags.into_iter().collect::<HashMap<_, _>>());
    }
    if let Some(webhook) = webhook {
        request = request.with_webhook(webhook);
    }
    if no_wait {
        request = request.without_wait();
    }

    let record = client.upload(request).await?;
    info!(
        "✅ Uploaded {} ({:?})",
        record.id, record.processing_state
    );
    Ok(record)
}

/// Magic bytes first, then the extension table.
fn detect_media_type(path: &Path, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        if is_allowed_type(kind.mime_type()) {
            return kind.mime_type().to_string();
        }
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(type_for_extension)
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
