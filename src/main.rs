use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use log::info;

use mailroom::server::{serve, AppState};
use mailroom::{Classifier, ModelManager, ModelSpec, Triage};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing model.onnx, tokenizer.json and optionally
    /// label_mapping.json
    #[arg(long, conflicts_with_all = ["model_url", "tokenizer_url"])]
    model_dir: Option<PathBuf>,

    /// URL to download the ONNX model from (requires --tokenizer-url)
    #[arg(long, requires = "tokenizer_url")]
    model_url: Option<String>,

    /// URL to download the tokenizer from
    #[arg(long)]
    tokenizer_url: Option<String>,

    /// Optional URL to download label_mapping.json from
    #[arg(long)]
    label_mapping_url: Option<String>,

    /// Expected SHA-256 of the model file, verified when set
    #[arg(long)]
    model_sha256: Option<String>,

    /// Expected SHA-256 of the tokenizer file, verified when set
    #[arg(long)]
    tokenizer_sha256: Option<String>,

    /// Cache subdirectory name for downloaded artifacts
    #[arg(long, default_value = "email-intent")]
    model_name: String,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    fresh: bool,

    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 7860)]
    port: u16,
}

async fn resolve_model_dir(args: &Args) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &args.model_dir {
        return Ok(dir.clone());
    }

    let (Some(model_url), Some(tokenizer_url)) = (&args.model_url, &args.tokenizer_url) else {
        bail!("Either --model-dir or both --model-url and --tokenizer-url are required");
    };

    let mut spec = ModelSpec::new(&args.model_name, model_url, tokenizer_url);
    if let Some(url) = &args.label_mapping_url {
        spec = spec.with_label_mapping_url(url);
    }
    if let Some(digest) = &args.model_sha256 {
        spec = spec.with_model_sha256(digest);
    }
    if let Some(digest) = &args.tokenizer_sha256 {
        spec = spec.with_tokenizer_sha256(digest);
    }

    let manager = ModelManager::new_default().context("Failed to create model manager")?;
    if args.fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(&spec)?;
    }
    manager.ensure_downloaded(&spec).await?;

    Ok(manager.model_dir(&spec))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("=== Starting Email Intent Triage ===");

    let model_dir = resolve_model_dir(&args).await?;

    let start_time = Instant::now();
    info!("Building classifier from {:?}...", model_dir);

    let classifier = Classifier::builder()
        .with_model_dir(&model_dir)?
        .build()?;
    let labels = classifier.labels.clone();
    info!(
        "=== Classifier built in {:.2?}, {} intents: {:?} ===",
        start_time.elapsed(),
        labels.len(),
        labels.names()
    );

    let state = AppState::new(Triage::new(Arc::new(classifier), labels));
    serve(state, &args.host, args.port)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
