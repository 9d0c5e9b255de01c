//! Roast a resume from the command line
//!
//! Run with: cargo run --bin roast -- --store ./documents resume.pdf

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roast_rag::providers::{LocalDocumentStore, OllamaEmbedder, OllamaGenerator};
use roast_rag::{RoastConfig, RoastPipeline, RoastRequest};

#[derive(Parser)]
#[command(name = "roast", about = "Generate an LLM critique of a stored resume")]
struct Args {
    /// Document location inside the store (e.g. resume.pdf)
    document: String,

    /// Root directory of the document store
    #[arg(long, default_value = "./documents")]
    store: PathBuf,

    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Caller-supplied request identifier
    #[arg(long)]
    request_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roast_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RoastConfig::from_toml_file(path)?,
        None => RoastConfig::default(),
    };

    tracing::info!("embedding model: {}", config.embeddings.model);
    tracing::info!("generation model: {}", config.llm.model);
    tracing::info!("overall deadline: {} ms", config.budget.overall_deadline_ms);

    let store = Arc::new(LocalDocumentStore::new(args.store));
    let embedder = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
    let generator = Arc::new(OllamaGenerator::new(&config.llm)?);
    let pipeline = RoastPipeline::new(config, store, embedder, generator)?;

    let request = match args.request_id {
        Some(id) => RoastRequest::with_id(id, args.document),
        None => RoastRequest::new(args.document),
    };

    match pipeline.run(request).await {
        Ok(result) => {
            println!("{}\n", result.generated_text);
            println!("---");
            println!(
                "{} pages, {} chunks ({} retrieved), {} ms, models: {} / {}",
                result.metadata.pages_processed,
                result.metadata.chunks_processed,
                result.metadata.chunks_retrieved,
                result.metadata.processing_time_ms,
                result.metadata.embedding_model_id,
                result.metadata.generation_model_id,
            );
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", serde_json::to_string_pretty(&failure)?);
            std::process::exit(1);
        }
    }
}
