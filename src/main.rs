use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pdfrag::chunker::Chunker;
use pdfrag::config::Config;
use pdfrag::embedder::{Embedder, download, onnx::OnnxEmbedder};
use pdfrag::llm::chat::ChatClient;
use pdfrag::pipeline::{IngestFile, IngestPipeline, QueryPipeline, SharedStore};
use pdfrag::server::{self, AppState};
use pdfrag::store::VectorStore;
use pdfrag::synthesizer::Synthesizer;

#[derive(Parser)]
#[command(name = "pdfrag", version, about = "Local PDF question answering")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Ingest PDF files from the command line
    Ingest {
        /// PDF files to index
        files: Vec<PathBuf>,
    },
    /// Ask a single question and print the answer
    Ask {
        /// The question to answer
        question: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    // 1. Load and validate config
    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config),
        Command::Ingest { files } => ingest(config, files),
        Command::Ask { question } => ask(config, &question),
    }
}

fn serve(config: Config) -> Result<()> {
    let config = Arc::new(config);

    // 2. Open the store and build the providers once; everything downstream
    //    borrows these via Arc.
    let store = open_store(&config)?;
    let embedder = build_embedder(&config)?;
    let llm = Arc::new(ChatClient::new(&config.llm)?);

    let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;
    let ingest = Arc::new(IngestPipeline::new(
        store.clone(),
        embedder.clone(),
        chunker,
    ));
    let query = Arc::new(QueryPipeline::new(
        store.clone(),
        embedder,
        Synthesizer::new(llm),
        config.top_k,
    ));

    let state = AppState {
        config,
        store,
        ingest,
        query,
    };

    // 3. Hand over to the HTTP server
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(server::serve(state))
}

fn ingest(config: Config, files: Vec<PathBuf>) -> Result<()> {
    let store = open_store(&config)?;
    let embedder = build_embedder(&config)?;
    let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;

    let pipeline = IngestPipeline::new(store.clone(), embedder, chunker);
    let batch: Vec<IngestFile> = files.into_iter().map(IngestFile::from_path).collect();
    let ids = pipeline.ingest(&batch)?;

    println!("Ingested {} document(s)", ids.len());
    Ok(())
}

fn ask(config: Config, question: &str) -> Result<()> {
    let store = open_store(&config)?;
    let embedder = build_embedder(&config)?;
    let llm = Arc::new(ChatClient::new(&config.llm)?);

    let pipeline = QueryPipeline::new(store, embedder, Synthesizer::new(llm), config.top_k);
    let answer = pipeline.answer(question)?;

    println!("{answer}");
    Ok(())
}

fn open_store(config: &Config) -> Result<SharedStore> {
    let store = VectorStore::open(&config.store_path, config.model.dimensions)
        .context("failed to open vector store")?;
    Ok(Arc::new(Mutex::new(store)))
}

fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let model_dir = Path::new(&config.model.dir);
    download::ensure_model(model_dir)?;

    let embedder = OnnxEmbedder::new(model_dir, config.model.dimensions)
        .context("failed to load embedding model")?;
    Ok(Arc::new(embedder))
}
