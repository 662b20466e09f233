//! `docqa`: ingest one document, then answer questions about it with page citations.
//!
//! # Usage
//!
//! ```bash
//! # Index a report with the local MiniLM model
//! cargo run -p docqa-cli -- ingest --document annual_report.pdf \
//!     --model-dir ./models/all-MiniLM-L6-v2
//!
//! # Ask questions (generation always uses Gemini)
//! GEMINI_API_KEY=xxx cargo run -p docqa-cli -- ask "What were total B2C orders?"
//! GEMINI_API_KEY=xxx cargo run -p docqa-cli -- ask --json "Average order value?"
//!
//! # Embed with Gemini instead of the local model
//! GEMINI_API_KEY=xxx cargo run -p docqa-cli -- --embedder gemini ingest --document report.txt
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=debug` for retrieval details.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docqa_cli::output::render_answer;
use docqa_cli::{Embedder, EmbedderKind};
use docqa_gemini::{DEFAULT_EMBEDDING_DIMENSIONS, GeminiBackend};
use docqa_pdf::PdfLoader;
use docqa_rag::config::{DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL};
use docqa_rag::{Ingestor, QaPipeline, RagConfig, RagConfigBuilder, StreamMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docqa", version, about)]
struct Args {
    /// Directory holding the index bundle.
    #[arg(long, global = true, env = "DOCQA_INDEX", default_value = "./docqa_index")]
    index: PathBuf,

    /// Embedding backend. Must match the one the index was built with.
    #[arg(long, global = true, env = "DOCQA_EMBEDDER", default_value_t = EmbedderKind::Ort)]
    embedder: EmbedderKind,

    /// ONNX model directory for `--embedder ort`.
    #[arg(
        long,
        global = true,
        env = "DOCQA_MODEL_DIR",
        default_value = "./models/all-MiniLM-L6-v2"
    )]
    model_dir: PathBuf,

    /// Embedding model identifier recorded in the index manifest.
    #[arg(long, global = true, env = "DOCQA_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Output dimensionality for `--embedder gemini`.
    #[arg(long, global = true)]
    embedding_dim: Option<usize>,

    /// Gemini model used to generate answers.
    #[arg(long, global = true, env = "DOCQA_GENERATION_MODEL", default_value = DEFAULT_GENERATION_MODEL)]
    generation_model: String,

    /// Document name used in the "could not find" answer. Defaults to the PDF title.
    #[arg(long, global = true, env = "DOCQA_DOCUMENT_NAME")]
    document_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk, embed and index a document, replacing any existing index.
    Ingest(IngestArgs),
    /// Answer a question from the indexed document.
    Ask(AskArgs),
}

#[derive(clap::Args, Debug)]
struct IngestArgs {
    /// PDF or plain-text document (form feeds separate text pages).
    #[arg(long, env = "DOCQA_DOCUMENT")]
    document: PathBuf,

    /// Characters per chunk.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks.
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Chunks embedded per batch.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Batches embedded concurrently.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Let chunks span page boundaries.
    #[arg(long)]
    continuous: bool,
}

#[derive(clap::Args, Debug)]
struct AskArgs {
    /// The question.
    question: String,

    /// Print the answer and its sources as JSON.
    #[arg(long)]
    json: bool,

    /// Chunks passed to the generator.
    #[arg(long)]
    top_k: Option<usize>,

    /// Candidates considered before diversity re-ranking.
    #[arg(long)]
    fetch_n: Option<usize>,

    /// Relevance/diversity trade-off between 0 and 1.
    #[arg(long)]
    lambda: Option<f32>,
}

impl Args {
    fn embedding_model(&self) -> String {
        self.embedding_model.clone().unwrap_or_else(|| {
            match self.embedder {
                EmbedderKind::Ort => DEFAULT_EMBEDDING_MODEL,
                EmbedderKind::Gemini => docqa_gemini::DEFAULT_EMBEDDING_MODEL,
            }
            .to_string()
        })
    }

    fn base_config(&self) -> RagConfigBuilder {
        let builder = RagConfig::builder()
            .index_path(&self.index)
            .embedding_model(self.embedding_model())
            .generation_model(&self.generation_model);
        match &self.document_name {
            Some(name) => builder.document_name(name),
            None => builder,
        }
    }

    fn load_embedder(&self, config: &RagConfig) -> Result<Embedder> {
        match self.embedder {
            EmbedderKind::Ort => Embedder::ort(&self.model_dir, &config.embedding_model),
            EmbedderKind::Gemini => {
                let backend = gemini_from_env()?.with_embedding_model(
                    &config.embedding_model,
                    self.embedding_dim.unwrap_or(DEFAULT_EMBEDDING_DIMENSIONS),
                );
                Ok(Embedder::gemini(backend))
            }
        }
    }
}

fn gemini_from_env() -> Result<GeminiBackend> {
    GeminiBackend::from_env().context("set GEMINI_API_KEY or GOOGLE_API_KEY")
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

async fn ingest(args: &Args, cmd: &IngestArgs) -> Result<()> {
    let document = &cmd.document;
    let mut builder = args.base_config().document_path(document);
    if let Some(size) = cmd.chunk_size {
        builder = builder.chunk_size(size);
    }
    if let Some(overlap) = cmd.chunk_overlap {
        builder = builder.chunk_overlap(overlap);
    }
    if let Some(size) = cmd.batch_size {
        builder = builder.batch_size(size);
    }
    if let Some(workers) = cmd.concurrency {
        builder = builder.embed_concurrency(workers);
    }
    if cmd.continuous {
        builder = builder.stream_mode(StreamMode::continuous());
    }
    let config = builder.build().context("invalid configuration")?;

    let embedder = Arc::new(args.load_embedder(&config)?);
    let ingestor = Ingestor::new(embedder, config.clone())?;
    let ingestor = if is_pdf(document) {
        ingestor.with_loader(PdfLoader)
    } else {
        ingestor
    };

    let report = ingestor
        .ingest_with_progress(document, &config.index_path, |progress| {
            tracing::info!(stage = %progress.stage, "{progress}");
        })
        .await
        .with_context(|| format!("failed to ingest {}", document.display()))?;

    println!(
        "Indexed {} chunks from {} pages in {} batches into {}",
        report.chunks,
        report.pages,
        report.batches,
        report.index_path.display()
    );
    Ok(())
}

async fn ask(args: &Args, cmd: &AskArgs) -> Result<()> {
    let generator = gemini_from_env()?.with_text_model(&args.generation_model);

    let mut builder = args.base_config();
    if let Some(k) = cmd.top_k {
        builder = builder.top_k(k);
    }
    if let Some(n) = cmd.fetch_n {
        builder = builder.fetch_n(n);
    }
    if let Some(lambda) = cmd.lambda {
        builder = builder.diversity_lambda(lambda);
    }
    let config = builder.build().context("invalid configuration")?;

    let embedder = Arc::new(args.load_embedder(&config)?);
    let pipeline = QaPipeline::new(embedder, Arc::new(generator), config)?;
    pipeline
        .load_index()
        .context("no usable index; run `docqa ingest` first")?;

    let answer = pipeline.answer_question(&cmd.question).await?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print!("{}", render_answer(&answer));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match &args.command {
        Command::Ingest(cmd) => ingest(&args, cmd).await,
        Command::Ask(cmd) => ask(&args, cmd).await,
    }
}
