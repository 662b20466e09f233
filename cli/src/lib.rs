//! Command-line front end for docqa.
//!
//! ```bash
//! # Build the index from a PDF with the local MiniLM model
//! docqa ingest --document annual_report.pdf --model-dir ./models/all-MiniLM-L6-v2
//!
//! # Ask a question (needs GEMINI_API_KEY for generation)
//! GEMINI_API_KEY=xxx docqa ask "What were total B2C orders?"
//! ```

pub mod embedder;
pub mod output;

pub use embedder::{Embedder, EmbedderKind};
