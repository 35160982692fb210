//! # pdfrag — Local PDF Question Answering
//!
//! Retrieval-augmented question answering over uploaded PDF documents:
//! pages are chunked and embedded into a local vector store, questions are
//! answered by a language model grounded in the retrieved chunks.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, validation, and defaults
//! - **[`loader`]** — PDF page text extraction (lopdf)
//! - **[`chunker`]** — Overlapping text windows with boundary-aware cuts
//! - **[`embedder`]** — Text embedding via ONNX Runtime (all-MiniLM-L6-v2)
//! - **[`store`]** — SQLite + sqlite-vec vector store (add, search, delete)
//! - **[`llm`]** — Chat-completions client for answer generation
//! - **[`synthesizer`]** — Grounded prompt construction
//! - **[`pipeline`]** — Ingestion and query orchestration
//! - **[`server`]** — Axum JSON API (upload, list, delete, ask)

pub mod chunker;
pub mod config;
pub mod embedder;
pub mod error;
pub mod llm;
pub mod loader;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod synthesizer;
