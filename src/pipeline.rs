//! Ingestion and query pipelines.
//!
//! Both pipelines are synchronous, single-pass sequences over the shared
//! providers: ingestion runs load → chunk → embed → store, querying runs
//! embed → search → synthesize. Stage failures abort the run and propagate
//! unmodified.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};

use crate::chunker::Chunker;
use crate::embedder::Embedder;
use crate::error::{Error, Result};
use crate::loader;
use crate::store::VectorStore;
use crate::store::models::{NewDocument, NewEntry};
use crate::synthesizer::{FALLBACK_ANSWER, Synthesizer};

/// Shared handle to the vector store. Writes are serialized by the mutex;
/// the store itself commits transactionally, so no partial entry is ever
/// visible.
pub type SharedStore = Arc<Mutex<VectorStore>>;

fn lock_store(store: &SharedStore) -> Result<std::sync::MutexGuard<'_, VectorStore>> {
    store
        .lock()
        .map_err(|_| Error::Store("vector store lock poisoned".to_string()))
}

/// One file to ingest, with its user-facing title.
#[derive(Debug, Clone)]
pub struct IngestFile {
    pub title: String,
    pub path: PathBuf,
}

impl IngestFile {
    /// Derive the title from the file stem.
    pub fn from_path(path: PathBuf) -> Self {
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();
        Self { title, path }
    }
}

/// Ingestion pipeline: load → chunk → embed → store.
pub struct IngestPipeline {
    store: SharedStore,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
}

impl IngestPipeline {
    pub fn new(store: SharedStore, embedder: Arc<dyn Embedder>, chunker: Chunker) -> Self {
        Self {
            store,
            embedder,
            chunker,
        }
    }

    /// Ingest a batch of PDF files, returning the new document ids.
    ///
    /// The store write happens once, after every chunk of the batch is
    /// embedded, so a failing stage leaves the store untouched. An empty
    /// batch succeeds trivially.
    pub fn ingest(&self, files: &[IngestFile]) -> Result<Vec<i64>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = Vec::with_capacity(files.len());

        for file in files {
            debug!("Loading {}", file.path.display());
            let segments = loader::load_pdf(&file.path)?;

            debug!("Chunking {} page segments", segments.len());
            let chunks = self.chunker.split_segments(&segments);

            debug!("Embedding {} chunks", chunks.len());
            let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;

            let entries: Vec<NewEntry> = chunks
                .into_iter()
                .zip(vectors)
                .map(|(chunk, vector)| NewEntry {
                    text: chunk.text,
                    vector,
                    page: chunk.page,
                    position: chunk.position,
                })
                .collect();

            let filename = file
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            batch.push(NewDocument {
                title: file.title.clone(),
                filename,
                uploaded_at: Utc::now(),
                entries,
            });
        }

        // Storing: one call for the whole batch, all-or-nothing
        let ids = lock_store(&self.store)?.add_batch(&batch)?;

        info!(
            "Ingested {} file(s), {} chunk(s)",
            ids.len(),
            batch.iter().map(|d| d.entries.len()).sum::<usize>()
        );
        Ok(ids)
    }
}

/// Query pipeline: embed → search → synthesize.
pub struct QueryPipeline {
    store: SharedStore,
    embedder: Arc<dyn Embedder>,
    synthesizer: Synthesizer,
    top_k: usize,
}

impl QueryPipeline {
    pub fn new(
        store: SharedStore,
        embedder: Arc<dyn Embedder>,
        synthesizer: Synthesizer,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            synthesizer,
            top_k,
        }
    }

    /// Answer a question from the indexed documents.
    ///
    /// When retrieval yields nothing (empty store), the fallback sentence is
    /// returned directly: the prompt would force that answer anyway, so the
    /// model round-trip is skipped.
    pub fn answer(&self, question: &str) -> Result<String> {
        let query_vector = self.embedder.embed(question)?;

        let hits = lock_store(&self.store)?.search(&query_vector, self.top_k)?;
        debug!("Retrieved {} snippet(s) for question", hits.len());

        if hits.is_empty() {
            return Ok(FALLBACK_ANSWER.to_string());
        }

        let snippets: Vec<_> = hits.into_iter().map(Into::into).collect();
        self.synthesizer.answer(question, &snippets)
    }
}

impl From<crate::store::search::SearchHit> for crate::synthesizer::Snippet {
    fn from(hit: crate::store::search::SearchHit) -> Self {
        Self {
            text: hit.text,
            source: hit.source,
            page: hit.page,
        }
    }
}
