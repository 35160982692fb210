/// End-to-end integration tests for the RAG pipeline.
///
/// Tests the complete flow:
///   Config → Store → Embedder → Ingest → Search → Answer → Delete
///
/// Uses the mock embedder and mock language model so everything runs
/// offline; the PDFs themselves are real, built in-test with lopdf.
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tempfile::tempdir;

use pdfrag::chunker::Chunker;
use pdfrag::config::Config;
use pdfrag::embedder::Embedder;
use pdfrag::embedder::mock::MockEmbedder;
use pdfrag::llm::mock::MockLanguageModel;
use pdfrag::pipeline::{IngestFile, IngestPipeline, QueryPipeline, SharedStore};
use pdfrag::store::VectorStore;
use pdfrag::synthesizer::{FALLBACK_ANSWER, Synthesizer};

const DIMS: usize = 384;

/// Build a minimal single-font PDF with one page per input string.
fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn open_shared(path: &Path) -> SharedStore {
    Arc::new(Mutex::new(VectorStore::open(path, DIMS).unwrap()))
}

fn ingest_pipeline(store: SharedStore) -> IngestPipeline {
    IngestPipeline::new(
        store,
        Arc::new(MockEmbedder::new(DIMS)),
        Chunker::new(500, 50).unwrap(),
    )
}

fn query_pipeline(store: SharedStore) -> QueryPipeline {
    QueryPipeline::new(
        store,
        Arc::new(MockEmbedder::new(DIMS)),
        Synthesizer::new(Arc::new(MockLanguageModel)),
        3,
    )
}

/// Full pipeline: ingest a PDF → list → answer → unrelated question →
/// restart → delete.
#[test]
fn test_full_pipeline() {
    // 1. Setup temp dir with a test PDF
    let temp_dir = tempdir().unwrap();
    let pdf_path = temp_dir.path().join("france.pdf");
    write_pdf(&pdf_path, &["The capital of France is Paris."]);

    let store_path = temp_dir.path().join("store.db");

    {
        let store = open_shared(&store_path);

        // 2. Ingest
        let ids = ingest_pipeline(store.clone())
            .ingest(&[IngestFile::from_path(pdf_path.clone())])
            .unwrap();
        assert_eq!(ids.len(), 1, "Should ingest 1 document");

        // 3. List documents
        let docs = store.lock().unwrap().list_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "france");
        assert_eq!(docs[0].filename, "france.pdf");

        // 4. A question answered by the document
        let query = query_pipeline(store.clone());
        let answer = query.answer("What is the capital of France?").unwrap();
        assert!(answer.contains("Paris"), "Answer should cite the context: {answer}");
        assert!(
            !answer.contains(FALLBACK_ANSWER),
            "Answer should not fall back: {answer}"
        );

        // 5. A question the document cannot answer
        let answer = query.answer("How do volcanoes erupt?").unwrap();
        assert_eq!(answer, FALLBACK_ANSWER);
    }

    // 6. Restart: the store contents survive reopening
    {
        let store = open_shared(&store_path);
        assert_eq!(store.lock().unwrap().count_entries().unwrap(), 1);

        let embedder = MockEmbedder::new(DIMS);
        let query_vector = embedder.embed("What is the capital of France?").unwrap();
        let hits = store.lock().unwrap().search(&query_vector, 3).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].text.contains("Paris"));
        assert_eq!(hits[0].page, 1);

        let answer = query_pipeline(store.clone())
            .answer("What is the capital of France?")
            .unwrap();
        assert!(answer.contains("Paris"));

        // 7. Delete the document; its vectors go with it
        let id = store.lock().unwrap().list_documents().unwrap()[0].id;
        assert!(store.lock().unwrap().delete_document(id).unwrap());
        assert_eq!(store.lock().unwrap().count_entries().unwrap(), 0);

        // 8. With nothing indexed, the fallback sentence comes back
        let answer = query_pipeline(store)
            .answer("What is the capital of France?")
            .unwrap();
        assert_eq!(answer, FALLBACK_ANSWER);
    }
}

/// A batch ingests atomically: several files, one store write.
#[test]
fn test_ingest_batch_of_files() {
    let temp_dir = tempdir().unwrap();

    let rust_pdf = temp_dir.path().join("rust.pdf");
    write_pdf(
        &rust_pdf,
        &["Rust is a systems programming language focused on safety."],
    );

    let cooking_pdf = temp_dir.path().join("cooking.pdf");
    write_pdf(
        &cooking_pdf,
        &["Simmer the sauce gently for twenty minutes.", "Season to taste."],
    );

    let store = open_shared(&temp_dir.path().join("store.db"));
    let ids = ingest_pipeline(store.clone())
        .ingest(&[
            IngestFile::from_path(rust_pdf),
            IngestFile::from_path(cooking_pdf),
        ])
        .unwrap();

    assert_eq!(ids.len(), 2);
    let docs = store.lock().unwrap().list_documents().unwrap();
    assert_eq!(docs.len(), 2);
    // Two pages in cooking.pdf, one in rust.pdf
    assert_eq!(store.lock().unwrap().count_entries().unwrap(), 3);
}

/// `ingest([])` succeeds trivially and stores nothing.
#[test]
fn test_ingest_empty_list() {
    let temp_dir = tempdir().unwrap();
    let store = open_shared(&temp_dir.path().join("store.db"));

    let ids = ingest_pipeline(store.clone()).ingest(&[]).unwrap();
    assert!(ids.is_empty());
    assert_eq!(store.lock().unwrap().count_entries().unwrap(), 0);
}

/// A failing batch leaves the store exactly as it was.
#[test]
fn test_failed_batch_writes_nothing() {
    let temp_dir = tempdir().unwrap();
    let good_pdf = temp_dir.path().join("good.pdf");
    write_pdf(&good_pdf, &["Some indexed content."]);

    let store = open_shared(&temp_dir.path().join("store.db"));
    let result = ingest_pipeline(store.clone()).ingest(&[
        IngestFile::from_path(good_pdf),
        IngestFile::from_path(PathBuf::from("/nonexistent/missing.pdf")),
    ]);

    assert!(result.is_err());
    assert_eq!(store.lock().unwrap().count_entries().unwrap(), 0);
    assert!(store.lock().unwrap().list_documents().unwrap().is_empty());
}

/// Answering against an empty store returns the fallback, not an error.
#[test]
fn test_answer_on_empty_store() {
    let temp_dir = tempdir().unwrap();
    let store = open_shared(&temp_dir.path().join("store.db"));

    let answer = query_pipeline(store).answer("Anything at all?").unwrap();
    assert_eq!(answer, FALLBACK_ANSWER);
}

/// Config defaults and validation
#[test]
fn test_config_defaults_and_validation() {
    let config = Config::default();

    assert_eq!(config.chunk_size, 500);
    assert_eq!(config.chunk_overlap, 50);
    assert_eq!(config.top_k, 3);
    assert_eq!(config.model.dimensions, 384);
    assert!(config.validate().is_ok());

    let mut bad_config = Config::default();
    bad_config.chunk_overlap = bad_config.chunk_size;
    assert!(bad_config.validate().is_err());
}

/// The mock embedder is deterministic, so retrieval is reproducible.
#[test]
fn test_mock_embedder_consistency() {
    let embedder = MockEmbedder::new(DIMS);

    let v1 = embedder.embed("hello world").unwrap();
    let v2 = embedder.embed("hello world").unwrap();
    assert_eq!(v1, v2, "Same input should produce same embedding");
    assert_eq!(v1.len(), embedder.dimensions());

    let v3 = embedder.embed("different text").unwrap();
    assert_ne!(v1, v3, "Different input should produce different embedding");
}
