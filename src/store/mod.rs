//! Vector store backed by SQLite and sqlite-vec.
//!
//! One database file holds the document records, the chunk texts, and the
//! chunk embeddings (a vec0 virtual table). Writes are transactional and
//! committed before a call returns, so a successful add is durable.
use std::path::Path;
use std::sync::Once;

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::{Error, Result};

pub mod documents;
pub mod models;
pub mod search;

/// The vec0 table is created with a fixed embedding width, so the schema is
/// generated from the configured dimensionality rather than hard-coded.
fn schema_sql(dimensions: usize) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    filename TEXT NOT NULL,
    uploaded_at DATETIME NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    page INTEGER NOT NULL,
    content TEXT NOT NULL,
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id);

CREATE VIRTUAL TABLE IF NOT EXISTS vec_chunks USING vec0(
    embedding FLOAT[{dimensions}]
);

CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#
    )
}

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    });
}

/// A SQLite connection initialized with sqlite-vec and the application
/// schema, pinned to one embedding dimensionality.
#[derive(Debug)]
pub struct VectorStore {
    pub(crate) conn: Connection,
    pub(crate) dimensions: usize,
}

impl VectorStore {
    /// Open (or create) a store at the given path.
    ///
    /// Reopening an existing store with a different dimensionality is a
    /// configuration error: stored vectors and query vectors would no
    /// longer be comparable.
    pub fn open<P: AsRef<Path>>(path: P, dimensions: usize) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening vector store: {}", path.display());

        init_sqlite_vec();
        let conn = Connection::open(path)?;
        Self::initialize(conn, dimensions)
    }

    /// Open an in-memory store (useful for testing).
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        init_sqlite_vec();
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, dimensions)
    }

    fn initialize(conn: Connection, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::Config("dimensions must be positive".to_string()));
        }

        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        info!("sqlite-vec version: {vec_version}");

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(&schema_sql(dimensions))?;

        let store = Self { conn, dimensions };
        store.check_dimensions(dimensions)?;
        Ok(store)
    }

    /// Compare the requested dimensionality against the one recorded in the
    /// store, recording it on first open.
    fn check_dimensions(&self, dimensions: usize) -> Result<()> {
        let recorded: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'dimensions'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match recorded {
            Some(value) if value != dimensions.to_string() => Err(Error::Config(format!(
                "store was created with {value} dimensions, configured model has {dimensions}"
            ))),
            Some(_) => Ok(()),
            None => {
                self.conn.execute(
                    "INSERT INTO store_meta (key, value) VALUES ('dimensions', ?)",
                    [dimensions.to_string()],
                )?;
                Ok(())
            }
        }
    }

    /// The embedding dimensionality this store was created with.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Serialize a float32 vector into bytes for the vec0 virtual table.
pub(crate) fn vector_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_init() {
        let store = VectorStore::open_in_memory(384).expect("failed to open in-memory store");

        let tables: usize = store
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN ('documents', 'chunks', 'vec_chunks', 'store_meta');",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
        assert_eq!(store.dimensions(), 384);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            VectorStore::open_in_memory(0),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_reopen_with_different_dimensions_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let _store = VectorStore::open(&path, 8).unwrap();
        }

        let err = VectorStore::open(&path, 16).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        // Reopening with the original dimensionality still works
        assert!(VectorStore::open(&path, 8).is_ok());
    }

    #[test]
    fn test_vector_blob() {
        let bytes = vector_blob(&[1.0, 2.0, -3.5]);
        assert_eq!(bytes.len(), 12);

        // 1.0f32 little endian: 00 00 80 3f
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x80, 0x3f]);
        // 2.0f32 little endian: 00 00 00 40
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x40]);
        // -3.5f32 little endian: 00 00 60 c0
        assert_eq!(&bytes[8..12], &[0x00, 0x00, 0x60, 0xc0]);
    }
}
