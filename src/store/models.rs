use chrono::{DateTime, Utc};
use serde::Serialize;

/// A persisted document row.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub title: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A document to be stored, together with its embedded chunks.
#[derive(Debug)]
pub struct NewDocument {
    pub title: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub entries: Vec<NewEntry>,
}

/// One chunk ready for storage: text, embedding, and source metadata.
#[derive(Debug)]
pub struct NewEntry {
    pub text: String,
    pub vector: Vec<f32>,
    pub page: u32,
    pub position: usize,
}
