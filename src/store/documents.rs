use rusqlite::{OptionalExtension, params};

use super::models::{DocumentRecord, NewDocument};
use super::{VectorStore, vector_blob};
use crate::error::{Error, Result};

impl VectorStore {
    /// Append a batch of documents with their chunks and embeddings, in one
    /// transaction.
    ///
    /// The write is purely additive: existing entries are never touched, and
    /// nothing is visible (or persisted) unless the whole batch commits.
    /// Returns the new document ids, in input order.
    pub fn add_batch(&mut self, batch: &[NewDocument]) -> Result<Vec<i64>> {
        for doc in batch {
            for entry in &doc.entries {
                if entry.vector.len() != self.dimensions {
                    return Err(Error::Config(format!(
                        "embedding has {} dimensions, store expects {}",
                        entry.vector.len(),
                        self.dimensions
                    )));
                }
            }
        }

        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(batch.len());

        for doc in batch {
            tx.execute(
                "INSERT INTO documents (title, filename, uploaded_at) VALUES (?, ?, ?)",
                params![doc.title, doc.filename, doc.uploaded_at],
            )?;
            let doc_id = tx.last_insert_rowid();

            for entry in &doc.entries {
                tx.execute(
                    "INSERT INTO chunks (document_id, position, page, content) VALUES (?, ?, ?, ?)",
                    params![
                        doc_id,
                        entry.position as i64,
                        i64::from(entry.page),
                        entry.text
                    ],
                )?;
                let chunk_id = tx.last_insert_rowid();

                tx.execute(
                    "INSERT INTO vec_chunks (rowid, embedding) VALUES (?, ?)",
                    params![chunk_id, vector_blob(&entry.vector)],
                )?;
            }

            ids.push(doc_id);
        }

        tx.commit()?;
        Ok(ids)
    }

    /// List all documents, newest first.
    pub fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, filename, uploaded_at FROM documents ORDER BY uploaded_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DocumentRecord {
                id: row.get(0)?,
                title: row.get(1)?,
                filename: row.get(2)?,
                uploaded_at: row.get(3)?,
            })
        })?;

        let mut docs = Vec::new();
        for row in rows {
            docs.push(row?);
        }
        Ok(docs)
    }

    /// Fetch one document by id.
    pub fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, title, filename, uploaded_at FROM documents WHERE id = ?",
                params![id],
                |row| {
                    Ok(DocumentRecord {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        filename: row.get(2)?,
                        uploaded_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Delete a document together with its chunks and vectors.
    ///
    /// Returns `false` when the id is unknown.
    pub fn delete_document(&mut self, id: i64) -> Result<bool> {
        let tx = self.conn.transaction()?;

        // Virtual tables do not participate in cascades; delete by rowid first
        tx.execute(
            "DELETE FROM vec_chunks WHERE rowid IN (SELECT id FROM chunks WHERE document_id = ?)",
            params![id],
        )?;

        // Cascade removes the chunks
        let rows = tx.execute("DELETE FROM documents WHERE id = ?", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    /// Number of stored chunk entries.
    pub fn count_entries(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
