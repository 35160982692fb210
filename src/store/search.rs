use rusqlite::params;

use super::{VectorStore, vector_blob};
use crate::error::{Error, Result};

/// One similarity-search hit.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub text: String,
    pub source: String,
    pub title: String,
    pub page: u32,
    pub position: usize,
    pub chunk_id: i64,
    pub similarity: f64,
}

impl VectorStore {
    /// Return the `k` entries closest to the query vector by cosine
    /// distance, best first. Equal scores keep insertion order. An empty
    /// store yields an empty result, not an error.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query_vector.len() != self.dimensions {
            return Err(Error::Config(format!(
                "query vector has {} dimensions, store expects {}",
                query_vector.len(),
                self.dimensions
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                c.content,
                d.filename,
                d.title,
                c.page,
                c.position,
                c.id,
                vec_distance_cosine(v.embedding, ?) AS distance
            FROM vec_chunks v
            JOIN chunks c ON v.rowid = c.id
            JOIN documents d ON c.document_id = d.id
            ORDER BY distance ASC, c.id ASC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![vector_blob(query_vector), k as i64], |row| {
            let distance: f64 = row.get(6)?;
            Ok(SearchHit {
                text: row.get(0)?,
                source: row.get(1)?,
                title: row.get(2)?,
                page: row.get::<_, i64>(3)? as u32,
                position: row.get::<_, i64>(4)? as usize,
                chunk_id: row.get(5)?,
                similarity: 1.0 - (distance / 2.0),
            })
        })?;

        let mut hits = Vec::new();
        for row in rows {
            hits.push(row?);
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{NewDocument, NewEntry};
    use chrono::Utc;

    const DIMS: usize = 8;

    fn unit(index: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; DIMS];
        v[index] = 1.0;
        v
    }

    fn doc_with_vectors(title: &str, vectors: Vec<Vec<f32>>) -> NewDocument {
        NewDocument {
            title: title.to_string(),
            filename: format!("{title}.pdf"),
            uploaded_at: Utc::now(),
            entries: vectors
                .into_iter()
                .enumerate()
                .map(|(i, vector)| NewEntry {
                    text: format!("{title} chunk {i}"),
                    vector,
                    page: 1,
                    position: i,
                })
                .collect(),
        }
    }

    #[test]
    fn test_search_empty_store() {
        let store = VectorStore::open_in_memory(DIMS).unwrap();
        let hits = store.search(&unit(0), 3).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_search_exact_match_first() {
        let mut store = VectorStore::open_in_memory(DIMS).unwrap();
        store
            .add_batch(&[doc_with_vectors("a", vec![unit(0), unit(1), unit(2)])])
            .unwrap();

        let hits = store.search(&unit(1), 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "a chunk 1");
        assert!(
            hits[0].similarity > 0.999,
            "identical vector should score best, got {}",
            hits[0].similarity
        );
        // Orthogonal vectors trail the exact match
        assert!(hits[1].similarity < hits[0].similarity);
    }

    #[test]
    fn test_search_best_first_ordering() {
        let mut store = VectorStore::open_in_memory(DIMS).unwrap();
        store
            .add_batch(&[doc_with_vectors(
                "a",
                vec![unit(0), unit(1), unit(2), unit(3)],
            )])
            .unwrap();

        let hits = store.search(&unit(2), 4).unwrap();
        for pair in hits.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_search_never_exceeds_k() {
        let mut store = VectorStore::open_in_memory(DIMS).unwrap();
        store
            .add_batch(&[doc_with_vectors(
                "a",
                (0..6).map(|i| unit(i % DIMS)).collect(),
            )])
            .unwrap();

        assert_eq!(store.search(&unit(0), 2).unwrap().len(), 2);
        assert_eq!(store.search(&unit(0), 100).unwrap().len(), 6);
        assert!(store.search(&unit(0), 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_tie_break_is_insertion_order() {
        let mut store = VectorStore::open_in_memory(DIMS).unwrap();

        // Two entries with the same vector: equal distance to any query
        store
            .add_batch(&[doc_with_vectors("first", vec![unit(5)])])
            .unwrap();
        store
            .add_batch(&[doc_with_vectors("second", vec![unit(5)])])
            .unwrap();

        let hits = store.search(&unit(5), 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "first chunk 0");
        assert_eq!(hits[1].text, "second chunk 0");
        assert!(hits[0].chunk_id < hits[1].chunk_id);
    }

    #[test]
    fn test_search_dimension_mismatch() {
        let store = VectorStore::open_in_memory(DIMS).unwrap();
        let err = store.search(&[1.0, 0.0], 3).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_search_returns_metadata() {
        let mut store = VectorStore::open_in_memory(DIMS).unwrap();
        store
            .add_batch(&[doc_with_vectors("meta", vec![unit(0)])])
            .unwrap();

        let hits = store.search(&unit(0), 1).unwrap();
        assert_eq!(hits[0].source, "meta.pdf");
        assert_eq!(hits[0].title, "meta");
        assert_eq!(hits[0].page, 1);
        assert_eq!(hits[0].position, 0);
    }
}
