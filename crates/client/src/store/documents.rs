//! Document embedding index.
//!
//! Documents are content-addressed by SHA-256, so re-storing the same text
//! is an upsert rather than a duplicate. Search is a brute-force scan over
//! every stored embedding, ordered by cosine distance ascending.

use sha2::{Digest, Sha256};
use tokio_rusqlite::params;

use super::connection::StoreDb;
use super::distance::cosine_distance;
use super::error::StoreError;

/// One document returned by a vector search.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct DocumentMatch {
    pub content: String,
    pub source: Option<String>,
    /// Cosine distance to the query vector; smaller is more similar.
    pub distance: f32,
    /// `1 - distance`, for display.
    pub similarity: f32,
}

/// Compute the content address of a document.
pub fn document_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

impl StoreDb {
    /// Insert or update a document with its embedding.
    ///
    /// Returns the content hash. Uses UPSERT semantics keyed on the hash,
    /// so identical content refreshes its embedding in place.
    pub async fn add_document(
        &self, content: &str, source: Option<&str>, embedding: &[f32],
    ) -> Result<String, StoreError> {
        let hash = document_hash(content);
        let content = content.to_string();
        let source = source.map(|s| s.to_string());
        let embedding_json = serde_json::to_string(embedding).unwrap_or_default();
        let created_at = chrono::Utc::now().to_rfc3339();

        let stored_hash = hash.clone();
        self.conn
            .call(move |conn| -> Result<(), StoreError> {
                conn.execute(
                    "INSERT INTO documents (hash, content, source, embedding, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(hash) DO UPDATE SET
                         source = excluded.source,
                         embedding = excluded.embedding,
                         created_at = excluded.created_at",
                    params![stored_hash, content, source, embedding_json, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)?;

        Ok(hash)
    }

    /// Nearest documents to `query`, ordered by distance ascending.
    ///
    /// Rows whose stored embedding fails to parse or has the wrong
    /// dimension are skipped, not fatal.
    pub async fn search_documents(&self, query: &[f32], limit: usize) -> Result<Vec<DocumentMatch>, StoreError> {
        let query = query.to_vec();
        self.conn
            .call(move |conn| -> Result<Vec<DocumentMatch>, StoreError> {
                let mut stmt = conn.prepare("SELECT content, source, embedding FROM documents")?;
                let rows: Vec<(String, Option<String>, String)> = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                    .collect::<Result<_, _>>()?;

                let mut matches = Vec::new();
                for (content, source, embedding_json) in rows {
                    let embedding: Vec<f32> = match serde_json::from_str(&embedding_json) {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::warn!("skipping document with unreadable embedding: {}", e);
                            continue;
                        }
                    };
                    if embedding.len() != query.len() {
                        tracing::warn!(
                            "skipping document with dimension {} (query has {})",
                            embedding.len(),
                            query.len()
                        );
                        continue;
                    }

                    let distance = cosine_distance(&query, &embedding);
                    matches.push(DocumentMatch { content, source, distance, similarity: 1.0 - distance });
                }

                matches.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
                matches.truncate(limit);

                Ok(matches)
            })
            .await
            .map_err(StoreError::from)
    }

    /// Number of stored documents.
    pub async fn document_count(&self) -> Result<i64, StoreError> {
        self.conn
            .call(|conn| -> Result<i64, StoreError> {
                conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
                    .map_err(StoreError::from)
            })
            .await
            .map_err(StoreError::from)
    }
}
