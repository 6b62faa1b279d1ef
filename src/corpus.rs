//! Precomputed embedding corpora.
//!
//! Two CSV tables are loaded once at process start: the knowledge-graph
//! node corpus and the source-document corpus. Each row pairs an identifier
//! with a fixed-length embedding vector stored as a JSON-style float list
//! in a string cell. After loading, the store is immutable and safe for
//! unsynchronized concurrent reads.

use std::path::Path;

use tracing::info;

use crate::config::CorpusConfig;
use crate::error::{DispatchError, Result};
use crate::models::EmbeddingRecord;

/// The two static corpora, loaded once and shared read-only.
#[derive(Debug)]
pub struct CorpusStore {
    pub nodes: Vec<EmbeddingRecord>,
    pub documents: Vec<EmbeddingRecord>,
}

impl CorpusStore {
    /// Load both corpora per the configuration. Fails fast on a missing
    /// column or a vector of the wrong length.
    pub fn load(config: &CorpusConfig) -> Result<Self> {
        info!(path = %config.nodes_path.display(), "loading node embeddings");
        let nodes = load_corpus(&config.nodes_path, &config.node_id_col, config.dims)?;

        info!(path = %config.documents_path.display(), "loading document embeddings");
        let documents = load_corpus(&config.documents_path, &config.document_id_col, config.dims)?;

        info!(nodes = nodes.len(), documents = documents.len(), "corpora loaded");
        Ok(Self { nodes, documents })
    }
}

/// Read one corpus CSV: `id_col` names the identifier column, `embedding`
/// holds the vector. Row order is preserved; it is the ranking tie-break.
pub fn load_corpus(path: &Path, id_col: &str, dims: usize) -> Result<Vec<EmbeddingRecord>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        DispatchError::Corpus(format!("failed to open {}: {}", path.display(), e))
    })?;

    let headers = reader
        .headers()
        .map_err(|e| DispatchError::Corpus(format!("failed to read headers: {}", e)))?
        .clone();

    let id_idx = headers.iter().position(|h| h == id_col).ok_or_else(|| {
        DispatchError::Corpus(format!(
            "{}: missing identifier column '{}'",
            path.display(),
            id_col
        ))
    })?;
    let emb_idx = headers.iter().position(|h| h == "embedding").ok_or_else(|| {
        DispatchError::Corpus(format!("{}: missing 'embedding' column", path.display()))
    })?;

    let mut records = Vec::new();
    for (row_num, row) in reader.records().enumerate() {
        let row = row.map_err(|e| {
            DispatchError::Corpus(format!("{}: row {}: {}", path.display(), row_num + 1, e))
        })?;

        let id = row.get(id_idx).unwrap_or_default().to_string();
        let raw = row.get(emb_idx).unwrap_or_default();
        let vector: Vec<f32> = serde_json::from_str(raw).map_err(|e| {
            DispatchError::Corpus(format!(
                "{}: row {} ('{}'): bad embedding: {}",
                path.display(),
                row_num + 1,
                id,
                e
            ))
        })?;

        if vector.len() != dims {
            return Err(DispatchError::Corpus(format!(
                "{}: row {} ('{}'): expected {} dimensions, got {}",
                path.display(),
                row_num + 1,
                id,
                dims,
                vector.len()
            )));
        }

        records.push(EmbeddingRecord { id, vector });
    }

    Ok(records)
}
