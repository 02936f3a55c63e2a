pub mod memory;
pub mod sqlite;

pub use memory::InMemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::{DocumentChunk, SearchHit, StoreError, StoredRecord};
use uuid::Uuid;

pub(crate) fn new_record_id() -> String {
    format!("doc_{}", Uuid::new_v4())
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

/// Checks an insert batch and returns its vector dimension (`None` for an empty batch).
pub(crate) fn validate_batch(
    chunks: &[DocumentChunk],
    embeddings: &[Vec<f32>],
    expected_dimensions: Option<usize>,
) -> Result<Option<usize>, StoreError> {
    if chunks.len() != embeddings.len() {
        return Err(StoreError::LengthMismatch {
            chunks: chunks.len(),
            embeddings: embeddings.len(),
        });
    }

    let Some(first) = embeddings.first() else {
        return Ok(None);
    };
    let expected = expected_dimensions.unwrap_or(first.len());

    for embedding in embeddings {
        if embedding.len() != expected {
            return Err(StoreError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }
    }

    Ok(Some(expected))
}

/// A query must have the collection's dimension once the collection holds vectors.
pub(crate) fn check_query_dimensions(
    expected: Option<usize>,
    query_vector: &[f32],
) -> Result<(), StoreError> {
    match expected {
        Some(expected) if expected != query_vector.len() => Err(StoreError::DimensionMismatch {
            expected,
            actual: query_vector.len(),
        }),
        _ => Ok(()),
    }
}

/// Brute-force ranking shared by both stores.
///
/// A zero query vector matches nothing, so it ranks no records.
pub(crate) fn rank_records<'a>(
    records: impl IntoIterator<Item = &'a StoredRecord>,
    query_vector: &[f32],
    k: usize,
) -> Vec<SearchHit> {
    if query_vector.iter().all(|value| *value == 0.0) {
        return Vec::new();
    }

    let mut scored = records
        .into_iter()
        .map(|record| {
            let score = f64::from(cosine_similarity(&record.embedding, query_vector));
            (score, record)
        })
        .collect::<Vec<_>>();

    scored.sort_by(|left, right| right.0.total_cmp(&left.0));

    scored
        .into_iter()
        .take(k)
        .map(|(score, record)| SearchHit {
            id: record.id.clone(),
            text: record.text.clone(),
            score,
            metadata: record.metadata.clone(),
        })
        .collect()
}
