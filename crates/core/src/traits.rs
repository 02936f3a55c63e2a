use crate::{DocumentChunk, SearchHit, StoreError};
use async_trait::async_trait;

/// Persistent collection of embedded chunks with nearest-neighbour lookup.
///
/// The store never deduplicates: inserting the same chunks twice stores them
/// twice. Callers gate re-ingestion on [`VectorIndex::count`].
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn collection(&self) -> &str;

    /// Stores one record per chunk under a fresh id and returns how many were written.
    async fn insert(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, StoreError>;

    /// Up to `k` records, most similar first. An empty store yields no hits.
    async fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<SearchHit>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}
