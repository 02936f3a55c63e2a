//! In-memory [`VectorIndex`] for tests and throwaway runs.
//!
//! Clones share the same records, so a test can keep a handle to the store it
//! hands to a pipeline and inspect it afterwards.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{check_query_dimensions, new_record_id, rank_records, validate_batch};
use crate::models::DEFAULT_COLLECTION;
use crate::traits::VectorIndex;
use crate::{DocumentChunk, SearchHit, StoreError, StoredRecord};

#[derive(Debug, Clone)]
pub struct InMemoryVectorStore {
    collection: String,
    records: Arc<RwLock<Vec<StoredRecord>>>,
}

impl InMemoryVectorStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn insert(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        let existing = records.first().map(|record| record.embedding.len());
        validate_batch(chunks, embeddings, existing)?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            records.push(StoredRecord {
                id: new_record_id(),
                text: chunk.text.clone(),
                embedding: embedding.clone(),
                metadata: chunk.metadata.clone(),
            });
        }

        Ok(chunks.len())
    }

    async fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<SearchHit>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        check_query_dimensions(records.first().map(|record| record.embedding.len()), query_vector)?;
        Ok(rank_records(records.iter(), query_vector, k))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_chunk;

    #[tokio::test]
    async fn empty_store_search_returns_nothing() {
        let store = InMemoryVectorStore::default();
        let hits = store.search(&[1.0, 0.0], 3).await.expect("search should succeed");
        assert!(hits.is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clones_share_records() {
        let store = InMemoryVectorStore::default();
        let handle = store.clone();

        store
            .insert(&[sample_chunk("alpha", 1)], &[vec![1.0, 0.0]])
            .await
            .expect("insert should succeed");

        assert_eq!(handle.count().await.unwrap(), 1);
        assert_eq!(handle.collection(), "company_docs");
    }

    #[tokio::test]
    async fn rejects_dimension_drift() {
        let store = InMemoryVectorStore::default();
        store
            .insert(&[sample_chunk("alpha", 1)], &[vec![1.0, 0.0]])
            .await
            .unwrap();

        let result = store
            .insert(&[sample_chunk("beta", 2)], &[vec![1.0, 0.0, 0.0]])
            .await;

        assert!(matches!(
            result,
            Err(StoreError::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn search_rejects_query_of_another_dimension() {
        let store = InMemoryVectorStore::default();
        store
            .insert(
                &[sample_chunk("alpha", 1), sample_chunk("beta", 2)],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .await
            .unwrap();

        let result = store.search(&[1.0, 0.0, 0.0], 3).await;

        assert!(matches!(
            result,
            Err(StoreError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }
}
