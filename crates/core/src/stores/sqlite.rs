//! SQLite-backed vector store.
//!
//! One database file inside the store directory holds every collection.
//! Vectors are kept as little-endian `f32` blobs and searched by brute-force
//! cosine similarity.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use super::{check_query_dimensions, new_record_id, rank_records, validate_batch};
use crate::traits::VectorIndex;
use crate::{ChunkMetadata, DocumentChunk, SearchHit, StoreError, StoredRecord};

pub const DATABASE_FILE: &str = "vectors.sqlite3";

pub struct SqliteVectorStore {
    pool: SqlitePool,
    collection: String,
    db_path: PathBuf,
}

impl SqliteVectorStore {
    /// Opens (or creates) the store under `dir` and the named collection in it.
    pub async fn open(dir: impl AsRef<Path>, collection: impl Into<String>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let db_path = dir.join(DATABASE_FILE);

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            collection: collection.into(),
            db_path,
        };
        store.init_schema().await?;

        let records = store.count().await?;
        info!(
            path = %store.db_path.display(),
            collection = %store.collection,
            records,
            "vector store loaded"
        );
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimensions INTEGER,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL REFERENCES collections(name),
                document TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection)")
            .execute(&self.pool)
            .await?;

        sqlx::query("INSERT OR IGNORE INTO collections (name) VALUES (?1)")
            .bind(&self.collection)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn collection_dimensions(&self) -> Result<Option<usize>, StoreError> {
        let dimensions =
            sqlx::query_scalar::<_, Option<i64>>("SELECT dimensions FROM collections WHERE name = ?1")
                .bind(&self.collection)
                .fetch_optional(&self.pool)
                .await?
                .flatten();

        Ok(dimensions.and_then(|value| usize::try_from(value).ok()))
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_record(row: &SqliteRow) -> Result<StoredRecord, StoreError> {
        let metadata: String = row.try_get("metadata")?;
        let embedding: Vec<u8> = row.try_get("embedding")?;

        Ok(StoredRecord {
            id: row.try_get("id")?,
            text: row.try_get("document")?,
            embedding: Self::deserialize_embedding(&embedding),
            metadata: serde_json::from_str::<ChunkMetadata>(&metadata)?,
        })
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn insert(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, StoreError> {
        let existing = self.collection_dimensions().await?;
        let Some(dimensions) = validate_batch(chunks, embeddings, existing)? else {
            return Ok(0);
        };

        let mut tx = self.pool.begin().await?;

        if existing.is_none() {
            sqlx::query("UPDATE collections SET dimensions = ?1 WHERE name = ?2")
                .bind(dimensions as i64)
                .bind(&self.collection)
                .execute(&mut *tx)
                .await?;
        }

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let metadata = serde_json::to_string(&chunk.metadata)?;

            sqlx::query(
                "INSERT INTO records (id, collection, document, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(new_record_id())
            .bind(&self.collection)
            .bind(&chunk.text)
            .bind(&metadata)
            .bind(Self::serialize_embedding(embedding))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(collection = %self.collection, inserted = chunks.len(), "records committed");
        Ok(chunks.len())
    }

    async fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<SearchHit>, StoreError> {
        check_query_dimensions(self.collection_dimensions().await?, query_vector)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, document, metadata, embedding FROM records WHERE collection = ?1",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .iter()
            .map(Self::row_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rank_records(records.iter(), query_vector, k))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM records WHERE collection = ?1")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}
