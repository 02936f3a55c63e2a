use crate::embeddings::Embedder;
use crate::extractor::{LopdfExtractor, PdfExtractor};
use crate::ingest::load_folder_chunks;
use crate::llm::ChatModel;
use crate::models::DEFAULT_TOP_K;
use crate::prompt::{build_context, render_prompt};
use crate::traits::VectorIndex;
use crate::{EmbedError, IngestError, IngestionOptions, IngestionReport, RagError, SearchHit};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Ingestion (write path) and question answering (read path) over one store.
///
/// Holds no per-request state; one instance is shared by every caller.
pub struct RagPipeline<S, M>
where
    S: VectorIndex,
    M: ChatModel,
{
    embedder: Arc<dyn Embedder>,
    extractor: Arc<dyn PdfExtractor>,
    store: S,
    model: M,
    options: IngestionOptions,
    top_k: usize,
}

impl<S, M> RagPipeline<S, M>
where
    S: VectorIndex,
    M: ChatModel,
{
    pub fn new(embedder: Arc<dyn Embedder>, store: S, model: M) -> Self {
        Self {
            embedder,
            extractor: Arc::new(LopdfExtractor),
            store,
            model,
            options: IngestionOptions::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_options(mut self, options: IngestionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn PdfExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn record_count(&self) -> Result<u64, RagError> {
        Ok(self.store.count().await?)
    }

    /// Loads, splits, embeds and stores every PDF in `folder`.
    ///
    /// Not idempotent: running it twice stores the corpus twice. Use
    /// [`RagPipeline::ensure_ingested`] to gate on an empty store.
    pub async fn build(&self, folder: &Path) -> Result<IngestionReport, RagError> {
        let corpus = {
            let folder: PathBuf = folder.to_path_buf();
            let extractor = Arc::clone(&self.extractor);
            let options = self.options;
            tokio::task::spawn_blocking(move || {
                load_folder_chunks(&folder, options, extractor.as_ref())
            })
            .await
            .map_err(|error| IngestError::Io(std::io::Error::other(error.to_string())))??
        };

        let mut report = IngestionReport {
            files_found: corpus.files_found,
            pages_loaded: corpus.pages_loaded,
            chunks_written: 0,
            skipped_files: corpus.skipped_files,
        };

        if corpus.chunks.is_empty() {
            info!(folder = %folder.display(), "nothing to ingest");
            return Ok(report);
        }

        let texts = corpus
            .chunks
            .iter()
            .map(|chunk| chunk.text.clone())
            .collect::<Vec<_>>();
        info!(chunks = texts.len(), model = self.embedder.model_name(), "embedding chunks");
        let embeddings = self.embed(texts).await?;

        report.chunks_written = self.store.insert(&corpus.chunks, &embeddings).await?;
        let total = self.store.count().await?;
        info!(
            collection = self.store.collection(),
            written = report.chunks_written,
            total,
            "ingestion complete"
        );
        Ok(report)
    }

    /// Runs [`RagPipeline::build`] only when the store holds no records.
    pub async fn ensure_ingested(&self, folder: &Path) -> Result<Option<IngestionReport>, RagError> {
        let existing = self.store.count().await?;
        if existing > 0 {
            info!(records = existing, "using existing vector store");
            return Ok(None);
        }

        self.build(folder).await.map(Some)
    }

    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, RagError> {
        let query = validate_query(query)?;
        let mut vectors = self.embed(vec![query.to_string()]).await?;
        let query_vector = vectors.pop().ok_or(EmbedError::CountMismatch {
            expected: 1,
            actual: 0,
        })?;

        Ok(self.store.search(&query_vector, k).await?)
    }

    pub async fn ask(&self, query: &str) -> Result<String, RagError> {
        self.ask_with_k(query, self.top_k).await
    }

    pub async fn ask_with_k(&self, query: &str, k: usize) -> Result<String, RagError> {
        info!(query = %query, k, "answering query");
        let hits = self.retrieve(query, k).await?;
        debug!(hits = hits.len(), "retrieved context");

        let context = build_context(&hits);
        let prompt = render_prompt(&context, query.trim());

        let reply = self.model.complete(&prompt).await?;
        Ok(reply.trim().to_string())
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
        let expected = texts.len();
        let embedder = Arc::clone(&self.embedder);
        let vectors = tokio::task::spawn_blocking(move || embedder.embed(&texts))
            .await
            .map_err(|error| EmbedError::Worker(error.to_string()))??;

        if vectors.len() != expected {
            return Err(EmbedError::CountMismatch {
                expected,
                actual: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

fn validate_query(query: &str) -> Result<&str, RagError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(RagError::InvalidQuery("query is empty".to_string()));
    }
    Ok(trimmed)
}
