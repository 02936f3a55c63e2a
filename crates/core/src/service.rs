//! Process-wide RAG service with guarded lazy initialisation.
//!
//! The first caller that needs the pipeline builds it through a
//! [`PipelineFactory`] and, if the store is empty, ingests the corpus. Callers
//! arriving meanwhile wait on the same initialisation. Construction and
//! ingestion are guarded separately: a pipeline that was built is kept even
//! when ingestion fails, so a retry only repeats the ingestion step and the
//! embedding model is loaded once per process.

use crate::llm::ChatModel;
use crate::pipeline::RagPipeline;
use crate::traits::VectorIndex;
use crate::RagError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

#[async_trait]
pub trait PipelineFactory: Send + Sync {
    type Store: VectorIndex + 'static;
    type Model: ChatModel + 'static;

    async fn create(&self) -> Result<RagPipeline<Self::Store, Self::Model>, RagError>;
}

pub struct RagService<F: PipelineFactory> {
    factory: F,
    corpus_dir: PathBuf,
    pipeline: OnceCell<Arc<RagPipeline<F::Store, F::Model>>>,
    ingested: OnceCell<()>,
}

impl<F: PipelineFactory> RagService<F> {
    pub fn new(factory: F, corpus_dir: impl Into<PathBuf>) -> Self {
        Self {
            factory,
            corpus_dir: corpus_dir.into(),
            pipeline: OnceCell::new(),
            ingested: OnceCell::new(),
        }
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    pub fn is_ready(&self) -> bool {
        self.ingested.initialized()
    }

    pub async fn pipeline(&self) -> Result<Arc<RagPipeline<F::Store, F::Model>>, RagError> {
        let pipeline = self
            .pipeline
            .get_or_try_init(|| async {
                info!(corpus = %self.corpus_dir.display(), "initializing rag pipeline");
                Ok::<_, RagError>(Arc::new(self.factory.create().await?))
            })
            .await?;

        self.ingested
            .get_or_try_init(|| async {
                if let Some(report) = pipeline.ensure_ingested(&self.corpus_dir).await? {
                    info!(
                        files = report.files_found,
                        chunks = report.chunks_written,
                        skipped = report.skipped_files.len(),
                        "initial ingestion finished"
                    );
                }
                Ok::<_, RagError>(())
            })
            .await?;

        Ok(Arc::clone(pipeline))
    }

    pub async fn answer(&self, query: &str) -> Result<String, RagError> {
        self.pipeline().await?.ask(query).await
    }
}
