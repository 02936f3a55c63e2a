use crate::config::{EmbedderKind, Settings};
use async_trait::async_trait;
use pdf_rag_core::{
    CharacterNgramEmbedder, Embedder, OpenAiCompatibleChatModel, PipelineFactory, RagError,
    RagPipeline, SqliteVectorStore,
};
use std::sync::Arc;
use tracing::info;

/// Builds the production pipeline: configured embedder, on-disk store, hosted chat model.
pub struct ServiceFactory {
    settings: Settings,
}

impl ServiceFactory {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl PipelineFactory for ServiceFactory {
    type Store = SqliteVectorStore;
    type Model = OpenAiCompatibleChatModel;

    async fn create(&self) -> Result<RagPipeline<Self::Store, Self::Model>, RagError> {
        let model = OpenAiCompatibleChatModel::new(self.settings.chat_model_config())
            .map_err(|error| RagError::Initialization(error.to_string()))?;

        let kind = self.settings.embedder;
        let embedder = tokio::task::spawn_blocking(move || build_embedder(kind))
            .await
            .map_err(|error| RagError::Initialization(error.to_string()))??;
        info!(
            model = embedder.model_name(),
            dimensions = embedder.dimensions(),
            "embedding model loaded"
        );

        let store = SqliteVectorStore::open(&self.settings.vector_store_path, &self.settings.collection)
            .await
            .map_err(|error| RagError::Initialization(error.to_string()))?;

        Ok(RagPipeline::new(embedder, store, model)
            .with_options(self.settings.ingestion_options())
            .with_top_k(self.settings.top_k))
    }
}

fn build_embedder(kind: EmbedderKind) -> Result<Arc<dyn Embedder>, RagError> {
    match kind {
        EmbedderKind::Ngram => Ok(Arc::new(CharacterNgramEmbedder::default())),
        #[cfg(feature = "local-embeddings")]
        EmbedderKind::Local => {
            let embedder = pdf_rag_core::FastEmbedder::all_minilm_l6_v2()
                .map_err(|error| RagError::Initialization(error.to_string()))?;
            Ok(Arc::new(embedder))
        }
        #[cfg(not(feature = "local-embeddings"))]
        EmbedderKind::Local => Err(RagError::Initialization(
            "local embeddings require building with --features local-embeddings".to_string(),
        )),
    }
}
