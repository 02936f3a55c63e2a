pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod service;
pub mod stores;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use chunking::{build_chunks, split_text, ChunkingConfig};
#[cfg(feature = "local-embeddings")]
pub use embeddings::FastEmbedder;
pub use embeddings::{CharacterNgramEmbedder, Embedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{EmbedError, ErrorKind, IngestError, LlmError, RagError, StoreError};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PdfExtractor};
pub use ingest::{digest_file, discover_pdf_files, load_folder_chunks, LoadedCorpus};
pub use llm::{
    ChatModel, ChatModelConfig, OpenAiCompatibleChatModel, DEFAULT_LLM_BASE_URL,
    DEFAULT_LLM_MODEL, DEFAULT_LLM_TIMEOUT,
};
pub use models::{
    ChunkMetadata, DocumentChunk, IngestionOptions, IngestionReport, SearchHit, SkippedPdf,
    StoredRecord, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_COLLECTION, DEFAULT_TOP_K,
};
pub use pipeline::RagPipeline;
pub use prompt::{build_context, render_prompt, NO_CONTEXT_PLACEHOLDER};
pub use service::{PipelineFactory, RagService};
pub use stores::{InMemoryVectorStore, SqliteVectorStore};
pub use traits::VectorIndex;
