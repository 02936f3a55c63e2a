use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding model failed: {0}")]
    Model(String),

    #[error("embedding worker failed: {0}")]
    Worker(String),

    #[error("embedder returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding count {embeddings} doesn't match chunk count {chunks}")]
    LengthMismatch { chunks: usize, embeddings: usize },

    #[error("vector dimension {actual} != collection dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm api key is missing")]
    MissingApiKey,

    #[error("invalid llm endpoint: {0}")]
    Url(#[from] url::ParseError),

    #[error("llm request timed out")]
    Timeout,

    #[error("http error: {0}")]
    Http(reqwest::Error),

    #[error("llm authentication failed ({0})")]
    Authentication(String),

    #[error("llm rate limit reached ({0})")]
    RateLimited(String),

    #[error("llm returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("llm response contained no message")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(error)
        }
    }
}

/// Coarse classification of [`RagError`], stable enough to assert on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Initialization,
    Ingestion,
    Embedding,
    Retrieval,
    Upstream,
    InvalidInput,
}

/// Error surfaced by the RAG pipeline and service to their callers.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("ingestion failed: {0}")]
    Ingestion(#[from] IngestError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] StoreError),

    #[error("language model call failed: {0}")]
    Upstream(#[from] LlmError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl RagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Initialization(_) => ErrorKind::Initialization,
            Self::Ingestion(_) => ErrorKind::Ingestion,
            Self::Embedding(_) => ErrorKind::Embedding,
            Self::Retrieval(_) => ErrorKind::Retrieval,
            Self::Upstream(_) => ErrorKind::Upstream,
            Self::InvalidQuery(_) => ErrorKind::InvalidInput,
        }
    }
}
