use clap::{Parser, Subcommand, ValueEnum};
use pdf_rag_core::{
    ChatModelConfig, IngestionOptions, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    DEFAULT_COLLECTION, DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL, DEFAULT_TOP_K,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pdf-rag-server", version, about = "Chat with a folder of PDFs over HTTP")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub settings: Settings,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the chat endpoint, health checks and the web page (default).
    Serve,
    /// Ingest the PDF folder into the vector store.
    Ingest {
        /// Ingest even when the store already holds records.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Answer one question from the command line.
    Ask {
        #[arg(long)]
        query: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// all-MiniLM-L6-v2 via fastembed (requires the `local-embeddings` feature).
    Local,
    /// Hashed character trigrams; no model download.
    Ngram,
}

impl Default for EmbedderKind {
    fn default() -> Self {
        if cfg!(feature = "local-embeddings") {
            Self::Local
        } else {
            Self::Ngram
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct Settings {
    /// API key for the hosted language model.
    #[arg(long, env = "GROQ_KEY", hide_env_values = true, global = true)]
    pub groq_key: Option<String>,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = 8000, global = true)]
    pub port: u16,

    /// Directory holding the vector database.
    #[arg(long, env = "VECTOR_STORE_PATH", default_value = "./vector_store", global = true)]
    pub vector_store_path: PathBuf,

    /// Collection inside the vector database.
    #[arg(long, env = "VECTOR_COLLECTION", default_value = DEFAULT_COLLECTION, global = true)]
    pub collection: String,

    /// Folder scanned (non-recursively) for PDFs.
    #[arg(long, env = "PDF_DIR", default_value = ".", global = true)]
    pub pdf_dir: PathBuf,

    /// Folder with index.html and the css/, js/ and images/ directories.
    #[arg(long, env = "STATIC_DIR", default_value = ".", global = true)]
    pub static_dir: PathBuf,

    /// Chat model name.
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_LLM_MODEL, global = true)]
    pub llm_model: String,

    /// OpenAI-compatible API base URL.
    #[arg(long, env = "LLM_BASE_URL", default_value = DEFAULT_LLM_BASE_URL, global = true)]
    pub llm_base_url: String,

    /// Upper bound on one chat completion call.
    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 60, global = true)]
    pub llm_timeout_secs: u64,

    #[arg(long, env = "EMBEDDING_PROVIDER", value_enum, default_value_t = EmbedderKind::default(), global = true)]
    pub embedder: EmbedderKind,

    /// Chunks retrieved per question.
    #[arg(long, env = "TOP_K", default_value_t = DEFAULT_TOP_K, global = true)]
    pub top_k: usize,

    #[arg(long, env = "CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE, global = true)]
    pub chunk_size: usize,

    #[arg(long, env = "CHUNK_OVERLAP", default_value_t = DEFAULT_CHUNK_OVERLAP, global = true)]
    pub chunk_overlap: usize,
}

impl Settings {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn ingestion_options(&self) -> IngestionOptions {
        IngestionOptions {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }

    /// The key is checked when the client is built, so a missing key becomes
    /// an initialisation error on first use rather than a startup failure.
    pub fn chat_model_config(&self) -> ChatModelConfig {
        ChatModelConfig {
            api_key: self.groq_key.clone().unwrap_or_default(),
            base_url: self.llm_base_url.clone(),
            model: self.llm_model.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }
}
