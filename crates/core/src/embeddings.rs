use crate::error::EmbedError;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 128;

/// Turns text into fixed-length vectors, one per input and in input order.
///
/// Implementations are loaded once and shared; `embed` is blocking and
/// should be driven from `spawn_blocking` in async code.
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;
    fn dimensions(&self) -> usize;
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Hashed character-trigram embedder. Deterministic and model-free.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

const NGRAM_WIDTH: usize = 3;

impl CharacterNgramEmbedder {
    /// Text shorter than a trigram is hashed as a single shorter gram.
    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions()];
        let chars = text.to_lowercase().chars().collect::<Vec<_>>();
        let width = NGRAM_WIDTH.min(chars.len());
        if width == 0 {
            return vector;
        }

        let buckets = vector.len() as u64;
        for gram in chars.windows(width) {
            vector[(fnv1a(gram) % buckets) as usize] += 1.0;
        }

        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        vector.iter_mut().for_each(|value| *value /= norm);
        vector
    }
}

fn fnv1a(gram: &[char]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    let mut buf = [0u8; 4];
    for ch in gram {
        for byte in ch.encode_utf8(&mut buf).bytes() {
            hash = (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

impl Embedder for CharacterNgramEmbedder {
    fn model_name(&self) -> &str {
        "char-trigram"
    }

    fn dimensions(&self) -> usize {
        self.dimensions.max(1)
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use super::Embedder;
    use crate::error::EmbedError;
    use std::sync::Mutex;

    const MINILM_DIMENSIONS: usize = 384;

    /// `all-MiniLM-L6-v2` sentence embeddings through fastembed's bundled ONNX runtime.
    pub struct FastEmbedder {
        model: Mutex<fastembed::TextEmbedding>,
        batch_size: Option<usize>,
    }

    impl FastEmbedder {
        /// Loads (and on first use downloads) the model. Slow; call once per process.
        pub fn all_minilm_l6_v2() -> Result<Self, EmbedError> {
            let model = fastembed::TextEmbedding::try_new(
                fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
                    .with_show_download_progress(false),
            )
            .map_err(|error| EmbedError::Model(error.to_string()))?;

            Ok(Self {
                model: Mutex::new(model),
                batch_size: Some(64),
            })
        }
    }

    impl Embedder for FastEmbedder {
        fn model_name(&self) -> &str {
            "all-MiniLM-L6-v2"
        }

        fn dimensions(&self) -> usize {
            MINILM_DIMENSIONS
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let mut model = self
                .model
                .lock()
                .map_err(|_| EmbedError::Model("embedding model lock poisoned".to_string()))?;
            model
                .embed(texts.to_vec(), self.batch_size)
                .map_err(|error| EmbedError::Model(error.to_string()))
        }
    }
}
