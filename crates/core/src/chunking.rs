use crate::error::IngestError;
use crate::extractor::PageText;
use crate::models::{ChunkMetadata, DocumentChunk, IngestionOptions};
use chrono::{DateTime, Utc};

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn validate(self) -> Result<Self, IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(self)
    }
}

impl From<IngestionOptions> for ChunkingConfig {
    fn from(value: IngestionOptions) -> Self {
        Self {
            chunk_size: value.chunk_size,
            chunk_overlap: value.chunk_overlap,
        }
    }
}

/// Splits `text` into chunks of at most `chunk_size` characters, preferring
/// paragraph, then line, then word boundaries, and carrying up to
/// `chunk_overlap` characters of the previous chunk into the next one.
pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    split_recursive(text, &SEPARATORS, config)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn split_recursive(text: &str, separators: &[&str], config: ChunkingConfig) -> Vec<String> {
    let mut separator = "";
    let mut remaining: &[&str] = &[];
    for (index, candidate) in separators.iter().enumerate() {
        if candidate.is_empty() {
            separator = candidate;
            break;
        }
        if text.contains(candidate) {
            separator = candidate;
            remaining = &separators[index + 1..];
            break;
        }
    }

    let mut chunks = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for piece in split_keeping_separator(text, separator) {
        if char_len(&piece) < config.chunk_size {
            pending.push(piece);
            continue;
        }

        if !pending.is_empty() {
            chunks.extend(merge_pieces(&pending, config));
            pending.clear();
        }

        if remaining.is_empty() {
            chunks.push(piece);
        } else {
            chunks.extend(split_recursive(&piece, remaining, config));
        }
    }

    if !pending.is_empty() {
        chunks.extend(merge_pieces(&pending, config));
    }

    chunks
}

/// Pieces keep their separator as a prefix so joining them restores the text.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    for (index, part) in text.split(separator).enumerate() {
        let piece = if index == 0 {
            part.to_string()
        } else {
            format!("{separator}{part}")
        };
        if !piece.is_empty() {
            pieces.push(piece);
        }
    }
    pieces
}

fn merge_pieces(pieces: &[String], config: ChunkingConfig) -> Vec<String> {
    let mut merged = Vec::new();
    let mut window: Vec<&str> = Vec::new();
    let mut window_len = 0usize;

    for piece in pieces {
        let piece_len = char_len(piece);

        if window_len + piece_len > config.chunk_size && !window.is_empty() {
            push_trimmed(&mut merged, &window.concat());

            while window_len > config.chunk_overlap
                || (window_len + piece_len > config.chunk_size && window_len > 0)
            {
                let dropped = window.remove(0);
                window_len -= char_len(dropped);
            }
        }

        window.push(piece);
        window_len += piece_len;
    }

    push_trimmed(&mut merged, &window.concat());
    merged
}

fn push_trimmed(target: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        target.push(trimmed.to_string());
    }
}

/// Splits one page into chunks tagged with the page's source metadata.
///
/// `global_index` numbers chunks across the whole corpus; the returned cursor
/// is the index to use for the next page.
pub fn build_chunks(
    source_file: &str,
    source_path: &str,
    checksum: &str,
    page: &PageText,
    config: ChunkingConfig,
    global_index: u64,
    ingested_at: DateTime<Utc>,
) -> (Vec<DocumentChunk>, u64) {
    let mut cursor = global_index;
    let mut chunks = Vec::new();

    for text in split_text(&page.text, config) {
        chunks.push(DocumentChunk {
            text,
            metadata: ChunkMetadata {
                source_file: source_file.to_string(),
                source_path: source_path.to_string(),
                page: page.number,
                total_pages: page.total,
                chunk_index: cursor,
                checksum: checksum.to_string(),
                ingested_at,
            },
        });
        cursor = cursor.saturating_add(1);
    }

    (chunks, cursor)
}
