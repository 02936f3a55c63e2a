use crate::chunking::{build_chunks, ChunkingConfig};
use crate::extractor::PdfExtractor;
use crate::{DocumentChunk, IngestError, IngestionOptions, SkippedPdf};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// PDFs directly inside `folder`; subdirectories are not searched.
pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Chunks read from a corpus folder, before embedding.
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    pub files_found: usize,
    pub pages_loaded: usize,
    pub chunks: Vec<DocumentChunk>,
    pub skipped_files: Vec<SkippedPdf>,
}

/// Extracts and splits every PDF in `folder`.
///
/// Unreadable files are skipped and reported rather than failing the whole
/// corpus. A folder with no PDFs yields an empty corpus.
pub fn load_folder_chunks(
    folder: &Path,
    options: IngestionOptions,
    extractor: &dyn PdfExtractor,
) -> Result<LoadedCorpus, IngestError> {
    if !folder.is_dir() {
        return Err(IngestError::InvalidArgument(format!(
            "corpus folder does not exist: {}",
            folder.display()
        )));
    }

    let config = ChunkingConfig::from(options).validate()?;
    let files = discover_pdf_files(folder);

    let mut corpus = LoadedCorpus {
        files_found: files.len(),
        ..LoadedCorpus::default()
    };

    if files.is_empty() {
        warn!(folder = %folder.display(), "no pdf files found");
        return Ok(corpus);
    }

    let ingested_at = Utc::now();
    let mut cursor = 0u64;

    for path in files {
        let build_result = (|| {
            let source_file = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?
                .to_string();
            let source_path = path.to_string_lossy().to_string();
            let checksum = digest_file(&path)?;
            let pages = extractor.extract_pages(&path)?;

            let mut chunks = Vec::new();
            let mut next_cursor = cursor;
            for page in &pages {
                let (page_chunks, advanced) = build_chunks(
                    &source_file,
                    &source_path,
                    &checksum,
                    page,
                    config,
                    next_cursor,
                    ingested_at,
                );
                next_cursor = advanced;
                chunks.extend(page_chunks);
            }

            Ok::<_, IngestError>((pages.len(), chunks, next_cursor))
        })();

        match build_result {
            Ok((page_count, chunks, next_cursor)) => {
                info!(file = %path.display(), pages = page_count, chunks = chunks.len(), "loaded pdf");
                cursor = next_cursor;
                corpus.pages_loaded += page_count;
                corpus.chunks.extend(chunks);
            }
            Err(error) => {
                warn!(path = %path.display(), reason = %error, "skipped pdf");
                corpus.skipped_files.push(SkippedPdf {
                    path,
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(corpus)
}
