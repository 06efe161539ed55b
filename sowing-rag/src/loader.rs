//! Discovery and reading of extracted document text.

use std::path::{Component, Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

/// File extensions treated as ingestible text.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Recursively list ingestible files under `dir`, sorted by path.
///
/// Entries that cannot be visited are logged and skipped.
///
/// # Errors
///
/// Returns [`RagError::IngestionError`] if `dir` is not a readable directory.
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RagError::IngestionError {
            document: dir.display().to_string(),
            message: "not a directory".to_string(),
        });
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_document(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Read a UTF-8 text file found under `root` into a [`Document`].
///
/// The document id is the path relative to `root` with `/` separators, so
/// same-named files in different subdirectories get distinct ids.
///
/// # Errors
///
/// Returns [`RagError::IngestionError`] if the file cannot be read or is not
/// valid UTF-8.
pub async fn read_document(root: &Path, path: &Path) -> Result<Document> {
    let id = document_id(root, path)?;

    let text = tokio::fs::read_to_string(path).await.map_err(|e| RagError::IngestionError {
        document: id.clone(),
        message: e.to_string(),
    })?;

    Ok(Document::new(id, text))
}

fn document_id(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return Err(RagError::IngestionError {
            document: path.display().to_string(),
            message: "path has no file name".to_string(),
        });
    }
    Ok(parts.join("/"))
}
