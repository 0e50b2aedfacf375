//! PDF text extraction collaborator.
//!
//! A failed extraction degrades to empty text so the pipeline can log and skip
//! that contract instead of aborting the batch.

use crate::error::Result;
use log::warn;
use std::path::{Path, PathBuf};

/// A contract file with its extracted text. Empty text means extraction
/// failed or the document had no text layer.
#[derive(Debug, Clone)]
pub struct ContractDocument {
    pub file_name: String,
    pub file_path: PathBuf,
    pub text: String,
}

/// Collect `(file_name, file_path, text)` for every `.pdf` in a folder,
/// sorted by file name. Per-file extraction failures yield empty text and the
/// walk continues.
pub fn extract_texts_from_folder(folder: &Path) -> Result<Vec<ContractDocument>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let text = match pdf_extract::extract_text(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to extract text from {}: {}", path.display(), e);
                String::new()
            }
        };

        documents.push(ContractDocument {
            file_name,
            file_path: path,
            text,
        });
    }

    Ok(documents)
}
