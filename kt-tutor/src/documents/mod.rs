//! KT document discovery and text extraction.
//!
//! Documents live flat in one directory. A project name resolves to the
//! first `.pdf` / `.docx` file (sorted by name) whose lowercase filename
//! contains the lowercase project name.

pub mod docx;
pub mod pdf;

use kt_common::error::ResultExt;
use kt_common::Result;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure while pulling text out of a document.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Unsupported file type: {0}")]
    Unsupported(String),
}

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Classify a file by extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

/// Extract plain text from a supported document.
pub fn extract_text(path: &Path) -> std::result::Result<String, ExtractError> {
    match DocumentKind::from_path(path) {
        Some(DocumentKind::Pdf) => pdf::extract_text(path),
        Some(DocumentKind::Docx) => docx::extract_text(path),
        None => Err(ExtractError::Unsupported(path.display().to_string())),
    }
}

/// Locates and reads KT documents from a directory.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    dir: PathBuf,
}

impl DocumentLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the documents directory if it does not exist.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context(format!("creating {}", self.dir.display()))
    }

    /// Supported documents in the directory, sorted by filename.
    fn documents(&self) -> std::io::Result<Vec<(String, PathBuf)>> {
        let mut documents: Vec<(String, PathBuf)> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && DocumentKind::from_path(path).is_some())
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?.to_string();
                Some((name, path))
            })
            .collect();

        documents.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(documents)
    }

    /// Filenames of every PDF / DOCX document, unfiltered by project.
    pub fn list_projects(&self) -> Result<Vec<String>> {
        let documents = self
            .documents()
            .context(format!("listing {}", self.dir.display()))?;
        Ok(documents.into_iter().map(|(name, _)| name).collect())
    }

    /// Resolve a project name to its document path.
    pub fn find_document(&self, project: &str) -> Option<PathBuf> {
        let needle = project.to_lowercase();

        let documents = match self.documents() {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "Cannot scan documents directory");
                return None;
            }
        };

        let mut matches: Vec<(String, PathBuf)> = documents
            .into_iter()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .collect();

        if matches.len() > 1 {
            let names: Vec<&str> = matches.iter().map(|(name, _)| name.as_str()).collect();
            tracing::warn!(
                project = %project,
                candidates = ?names,
                "Several documents match project, using the first"
            );
        }

        if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0).1)
        }
    }

    /// Find and extract the project's document text.
    ///
    /// No match, an extraction failure and a document with no text all
    /// come back as `None`.
    pub fn load(&self, project: &str) -> Option<String> {
        let path = self.find_document(project)?;

        match extract_text(&path) {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!(path = %path.display(), "Document has no extractable text");
                None
            }
            Ok(text) => {
                tracing::info!(
                    project = %project,
                    path = %path.display(),
                    chars = text.chars().count(),
                    "Document loaded"
                );
                Some(text)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Error extracting document text");
                None
            }
        }
    }
}
