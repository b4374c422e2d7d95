//! Document Fetcher
//!
//! Turns a [`DocumentRef`] into plain text for the processor. The loop only
//! sees the [`DocumentSource`] trait; [`FetcherRegistry`] implements it as a
//! dispatch table from file extension to a [`FormatExtractor`].
//!
//! Extraction is blocking file I/O and runs on the blocking pool.

use async_trait::async_trait;
use sdk::errors::FetchError;
use sdk::types::DocumentRef;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

pub mod docx;
pub mod text;

pub use docx::DocxExtractor;
pub use text::PlainTextExtractor;

const TRUNCATION_MARKER: &str = "\n\n[... document truncated ...]";

/// Loop-facing fetch interface
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, document: &DocumentRef) -> Result<String, FetchError>;
}

/// One document container format
pub trait FormatExtractor: Send + Sync {
    /// Short format name used in logs
    fn format(&self) -> &'static str;

    /// Extract the text of the file at `path`
    fn extract(&self, path: &Path) -> Result<String, FetchError>;
}

/// Extension-keyed dispatch over the registered extractors
pub struct FetcherRegistry {
    data_dir: PathBuf,
    max_chars: usize,
    extractors: HashMap<String, Arc<dyn FormatExtractor>>,
}

impl FetcherRegistry {
    /// Registry with no formats registered
    pub fn new(data_dir: impl Into<PathBuf>, max_chars: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_chars,
            extractors: HashMap::new(),
        }
    }

    /// Registry with the built-in formats: docx, txt, md
    pub fn with_defaults(data_dir: impl Into<PathBuf>, max_chars: usize) -> Self {
        let mut registry = Self::new(data_dir, max_chars);
        registry.register("docx", Arc::new(DocxExtractor));
        let text: Arc<dyn FormatExtractor> = Arc::new(PlainTextExtractor);
        registry.register("txt", text.clone());
        registry.register("md", text);
        registry
    }

    /// Register (or replace) the extractor for an extension
    pub fn register(&mut self, extension: &str, extractor: Arc<dyn FormatExtractor>) {
        self.extractors
            .insert(extension.trim_start_matches('.').to_ascii_lowercase(), extractor);
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.extractors.contains_key(&extension.to_ascii_lowercase())
    }

    /// Map an identifier onto a path under the data directory.
    ///
    /// Absolute identifiers and `..` components never leave the corpus.
    fn locate(&self, document: &DocumentRef) -> Result<PathBuf, FetchError> {
        let relative = Path::new(document.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(FetchError::NotFound(document.to_string()));
        }
        let path = self.data_dir.join(relative);
        if !path.is_file() {
            return Err(FetchError::NotFound(document.to_string()));
        }
        Ok(path)
    }
}

#[async_trait]
impl DocumentSource for FetcherRegistry {
    async fn fetch(&self, document: &DocumentRef) -> Result<String, FetchError> {
        let extractor = document
            .extension()
            .and_then(|ext| self.extractors.get(&ext))
            .cloned()
            .ok_or_else(|| FetchError::UnsupportedFormat(document.to_string()))?;

        let path = self.locate(document)?;
        tracing::debug!("Extracting {} as {}", document, extractor.format());

        let text = tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .map_err(|e| FetchError::Extraction {
                path: document.to_string(),
                reason: e.to_string(),
            })??;

        Ok(truncate_chars(text, self.max_chars))
    }
}

/// Truncate to at most `max_chars` characters, appending a marker when cut
pub fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].to_string();
            cut.push_str(TRUNCATION_MARKER);
            cut
        }
        None => text,
    }
}

/// Map an I/O error on `path` to the fetch taxonomy
pub(crate) fn io_error(path: &Path, e: std::io::Error) -> FetchError {
    if e.kind() == std::io::ErrorKind::NotFound {
        FetchError::NotFound(path.display().to_string())
    } else {
        FetchError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_truncate_chars_is_boundary_safe() {
        let text = "就業規則第三条".to_string();
        let cut = truncate_chars(text.clone(), 3);
        assert!(cut.starts_with("就業規"));
        assert!(cut.ends_with(TRUNCATION_MARKER));
        assert_eq!(truncate_chars(text.clone(), 100), text);
    }

    #[tokio::test]
    async fn test_fetch_plain_text() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("notes")).unwrap();
        fs::write(tmp.path().join("notes/a.md"), "# Flextime\ncore hours").unwrap();

        let registry = FetcherRegistry::with_defaults(tmp.path(), 1000);
        let text = registry.fetch(&DocumentRef::new("notes/a.md")).await.unwrap();
        assert_eq!(text, "# Flextime\ncore hours");
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("scan.pdf"), b"%PDF").unwrap();

        let registry = FetcherRegistry::with_defaults(tmp.path(), 1000);
        let err = registry.fetch(&DocumentRef::new("scan.pdf")).await.unwrap_err();
        assert_eq!(err, FetchError::UnsupportedFormat("scan.pdf".into()));

        let err = registry.fetch(&DocumentRef::new("README")).await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_missing_and_escaping_documents() {
        let tmp = TempDir::new().unwrap();
        let registry = FetcherRegistry::with_defaults(tmp.path().join("data"), 1000);

        let err = registry.fetch(&DocumentRef::new("gone.txt")).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));

        fs::write(tmp.path().join("secret.txt"), "outside").unwrap();
        let err = registry
            .fetch(&DocumentRef::new("../secret.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn test_register_normalizes_extension() {
        let mut registry = FetcherRegistry::new("/tmp", 10);
        registry.register(".TXT", Arc::new(PlainTextExtractor));
        assert!(registry.supports("txt"));
        assert!(!registry.supports("docx"));
    }
}
