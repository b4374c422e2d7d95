use super::{io_error, FormatExtractor};
use sdk::errors::FetchError;
use std::fs;
use std::path::Path;

/// UTF-8 text and Markdown files
pub struct PlainTextExtractor;

impl FormatExtractor for PlainTextExtractor {
    fn format(&self) -> &'static str {
        "text"
    }

    fn extract(&self, path: &Path) -> Result<String, FetchError> {
        let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
        let text = String::from_utf8(bytes).map_err(|e| FetchError::Extraction {
            path: path.display().to_string(),
            reason: format!("not valid UTF-8: {}", e),
        })?;
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}
