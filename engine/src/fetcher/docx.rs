//! Word (.docx) text extraction.
//!
//! A .docx file is a zip container; the body text lives in
//! `word/document.xml`. Paragraph properties (tab stops, numbering) are
//! dropped, paragraph ends, breaks and tabs become whitespace, every other
//! tag is dropped and XML entities are decoded.

use super::{io_error, FormatExtractor};
use regex::{Captures, Regex};
use sdk::errors::FetchError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

const DOCUMENT_PART: &str = "word/document.xml";

pub struct DocxExtractor;

struct Patterns {
    paragraph_properties: Regex,
    tab: Regex,
    line_break: Regex,
    paragraph_end: Regex,
    tag: Regex,
    entity: Regex,
    blank_lines: Regex,
}

static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();

fn patterns() -> Option<&'static Patterns> {
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                paragraph_properties: Regex::new(r"(?s)<w:pPr(?:\s[^>]*[^/>])?>.*?</w:pPr>").ok()?,
                tab: Regex::new(r"<w:tab\b[^>]*/>").ok()?,
                line_break: Regex::new(r"<w:(?:br|cr)\b[^>]*/>").ok()?,
                paragraph_end: Regex::new(r"</w:p>").ok()?,
                tag: Regex::new(r"<[^>]*>").ok()?,
                entity: Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").ok()?,
                blank_lines: Regex::new(r"\n{3,}").ok()?,
            })
        })
        .as_ref()
}

impl FormatExtractor for DocxExtractor {
    fn format(&self) -> &'static str {
        "docx"
    }

    fn extract(&self, path: &Path) -> Result<String, FetchError> {
        let extraction_error = |reason: String| FetchError::Extraction {
            path: path.display().to_string(),
            reason,
        };

        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| extraction_error(format!("not a docx container: {}", e)))?;
        let mut part = archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| extraction_error(format!("{}: {}", DOCUMENT_PART, e)))?;

        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| extraction_error(e.to_string()))?;

        xml_to_text(&xml).ok_or_else(|| extraction_error("text patterns unavailable".to_string()))
    }
}

/// Flatten WordprocessingML body markup into plain text
pub fn xml_to_text(xml: &str) -> Option<String> {
    let p = patterns()?;
    // Tab stop definitions live in paragraph properties, not in the text
    let text = p.paragraph_properties.replace_all(xml, "");
    let text = p.tab.replace_all(&text, "\t");
    let text = p.line_break.replace_all(&text, "\n");
    let text = p.paragraph_end.replace_all(&text, "\n");
    let text = p.tag.replace_all(&text, "");
    let text = p.entity.replace_all(&text, |caps: &Captures| decode_entity(&caps[1], &caps[0]));
    let text = p.blank_lines.replace_all(&text, "\n\n");
    Some(text.trim().to_string())
}

fn decode_entity(name: &str, raw: &str) -> String {
    let decoded = match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name
            .strip_prefix("#x")
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
            .and_then(char::from_u32),
    };
    decoded.map(String::from).unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_docx(path: &Path, document_xml: &str) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(DOCUMENT_PART, zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_xml_to_text() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>第1条</w:t><w:tab/><w:t>目的</w:t></w:r></w:p><w:p><w:r><w:t>A &amp; B &lt;9:00&gt;</w:t><w:br/><w:t>&#x3042;&#12354;</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(
            xml_to_text(xml).unwrap(),
            "第1条\t目的\nA & B <9:00>\nああ"
        );
    }

    #[test]
    fn test_tab_stops_are_not_text() {
        let xml = r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="2880"/></w:tabs><w:jc w:val="both"/></w:pPr><w:r><w:t>Article 5</w:t><w:tab/><w:t>Leave</w:t></w:r></w:p><w:p><w:pPr/><w:r><w:t>Next</w:t></w:r></w:p>"#;
        assert_eq!(xml_to_text(xml).unwrap(), "Article 5\tLeave\nNext");
    }

    #[test]
    fn test_unknown_entity_is_kept() {
        assert_eq!(xml_to_text("<w:t>&nbsp;x</w:t>").unwrap(), "&nbsp;x");
    }

    #[test]
    fn test_extract_docx_container() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rules.docx");
        write_docx(
            &path,
            "<w:document><w:body><w:p><w:r><w:t>Core time is 10:00-15:00.</w:t></w:r></w:p></w:body></w:document>",
        );
        assert_eq!(
            DocxExtractor.extract(&path).unwrap(),
            "Core time is 10:00-15:00."
        );
    }

    #[test]
    fn test_not_a_container() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.docx");
        std::fs::write(&path, "plain text pretending").unwrap();
        assert!(matches!(
            DocxExtractor.extract(&path),
            Err(FetchError::Extraction { .. })
        ));
    }
}
