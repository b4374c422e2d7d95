use super::Report;
use chrono::Local;
use sdk::errors::EngineError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Timestamp format shared by all artifacts of one report
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Paths of the artifacts written for one report
#[derive(Debug, Clone, Serialize)]
pub struct WrittenReport {
    pub variants: Vec<PathBuf>,
    pub structured: PathBuf,
}

/// Writes a report into a results directory
pub struct ReportWriter {
    dir: PathBuf,
}

#[derive(Serialize)]
struct StructuredReport<'a> {
    generated_at: &'a str,
    #[serde(flatten)]
    report: &'a Report,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write with the current local time as timestamp
    pub fn write(&self, report: &Report) -> Result<WrittenReport, EngineError> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.write_with_timestamp(report, &timestamp)
    }

    /// Write `report_<lang>_<timestamp>.md` per variant and
    /// `report_<timestamp>.json` with the full structured report.
    pub fn write_with_timestamp(
        &self,
        report: &Report,
        timestamp: &str,
    ) -> Result<WrittenReport, EngineError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            EngineError::ReportWrite(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let mut variants = Vec::with_capacity(report.variants.len());
        for variant in &report.variants {
            let path = self
                .dir
                .join(format!("report_{}_{}.md", variant.language, timestamp));
            write_file(&path, variant.body.as_bytes())?;
            variants.push(path);
        }

        let structured = self.dir.join(format!("report_{}.json", timestamp));
        let json = serde_json::to_vec_pretty(&StructuredReport {
            generated_at: timestamp,
            report,
        })
        .map_err(|e| EngineError::ReportWrite(e.to_string()))?;
        write_file(&structured, &json)?;

        tracing::info!(
            "Report written to {} ({} variants)",
            self.dir.display(),
            variants.len()
        );
        Ok(WrittenReport {
            variants,
            structured,
        })
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), EngineError> {
    fs::write(path, contents)
        .map_err(|e| EngineError::ReportWrite(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conductor::Coverage;
    use crate::report::{ReportDraft, ReportVariant};
    use tempfile::TempDir;

    fn report() -> Report {
        Report {
            draft: ReportDraft {
                run_id: "run-7".into(),
                query: "core time".into(),
                entries: vec![],
                reviewed_without_change: vec![],
                coverage: Coverage::default(),
            },
            variants: vec![
                ReportVariant {
                    language: "ja".into(),
                    body: "# 規程改定レポート\n".into(),
                    refined: false,
                },
                ReportVariant {
                    language: "en".into(),
                    body: "# Document Revision Report\n".into(),
                    refined: true,
                },
            ],
        }
    }

    #[test]
    fn test_writes_variants_and_json() {
        let tmp = TempDir::new().unwrap();
        let writer = ReportWriter::new(tmp.path().join("results/internal_regulations"));

        let written = writer
            .write_with_timestamp(&report(), "20250101_093000")
            .unwrap();

        assert_eq!(written.variants.len(), 2);
        assert!(written.variants[0].ends_with("report_ja_20250101_093000.md"));
        assert_eq!(
            fs::read_to_string(&written.variants[1]).unwrap(),
            "# Document Revision Report\n"
        );

        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(&written.structured).unwrap()).unwrap();
        assert_eq!(json["generated_at"], "20250101_093000");
        assert_eq!(json["draft"]["run_id"], "run-7");
        assert_eq!(json["variants"][1]["refined"], true);
    }

    #[test]
    fn test_timestamp_format() {
        let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "_");
    }

    #[test]
    fn test_unwritable_directory() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let writer = ReportWriter::new(blocker.join("sub"));
        assert!(matches!(
            writer.write_with_timestamp(&report(), "t"),
            Err(EngineError::ReportWrite(_))
        ));
    }
}
