//! Reflector
//!
//! One refinement pass per rendered variant for clarity and layout. The
//! refined text must still carry every affected document and every
//! proposed revision verbatim, and must not name a document the rendered
//! draft did not name; otherwise the rendered draft is kept. Any backend
//! failure also keeps the draft. Runs after exploration and is not bounded
//! by the Time Guard.

use super::render::labels_for;
use super::{Report, ReportDraft, ReportVariant};
use crate::corpus::CorpusIndex;
use crate::llm::json::strip_code_fence;
use crate::llm::{LLMProvider, Message};
use regex::Regex;
use std::sync::{Arc, OnceLock};

const REFLECTION_PROMPT: &str = "\
You are given a Markdown report on proposed revisions of internal documents.
Improve its clarity and layout only:
- keep the title, the request and every section
- keep every document name and every quoted text block exactly as written
- do not add, remove or change any proposed revision or document
- make it easy to compare the current and the revised text of each document
- state clearly which documents change and why, and why the others do not
Keep the language of the report. Output only the revised Markdown.";

/// File names with an extension the fetchers read
static DOCUMENT_NAME: OnceLock<Option<Regex>> = OnceLock::new();

fn document_names(text: &str) -> Vec<&str> {
    let pattern = DOCUMENT_NAME
        .get_or_init(|| Regex::new(r"[\p{L}\p{N}_./\-]+\.(?:docx|txt|md)\b").ok())
        .as_ref();
    match pattern {
        Some(re) => re.find_iter(text).map(|m| m.as_str()).collect(),
        None => Vec::new(),
    }
}

pub struct Reflector {
    llm: Arc<dyn LLMProvider>,
    corpus: Option<Arc<CorpusIndex>>,
}

impl Reflector {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm, corpus: None }
    }

    /// Also reject refinements naming corpus documents absent from the draft
    pub fn with_corpus(mut self, corpus: Arc<CorpusIndex>) -> Self {
        self.corpus = Some(corpus);
        self
    }

    /// Refine every variant, falling back to the unrefined body per variant
    pub async fn reflect(&self, mut report: Report) -> Report {
        for variant in &mut report.variants {
            self.reflect_variant(&report.draft, variant).await;
        }
        report
    }

    async fn reflect_variant(&self, draft: &ReportDraft, variant: &mut ReportVariant) {
        let messages = [
            Message::system(REFLECTION_PROMPT),
            Message::user(variant.body.clone()),
        ];
        let refined = match self.llm.generate(&messages).await {
            Ok(answer) => strip_code_fence(&answer).to_string(),
            Err(e) => {
                tracing::warn!(
                    "Reflection of the {} report failed, keeping draft: {}",
                    variant.language,
                    e
                );
                return;
            }
        };

        let check = preserves_content(draft, &refined)
            .and_then(|_| self.adds_no_documents(&variant.body, &refined));
        if let Err(reason) = check {
            tracing::warn!(
                "Rejected refinement of the {} report ({}), keeping draft",
                variant.language,
                reason
            );
            return;
        }

        // Partial coverage must stay visible in every variant
        let notice = labels_for(&variant.language).partial_notice;
        variant.body = if draft.coverage.is_partial() && !refined.contains(notice) {
            format!("> {}\n\n{}\n", notice, refined)
        } else {
            refined + "\n"
        };
        variant.refined = true;
    }

    /// Every document named in `refined` must already be named in `rendered`
    fn adds_no_documents(&self, rendered: &str, refined: &str) -> Result<(), String> {
        if let Some(name) = document_names(refined)
            .into_iter()
            .find(|name| !rendered.contains(name))
        {
            return Err(format!("added {}", name));
        }
        if let Some(corpus) = &self.corpus {
            if let Some(document) = corpus
                .iter()
                .find(|d| refined.contains(d.as_str()) && !rendered.contains(d.as_str()))
            {
                return Err(format!("added {}", document));
            }
        }
        Ok(())
    }
}

/// Check that a refinement kept the factual content of the draft
fn preserves_content(draft: &ReportDraft, refined: &str) -> Result<(), String> {
    if refined.trim().is_empty() {
        return Err("empty output".to_string());
    }
    for entry in &draft.entries {
        if !refined.contains(entry.document.as_str()) {
            return Err(format!("dropped {}", entry.document));
        }
        for change in &entry.changes {
            if !refined.contains(change.revision.trim()) {
                return Err(format!("altered revision of {}", entry.document));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conductor::Coverage;
    use crate::llm::LLMError;
    use crate::report::{ProposedChange, ReportEntry};
    use async_trait::async_trait;
    use sdk::types::DocumentRef;

    const DRAFT_JA: &str = "# 規程改定レポート\nA.docx: 9:00 -> 8:30\n- `B.docx`: 変更なし\n";
    const DRAFT_EN: &str = "# Document Revision Report\nA.docx: 9:00 -> 8:30\n- `B.docx`: unchanged\n";

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl LLMProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn is_local(&self) -> bool {
            true
        }
        async fn generate(&self, _messages: &[Message]) -> crate::llm::Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| LLMError::ProviderUnavailable("down".into()))
        }
    }

    fn report() -> Report {
        Report {
            draft: ReportDraft {
                run_id: "r".into(),
                query: "q".into(),
                entries: vec![ReportEntry {
                    document: DocumentRef::new("A.docx"),
                    changes: vec![ProposedChange {
                        excerpt: "9:00".into(),
                        revision: "8:30".into(),
                        rationale: "why".into(),
                        review_reason: "check".into(),
                    }],
                }],
                reviewed_without_change: vec![],
                coverage: Coverage::default(),
            },
            variants: vec![
                ReportVariant {
                    language: "ja".into(),
                    body: DRAFT_JA.into(),
                    refined: false,
                },
                ReportVariant {
                    language: "en".into(),
                    body: DRAFT_EN.into(),
                    refined: false,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_accepts_faithful_refinement() {
        let reflector = Reflector::new(Arc::new(Fixed(Some(
            "```markdown\n# Report\n| A.docx | 9:00 | 8:30 |\n```",
        ))));
        let refined = reflector.reflect(report()).await;
        assert!(refined.variants.iter().all(|v| v.refined));
        assert_eq!(refined.variants[0].body, "# Report\n| A.docx | 9:00 | 8:30 |\n");
    }

    #[tokio::test]
    async fn test_rejects_refinement_dropping_document() {
        let reflector = Reflector::new(Arc::new(Fixed(Some("# Report\nNothing to see"))));
        let refined = reflector.reflect(report()).await;
        assert_eq!(refined.variants[0].body, DRAFT_JA);
        assert!(!refined.variants[0].refined);
    }

    #[tokio::test]
    async fn test_rejects_altered_revision() {
        let reflector = Reflector::new(Arc::new(Fixed(Some("A.docx now reads 8:45"))));
        let refined = reflector.reflect(report()).await;
        assert_eq!(refined.variants[1].body, DRAFT_EN);
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_draft() {
        let reflector = Reflector::new(Arc::new(Fixed(None)));
        let refined = reflector.reflect(report()).await;
        assert_eq!(refined.variants[0].body, DRAFT_JA);
        assert_eq!(refined.variants[1].body, DRAFT_EN);
    }

    #[tokio::test]
    async fn test_partial_notice_is_restored() {
        let mut partial = report();
        partial.draft.coverage.timed_out = true;
        let reflector = Reflector::new(Arc::new(Fixed(Some("# Report\nA.docx: 8:30"))));
        let refined = reflector.reflect(partial).await;
        assert!(refined.variants[1]
            .body
            .starts_with("> Exploration stopped before every scheduled document was reviewed."));
        assert!(refined.variants[0].body.contains("部分的な結果"));
    }

    #[tokio::test]
    async fn test_empty_refinement_is_rejected() {
        let reflector = Reflector::new(Arc::new(Fixed(Some("   "))));
        let refined = reflector.reflect(report()).await;
        assert!(!refined.variants[0].refined);
    }

    #[tokio::test]
    async fn test_rejects_refinement_adding_document() {
        let reflector = Reflector::new(Arc::new(Fixed(Some(
            "# Report\nA.docx: 8:30\nZ.docx: also change core time to 7:00",
        ))));
        let refined = reflector.reflect(report()).await;
        assert!(refined.variants.iter().all(|v| !v.refined));
        assert!(!refined.variants[1].body.contains("Z.docx"));
    }

    #[tokio::test]
    async fn test_documents_named_in_draft_may_stay() {
        let reflector = Reflector::new(Arc::new(Fixed(Some(
            "# Report\n| A.docx | 8:30 |\nB.docx needs no change",
        ))));
        let refined = reflector.reflect(report()).await;
        assert!(refined.variants.iter().all(|v| v.refined));
    }

    #[tokio::test]
    async fn test_rejects_corpus_document_absent_from_draft() {
        let corpus = Arc::new(CorpusIndex::from_entries(["A.docx", "B.docx", "rules/overtime"]));
        let reflector = Reflector::new(Arc::new(Fixed(Some(
            "# Report\nA.docx: 8:30\nSee also rules/overtime",
        ))))
        .with_corpus(corpus);
        let refined = reflector.reflect(report()).await;
        assert_eq!(refined.variants[0].body, DRAFT_JA);
    }

    #[test]
    fn test_document_names() {
        assert_eq!(
            document_names("see `rules/就業規則.docx` and notes.md, not v1.2"),
            vec!["rules/就業規則.docx", "notes.md"]
        );
    }
}
