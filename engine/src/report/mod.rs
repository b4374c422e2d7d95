//! Report pipeline
//!
//! compile (deterministic grouping of findings) → render (one Markdown
//! variant per language) → reflect (optional refinement pass) → write.
//!
//! Only the rendering of non-primary languages and the reflection pass
//! call the reasoning backend. Both fail open.

use crate::conductor::{Coverage, ExplorationOutcome};
use sdk::types::DocumentRef;
use serde::{Deserialize, Serialize};

pub mod reflector;
pub mod render;
pub mod writer;

pub use reflector::Reflector;
pub use render::{LLMTranslator, ReportRenderer, Translator};
pub use writer::{ReportWriter, WrittenReport};

/// One proposed revision of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedChange {
    pub excerpt: String,
    pub revision: String,
    pub rationale: String,
    pub review_reason: String,
}

/// All proposed revisions for one affected document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub document: DocumentRef,
    pub changes: Vec<ProposedChange>,
}

/// A document that was reviewed and judged unaffected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnchangedDocument {
    pub document: DocumentRef,
    pub reason: String,
}

/// Language-neutral report content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDraft {
    pub run_id: String,
    pub query: String,

    /// Affected documents in order of first appearance
    pub entries: Vec<ReportEntry>,

    pub reviewed_without_change: Vec<UnchangedDocument>,
    pub coverage: Coverage,
}

impl ReportDraft {
    pub fn affected_documents(&self) -> impl Iterator<Item = &DocumentRef> {
        self.entries.iter().map(|e| &e.document)
    }
}

/// One rendered language variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVariant {
    pub language: String,
    pub body: String,

    /// Whether the reflection pass replaced the rendered body
    #[serde(default)]
    pub refined: bool,
}

/// Terminal artifact of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub draft: ReportDraft,
    pub variants: Vec<ReportVariant>,
}

pub struct ReportCompiler;

impl ReportCompiler {
    /// Group findings by affected document.
    ///
    /// Findings without a revision are dropped from the change list and
    /// listed as reviewed without change. Output depends only on the input.
    pub fn compile(outcome: &ExplorationOutcome) -> ReportDraft {
        let mut entries: Vec<ReportEntry> = Vec::new();
        let mut unchanged: Vec<UnchangedDocument> = Vec::new();

        for finding in &outcome.findings {
            if finding.is_empty() {
                unchanged.push(UnchangedDocument {
                    document: finding.source.clone(),
                    reason: finding.rationale.clone(),
                });
                continue;
            }

            let change = ProposedChange {
                excerpt: finding.excerpt.clone(),
                revision: finding.proposed_revision.clone(),
                rationale: finding.rationale.clone(),
                review_reason: finding.review_reason.clone(),
            };
            match entries.iter_mut().find(|e| e.document == finding.source) {
                Some(entry) => entry.changes.push(change),
                None => entries.push(ReportEntry {
                    document: finding.source.clone(),
                    changes: vec![change],
                }),
            }
        }

        // A document with any revision is not also listed as unchanged
        unchanged.retain(|u| !entries.iter().any(|e| e.document == u.document));

        ReportDraft {
            run_id: outcome.run_id.clone(),
            query: outcome.query.clone(),
            entries,
            reviewed_without_change: unchanged,
            coverage: outcome.coverage.clone(),
        }
    }
}
