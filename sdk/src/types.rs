//! Document model types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one document in the corpus.
///
/// A hierarchical, `/`-separated path relative to the corpus data
/// directory (e.g. `labor/flextime_agreement.docx`). Immutable and unique
/// within a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentRef(String);

impl DocumentRef {
    /// Create a new document reference
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment (the bare file name)
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Lower-cased extension, if the file name has one
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A document the reasoning backend proposed for review, with its reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedDocument {
    pub document: DocumentRef,
    pub reason: String,
}

impl RelatedDocument {
    pub fn new(document: impl Into<DocumentRef>, reason: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            reason: reason.into(),
        }
    }
}

/// The processor's output for one reviewed document.
///
/// A finding with `needs_revision == false` is a valid outcome: the
/// document was reviewed and judged unaffected. Such findings are kept in
/// the run accumulator but dropped from the change list of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Document the finding was produced for
    pub source: DocumentRef,

    /// Why the document was scheduled for review
    pub review_reason: String,

    /// Whether the backend judged a revision necessary
    pub needs_revision: bool,

    /// Excerpt of the current text that is affected
    pub excerpt: String,

    /// Proposed replacement text for the excerpt
    pub proposed_revision: String,

    /// Backend's explanation for revising (or not revising)
    pub rationale: String,

    /// Further documents the backend proposed to examine
    #[serde(default)]
    pub related: Vec<RelatedDocument>,
}

impl Finding {
    /// True when the finding carries no revision to report
    pub fn is_empty(&self) -> bool {
        !self.needs_revision || self.proposed_revision.trim().is_empty()
    }
}
