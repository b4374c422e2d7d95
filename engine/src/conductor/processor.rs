//! Conductor Processor
//!
//! Reviews one fetched document against the change request. The backend is
//! asked whether the document needs revision, for the revised wording, and
//! for further documents worth reviewing. The request carries a fresh
//! snapshot of the exploration state so the backend can avoid proposing
//! documents the run already knows.

use crate::conductor::planner::{raw_tasks, RawTask};
use crate::conductor::types::{ExplorationTask, QueueSnapshot};
use crate::corpus::CorpusIndex;
use crate::llm::json::extract_json;
use crate::llm::{fill_template, LLMProvider, Message};
use sdk::errors::EngineError;
use sdk::types::{DocumentRef, Finding, RelatedDocument};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;

const REVIEW_PROMPT: &str = "\
You review one internal document against a change request.
Decide whether the document must be revised to fulfil the request. If it must,
quote the affected passage verbatim as original_text and give the complete
revised passage as updated_text. If it must not, leave both texts empty and
explain why in reason.

Then check the document for references to other documents (linked rules,
agreements, appendices) whose wording may be affected by the same change and
list them in related_files. Only list documents from the index below. Do not
list documents that are already reviewed, scheduled, or failed.

Change request: {query}

Why this document is reviewed: {reason}

{state}
Document index:
{index}

Respond in the following format:

JSON:
```json
{\"is_updated\": <true|false>, \"original_text\": \"...\", \"updated_text\": \"...\", \"reason\": \"...\", \"related_files\": [{\"file_name\": \"...\", \"check_reason\": \"...\"}]}
```
This JSON is parsed automatically, so keep the format exact.";

pub struct Processor {
    llm: Arc<dyn LLMProvider>,
}

/// Intermediate deserialization type for the review answer
#[derive(Debug, Deserialize)]
struct RawReview {
    #[serde(default)]
    is_updated: bool,
    #[serde(default)]
    original_text: String,
    #[serde(default)]
    updated_text: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    related_files: Value,
}

impl Processor {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    /// Review one document and produce its finding.
    ///
    /// # Errors
    /// `ProcessingFailure` on backend error or an unparseable answer. The
    /// loop treats it as recoverable.
    pub async fn process(
        &self,
        task: &ExplorationTask,
        text: &str,
        query: &str,
        snapshot: &QueueSnapshot,
        corpus: &CorpusIndex,
    ) -> Result<Finding, EngineError> {
        let state = render_state(snapshot);
        let index = corpus.render_tree();
        let system = Message::system(fill_template(
            REVIEW_PROMPT,
            &[
                ("query", query),
                ("reason", &task.reason),
                ("state", &state),
                ("index", &index),
            ],
        ));
        let user = Message::user(format!(
            "Document: {}\n\n{}",
            task.document, text
        ));

        let content = self
            .llm
            .generate(&[system, user])
            .await
            .map_err(|e| failure(&task.document, format!("backend error: {}", e)))?;

        Self::parse_review(task, &content)
    }

    fn parse_review(task: &ExplorationTask, content: &str) -> Result<Finding, EngineError> {
        let value = extract_json(content)
            .ok_or_else(|| failure(&task.document, "no JSON found in review response"))?;

        // Some models wrap the object in a one-element list
        let value = match value {
            Value::Array(mut items) if items.len() == 1 => items.remove(0),
            other => other,
        };

        let raw: RawReview = serde_json::from_value(value)
            .map_err(|e| failure(&task.document, format!("unexpected review format: {}", e)))?;

        let related = match raw.related_files {
            Value::Null => Vec::new(),
            value => raw_tasks(value).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed related_files for {}: {}", task.document, e);
                Vec::new()
            }),
        };

        Ok(Finding {
            source: task.document.clone(),
            review_reason: task.reason.clone(),
            needs_revision: raw.is_updated,
            excerpt: raw.original_text,
            proposed_revision: raw.updated_text,
            rationale: raw.reason,
            related: related
                .into_iter()
                .filter(|r| !r.file_name.trim().is_empty())
                .map(|RawTask { file_name, check_reason }| RelatedDocument::new(file_name, check_reason))
                .collect(),
        })
    }
}

fn failure(document: &DocumentRef, reason: impl Into<String>) -> EngineError {
    EngineError::ProcessingFailure {
        document: document.to_string(),
        reason: reason.into(),
    }
}

fn render_state(snapshot: &QueueSnapshot) -> String {
    let mut out = String::new();
    let mut section = |title: &str, items: Vec<&str>| {
        let _ = writeln!(out, "{}:", title);
        if items.is_empty() {
            let _ = writeln!(out, "- (none)");
        }
        for item in items {
            let _ = writeln!(out, "- {}", item);
        }
        out.push('\n');
    };

    section(
        "Already reviewed",
        snapshot.completed.iter().map(|d| d.as_str()).collect(),
    );
    section(
        "Currently under review",
        snapshot.in_flight.iter().map(|d| d.as_str()).collect(),
    );
    section(
        "Scheduled for review",
        snapshot.pending.iter().map(|t| t.document.as_str()).collect(),
    );
    section(
        "Could not be reviewed",
        snapshot.failed.iter().map(|d| d.as_str()).collect(),
    );
    out
}
