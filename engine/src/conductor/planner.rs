//! Conductor Planner
//!
//! Turns the user's change request into the initial set of documents to
//! review. One backend request is issued with the rendered corpus index;
//! every identifier in the answer must resolve against that index.

use crate::conductor::types::ExplorationTask;
use crate::corpus::CorpusIndex;
use crate::llm::json::extract_json;
use crate::llm::{fill_template, LLMProvider, Message};
use sdk::errors::EngineError;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const PLANNING_PROMPT: &str = "\
You are updating the internal documents of a company in response to a change request.
Select every document in the index below that may need revision for the request,
and state for each one why it has to be reviewed. Select broadly: a document that
turns out to be unaffected costs one review, a missed document is a defect.

Document index:
{index}

Respond in the following format:

JSON:
```json
[{\"file_name\": \"<path exactly as listed in the index>\", \"check_reason\": \"<why this document must be reviewed>\"}]
```
This JSON is parsed automatically, so keep the format exact.";

pub struct Planner {
    llm: Arc<dyn LLMProvider>,
}

/// Intermediate deserialization type for a task proposed by the backend
#[derive(Debug, Deserialize)]
pub(crate) struct RawTask {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub check_reason: String,
}

/// Accept either a list of tasks or a single task object
pub(crate) fn raw_tasks(value: Value) -> Result<Vec<RawTask>, serde_json::Error> {
    match value {
        Value::Array(_) => serde_json::from_value(value),
        other => serde_json::from_value(other).map(|task| vec![task]),
    }
}

impl Planner {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    /// Generate the seed tasks for a run.
    ///
    /// # Errors
    /// `PlanningFailure` when the backend fails, the answer cannot be
    /// parsed, or no proposed identifier exists in the index.
    pub async fn plan(
        &self,
        query: &str,
        corpus: &CorpusIndex,
    ) -> Result<Vec<ExplorationTask>, EngineError> {
        if corpus.is_empty() {
            return Err(EngineError::PlanningFailure(
                "the corpus index is empty".to_string(),
            ));
        }

        let index = corpus.render_tree();
        let system = Message::system(fill_template(PLANNING_PROMPT, &[("index", &index)]));
        let content = self
            .llm
            .generate(&[system, Message::user(query)])
            .await
            .map_err(|e| EngineError::PlanningFailure(format!("backend error: {}", e)))?;

        let tasks = Self::parse_plan(&content, corpus)?;
        tracing::info!(
            "Planned {} documents: {}",
            tasks.len(),
            tasks
                .iter()
                .map(|t| t.document.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(tasks)
    }

    /// Parse the backend answer and enforce referential integrity
    fn parse_plan(content: &str, corpus: &CorpusIndex) -> Result<Vec<ExplorationTask>, EngineError> {
        let value = extract_json(content).ok_or_else(|| {
            EngineError::PlanningFailure("no JSON found in planner response".to_string())
        })?;
        let raw = raw_tasks(value).map_err(|e| {
            EngineError::PlanningFailure(format!("unexpected plan format: {}", e))
        })?;

        let mut tasks = Vec::with_capacity(raw.len());
        for item in raw {
            match corpus.resolve(&item.file_name) {
                Some(document) => tasks.push(ExplorationTask::new(document, item.check_reason)),
                None => tracing::warn!(
                    "Planner proposed '{}', which is not in the corpus index",
                    item.file_name
                ),
            }
        }

        if tasks.is_empty() {
            return Err(EngineError::PlanningFailure(
                "no proposed document exists in the corpus index".to_string(),
            ));
        }
        Ok(tasks)
    }
}
