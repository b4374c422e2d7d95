//! Shared fixtures for the engine integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use regent_engine::conductor::ManualClock;
use regent_engine::fetcher::DocumentSource;
use regent_engine::llm::{LLMError, LLMProvider, Message};
use sdk::errors::FetchError;
use sdk::types::DocumentRef;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Backend that answers each kind of request from a fixed script
///
/// Requests are told apart by their system prompt. Reviews are looked up by
/// the document named in the user message; unknown documents get an
/// "unaffected" answer.
#[derive(Default)]
pub struct ScriptedProvider {
    pub plan: Option<String>,
    pub reviews: HashMap<String, String>,
    pub reflection: Option<String>,
    pub reviewed: Mutex<Vec<String>>,
    pub translations: Mutex<usize>,
}

impl ScriptedProvider {
    pub fn new(plan: &str) -> Self {
        Self {
            plan: Some(plan.to_string()),
            ..Default::default()
        }
    }

    pub fn review(mut self, document: &str, answer: &str) -> Self {
        self.reviews.insert(document.to_string(), answer.to_string());
        self
    }

    pub fn reflect_with(mut self, answer: &str) -> Self {
        self.reflection = Some(answer.to_string());
        self
    }

    pub fn reviewed(&self) -> Vec<String> {
        self.reviewed.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(&self, messages: &[Message]) -> regent_engine::llm::Result<String> {
        let system = &messages[0].content;
        let user = messages.last().map(|m| m.content.as_str()).unwrap_or("");

        if system.contains("Select every document in the index") {
            return self
                .plan
                .clone()
                .ok_or_else(|| LLMError::ProviderUnavailable("no plan scripted".into()));
        }

        if system.contains("You review one internal document") {
            let document = user
                .lines()
                .next()
                .and_then(|line| line.strip_prefix("Document: "))
                .unwrap_or_default()
                .to_string();
            self.reviewed.lock().unwrap().push(document.clone());
            return Ok(self.reviews.get(&document).cloned().unwrap_or_else(|| {
                unaffected("Nothing in this document depends on the request")
            }));
        }

        if system.starts_with("Translate the user's text") {
            *self.translations.lock().unwrap() += 1;
            return Ok(format!("(en) {}", user));
        }

        if system.contains("Improve its clarity and layout only") {
            return self
                .reflection
                .clone()
                .ok_or_else(|| LLMError::ProviderUnavailable("no reflection scripted".into()));
        }

        Err(LLMError::InvalidRequest("unexpected prompt".into()))
    }
}

/// Planner answer listing `documents` as seeds
pub fn plan(documents: &[&str]) -> String {
    let tasks: Vec<_> = documents
        .iter()
        .map(|d| serde_json::json!({"file_name": d, "check_reason": format!("{} may mention core time", d)}))
        .collect();
    format!("JSON:\n```json\n{}\n```", serde_json::Value::Array(tasks))
}

/// Review answer proposing a revision and related documents
pub fn revised(original: &str, updated: &str, related: &[&str]) -> String {
    review_answer(true, original, updated, "The request changes this passage", related)
}

/// Review answer for an unaffected document
pub fn unaffected(reason: &str) -> String {
    review_answer(false, "", "", reason, &[])
}

pub fn review_answer(
    is_updated: bool,
    original: &str,
    updated: &str,
    reason: &str,
    related: &[&str],
) -> String {
    let related: Vec<_> = related
        .iter()
        .map(|d| serde_json::json!({"file_name": d, "check_reason": "referenced by this document"}))
        .collect();
    let answer = serde_json::json!({
        "is_updated": is_updated,
        "original_text": original,
        "updated_text": updated,
        "reason": reason,
        "related_files": related,
    });
    format!("JSON:\n```json\n{}\n```", answer)
}

/// In-memory document source
///
/// Documents listed in `failing` raise a fetch error. Fetching a document
/// listed in `advance_on` moves the manual clock forward.
#[derive(Default)]
pub struct MemorySource {
    pub documents: HashMap<String, String>,
    pub failing: Vec<String>,
    pub advance_on: Option<(String, Arc<ManualClock>, Duration)>,
}

impl MemorySource {
    pub fn with_documents(documents: &[(&str, &str)]) -> Self {
        Self {
            documents: documents
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn fetch(&self, document: &DocumentRef) -> Result<String, FetchError> {
        if let Some((trigger, clock, by)) = &self.advance_on {
            if trigger == document.as_str() {
                clock.advance(*by);
            }
        }
        if self.failing.iter().any(|d| d == document.as_str()) {
            return Err(FetchError::Extraction {
                path: document.to_string(),
                reason: "corrupt archive".to_string(),
            });
        }
        self.documents
            .get(document.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(document.to_string()))
    }
}

/// Create `<root>/<experiment>/data/<file>` for each text file
pub fn write_corpus(root: &Path, experiment: &str, files: &[(&str, &str)]) {
    let data = root.join(experiment).join("data");
    for (name, contents) in files {
        let path = data.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
}
