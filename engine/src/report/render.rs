//! Markdown rendering of a report draft, one variant per language.
//!
//! Headings and labels are localized from built-in tables. Quoted document
//! text (the current excerpt and the proposed revision) is never
//! translated. Free-text explanations are translated into non-primary
//! languages through a [`Translator`]; a failed translation keeps the
//! source text.

use super::{ReportDraft, ReportVariant};
use crate::llm::json::strip_code_fence;
use crate::llm::{LLMProvider, Message};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Localized strings for one report language
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    pub title: &'static str,
    pub request: &'static str,
    pub run: &'static str,
    pub partial_notice: &'static str,
    pub summary: &'static str,
    pub affected_count: &'static str,
    pub reviewed_count: &'static str,
    pub skipped_count: &'static str,
    pub changes: &'static str,
    pub no_changes: &'static str,
    pub review_reason: &'static str,
    pub rationale: &'static str,
    pub before: &'static str,
    pub after: &'static str,
    pub unchanged: &'static str,
    pub skipped: &'static str,
    pub not_reviewed: &'static str,
}

const ENGLISH: Labels = Labels {
    title: "Document Revision Report",
    request: "Request",
    run: "Run",
    partial_notice: "Exploration stopped before every scheduled document was reviewed. The results below are partial.",
    summary: "Summary",
    affected_count: "Documents requiring revision",
    reviewed_count: "Documents reviewed",
    skipped_count: "Documents skipped",
    changes: "Proposed Revisions",
    no_changes: "No document requires revision.",
    review_reason: "Why reviewed",
    rationale: "Reason for revision",
    before: "Current text",
    after: "Revised text",
    unchanged: "Reviewed Without Change",
    skipped: "Skipped Documents",
    not_reviewed: "Not Reviewed (time budget)",
};

const JAPANESE: Labels = Labels {
    title: "規程改定レポート",
    request: "依頼内容",
    run: "実行ID",
    partial_notice: "予定していたすべての文書を確認する前に探索が終了しました。以下は部分的な結果です。",
    summary: "概要",
    affected_count: "改定が必要な文書",
    reviewed_count: "確認した文書",
    skipped_count: "スキップした文書",
    changes: "改定案",
    no_changes: "改定が必要な文書はありません。",
    review_reason: "確認理由",
    rationale: "改定理由",
    before: "現行",
    after: "改定案",
    unchanged: "確認済み・変更なし",
    skipped: "スキップした文書",
    not_reviewed: "未確認（時間切れ）",
};

/// Labels for a language code; unknown codes get English labels
pub fn labels_for(language: &str) -> &'static Labels {
    match language {
        "ja" => &JAPANESE,
        _ => &ENGLISH,
    }
}

fn language_name(code: &str) -> &str {
    match code {
        "ja" => "Japanese",
        "en" => "English",
        "zh" => "Chinese",
        "ko" => "Korean",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        other => other,
    }
}

/// Translation of free text into a target language
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> crate::llm::Result<String>;
}

/// Translator backed by the reasoning backend
pub struct LLMTranslator {
    llm: Arc<dyn LLMProvider>,
}

impl LLMTranslator {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Translator for LLMTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> crate::llm::Result<String> {
        let system = Message::system(format!(
            "Translate the user's text into {}. Keep document names, article numbers and times unchanged. Output only the translation.",
            language_name(target_language)
        ));
        let answer = self.llm.generate(&[system, Message::user(text)]).await?;
        Ok(strip_code_fence(&answer).to_string())
    }
}

pub struct ReportRenderer {
    languages: Vec<String>,
    translator: Option<Arc<dyn Translator>>,
}

impl ReportRenderer {
    /// `languages[0]` is the primary language: the language the backend
    /// wrote the findings in.
    pub fn new(languages: Vec<String>, translator: Option<Arc<dyn Translator>>) -> Self {
        Self {
            languages,
            translator,
        }
    }

    /// Render every configured language variant
    pub async fn render(&self, draft: &ReportDraft) -> Vec<ReportVariant> {
        let mut variants = Vec::with_capacity(self.languages.len());
        for (i, language) in self.languages.iter().enumerate() {
            let body = if i == 0 {
                render_markdown(draft, labels_for(language), |s| s.to_string())
            } else {
                let translations = self.translate_free_text(draft, language).await;
                render_markdown(draft, labels_for(language), |s| {
                    translations.get(s).cloned().unwrap_or_else(|| s.to_string())
                })
            };
            variants.push(ReportVariant {
                language: language.clone(),
                body,
                refined: false,
            });
        }
        variants
    }

    /// Translate every distinct explanation once; failures keep the source
    async fn translate_free_text(&self, draft: &ReportDraft, language: &str) -> HashMap<String, String> {
        let mut translations = HashMap::new();
        let Some(translator) = &self.translator else {
            return translations;
        };

        let texts = draft
            .entries
            .iter()
            .flat_map(|e| e.changes.iter())
            .flat_map(|c| [c.rationale.as_str(), c.review_reason.as_str()])
            .chain(draft.reviewed_without_change.iter().map(|u| u.reason.as_str()))
            .chain(draft.coverage.failed.iter().map(|s| s.reason.as_str()));

        for text in texts {
            if text.trim().is_empty() || translations.contains_key(text) {
                continue;
            }
            match translator.translate(text, language).await {
                Ok(translated) if !translated.trim().is_empty() => {
                    translations.insert(text.to_string(), translated);
                }
                Ok(_) => tracing::warn!("Empty translation into {}, keeping source text", language),
                Err(e) => tracing::warn!("Translation into {} failed, keeping source text: {}", language, e),
            }
        }
        translations
    }
}

/// Render one variant. `text` maps free-text explanations into the
/// variant's language.
pub fn render_markdown<F>(draft: &ReportDraft, labels: &Labels, text: F) -> String
where
    F: Fn(&str) -> String,
{
    let mut out = String::new();
    let coverage = &draft.coverage;

    let _ = writeln!(out, "# {}\n", labels.title);
    let _ = writeln!(out, "**{}:** {}\n", labels.request, draft.query);
    let _ = writeln!(out, "**{}:** `{}`\n", labels.run, draft.run_id);
    if coverage.is_partial() {
        let _ = writeln!(out, "> {}\n", labels.partial_notice);
    }

    let _ = writeln!(out, "## {}\n", labels.summary);
    let _ = writeln!(out, "- {}: {}", labels.affected_count, draft.entries.len());
    let _ = writeln!(out, "- {}: {}", labels.reviewed_count, coverage.completed.len());
    let _ = writeln!(out, "- {}: {}\n", labels.skipped_count, coverage.failed.len());

    let _ = writeln!(out, "## {}\n", labels.changes);
    if draft.entries.is_empty() {
        let _ = writeln!(out, "{}\n", labels.no_changes);
    }
    for (i, entry) in draft.entries.iter().enumerate() {
        let _ = writeln!(out, "### {}. `{}`\n", i + 1, entry.document);
        for change in &entry.changes {
            let _ = writeln!(out, "**{}:** {}\n", labels.review_reason, text(&change.review_reason));
            let _ = writeln!(out, "**{}:** {}\n", labels.rationale, text(&change.rationale));
            write_quoted(&mut out, labels.before, change.excerpt.trim());
            write_quoted(&mut out, labels.after, change.revision.trim());
        }
    }

    if !draft.reviewed_without_change.is_empty() {
        let _ = writeln!(out, "## {}\n", labels.unchanged);
        for unchanged in &draft.reviewed_without_change {
            let _ = writeln!(out, "- `{}`: {}", unchanged.document, text(&unchanged.reason));
        }
        out.push('\n');
    }

    if !coverage.failed.is_empty() {
        let _ = writeln!(out, "## {}\n", labels.skipped);
        for skipped in &coverage.failed {
            let _ = writeln!(out, "- `{}`: {}", skipped.document, text(&skipped.reason));
        }
        out.push('\n');
    }

    if !coverage.remaining.is_empty() {
        let _ = writeln!(out, "## {}\n", labels.not_reviewed);
        for document in &coverage.remaining {
            let _ = writeln!(out, "- `{}`", document);
        }
        out.push('\n');
    }

    out.trim_end().to_string() + "\n"
}

/// Quote document text in a fenced block longer than any backtick run inside it
fn write_quoted(out: &mut String, label: &str, quoted: &str) {
    let fence = "`".repeat(longest_backtick_run(quoted).max(2) + 1);
    let _ = writeln!(out, "**{}:**\n\n{}text\n{}\n{}\n", label, fence, quoted, fence);
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}
