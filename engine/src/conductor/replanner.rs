//! Conductor Replanner
//!
//! Filters the documents a finding proposes through the live exploration
//! state and admits only the genuinely new ones. The queue is read at every
//! single decision, never through an earlier copy.

use crate::conductor::queue::{DocumentState, TaskQueue};
use crate::conductor::types::ExplorationTask;
use crate::corpus::CorpusIndex;
use sdk::types::{DocumentRef, Finding};
use serde::Serialize;
use std::collections::HashSet;

/// Why a proposed document was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    UnknownDocument,
    InFlight,
    Completed,
    Failed,
    Pending,
    DuplicateProposal,
}

impl From<DocumentState> for RejectReason {
    fn from(state: DocumentState) -> Self {
        match state {
            DocumentState::InFlight => Self::InFlight,
            DocumentState::Completed => Self::Completed,
            DocumentState::Failed => Self::Failed,
            DocumentState::Pending => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedProposal {
    /// The identifier as the backend proposed it
    pub candidate: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplanOutcome {
    pub admitted: Vec<ExplorationTask>,
    pub rejected: Vec<RejectedProposal>,
}

#[derive(Debug, Default)]
pub struct Replanner;

impl Replanner {
    pub fn new() -> Self {
        Self
    }

    /// Admit the finding's proposals that are in the index and new to the run
    pub fn replan(
        &self,
        finding: &Finding,
        queue: &mut TaskQueue,
        corpus: &CorpusIndex,
    ) -> ReplanOutcome {
        let mut outcome = ReplanOutcome::default();
        let mut seen_this_step: HashSet<DocumentRef> = HashSet::new();

        for proposal in &finding.related {
            let candidate = proposal.document.as_str();
            let reject = |reason| RejectedProposal {
                candidate: candidate.to_string(),
                reason,
            };

            let Some(document) = corpus.resolve(candidate) else {
                outcome.rejected.push(reject(RejectReason::UnknownDocument));
                continue;
            };
            if !seen_this_step.insert(document.clone()) {
                outcome.rejected.push(reject(RejectReason::DuplicateProposal));
                continue;
            }
            if let Some(state) = queue.state_of(&document) {
                outcome.rejected.push(reject(state.into()));
                continue;
            }

            let task = ExplorationTask::new(document, proposal.reason.clone());
            if queue.enqueue(task.clone()) {
                outcome.admitted.push(task);
            }
        }

        tracing::debug!(
            "Replanning after {}: admitted {}, rejected {}",
            finding.source,
            outcome.admitted.len(),
            outcome.rejected.len()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::RelatedDocument;

    fn finding(source: &str, related: &[&str]) -> Finding {
        Finding {
            source: DocumentRef::new(source),
            review_reason: String::new(),
            needs_revision: false,
            excerpt: String::new(),
            proposed_revision: String::new(),
            rationale: String::new(),
            related: related
                .iter()
                .map(|r| RelatedDocument::new(*r, "linked"))
                .collect(),
        }
    }

    fn corpus() -> CorpusIndex {
        CorpusIndex::from_entries(["A.docx", "B.docx", "C.docx", "D.docx", "E.docx"])
    }

    #[test]
    fn test_rejection_reasons() {
        let corpus = corpus();
        let mut queue = TaskQueue::new();
        for doc in ["A.docx", "B.docx", "C.docx", "D.docx"] {
            queue.enqueue(ExplorationTask::new(doc, "seed"));
        }
        let a = queue.dequeue().unwrap();
        queue.mark_completed(&a.document).unwrap();
        let b = queue.dequeue().unwrap();
        queue.mark_failed(&b.document, "unreadable").unwrap();
        let c = queue.dequeue().unwrap();
        // C in flight, D pending, E new

        let outcome = Replanner::new().replan(
            &finding(c.document.as_str(), &["A.docx", "B.docx", "C.docx", "D.docx", "E.docx", "E.docx", "X.docx"]),
            &mut queue,
            &corpus,
        );

        let reasons: Vec<_> = outcome.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![
                RejectReason::Completed,
                RejectReason::Failed,
                RejectReason::InFlight,
                RejectReason::Pending,
                RejectReason::DuplicateProposal,
                RejectReason::UnknownDocument,
            ]
        );
        assert_eq!(outcome.admitted, vec![ExplorationTask::new("E.docx", "linked")]);
        assert_eq!(queue.pending_len(), 2);
    }

    #[test]
    fn test_resolves_bare_names() {
        let corpus = CorpusIndex::from_entries(["rules/A.docx", "rules/B.docx"]);
        let mut queue = TaskQueue::new();
        let outcome = Replanner::new().replan(&finding("rules/A.docx", &["B.docx"]), &mut queue, &corpus);
        assert_eq!(outcome.admitted[0].document.as_str(), "rules/B.docx");
    }

    #[test]
    fn test_no_proposals() {
        let mut queue = TaskQueue::new();
        let outcome = Replanner::new().replan(&finding("A.docx", &[]), &mut queue, &corpus());
        assert_eq!(outcome, ReplanOutcome::default());
    }
}
