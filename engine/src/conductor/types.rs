use sdk::types::{DocumentRef, Finding};
use serde::{Deserialize, Serialize};

/// One document scheduled for review, with the reason it was scheduled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationTask {
    pub document: DocumentRef,
    pub reason: String,
}

impl ExplorationTask {
    pub fn new(document: impl Into<DocumentRef>, reason: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            reason: reason.into(),
        }
    }
}

/// A document that was dequeued but produced no finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub document: DocumentRef,
    pub reason: String,
}

/// Point-in-time copy of the exploration state.
///
/// Always taken from the live queue right before it is used; never cached
/// across a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub completed: Vec<DocumentRef>,
    pub pending: Vec<ExplorationTask>,
    pub in_flight: Option<DocumentRef>,
    pub failed: Vec<DocumentRef>,
}

impl QueueSnapshot {
    /// Every document the run already knows about
    pub fn known(&self) -> impl Iterator<Item = &DocumentRef> {
        self.completed
            .iter()
            .chain(self.pending.iter().map(|t| &t.document))
            .chain(self.in_flight.iter())
            .chain(self.failed.iter())
    }
}

/// How much of the planned exploration actually happened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    /// Documents processed to a finding, in completion order
    pub completed: Vec<DocumentRef>,

    /// Documents skipped after a fetch or processing failure
    pub failed: Vec<SkippedDocument>,

    /// Documents still queued when the loop stopped
    pub remaining: Vec<DocumentRef>,

    /// Whether the Time Guard stopped the loop
    pub timed_out: bool,

    pub iterations: usize,
    pub elapsed_ms: u64,
}

impl Coverage {
    /// True when the run stopped before the queue drained
    pub fn is_partial(&self) -> bool {
        self.timed_out || !self.remaining.is_empty()
    }
}

/// Result of one exploration run, input to the report pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationOutcome {
    pub run_id: String,
    pub query: String,

    /// Findings in dequeue order, including ones without a revision
    pub findings: Vec<Finding>,

    pub coverage: Coverage,
}
