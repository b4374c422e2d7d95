//! Task Queue Manager
//!
//! Owns the exploration state of one run: the FIFO of pending tasks, the
//! single in-flight document, and the cumulative completed and failed sets.
//! A document is admitted at most once per run; every later proposal of it
//! is dropped silently. This is what bounds the exploration loop.

use super::types::{ExplorationTask, QueueSnapshot, SkippedDocument};
use sdk::errors::QueueError;
use sdk::types::DocumentRef;
use std::collections::{HashSet, VecDeque};

/// Where a known document currently sits in the exploration state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    InFlight,
    Completed,
    Failed,
    Pending,
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    pending: VecDeque<ExplorationTask>,
    in_flight: Option<ExplorationTask>,
    completed: Vec<DocumentRef>,
    failed: Vec<SkippedDocument>,
    // Every document ever admitted, whatever its current state
    admitted: HashSet<DocumentRef>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a task unless its document is already known to the run.
    ///
    /// Returns whether the task was admitted. Duplicates are not an error.
    pub fn enqueue(&mut self, task: ExplorationTask) -> bool {
        if self.admitted.contains(&task.document) {
            tracing::debug!("Dropping duplicate task for {}", task.document);
            return false;
        }
        self.admitted.insert(task.document.clone());
        self.pending.push_back(task);
        true
    }

    /// Take the head of the pending queue and mark it in flight.
    pub fn dequeue(&mut self) -> Result<ExplorationTask, QueueError> {
        if let Some(current) = &self.in_flight {
            return Err(QueueError::InvalidTransition {
                document: self
                    .pending
                    .front()
                    .map(|t| t.document.to_string())
                    .unwrap_or_default(),
                in_flight: Some(current.document.to_string()),
            });
        }
        let task = self.pending.pop_front().ok_or(QueueError::EmptyQueue)?;
        self.in_flight = Some(task.clone());
        Ok(task)
    }

    /// Move the in-flight document to the completed set.
    pub fn mark_completed(&mut self, document: &DocumentRef) -> Result<(), QueueError> {
        let task = self.take_in_flight(document)?;
        self.completed.push(task.document);
        Ok(())
    }

    /// Move the in-flight document to the failed set. It is never retried.
    pub fn mark_failed(
        &mut self,
        document: &DocumentRef,
        reason: impl Into<String>,
    ) -> Result<(), QueueError> {
        let task = self.take_in_flight(document)?;
        self.failed.push(SkippedDocument {
            document: task.document,
            reason: reason.into(),
        });
        Ok(())
    }

    fn take_in_flight(&mut self, document: &DocumentRef) -> Result<ExplorationTask, QueueError> {
        match self.in_flight.take() {
            Some(task) if &task.document == document => Ok(task),
            other => {
                let in_flight = other.as_ref().map(|t| t.document.to_string());
                self.in_flight = other;
                Err(QueueError::InvalidTransition {
                    document: document.to_string(),
                    in_flight,
                })
            }
        }
    }

    /// Current state of a document, if the run knows it.
    ///
    /// When a document could match several states the first of
    /// in-flight, completed, failed, pending is reported.
    pub fn state_of(&self, document: &DocumentRef) -> Option<DocumentState> {
        if !self.admitted.contains(document) {
            return None;
        }
        if self.in_flight.as_ref().map(|t| &t.document) == Some(document) {
            Some(DocumentState::InFlight)
        } else if self.completed.contains(document) {
            Some(DocumentState::Completed)
        } else if self.failed.iter().any(|s| &s.document == document) {
            Some(DocumentState::Failed)
        } else {
            Some(DocumentState::Pending)
        }
    }

    pub fn is_known(&self, document: &DocumentRef) -> bool {
        self.admitted.contains(document)
    }

    /// Fresh copy of the whole state
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            completed: self.completed.clone(),
            pending: self.pending.iter().cloned().collect(),
            in_flight: self.in_flight.as_ref().map(|t| t.document.clone()),
            failed: self.failed.iter().map(|s| s.document.clone()).collect(),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_none()
    }

    pub fn completed(&self) -> &[DocumentRef] {
        &self.completed
    }

    pub fn failed(&self) -> &[SkippedDocument] {
        &self.failed
    }

    pub fn remaining(&self) -> Vec<DocumentRef> {
        self.pending.iter().map(|t| t.document.clone()).collect()
    }
}
