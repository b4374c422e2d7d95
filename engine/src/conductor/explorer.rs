//! Exploration loop
//!
//! plan → {guard check → dequeue → fetch → process → replan} until the
//! queue drains or the Time Guard expires. Processing is strictly
//! sequential: at most one document is in flight. Fetch and processing
//! failures skip the document; only a failed plan or a queue invariant
//! violation ends the run with an error.

use crate::conductor::guard::{Clock, GuardState, SystemClock, TimeGuard};
use crate::conductor::planner::Planner;
use crate::conductor::processor::Processor;
use crate::conductor::queue::TaskQueue;
use crate::conductor::replanner::Replanner;
use crate::conductor::types::{Coverage, ExplorationOutcome};
use crate::corpus::CorpusIndex;
use crate::fetcher::DocumentSource;
use crate::llm::LLMProvider;
use sdk::errors::{EngineError, QueueError};
use sdk::types::Finding;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// State owned by one run, passed explicitly through the loop
pub struct RunContext {
    pub run_id: String,
    pub query: String,
    pub guard: TimeGuard,
    pub queue: TaskQueue,
    pub findings: Vec<Finding>,
    iterations: usize,
    timed_out: bool,
}

impl RunContext {
    pub fn new(query: impl Into<String>, guard: TimeGuard) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
            guard,
            queue: TaskQueue::new(),
            findings: Vec::new(),
            iterations: 0,
            timed_out: false,
        }
    }

    fn into_outcome(self) -> ExplorationOutcome {
        let coverage = Coverage {
            completed: self.queue.completed().to_vec(),
            failed: self.queue.failed().to_vec(),
            remaining: self.queue.remaining(),
            timed_out: self.timed_out,
            iterations: self.iterations,
            elapsed_ms: self.guard.elapsed().as_millis() as u64,
        };
        ExplorationOutcome {
            run_id: self.run_id,
            query: self.query,
            findings: self.findings,
            coverage,
        }
    }
}

pub struct Explorer {
    planner: Planner,
    processor: Processor,
    replanner: Replanner,
    source: Arc<dyn DocumentSource>,
    corpus: Arc<CorpusIndex>,
    clock: Arc<dyn Clock>,
    budget: Duration,
}

impl Explorer {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        source: Arc<dyn DocumentSource>,
        corpus: Arc<CorpusIndex>,
        budget: Duration,
    ) -> Self {
        Self {
            planner: Planner::new(llm.clone()),
            processor: Processor::new(llm),
            replanner: Replanner::new(),
            source,
            corpus,
            clock: Arc::new(SystemClock),
            budget,
        }
    }

    /// Replace the wall clock used by the Time Guard
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one exploration for `query`.
    ///
    /// # Errors
    /// `PlanningFailure` when no seed set can be derived;
    /// `Queue(InvalidTransition)` on an exploration state violation.
    pub async fn explore(&self, query: &str) -> Result<ExplorationOutcome, EngineError> {
        let guard = TimeGuard::start(self.clock.clone(), self.budget);
        let mut ctx = RunContext::new(query, guard);
        info!(run_id = %ctx.run_id, "Starting exploration (budget {}s)", self.budget.as_secs());

        let seeds = self.planner.plan(query, &self.corpus).await?;
        for task in seeds {
            if !ctx.queue.enqueue(task) {
                debug!("Plan listed a document twice");
            }
        }

        loop {
            if ctx.guard.check() == GuardState::Expired {
                if ctx.queue.pending_len() > 0 {
                    warn!(
                        "Time budget exhausted, {} documents left unreviewed",
                        ctx.queue.pending_len()
                    );
                    ctx.timed_out = true;
                }
                break;
            }

            let task = match ctx.queue.dequeue() {
                Ok(task) => task,
                Err(QueueError::EmptyQueue) => break,
                Err(e) => return Err(e.into()),
            };
            ctx.iterations += 1;
            info!(
                document = %task.document,
                remaining = ctx.queue.pending_len(),
                completed = ctx.queue.completed().len(),
                "Reviewing document"
            );

            let text = match self.source.fetch(&task.document).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(document = %task.document, "Skipping document: {}", e);
                    ctx.queue.mark_failed(&task.document, e.to_string())?;
                    continue;
                }
            };

            let snapshot = ctx.queue.snapshot();
            let finding = match self
                .processor
                .process(&task, &text, query, &snapshot, &self.corpus)
                .await
            {
                Ok(finding) => finding,
                Err(e) => {
                    warn!(document = %task.document, "Skipping document: {}", e);
                    ctx.queue.mark_failed(&task.document, e.to_string())?;
                    continue;
                }
            };

            ctx.queue.mark_completed(&task.document)?;
            let replan = self.replanner.replan(&finding, &mut ctx.queue, &self.corpus);
            for task in &replan.admitted {
                info!(document = %task.document, "Added to review queue: {}", task.reason);
            }
            for rejected in &replan.rejected {
                debug!(
                    "Not admitting {} ({:?})",
                    rejected.candidate, rejected.reason
                );
            }

            if finding.needs_revision {
                info!(document = %finding.source, "Revision proposed");
            }
            ctx.findings.push(finding);
        }

        let outcome = ctx.into_outcome();
        info!(
            run_id = %outcome.run_id,
            completed = outcome.coverage.completed.len(),
            failed = outcome.coverage.failed.len(),
            remaining = outcome.coverage.remaining.len(),
            timed_out = outcome.coverage.timed_out,
            "Exploration finished in {} iterations",
            outcome.coverage.iterations
        );
        Ok(outcome)
    }
}
