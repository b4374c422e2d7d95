//! Conductor System
//!
//! Orchestrates the exploration of a document corpus: planning the seed
//! set, reviewing documents one at a time, and admitting the related
//! documents each review proposes, under a global time budget.

pub mod explorer;
pub mod guard;
pub mod planner;
pub mod processor;
pub mod queue;
pub mod replanner;
pub mod types;

pub use explorer::{Explorer, RunContext};
pub use guard::{Clock, GuardState, ManualClock, SystemClock, TimeGuard};
pub use planner::Planner;
pub use processor::Processor;
pub use queue::{DocumentState, TaskQueue};
pub use replanner::{RejectReason, RejectedProposal, ReplanOutcome, Replanner};
pub use types::{Coverage, ExplorationOutcome, ExplorationTask, QueueSnapshot, SkippedDocument};
