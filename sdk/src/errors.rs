//! Error types and handling
//!
//! This module provides the error types used throughout the Regent engine.
//! All errors implement the `RegentErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Recoverability
//!
//! The exploration loop absorbs recoverable errors (a document that cannot
//! be fetched or processed is skipped) and only propagates the fatal ones:
//! a failed initial plan, or a queue state-machine violation.
//!
//! # Examples
//!
//! ```
//! use sdk::errors::{EngineError, FetchError, RegentErrorExt};
//!
//! let error = EngineError::Fetch(FetchError::UnsupportedFormat("scan.pdf".into()));
//! println!("Hint: {}", error.user_hint());
//! assert!(error.is_recoverable());
//!
//! let fatal_error = EngineError::PlanningFailure("no valid documents".into());
//! assert!(!fatal_error.is_recoverable());
//! ```

use thiserror::Error;

/// Trait for Regent error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait RegentErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors are absorbed by the exploration loop. Non-recoverable
    /// errors terminate the run with a non-zero result.
    fn is_recoverable(&self) -> bool;
}

/// Errors raised while turning a document identifier into text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Failed to read document {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to extract text from {path}: {reason}")]
    Extraction { path: String, reason: String },
}

/// Errors raised by the exploration queue state machine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// No pending documents remain. Normal loop termination, not a failure.
    #[error("Exploration queue is empty")]
    EmptyQueue,

    #[error("Invalid queue transition: {document} is not in flight (in flight: {in_flight:?})")]
    InvalidTransition {
        document: String,
        in_flight: Option<String>,
    },
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Corpus**: Missing or unreadable corpus index
/// - **Planning**: No valid seed set could be derived (fatal)
/// - **Processing**: Backend or parse failure for one document (recoverable)
/// - **Fetch**: Document could not be read (recoverable)
/// - **Queue**: Empty queue (termination signal) or invariant violation (fatal)
/// - **Secret**: Missing API keys
/// - **Report**: Artifact could not be written
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Corpus errors
    #[error("Corpus index error: {0}")]
    CorpusIndex(String),

    // Exploration errors
    #[error("Planning failed: {0}")]
    PlanningFailure(String),

    #[error("Processing failed for {document}: {reason}")]
    ProcessingFailure { document: String, reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    // Secret errors
    #[error("Secret unavailable: {0}")]
    Secret(String),

    // Output errors
    #[error("Failed to write report: {0}")]
    ReportWrite(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegentErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::CorpusIndex(_) => {
                "Corpus index unavailable. Run without --skip-index-regeneration to rebuild it"
            }
            Self::PlanningFailure(_) => {
                "No reviewable documents could be planned. Rephrase the request or check the corpus"
            }
            Self::ProcessingFailure { .. } => "A document could not be analyzed and was skipped",
            Self::Fetch(FetchError::UnsupportedFormat(_)) => {
                "This document format is not supported and was skipped"
            }
            Self::Fetch(_) => "A document could not be read and was skipped",
            Self::Queue(QueueError::EmptyQueue) => "No documents left to explore",
            Self::Queue(QueueError::InvalidTransition { .. }) => {
                "Internal exploration state is inconsistent. Please report this"
            }
            Self::Secret(_) => "Set the provider API key in the environment or the OS keychain",
            Self::ReportWrite(_) => "Check that the results directory is writable",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::PlanningFailure(_)
            | Self::Queue(QueueError::InvalidTransition { .. })
            | Self::Config(_)
            | Self::CorpusIndex(_) => false,

            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability_follows_taxonomy() {
        assert!(!EngineError::PlanningFailure("x".into()).is_recoverable());
        assert!(!EngineError::Queue(QueueError::InvalidTransition {
            document: "a".into(),
            in_flight: None,
        })
        .is_recoverable());

        assert!(EngineError::Queue(QueueError::EmptyQueue).is_recoverable());
        assert!(EngineError::Fetch(FetchError::NotFound("a".into())).is_recoverable());
        assert!(EngineError::ProcessingFailure {
            document: "a".into(),
            reason: "bad json".into(),
        }
        .is_recoverable());
    }

    #[test]
    fn test_fetch_error_converts() {
        let err: EngineError = FetchError::UnsupportedFormat("x.pdf".into()).into();
        assert!(matches!(err, EngineError::Fetch(_)));
        assert_eq!(err.to_string(), "Unsupported document format: x.pdf");
    }
}
