//! Regent SDK
//!
//! Shared library providing the document model and error taxonomy used by
//! the Regent engine and its tests.

/// Error types and handling
pub mod errors;

/// Document model types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, FetchError, QueueError, RegentErrorExt};
pub use types::{DocumentRef, Finding, RelatedDocument};
