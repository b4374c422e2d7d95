//! Regent Engine Library
//!
//! Core of the Regent document exploration agent. Used by the binary and
//! by the integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// Telemetry and Observability
pub mod telemetry;

/// LLM provider abstraction layer
pub mod llm;

/// Corpus index over an experiment's data directory
pub mod corpus;

/// Document text extraction
pub mod fetcher;

/// Exploration control loop
pub mod conductor;

/// Report compilation, rendering and output
pub mod report;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
