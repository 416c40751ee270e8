//! Execution engine for SCAF
//!
//! This crate runs agents against contracts:
//! - Engine / EngineBuilder: Registration, submission, posting and lifecycle
//! - EngineConfig: Settings loaded from `scaf.toml`
//! - diagnostics: Non-fatal reports and the sinks that receive them
//! - EngineStats: Counters for monitoring and tests
//! - logging: `tracing` subscriber setup
//!
//! Work is scheduled per contract. A fixed pool of workers pops contracts
//! from a FIFO ready queue and runs one bounded turn each, so a contract is
//! only ever stepped by one worker at a time and contracts progress
//! round-robin.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod logging;
mod registry;
mod scheduler;
pub mod stats;

pub use config::{EngineConfig, CONFIG_FILE_NAME};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, MemorySink, TracingSink};
pub use engine::{Engine, EngineBuilder};
pub use stats::EngineStats;
