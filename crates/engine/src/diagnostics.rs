//! Engine diagnostics
//!
//! Non-fatal problems found while running contracts (a refused transition,
//! a message that could not be routed, a panicking policy) never surface
//! as errors to the caller who posted the work. They are reported to a
//! `DiagnosticSink` instead. The default sink logs through `tracing`;
//! `MemorySink` keeps them for inspection.

use parking_lot::Mutex;
use scaf_core::{reflect_enum, AgentId, ContractId, Timestamp};
use std::fmt;
use tracing::warn;

reflect_enum! {
    /// What went wrong
    pub enum DiagnosticKind: "DiagnosticKind" {
        /// A proposed event is not permitted from the contract's state
        TransitionRejected => "TransitionRejected",
        /// Work arrived for a contract that already reached a terminal state
        PostToTerminalContract => "PostToTerminalContract",
        /// A policy panicked; the contract was aborted
        WorkerPanic => "WorkerPanic",
        /// A message's reply-by deadline passed before delivery
        ExpiredMessage => "ExpiredMessage",
        /// A message emitted by a policy could not be delivered
        UndeliverableMessage => "UndeliverableMessage",
    }
}

/// A non-fatal engine report
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Category
    pub kind: DiagnosticKind,
    /// Contract concerned
    pub contract: Option<ContractId>,
    /// Agent concerned
    pub agent: Option<AgentId>,
    /// Human-readable description
    pub detail: String,
    /// When it was raised
    pub at: Timestamp,
}

impl Diagnostic {
    /// Create a diagnostic stamped with the current time
    pub fn new(
        kind: DiagnosticKind,
        contract: Option<ContractId>,
        agent: Option<AgentId>,
        detail: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            contract,
            agent,
            detail: detail.into(),
            at: Timestamp::now(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Receiver of diagnostics
///
/// Called from worker threads; implementations must not block for long.
pub trait DiagnosticSink: Send + Sync {
    /// Handle one diagnostic
    fn handle(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn handle(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Sink that logs every diagnostic at `warn`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn handle(&self, diagnostic: &Diagnostic) {
        let contract = diagnostic.contract.map(|c| c.to_string()).unwrap_or_default();
        let agent = diagnostic.agent.map(|a| a.to_string()).unwrap_or_default();
        warn!(
            kind = %diagnostic.kind,
            contract = %contract,
            agent = %agent,
            "{}",
            diagnostic.detail
        );
    }
}

/// Sink that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Diagnostics of one kind
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }

    /// Number received so far
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if nothing was received
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything received so far
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn handle(&self, diagnostic: &Diagnostic) {
        self.entries.lock().push(diagnostic.clone());
    }
}
