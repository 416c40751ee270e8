//! Engine counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of engine metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// Contracts waiting in the ready queue
    pub ready_depth: usize,
    /// Turns currently running on workers
    pub active_turns: usize,
    /// Turns completed since start
    pub turns: u64,
    /// Policy steps run since start
    pub steps: u64,
    /// Transitions applied since start (the initial `Propose` excluded)
    pub transitions: u64,
    /// Diagnostics raised since start
    pub diagnostics: u64,
    /// Times a contract was found held by two workers (zero when correct)
    pub exclusion_violations: u64,
    /// Worker threads
    pub workers: usize,
    /// Contracts submitted
    pub contracts: usize,
    /// Agents registered
    pub agents: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub turns: AtomicU64,
    pub steps: AtomicU64,
    pub transitions: AtomicU64,
    pub diagnostics: AtomicU64,
    pub exclusion_violations: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
