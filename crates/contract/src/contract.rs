//! Contract and its transition log
//!
//! A `Contract` is owned by the engine. It changes only through `apply` (or
//! `force_abort` when a policy faults); both append exactly one `LogEntry`
//! on success and leave state and log untouched on error.

use crate::transition;
use crate::view::ContractView;
use scaf_core::{
    AgentId, ContractEvent, ContractId, ContractState, Document, Timestamp, TransitionError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// One recorded state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// State before the change (`None` only for the initial `Propose`)
    pub from: Option<ContractState>,
    /// State after the change
    pub to: ContractState,
    /// Event that caused it
    pub event: ContractEvent,
    /// Wall-clock time of the change
    pub timestamp: Timestamp,
    /// Agent whose effect caused it, if any
    pub actor: Option<AgentId>,
    /// Free-form annotation (set on forced aborts)
    pub note: Option<String>,
}

/// A contract tracked by the state machine
#[derive(Debug, Clone)]
pub struct Contract {
    id: ContractId,
    state: ContractState,
    terms: Arc<Document>,
    participants: Vec<AgentId>,
    log: Vec<LogEntry>,
}

impl Contract {
    /// Create a contract by applying `Propose`
    ///
    /// Duplicate participants are collapsed, keeping first occurrence order.
    pub fn propose(
        id: ContractId,
        terms: Document,
        participants: impl IntoIterator<Item = AgentId>,
    ) -> Self {
        let mut unique: Vec<AgentId> = Vec::new();
        for agent in participants {
            if !unique.contains(&agent) {
                unique.push(agent);
            }
        }

        let entry = LogEntry {
            from: None,
            to: transition::target(ContractEvent::Propose),
            event: ContractEvent::Propose,
            timestamp: Timestamp::now(),
            actor: None,
            note: None,
        };

        Contract {
            id,
            state: entry.to,
            terms: Arc::new(terms),
            participants: unique,
            log: vec![entry],
        }
    }

    /// Contract id
    pub fn id(&self) -> ContractId {
        self.id
    }

    /// Current state
    pub fn state(&self) -> ContractState {
        self.state
    }

    /// Check whether the contract is frozen
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Terms the contract was proposed with
    pub fn terms(&self) -> &Arc<Document> {
        &self.terms
    }

    /// Participants in submission order
    pub fn participants(&self) -> &[AgentId] {
        &self.participants
    }

    /// Check whether `agent` takes part in this contract
    pub fn is_participant(&self, agent: AgentId) -> bool {
        self.participants.contains(&agent)
    }

    /// Transition log, oldest first
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Apply an event
    pub fn apply(
        &mut self,
        event: ContractEvent,
        actor: Option<AgentId>,
    ) -> Result<LogEntry, TransitionError> {
        let to = transition::destination(self.state, event)?;
        Ok(self.record(to, event, actor, None))
    }

    /// Move a non-terminal contract to `Aborted`
    ///
    /// Bypasses the table: used when the policy stepping the contract
    /// faulted. Recorded as a `Fail` with `reason` as the note.
    pub fn force_abort(&mut self, reason: impl Into<String>) -> Result<LogEntry, TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError::TerminalState {
                state: self.state,
                attempted: ContractEvent::Fail,
            });
        }
        Ok(self.record(
            ContractState::Aborted,
            ContractEvent::Fail,
            None,
            Some(reason.into()),
        ))
    }

    fn record(
        &mut self,
        to: ContractState,
        event: ContractEvent,
        actor: Option<AgentId>,
        note: Option<String>,
    ) -> LogEntry {
        let entry = LogEntry {
            from: Some(self.state),
            to,
            event,
            timestamp: Timestamp::now(),
            actor,
            note,
        };
        trace!(contract = %self.id, from = %self.state, to = %to, event = %event, "transition");
        self.state = to;
        self.log.push(entry.clone());
        entry
    }

    /// Point-in-time copy for policies and callers
    pub fn view(&self) -> ContractView {
        ContractView {
            id: self.id,
            state: self.state,
            terms: Arc::clone(&self.terms),
            participants: self.participants.clone(),
            log: self.log.clone(),
        }
    }
}
