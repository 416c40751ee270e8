//! Error types for SCAF
//!
//! Every fallible boundary returns one of the typed errors below. We use
//! `thiserror` for `Display` and `Error` impls; `Error` is the umbrella that
//! callers can `?` into when they do not care which layer failed.

use crate::limits::LimitError;
use crate::state::{ContractEvent, ContractState};
use crate::types::{AgentId, ContractId};
use thiserror::Error;

/// Result type alias using the umbrella error
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed document bytes
///
/// `offset` is the byte position at which decoding gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Decode error at byte {offset}: {reason}")]
pub struct DecodeError {
    /// What was wrong
    pub reason: String,
    /// Byte offset into the input
    pub offset: usize,
}

impl DecodeError {
    /// Create a decode error at the given offset
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        DecodeError {
            reason: reason.into(),
            offset,
        }
    }
}

/// A name that matches no symbol of a reflected enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} name: '{name}'")]
pub struct UnknownStateError {
    /// Enumeration that was searched
    pub kind: &'static str,
    /// The offending name
    pub name: String,
}

impl UnknownStateError {
    /// Create an unknown-name error
    pub fn new(kind: &'static str, name: impl Into<String>) -> Self {
        UnknownStateError {
            kind,
            name: name.into(),
        }
    }
}

/// Illegal state change; the contract is left unmodified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The event is not permitted from the current state
    #[error("Event {attempted} is not permitted from state {current}")]
    NotPermitted {
        /// State the contract is in
        current: ContractState,
        /// Event that was applied
        attempted: ContractEvent,
    },

    /// The contract is in a terminal state and accepts no events
    #[error("Contract is in terminal state {state}; event {attempted} rejected")]
    TerminalState {
        /// Terminal state the contract is frozen in
        state: ContractState,
        /// Event that was applied
        attempted: ContractEvent,
    },
}

impl TransitionError {
    /// State the contract was in when the event was refused
    pub fn current(&self) -> ContractState {
        match self {
            TransitionError::NotPermitted { current, .. } => *current,
            TransitionError::TerminalState { state, .. } => *state,
        }
    }

    /// Check if this is the terminal-state variant
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransitionError::TerminalState { .. })
    }
}

/// Failure to post a message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostError {
    /// No contract with this id was submitted
    #[error("Unknown contract: {0}")]
    UnknownContract(ContractId),

    /// No agent with this id is registered
    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// The agent does not take part in the contract
    #[error("Agent {agent} is not a participant of contract {contract}")]
    NotParticipant {
        /// Contract addressed
        contract: ContractId,
        /// Agent that is not a participant
        agent: AgentId,
    },

    /// The contract already reached a terminal state
    #[error("Contract {contract} is in terminal state {state}")]
    TerminalContract {
        /// Contract addressed
        contract: ContractId,
        /// Terminal state it is frozen in
        state: ContractState,
    },

    /// The recipient's bounded mailbox is full; the message was rejected
    #[error("Mailbox of agent {agent} is full (capacity {capacity})")]
    MailboxOverflow {
        /// Agent whose mailbox is full
        agent: AgentId,
        /// Configured capacity
        capacity: usize,
    },

    /// The engine no longer accepts work
    #[error("Engine is shut down")]
    ShutDown,
}

/// Failure to submit a contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// A contract needs at least one participant
    #[error("Contract has no participants")]
    NoParticipants,

    /// A participant is not registered
    #[error("Unknown participant: {0}")]
    UnknownAgent(AgentId),

    /// The terms exceed the configured document limits
    #[error("Terms rejected: {0}")]
    TermsTooLarge(#[from] LimitError),

    /// The engine no longer accepts work
    #[error("Engine is shut down")]
    ShutDown,
}

/// Failure to read or write the JSON message envelope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The input is not valid JSON or does not match the envelope shape
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// Missing or unsupported content language
    #[error("Missing or invalid language type; only {expected} is supported")]
    Language {
        /// Supported language
        expected: &'static str,
    },

    /// Missing or unsupported content encoding
    #[error("Missing or invalid encoding type; only {expected} is supported")]
    Encoding {
        /// Supported encoding
        expected: &'static str,
    },
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(e: serde_json::Error) -> Self {
        EnvelopeError::Malformed(e.to_string())
    }
}

/// Failure to rebuild a contract snapshot from a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// A required field is absent
    #[error("Snapshot is missing field '{0}'")]
    MissingField(&'static str),

    /// A field has the wrong shape
    #[error("Snapshot field '{field}' is invalid: expected {expected}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// What was expected
        expected: &'static str,
    },

    /// A state or event name is not recognized
    #[error(transparent)]
    UnknownState(#[from] UnknownStateError),

    /// The snapshot bytes could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Failure to load, validate or store engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file '{path}': {reason}")]
    Read {
        /// File path
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// The configuration text could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A setting has an unusable value
    #[error("Invalid config value for '{field}': {reason}")]
    Invalid {
        /// Setting name
        field: &'static str,
        /// Why it is rejected
        reason: String,
    },

    /// The configuration file could not be written
    #[error("Failed to write config file '{path}': {reason}")]
    Write {
        /// File path
        path: String,
        /// Underlying cause
        reason: String,
    },
}

/// Engine-level failure outside posting and submitting
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No contract with this id was submitted
    #[error("Unknown contract: {0}")]
    UnknownContract(ContractId),

    /// The engine could not be built from its configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Umbrella error for all SCAF operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Document decoding failed
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Unknown enumeration name
    #[error(transparent)]
    UnknownState(#[from] UnknownStateError),

    /// Illegal state change
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Posting failed
    #[error(transparent)]
    Post(#[from] PostError),

    /// Submitting failed
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// Document limit violated
    #[error(transparent)]
    Limit(#[from] LimitError),

    /// Envelope handling failed
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// Snapshot decoding failed
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Engine-level failure
    #[error(transparent)]
    Engine(#[from] EngineError),
}
