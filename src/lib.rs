//! SCAF - Smart Contracting Agents Framework
//!
//! Autonomous agents negotiate and execute contracts by exchanging FIPA ACL
//! messages. Each contract is a state machine driven by the transitions its
//! participants propose; a pool of worker threads runs the agents'
//! policies, one contract at a time per worker.
//!
//! # Quick Start
//!
//! ```no_run
//! use scaf::{ContractState, DirectivePolicy, Document, Engine, Fields};
//!
//! let engine = Engine::new(4);
//! let buyer = engine.register_agent_named("buyer", DirectivePolicy);
//! let seller = engine.register_agent_named("seller", DirectivePolicy);
//!
//! let contract = engine
//!     .submit(Fields::new().with("price", 100), [buyer, seller])
//!     .unwrap();
//! engine
//!     .post(contract, buyer, Fields::new().with("action", "Accept"))
//!     .unwrap();
//! engine.drain();
//!
//! assert_eq!(engine.snapshot(contract).unwrap().state, ContractState::Accepted);
//! ```
//!
//! # Architecture
//!
//! - `scaf-core`: documents and their binary codec, reflected enumerations,
//!   identifiers and the error types
//! - `scaf-contract`: the contract state machine and its snapshots
//! - `scaf-agent`: messages, mailboxes, policies and the JSON envelope
//! - `scaf-engine`: scheduling, configuration, diagnostics and logging

pub use scaf_agent::{
    envelope, Agent, AgentPolicy, DirectivePolicy, Effect, Mailbox, Message, OutboundMessage,
    ACTION_KEY,
};
pub use scaf_contract::{transition, Contract, ContractView, LogEntry};
pub use scaf_core::{
    codec, decode, decode_with_limits, encode, name_of, parse, reflect_enum, AgentId,
    ConfigError, ContractEvent, ContractId, ContractState, DecodeError, Document, EngineError,
    EnvelopeError, Error, Fields, LimitError, Limits, Performative, PostError, Reflect, Result,
    SnapshotError, SubmitError, Timestamp, TransitionError, UnknownStateError,
};
pub use scaf_engine::{
    logging, Diagnostic, DiagnosticKind, DiagnosticSink, Engine, EngineBuilder, EngineConfig,
    EngineStats, MemorySink, TracingSink, CONFIG_FILE_NAME,
};
