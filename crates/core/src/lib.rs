//! Core types for SCAF
//!
//! This crate defines the foundational types used throughout the system:
//! - ContractId / AgentId: Unique identifiers
//! - Timestamp: Microsecond wall-clock time
//! - Document / Fields: Schema-free values for terms and payloads
//! - codec: Binary document encoding
//! - Limits: Document size limits
//! - Reflect: Compile-time name tables for closed enumerations
//! - ContractState / ContractEvent: Contract lifecycle symbols
//! - Performative: FIPA ACL communicative acts
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod document;
pub mod error;
pub mod limits;
pub mod performative;
pub mod reflect;
pub mod state;
pub mod timestamp;
pub mod types;

pub use codec::{decode, decode_with_limits, encode};
pub use document::{Document, Fields};
pub use error::{
    ConfigError, DecodeError, EngineError, EnvelopeError, Error, PostError, Result, SnapshotError,
    SubmitError, TransitionError, UnknownStateError,
};
pub use limits::{LimitError, Limits};
pub use performative::Performative;
pub use reflect::{name_of, parse, Reflect};
pub use state::{ContractEvent, ContractState};
pub use timestamp::Timestamp;
pub use types::{AgentId, ContractId};

// Used by `reflect_enum!` expansions in downstream crates
#[doc(hidden)]
pub mod __private {
    pub use serde;
}
