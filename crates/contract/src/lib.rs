//! Contract state machine for SCAF
//!
//! This crate provides:
//! - transition: The transition table and its lookups
//! - Contract: A contract, its terms, participants and transition log
//! - ContractView: Read-only snapshot with document encoding

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod transition;
pub mod view;

pub use contract::{Contract, LogEntry};
pub use view::ContractView;
