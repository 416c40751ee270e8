//! Agents, messages and mailboxes for SCAF
//!
//! This crate provides:
//! - Message / OutboundMessage: FIPA ACL messages and the builder for them
//! - envelope: JSON wire form of a message
//! - Effect: What a policy step produces
//! - AgentPolicy / DirectivePolicy: The reactive capability of an agent
//! - Mailbox: Bounded, non-blocking, FIFO per contract
//! - Agent: Identity, mailbox, policy and message clocks

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod effect;
pub mod envelope;
pub mod mailbox;
pub mod message;
pub mod policy;

pub use agent::Agent;
pub use effect::Effect;
pub use mailbox::Mailbox;
pub use message::{Message, OutboundMessage};
pub use policy::{AgentPolicy, DirectivePolicy, ACTION_KEY};
