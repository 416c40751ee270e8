//! Effects returned by agent policies

use crate::message::OutboundMessage;
use scaf_core::ContractEvent;

/// An outcome of one policy step
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Apply an event to the contract being stepped
    Transition(ContractEvent),
    /// Send a message
    Emit(OutboundMessage),
}

impl Effect {
    /// Event carried by a transition effect
    pub fn as_transition(&self) -> Option<ContractEvent> {
        match self {
            Effect::Transition(event) => Some(*event),
            Effect::Emit(_) => None,
        }
    }

    /// Message carried by an emit effect
    pub fn as_emit(&self) -> Option<&OutboundMessage> {
        match self {
            Effect::Emit(message) => Some(message),
            Effect::Transition(_) => None,
        }
    }
}

impl From<ContractEvent> for Effect {
    fn from(event: ContractEvent) -> Self {
        Effect::Transition(event)
    }
}

impl From<OutboundMessage> for Effect {
    fn from(message: OutboundMessage) -> Self {
        Effect::Emit(message)
    }
}
