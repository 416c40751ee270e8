//! Agent policies
//!
//! A policy is the reactive part of an agent: given a snapshot of the
//! contract and the message being delivered (`None` for the opening step
//! after submission) it returns the effects to apply. Policies run on
//! worker threads under the contract's lease and must be deterministic for
//! identical inputs.

use crate::effect::Effect;
use crate::message::{Message, OutboundMessage};
use scaf_contract::ContractView;
use scaf_core::{ContractEvent, Document, Fields, Performative, Reflect};

/// Capability to react to a contract and a message
pub trait AgentPolicy: Send + Sync {
    /// Compute effects for one delivery
    fn step(&self, contract: &ContractView, message: Option<&Message>) -> Vec<Effect>;
}

impl<F> AgentPolicy for F
where
    F: Fn(&ContractView, Option<&Message>) -> Vec<Effect> + Send + Sync,
{
    fn step(&self, contract: &ContractView, message: Option<&Message>) -> Vec<Effect> {
        self(contract, message)
    }
}

/// Payload key naming the event a directive asks for
pub const ACTION_KEY: &str = "action";

/// Policy that carries out directives
///
/// A message whose payload has an `action` naming a `ContractEvent` proposes
/// that event. Without an `action`, the event implied by the performative
/// (if any) is proposed. An `action` that names no event is answered with
/// `not_understood`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectivePolicy;

impl DirectivePolicy {
    /// Create the policy
    pub fn new() -> Self {
        DirectivePolicy
    }

    fn not_understood(message: &Message, reason: String) -> Effect {
        let payload = Fields::new().with("reason", reason);
        Effect::Emit(OutboundMessage::reply(
            message,
            Performative::NotUnderstood,
            payload,
        ))
    }
}

impl AgentPolicy for DirectivePolicy {
    fn step(&self, _contract: &ContractView, message: Option<&Message>) -> Vec<Effect> {
        let Some(message) = message else {
            return Vec::new();
        };

        match message.payload().get(ACTION_KEY) {
            Some(Document::String(name)) => match ContractEvent::parse(name) {
                Ok(event) => vec![Effect::Transition(event)],
                // never answer a not_understood with another one
                Err(_) if message.performative() == Performative::NotUnderstood => Vec::new(),
                Err(err) => vec![Self::not_understood(message, err.to_string())],
            },
            Some(other) if message.performative() != Performative::NotUnderstood => {
                vec![Self::not_understood(
                    message,
                    format!("'{ACTION_KEY}' must be a string, found {}", other.type_name()),
                )]
            }
            Some(_) => Vec::new(),
            None => message
                .performative()
                .implied_event()
                .map(|event| vec![Effect::Transition(event)])
                .unwrap_or_default(),
        }
    }
}
