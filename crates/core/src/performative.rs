//! FIPA ACL performatives
//!
//! Every message carries the communicative act it performs. Wire names are
//! the snake_case FIPA names (`accept_proposal`, `call_for_proposal`, ...).

use crate::reflect_enum;
use crate::state::ContractEvent;

reflect_enum! {
    /// Communicative act of a message
    pub enum Performative: "Performative" {
        /// Accept a previously submitted proposal
        AcceptProposal => "accept_proposal",
        /// Agree to perform an action
        Agree => "agree",
        /// Cancel a previously requested action
        Cancel => "cancel",
        /// Call for proposals
        CallForProposal => "call_for_proposal",
        /// Confirm a proposition
        Confirm => "confirm",
        /// Disconfirm a proposition
        Disconfirm => "disconfirm",
        /// An attempted action failed
        Failure => "failure",
        /// Inform that a proposition is true
        Inform => "inform",
        /// Inform whether a proposition is true
        InformIf => "inform_if",
        /// Inform the object matching a description
        InformRef => "inform_ref",
        /// The received message was not understood
        NotUnderstood => "not_understood",
        /// Forward to agents matching a description
        Propagate => "propagate",
        /// Submit a proposal
        Propose => "propose",
        /// Relay to selected agents
        Proxy => "proxy",
        /// Ask whether a proposition is true
        QueryIf => "query_if",
        /// Ask for the object matching a description
        QueryRef => "query_ref",
        /// Refuse to perform an action
        Refuse => "refuse",
        /// Reject a proposal
        RejectProposal => "reject_proposal",
        /// Request an action
        Request => "request",
        /// Request an action once a condition holds
        RequestWhen => "request_when",
        /// Request an action whenever a condition holds
        RequestWhenever => "request_whenever",
        /// Subscribe to changes of a value
        Subscribe => "subscribe",
    }
}

impl Performative {
    /// Contract event this act implies, if any
    ///
    /// Used by the directive policy when a payload carries no explicit
    /// `action`.
    pub fn implied_event(&self) -> Option<ContractEvent> {
        match self {
            Performative::AcceptProposal => Some(ContractEvent::Accept),
            Performative::RejectProposal | Performative::Refuse => Some(ContractEvent::Reject),
            Performative::Propose => Some(ContractEvent::CounterOffer),
            Performative::Agree => Some(ContractEvent::Begin),
            Performative::Confirm => Some(ContractEvent::Complete),
            Performative::Failure => Some(ContractEvent::Fail),
            _ => None,
        }
    }
}
