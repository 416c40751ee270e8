//! Contract states and events
//!
//! The symbols here are shared by every layer: the state machine in
//! `scaf-contract` owns the transition table, the engine logs them, and
//! contract snapshots encode them by name.

use crate::reflect_enum;

reflect_enum! {
    /// Lifecycle state of a contract
    ///
    /// `Rejected`, `Settled` and `Aborted` are terminal: a contract in one of
    /// them accepts no further events.
    pub enum ContractState: "ContractState" {
        /// Initial state after the proposal is recorded
        Proposed => "Proposed",
        /// Terms are being countered
        Negotiating => "Negotiating",
        /// Terms agreed, work not started
        Accepted => "Accepted",
        /// Proposal turned down (terminal)
        Rejected => "Rejected",
        /// Work in progress
        Executing => "Executing",
        /// Work completed (terminal)
        Settled => "Settled",
        /// Work failed or the contract was faulted (terminal)
        Aborted => "Aborted",
    }
}

impl ContractState {
    /// State every contract starts in
    pub const INITIAL: ContractState = ContractState::Proposed;

    /// Check whether the state freezes the contract
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ContractState::Rejected | ContractState::Settled | ContractState::Aborted
        )
    }
}

reflect_enum! {
    /// An event that drives a contract from one state to another
    pub enum ContractEvent: "ContractEvent" {
        /// Create the contract in `Proposed`
        Propose => "Propose",
        /// Counter the current terms
        CounterOffer => "CounterOffer",
        /// Agree to the current terms
        Accept => "Accept",
        /// Turn the proposal down
        Reject => "Reject",
        /// Start the agreed work
        Begin => "Begin",
        /// Finish the work successfully
        Complete => "Complete",
        /// Give up on the work
        Fail => "Fail",
    }
}
