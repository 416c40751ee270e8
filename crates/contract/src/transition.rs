//! Transition table
//!
//! | Event          | From                        | To            |
//! |----------------|-----------------------------|---------------|
//! | `Propose`      | (none)                      | `Proposed`    |
//! | `CounterOffer` | `Proposed`, `Negotiating`   | `Negotiating` |
//! | `Accept`       | `Proposed`, `Negotiating`   | `Accepted`    |
//! | `Reject`       | `Proposed`, `Negotiating`   | `Rejected`    |
//! | `Begin`        | `Accepted`                  | `Executing`   |
//! | `Complete`     | `Executing`                 | `Settled`     |
//! | `Fail`         | `Executing`                 | `Aborted`     |
//!
//! `Propose` only creates a contract; it is never permitted from an
//! existing state.

use scaf_core::{ContractEvent, ContractState, Reflect, TransitionError};

const OPEN: &[ContractState] = &[ContractState::Proposed, ContractState::Negotiating];

/// States from which `event` may fire
pub fn sources(event: ContractEvent) -> &'static [ContractState] {
    match event {
        ContractEvent::Propose => &[],
        ContractEvent::CounterOffer | ContractEvent::Accept | ContractEvent::Reject => OPEN,
        ContractEvent::Begin => &[ContractState::Accepted],
        ContractEvent::Complete | ContractEvent::Fail => &[ContractState::Executing],
    }
}

/// State reached when `event` fires
pub fn target(event: ContractEvent) -> ContractState {
    match event {
        ContractEvent::Propose => ContractState::Proposed,
        ContractEvent::CounterOffer => ContractState::Negotiating,
        ContractEvent::Accept => ContractState::Accepted,
        ContractEvent::Reject => ContractState::Rejected,
        ContractEvent::Begin => ContractState::Executing,
        ContractEvent::Complete => ContractState::Settled,
        ContractEvent::Fail => ContractState::Aborted,
    }
}

/// Check whether `event` is permitted from `current`
pub fn is_permitted(current: ContractState, event: ContractEvent) -> bool {
    sources(event).contains(&current)
}

/// Resolve the state `event` leads to from `current`
///
/// Terminal states refuse every event, `Propose` included.
pub fn destination(
    current: ContractState,
    event: ContractEvent,
) -> Result<ContractState, TransitionError> {
    if current.is_terminal() {
        return Err(TransitionError::TerminalState {
            state: current,
            attempted: event,
        });
    }
    if !is_permitted(current, event) {
        return Err(TransitionError::NotPermitted {
            current,
            attempted: event,
        });
    }
    Ok(target(event))
}

/// Events permitted from `current`, in declaration order
pub fn permitted_events(current: ContractState) -> impl Iterator<Item = ContractEvent> {
    ContractEvent::variants()
        .iter()
        .copied()
        .filter(move |event| is_permitted(current, *event))
}
