//! Contract slots and the agent/contract registries
//!
//! Each submitted contract lives in a `ContractSlot`: the contract itself,
//! its pending deliveries in arrival order, and the flags that keep it in
//! the ready queue at most once and leased by at most one worker.
//!
//! Lock order: the schedule lock may be held while pushing to the ready
//! queue. It is never held together with an agent's mailbox lock or the
//! contract lock.

use crate::scheduler::ReadyQueue;
use dashmap::DashMap;
use parking_lot::Mutex;
use scaf_agent::Agent;
use scaf_contract::{Contract, ContractView, LogEntry};
use scaf_core::{AgentId, ContractEvent, ContractId, ContractState, TransitionError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// What a delivery hands to the agent's policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeliveryKind {
    /// First step after submission, no message
    Opening,
    /// The agent's oldest mailbox message for the contract
    Mailbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Delivery {
    pub agent: AgentId,
    pub kind: DeliveryKind,
}

#[derive(Debug, Default)]
struct Schedule {
    deliveries: VecDeque<Delivery>,
    /// Queued in the ready queue or leased by a worker
    scheduled: bool,
}

pub(crate) struct ContractSlot {
    id: ContractId,
    participants: Vec<AgentId>,
    contract: Mutex<Contract>,
    schedule: Mutex<Schedule>,
    holders: AtomicUsize,
    terminal: AtomicBool,
}

impl ContractSlot {
    pub fn new(contract: Contract) -> Self {
        ContractSlot {
            id: contract.id(),
            participants: contract.participants().to_vec(),
            terminal: AtomicBool::new(contract.is_terminal()),
            contract: Mutex::new(contract),
            schedule: Mutex::new(Schedule::default()),
            holders: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> ContractId {
        self.id
    }

    pub fn participants(&self) -> &[AgentId] {
        &self.participants
    }

    pub fn is_participant(&self, agent: AgentId) -> bool {
        self.participants.contains(&agent)
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::Acquire)
    }

    pub fn state(&self) -> ContractState {
        self.contract.lock().state()
    }

    pub fn view(&self) -> ContractView {
        self.contract.lock().view()
    }

    pub fn apply(
        &self,
        event: ContractEvent,
        actor: Option<AgentId>,
    ) -> Result<LogEntry, TransitionError> {
        let mut contract = self.contract.lock();
        let entry = contract.apply(event, actor)?;
        self.terminal.store(contract.is_terminal(), Ordering::Release);
        Ok(entry)
    }

    pub fn force_abort(&self, reason: String) -> Result<LogEntry, TransitionError> {
        let mut contract = self.contract.lock();
        let entry = contract.force_abort(reason)?;
        self.terminal.store(true, Ordering::Release);
        Ok(entry)
    }

    /// Append a delivery; queue the contract unless it already is queued or leased
    pub fn push_delivery(&self, delivery: Delivery, ready: &ReadyQueue) {
        let mut schedule = self.schedule.lock();
        schedule.deliveries.push_back(delivery);
        if !schedule.scheduled {
            schedule.scheduled = true;
            ready.push(self.id);
        }
    }

    pub fn pop_delivery(&self) -> Option<Delivery> {
        self.schedule.lock().deliveries.pop_front()
    }

    pub fn take_deliveries(&self) -> Vec<Delivery> {
        self.schedule.lock().deliveries.drain(..).collect()
    }

    /// Mark the lease taken; returns how many workers held it before
    pub fn acquire(&self) -> usize {
        self.holders.fetch_add(1, Ordering::AcqRel)
    }

    /// Give up the lease, re-queueing at the back if work remains
    pub fn release(&self, ready: &ReadyQueue) -> bool {
        self.holders.fetch_sub(1, Ordering::AcqRel);
        let mut schedule = self.schedule.lock();
        if schedule.deliveries.is_empty() {
            schedule.scheduled = false;
            false
        } else {
            ready.push(self.id);
            true
        }
    }
}

/// Registered agents and submitted contracts
#[derive(Default)]
pub(crate) struct Registry {
    contracts: DashMap<ContractId, Arc<ContractSlot>>,
    agents: DashMap<AgentId, Arc<Agent>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_agent(&self, agent: Agent) -> AgentId {
        let id = agent.id();
        self.agents.insert(id, Arc::new(agent));
        id
    }

    pub fn agent(&self, id: AgentId) -> Option<Arc<Agent>> {
        self.agents.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn has_agent(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn insert_contract(&self, slot: ContractSlot) -> Arc<ContractSlot> {
        let slot = Arc::new(slot);
        self.contracts.insert(slot.id(), Arc::clone(&slot));
        slot
    }

    pub fn contract(&self, id: ContractId) -> Option<Arc<ContractSlot>> {
        self.contracts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contract_ids(&self) -> Vec<ContractId> {
        self.contracts.iter().map(|entry| *entry.key()).collect()
    }

    pub fn contract_count(&self) -> usize {
        self.contracts.len()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaf_agent::DirectivePolicy;
    use scaf_core::Document;

    fn slot() -> ContractSlot {
        ContractSlot::new(Contract::propose(
            ContractId::new(),
            Document::Null,
            [AgentId::new()],
        ))
    }

    #[test]
    fn test_contract_queued_once() {
        let ready = ReadyQueue::new();
        let slot = slot();
        let agent = slot.participants()[0];
        for _ in 0..3 {
            slot.push_delivery(
                Delivery {
                    agent,
                    kind: DeliveryKind::Mailbox,
                },
                &ready,
            );
        }
        assert_eq!(ready.depth(), 1);
    }

    #[test]
    fn test_release_requeues_when_work_remains() {
        let ready = ReadyQueue::new();
        let slot = slot();
        let agent = slot.participants()[0];
        let delivery = Delivery {
            agent,
            kind: DeliveryKind::Opening,
        };
        slot.push_delivery(delivery, &ready);
        slot.push_delivery(delivery, &ready);

        assert_eq!(slot.acquire(), 0);
        assert_eq!(slot.pop_delivery(), Some(delivery));
        assert!(slot.release(&ready));
        assert_eq!(ready.depth(), 2);

        assert_eq!(slot.acquire(), 0);
        slot.pop_delivery();
        assert!(!slot.release(&ready));

        // scheduled flag cleared: the next push queues again
        slot.push_delivery(delivery, &ready);
        assert_eq!(ready.depth(), 3);
    }

    #[test]
    fn test_terminal_flag_follows_contract() {
        let slot = slot();
        assert!(!slot.is_terminal());
        slot.apply(ContractEvent::Reject, None).unwrap();
        assert!(slot.is_terminal());
        assert_eq!(slot.state(), ContractState::Rejected);
        assert!(slot.force_abort("late".into()).is_err());
    }

    #[test]
    fn test_registry_lookups() {
        let registry = Registry::new();
        let id = registry.insert_agent(Agent::new(
            AgentId::new(),
            "a",
            Arc::new(DirectivePolicy),
            4,
        ));
        assert!(registry.has_agent(id));
        assert_eq!(registry.agent(id).map(|a| a.name().to_string()), Some("a".into()));
        assert!(registry.agent(AgentId::new()).is_none());

        let slot = registry.insert_contract(slot());
        assert_eq!(registry.contract_ids(), vec![slot.id()]);
        assert_eq!(registry.contract_count(), 1);
        assert_eq!(registry.agent_count(), 1);
    }
}
