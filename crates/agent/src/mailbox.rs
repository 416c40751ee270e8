//! Bounded per-agent mailbox
//!
//! Messages are queued per contract so a worker holding one contract only
//! ever takes that contract's messages, in arrival order. The capacity
//! bounds the total across contracts. `enqueue` never blocks: a full
//! mailbox rejects the message with `PostError::MailboxOverflow`.
//!
//! The lock is held only for the queue operation itself, never while a
//! policy runs.

use crate::message::Message;
use parking_lot::Mutex;
use scaf_core::{AgentId, ContractId, PostError};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Bounded FIFO mailbox
#[derive(Debug)]
pub struct Mailbox {
    owner: AgentId,
    capacity: usize,
    inner: Mutex<Queues>,
}

#[derive(Debug, Default)]
struct Queues {
    by_contract: HashMap<ContractId, VecDeque<Message>>,
    len: usize,
}

impl Mailbox {
    /// Create an empty mailbox for `owner`
    pub fn new(owner: AgentId, capacity: usize) -> Self {
        Mailbox {
            owner,
            capacity,
            inner: Mutex::new(Queues::default()),
        }
    }

    /// Maximum number of queued messages
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue a message behind earlier ones for the same contract
    pub fn enqueue(&self, message: Message) -> Result<(), PostError> {
        let mut queues = self.inner.lock();
        if queues.len >= self.capacity {
            debug!(agent = %self.owner, capacity = self.capacity, "mailbox full, message rejected");
            return Err(PostError::MailboxOverflow {
                agent: self.owner,
                capacity: self.capacity,
            });
        }
        queues
            .by_contract
            .entry(message.contract())
            .or_default()
            .push_back(message);
        queues.len += 1;
        Ok(())
    }

    /// Take the oldest message for `contract`
    pub fn dequeue(&self, contract: ContractId) -> Option<Message> {
        let mut queues = self.inner.lock();
        let queue = queues.by_contract.get_mut(&contract)?;
        let message = queue.pop_front();
        if queue.is_empty() {
            queues.by_contract.remove(&contract);
        }
        if message.is_some() {
            queues.len -= 1;
        }
        message
    }

    /// Remove every message for `contract`, oldest first
    pub fn drain_contract(&self, contract: ContractId) -> Vec<Message> {
        let mut queues = self.inner.lock();
        let drained: Vec<Message> = queues
            .by_contract
            .remove(&contract)
            .map(Vec::from)
            .unwrap_or_default();
        queues.len -= drained.len();
        drained
    }

    /// Number of messages queued for `contract`
    pub fn pending_for(&self, contract: ContractId) -> usize {
        self.inner
            .lock()
            .by_contract
            .get(&contract)
            .map_or(0, VecDeque::len)
    }

    /// Total queued messages
    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    /// Check if no message is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
