//! Agents
//!
//! An agent couples an identity, a bounded mailbox and a policy. It also
//! owns the two counters that stamp its outgoing messages: the sequence
//! clock (strictly increasing) and the conversation id generator, which
//! starts at a random offset so ids from different agents rarely collide.

use crate::effect::Effect;
use crate::mailbox::Mailbox;
use crate::message::{Message, OutboundMessage};
use crate::policy::AgentPolicy;
use scaf_contract::ContractView;
use scaf_core::AgentId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A registered participant
pub struct Agent {
    id: AgentId,
    name: String,
    mailbox: Mailbox,
    policy: Arc<dyn AgentPolicy>,
    seq: AtomicU64,
    next_conversation: AtomicU64,
}

impl Agent {
    /// Create an agent with an empty mailbox of `mailbox_capacity`
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        policy: Arc<dyn AgentPolicy>,
        mailbox_capacity: usize,
    ) -> Self {
        Agent {
            id,
            name: name.into(),
            mailbox: Mailbox::new(id, mailbox_capacity),
            policy,
            seq: AtomicU64::new(0),
            next_conversation: AtomicU64::new(u64::from(rand::random::<u32>())),
        }
    }

    /// Agent id
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Incoming messages
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// A fresh conversation id
    pub fn new_conversation(&self) -> u64 {
        self.next_conversation.fetch_add(1, Ordering::Relaxed)
    }

    /// Last sequence number handed out (0 before the first message)
    pub fn last_seq(&self) -> u64 {
        self.seq.load(Ordering::Acquire)
    }

    /// Turn an outbound message into one sent by this agent
    pub fn stamp(&self, outbound: OutboundMessage) -> Message {
        let seq = self.seq.fetch_add(1, Ordering::AcqRel) + 1;
        let conversation = match outbound.conversation_id {
            Some(id) => id,
            None => self.new_conversation(),
        };
        Message::stamp(self.id, seq, conversation, outbound)
    }

    /// Invoke the policy
    pub fn step(&self, contract: &ContractView, message: Option<&Message>) -> Vec<Effect> {
        self.policy.step(contract, message)
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mailbox_len", &self.mailbox.len())
            .field("last_seq", &self.last_seq())
            .finish()
    }
}
