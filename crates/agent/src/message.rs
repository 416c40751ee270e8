//! Messages
//!
//! This module defines:
//! - Message: an immutable FIPA ACL message as delivered to a mailbox
//! - OutboundMessage: what a policy or caller asks to send
//!
//! The engine turns an `OutboundMessage` into a `Message` by stamping the
//! sender, its next sequence number, a conversation id and the send time.
//! Payloads are shared (`Arc<Document>`): cloning a message never copies
//! its payload.

use scaf_core::{AgentId, ContractId, Document, Performative, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A delivered message
///
/// Field names on the wire follow the ACL convention (`receiver`,
/// `content`, `conversationId`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    performative: Performative,
    sender: AgentId,
    #[serde(rename = "receiver")]
    recipient: AgentId,
    contract: ContractId,
    #[serde(rename = "content")]
    payload: Arc<Document>,
    seq: u64,
    conversation_id: u64,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    ontology: Option<String>,
    #[serde(default)]
    reply_to: Option<AgentId>,
    #[serde(default)]
    reply_with: Option<String>,
    #[serde(default)]
    in_reply_to: Option<String>,
    #[serde(default)]
    reply_by: Option<Timestamp>,
    sent_at: Timestamp,
}

impl Message {
    /// Stamp an outbound message
    ///
    /// `conversation_id` is used only when the outbound message does not
    /// already belong to a conversation.
    pub fn stamp(
        sender: AgentId,
        seq: u64,
        conversation_id: u64,
        outbound: OutboundMessage,
    ) -> Self {
        Message {
            performative: outbound.performative,
            sender,
            recipient: outbound.recipient,
            contract: outbound.contract,
            payload: outbound.payload,
            seq,
            conversation_id: outbound.conversation_id.unwrap_or(conversation_id),
            protocol: outbound.protocol,
            ontology: outbound.ontology,
            reply_to: outbound.reply_to,
            reply_with: outbound.reply_with,
            in_reply_to: outbound.in_reply_to,
            reply_by: outbound.reply_by,
            sent_at: Timestamp::now(),
        }
    }

    /// Communicative act
    pub fn performative(&self) -> Performative {
        self.performative
    }

    /// Sending agent
    pub fn sender(&self) -> AgentId {
        self.sender
    }

    /// Receiving agent
    pub fn recipient(&self) -> AgentId {
        self.recipient
    }

    /// Target contract
    pub fn contract(&self) -> ContractId {
        self.contract
    }

    /// Payload document
    pub fn payload(&self) -> &Document {
        &self.payload
    }

    /// Shared handle to the payload
    pub fn shared_payload(&self) -> &Arc<Document> {
        &self.payload
    }

    /// Logical timestamp, strictly increasing per sender
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Conversation the message belongs to
    pub fn conversation_id(&self) -> u64 {
        self.conversation_id
    }

    /// Interaction protocol name
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// Ontology of the payload
    pub fn ontology(&self) -> Option<&str> {
        self.ontology.as_deref()
    }

    /// Agent that replies should go to instead of the sender
    pub fn reply_to(&self) -> Option<AgentId> {
        self.reply_to
    }

    /// Tag the sender expects back in `in_reply_to`
    pub fn reply_with(&self) -> Option<&str> {
        self.reply_with.as_deref()
    }

    /// Tag of the message this one answers
    pub fn in_reply_to(&self) -> Option<&str> {
        self.in_reply_to.as_deref()
    }

    /// Deadline after which the message is stale
    pub fn reply_by(&self) -> Option<Timestamp> {
        self.reply_by
    }

    /// Wall-clock send time
    pub fn sent_at(&self) -> Timestamp {
        self.sent_at
    }

    /// Check whether the reply-by deadline passed before `now`
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.reply_by.map_or(false, |deadline| deadline.has_passed(now))
    }
}

/// A message to be sent
///
/// Built with `new` and the `with_*` methods; sender, sequence number and
/// send time are filled in on delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Communicative act
    pub performative: Performative,
    /// Receiving agent
    pub recipient: AgentId,
    /// Target contract
    pub contract: ContractId,
    /// Payload document
    pub payload: Arc<Document>,
    /// Existing conversation to continue (`None` opens a new one)
    pub conversation_id: Option<u64>,
    /// Interaction protocol name
    pub protocol: Option<String>,
    /// Ontology of the payload
    pub ontology: Option<String>,
    /// Agent replies should go to
    pub reply_to: Option<AgentId>,
    /// Tag expected back in replies
    pub reply_with: Option<String>,
    /// Tag of the message being answered
    pub in_reply_to: Option<String>,
    /// Deadline after which the message is stale
    pub reply_by: Option<Timestamp>,
}

impl OutboundMessage {
    /// Create a message with a null payload
    pub fn new(performative: Performative, recipient: AgentId, contract: ContractId) -> Self {
        OutboundMessage {
            performative,
            recipient,
            contract,
            payload: Arc::new(Document::Null),
            conversation_id: None,
            protocol: None,
            ontology: None,
            reply_to: None,
            reply_with: None,
            in_reply_to: None,
            reply_by: None,
        }
    }

    /// Answer `message`
    ///
    /// Addresses the original sender (or its `reply_to`), stays in the same
    /// contract and conversation, and echoes `reply_with` as `in_reply_to`.
    pub fn reply(
        message: &Message,
        performative: Performative,
        payload: impl Into<Document>,
    ) -> Self {
        OutboundMessage {
            performative,
            recipient: message.reply_to.unwrap_or(message.sender),
            contract: message.contract,
            payload: Arc::new(payload.into()),
            conversation_id: Some(message.conversation_id),
            protocol: message.protocol.clone(),
            ontology: message.ontology.clone(),
            reply_to: None,
            reply_with: None,
            in_reply_to: message.reply_with.clone(),
            reply_by: None,
        }
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: impl Into<Document>) -> Self {
        self.payload = Arc::new(payload.into());
        self
    }

    /// Share an existing payload
    pub fn with_shared_payload(mut self, payload: Arc<Document>) -> Self {
        self.payload = payload;
        self
    }

    /// Continue an existing conversation
    pub fn with_conversation(mut self, conversation_id: u64) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    /// Set the protocol
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Set the ontology
    pub fn with_ontology(mut self, ontology: impl Into<String>) -> Self {
        self.ontology = Some(ontology.into());
        self
    }

    /// Redirect replies to another agent
    pub fn with_reply_to(mut self, agent: AgentId) -> Self {
        self.reply_to = Some(agent);
        self
    }

    /// Ask for replies tagged with `tag`
    pub fn with_reply_with(mut self, tag: impl Into<String>) -> Self {
        self.reply_with = Some(tag.into());
        self
    }

    /// Mark as the answer to `tag`
    pub fn with_in_reply_to(mut self, tag: impl Into<String>) -> Self {
        self.in_reply_to = Some(tag.into());
        self
    }

    /// Set the reply-by deadline
    pub fn with_reply_by(mut self, deadline: Timestamp) -> Self {
        self.reply_by = Some(deadline);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaf_core::Fields;

    fn request() -> Message {
        let outbound =
            OutboundMessage::new(Performative::Request, AgentId::new(), ContractId::new())
                .with_payload(Fields::new().with("action", "Accept"))
                .with_protocol("fipa-request")
                .with_reply_with("r-1");
        Message::stamp(AgentId::new(), 1, 77, outbound)
    }

    #[test]
    fn test_stamp_fills_envelope_fields() {
        let msg = request();
        assert_eq!(msg.seq(), 1);
        assert_eq!(msg.conversation_id(), 77);
        assert_eq!(msg.protocol(), Some("fipa-request"));
        assert_eq!(msg.payload().get("action").and_then(Document::as_str), Some("Accept"));
    }

    #[test]
    fn test_stamp_keeps_existing_conversation() {
        let outbound = OutboundMessage::new(Performative::Inform, AgentId::new(), ContractId::new())
            .with_conversation(5);
        assert_eq!(Message::stamp(AgentId::new(), 1, 99, outbound).conversation_id(), 5);
    }

    #[test]
    fn test_reply_addresses_sender() {
        let msg = request();
        let reply = OutboundMessage::reply(&msg, Performative::Agree, Document::Null);
        assert_eq!(reply.recipient, msg.sender());
        assert_eq!(reply.contract, msg.contract());
        assert_eq!(reply.conversation_id, Some(77));
        assert_eq!(reply.in_reply_to.as_deref(), Some("r-1"));
        assert_eq!(reply.protocol.as_deref(), Some("fipa-request"));
    }

    #[test]
    fn test_reply_honours_reply_to() {
        let delegate = AgentId::new();
        let outbound =
            OutboundMessage::new(Performative::Request, AgentId::new(), ContractId::new())
                .with_reply_to(delegate);
        let msg = Message::stamp(AgentId::new(), 1, 1, outbound);
        let reply = OutboundMessage::reply(&msg, Performative::Refuse, ());
        assert_eq!(reply.recipient, delegate);
    }

    #[test]
    fn test_expiry() {
        let deadline = Timestamp::from_micros(1_000);
        let outbound = OutboundMessage::new(Performative::Cancel, AgentId::new(), ContractId::new())
            .with_reply_by(deadline);
        let msg = Message::stamp(AgentId::new(), 1, 1, outbound);
        assert!(!msg.is_expired(Timestamp::from_micros(1_000)));
        assert!(msg.is_expired(Timestamp::from_micros(1_001)));
        assert!(!request().is_expired(Timestamp::MAX));
    }

    #[test]
    fn test_clone_shares_payload() {
        let msg = request();
        let copy = msg.clone();
        assert!(Arc::ptr_eq(msg.shared_payload(), copy.shared_payload()));
    }
}
