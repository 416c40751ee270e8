//! Read-only contract snapshots
//!
//! A `ContractView` is what policies step against and what callers get
//! from the engine. It can be encoded as a `Document` (and from there with
//! the binary codec) using the reflected state and event names:
//!
//! ```text
//! {
//!   "id": "<uuid>",
//!   "state": "Accepted",
//!   "terms": { ... },
//!   "participants": ["<uuid>", ...],
//!   "log": [
//!     {"from": null | "<state>", "to": "<state>", "event": "<event>",
//!      "timestamp": <micros>, "actor": null | "<uuid>", "note": null | "<text>"}
//!   ]
//! }
//! ```

use crate::contract::LogEntry;
use scaf_core::{
    decode_with_limits, encode, AgentId, ContractEvent, ContractId, ContractState, Document,
    Fields, Limits, Reflect, SnapshotError, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Containers the snapshot puts around the terms
const TERMS_NESTING: usize = 1;
// Root mapping, log sequence, entry mapping
const LOG_NESTING: usize = 3;

/// Point-in-time copy of a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractView {
    /// Contract id
    pub id: ContractId,
    /// State at the time of the copy
    pub state: ContractState,
    /// Terms, shared with the live contract
    pub terms: Arc<Document>,
    /// Participants in submission order
    pub participants: Vec<AgentId>,
    /// Transition log, oldest first
    pub log: Vec<LogEntry>,
}

impl ContractView {
    /// Check whether the contract was frozen
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Check whether `agent` takes part in the contract
    pub fn is_participant(&self, agent: AgentId) -> bool {
        self.participants.contains(&agent)
    }

    /// Most recent log entry
    pub fn last_entry(&self) -> Option<&LogEntry> {
        self.log.last()
    }

    /// Encode as a document
    pub fn to_document(&self) -> Document {
        let log = self.log.iter().map(entry_to_document).collect::<Vec<_>>();
        Document::Mapping(
            Fields::new()
                .with("id", self.id.to_string())
                .with("state", self.state.name())
                .with("terms", self.terms.as_ref().clone())
                .with(
                    "participants",
                    self.participants
                        .iter()
                        .map(|a| Document::from(a.to_string()))
                        .collect::<Vec<_>>(),
                )
                .with("log", log),
        )
    }

    /// Encode with the binary codec
    pub fn encode(&self) -> Vec<u8> {
        encode(&self.to_document())
    }

    /// Decode a snapshot whose terms were validated against `limits`
    ///
    /// The nesting limit is widened by the levels the snapshot adds, so
    /// terms accepted at the limit still come back.
    pub fn decode(bytes: &[u8], limits: &Limits) -> Result<Self, SnapshotError> {
        let mut limits = limits.with_extra_depth(TERMS_NESTING);
        limits.max_nesting_depth = limits.max_nesting_depth.max(LOG_NESTING);
        Self::from_document(&decode_with_limits(bytes, &limits)?)
    }

    /// Rebuild from a document produced by `to_document`
    pub fn from_document(doc: &Document) -> Result<Self, SnapshotError> {
        let fields = doc.as_mapping().ok_or(SnapshotError::InvalidField {
            field: "snapshot",
            expected: "mapping",
        })?;

        let id = ContractId::from_string(str_field(fields, "id")?).ok_or(
            SnapshotError::InvalidField {
                field: "id",
                expected: "uuid string",
            },
        )?;
        let state = ContractState::parse(str_field(fields, "state")?)?;
        let terms = fields
            .get("terms")
            .cloned()
            .ok_or(SnapshotError::MissingField("terms"))?;

        let participants = seq_field(fields, "participants")?
            .iter()
            .map(|p| agent_id(p, "participants"))
            .collect::<Result<Vec<_>, _>>()?;

        let log = seq_field(fields, "log")?
            .iter()
            .map(entry_from_document)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ContractView {
            id,
            state,
            terms: Arc::new(terms),
            participants,
            log,
        })
    }
}

fn entry_to_document(entry: &LogEntry) -> Document {
    Document::Mapping(
        Fields::new()
            .with("from", entry.from.map(|s| s.name()))
            .with("to", entry.to.name())
            .with("event", entry.event.name())
            .with("timestamp", entry.timestamp.as_micros() as i64)
            .with("actor", entry.actor.map(|a| a.to_string()))
            .with("note", entry.note.clone()),
    )
}

fn entry_from_document(doc: &Document) -> Result<LogEntry, SnapshotError> {
    let fields = doc.as_mapping().ok_or(SnapshotError::InvalidField {
        field: "log",
        expected: "sequence of mappings",
    })?;

    let from = match opt_str_field(fields, "from")? {
        Some(name) => Some(ContractState::parse(name)?),
        None => None,
    };
    let to = ContractState::parse(str_field(fields, "to")?)?;
    let event = ContractEvent::parse(str_field(fields, "event")?)?;
    let timestamp = fields
        .get("timestamp")
        .ok_or(SnapshotError::MissingField("timestamp"))?
        .as_int()
        .and_then(|t| u64::try_from(t).ok())
        .map(Timestamp::from_micros)
        .ok_or(SnapshotError::InvalidField {
            field: "timestamp",
            expected: "non-negative integer",
        })?;
    let actor = match fields.get("actor") {
        None | Some(Document::Null) => None,
        Some(doc) => Some(agent_id(doc, "actor")?),
    };
    let note = opt_str_field(fields, "note")?.map(str::to_string);

    Ok(LogEntry {
        from,
        to,
        event,
        timestamp,
        actor,
        note,
    })
}

fn str_field<'a>(fields: &'a Fields, field: &'static str) -> Result<&'a str, SnapshotError> {
    fields
        .get(field)
        .ok_or(SnapshotError::MissingField(field))?
        .as_str()
        .ok_or(SnapshotError::InvalidField {
            field,
            expected: "string",
        })
}

fn opt_str_field<'a>(
    fields: &'a Fields,
    field: &'static str,
) -> Result<Option<&'a str>, SnapshotError> {
    match fields.get(field) {
        None | Some(Document::Null) => Ok(None),
        Some(Document::String(s)) => Ok(Some(s)),
        Some(_) => Err(SnapshotError::InvalidField {
            field,
            expected: "string or null",
        }),
    }
}

fn seq_field<'a>(fields: &'a Fields, field: &'static str) -> Result<&'a [Document], SnapshotError> {
    fields
        .get(field)
        .ok_or(SnapshotError::MissingField(field))?
        .as_sequence()
        .ok_or(SnapshotError::InvalidField {
            field,
            expected: "sequence",
        })
}

fn agent_id(doc: &Document, field: &'static str) -> Result<AgentId, SnapshotError> {
    doc.as_str()
        .and_then(AgentId::from_string)
        .ok_or(SnapshotError::InvalidField {
            field,
            expected: "uuid string",
        })
}
