use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Company;
use crate::kernel::publisher::OutboundEvent;

/// Subject every company command event is published on.
pub const COMMAND_SUBJECT: &str = "companies.commands";

/// The mutation an event announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOp {
    Insert,
    Update,
    Delete,
}

impl EventOp {
    /// Static routing table from op to subject.
    pub fn subject(self) -> &'static str {
        match self {
            EventOp::Insert => COMMAND_SUBJECT,
            EventOp::Update => COMMAND_SUBJECT,
            EventOp::Delete => COMMAND_SUBJECT,
        }
    }
}

impl std::fmt::Display for EventOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventOp::Insert => write!(f, "insert"),
            EventOp::Update => write!(f, "update"),
            EventOp::Delete => write!(f, "delete"),
        }
    }
}

/// A company mutation as seen by downstream consumers.
///
/// The payload is the company's own fields plus `op`. The event id is not part
/// of the payload; it travels as the message id so that a retried send of the
/// same event is deduplicated by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyEvent {
    #[serde(skip)]
    event_id: String,
    #[serde(flatten)]
    company: Company,
    op: EventOp,
}

impl CompanyEvent {
    pub fn new(company: Company, op: EventOp) -> Self {
        Self {
            event_id: Uuid::now_v7().to_string(),
            company,
            op,
        }
    }

    pub fn company(&self) -> &Company {
        &self.company
    }

    pub fn op(&self) -> EventOp {
        self.op
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }
}

impl OutboundEvent for CompanyEvent {
    fn subject(&self) -> &str {
        self.op.subject()
    }

    fn key(&self) -> &str {
        &self.company.id
    }

    fn message_id(&self) -> &str {
        &self.event_id
    }

    fn payload(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}
