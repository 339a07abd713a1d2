use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dealflow_core::{ConsultantId, OpportunityId};

/// Envelope for a published event, carrying ownership + stream metadata.
///
/// - `consultant_id` scopes the event to the agent owning the listing, so
///   consumers can filter without decoding the payload.
/// - `sequence_number` is the opportunity version after the event was applied
///   and increases monotonically per opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    consultant_id: ConsultantId,
    opportunity_id: OpportunityId,
    event_type: String,
    sequence_number: u64,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        consultant_id: ConsultantId,
        opportunity_id: OpportunityId,
        event_type: impl Into<String>,
        sequence_number: u64,
        occurred_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            consultant_id,
            opportunity_id,
            event_type: event_type.into(),
            sequence_number,
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn consultant_id(&self) -> ConsultantId {
        self.consultant_id
    }

    pub fn opportunity_id(&self) -> OpportunityId {
        self.opportunity_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
