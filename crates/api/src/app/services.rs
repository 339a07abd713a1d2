use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value as JsonValue;

use dealflow_core::ConsultantId;
use dealflow_events::{EventBus, EventEnvelope, InMemoryEventBus};
use dealflow_infra::{DealService, DealSettings, InMemoryDocumentStore};

pub type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
pub type Deals = DealService<Arc<InMemoryDocumentStore>, Bus>;

/// How many published events the activity feed keeps.
const ACTIVITY_CAPACITY: usize = 1024;

/// Bounded, most-recent-last log of published deal events.
#[derive(Debug, Default)]
pub struct ActivityLog {
    inner: Mutex<VecDeque<EventEnvelope<JsonValue>>>,
}

impl ActivityLog {
    pub fn record(&self, envelope: EventEnvelope<JsonValue>) {
        let mut log = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if log.len() == ACTIVITY_CAPACITY {
            log.pop_front();
        }
        log.push_back(envelope);
    }

    /// Newest first, only this consultant's events.
    pub fn for_consultant(&self, consultant_id: ConsultantId, limit: usize) -> Vec<EventEnvelope<JsonValue>> {
        let log = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        log.iter()
            .rev()
            .filter(|e| e.consultant_id() == consultant_id)
            .take(limit)
            .cloned()
            .collect()
    }
}

/// Everything the handlers share.
#[derive(Debug)]
pub struct AppServices {
    deals: Deals,
    activity: Arc<ActivityLog>,
}

impl AppServices {
    pub fn deals(&self) -> &Deals {
        &self.deals
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }
}

/// In-memory wiring: document store + bus, plus a background subscriber
/// feeding the activity log. Must run inside a tokio runtime.
pub fn build_services(settings: DealSettings) -> AppServices {
    let store = Arc::new(InMemoryDocumentStore::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let activity = Arc::new(ActivityLog::default());

    // Background subscriber: bus -> activity log
    {
        let sub = bus.subscribe();
        let activity = activity.clone();
        tokio::task::spawn_blocking(move || {
            while let Ok(envelope) = sub.recv() {
                tracing::debug!(
                    event_type = envelope.event_type(),
                    opportunity_id = %envelope.opportunity_id(),
                    sequence_number = envelope.sequence_number(),
                    "event received"
                );
                activity.record(envelope);
            }
        });
    }

    AppServices {
        deals: DealService::new(store, bus, settings),
        activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use dealflow_core::OpportunityId;
    use serde_json::json;
    use uuid::Uuid;

    fn envelope(consultant_id: ConsultantId, seq: u64) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            consultant_id,
            OpportunityId::new(),
            "deals.offer.submitted",
            seq,
            Utc::now(),
            json!({}),
        )
    }

    #[test]
    fn activity_is_scoped_newest_first_and_bounded() {
        let log = ActivityLog::default();
        let mine = ConsultantId::new();
        let theirs = ConsultantId::new();

        for seq in 1..=(ACTIVITY_CAPACITY as u64 + 5) {
            log.record(envelope(mine, seq));
        }
        log.record(envelope(theirs, 1));

        let recent = log.for_consultant(mine, 3);
        let seqs: Vec<u64> = recent.iter().map(|e| e.sequence_number()).collect();
        assert_eq!(seqs, vec![1029, 1028, 1027]);
        assert_eq!(log.for_consultant(mine, usize::MAX).len(), ACTIVITY_CAPACITY - 1);
        assert_eq!(log.for_consultant(theirs, 10).len(), 1);
    }
}
