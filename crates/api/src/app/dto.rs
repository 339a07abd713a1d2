use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use dealflow_commission::CommissionTerms;
use dealflow_core::OfferId;
use dealflow_deals::{DocumentStatus, FinancingMilestone, Offer, OfferTerms, PipelineStage};
use dealflow_events::EventEnvelope;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct OpenOpportunityRequest {
    pub asking_price: Decimal,
    #[serde(default)]
    pub property_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStageRequest {
    pub stage: PipelineStage,
}

#[derive(Debug, Deserialize)]
pub struct SubmitOfferRequest {
    /// Caller-chosen id; generated when absent.
    #[serde(default)]
    pub offer_id: Option<OfferId>,
    #[serde(flatten)]
    pub terms: OfferTerms,
}

#[derive(Debug, Default, Deserialize)]
pub struct AcceptOfferRequest {
    #[serde(default)]
    pub commission_terms: Option<CommissionTerms>,
}

#[derive(Debug, Deserialize)]
pub struct RejectOfferRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CounterOfferRequest {
    pub counter_amount: Decimal,
    #[serde(default)]
    pub counter_conditions: BTreeSet<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpireOffersRequest {
    /// Reference instant; defaults to the server clock.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteEscrituraRequest {
    #[serde(default)]
    pub registration_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FellThroughRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct DocumentStatusRequest {
    pub status: DocumentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetFinancingRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct FinancingDetailsRequest {
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub approval_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct FinancingMilestoneRequest {
    pub milestone: FinancingMilestone,
    pub done: bool,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn ranked_offers_to_json(offers: &[Offer]) -> JsonValue {
    serde_json::json!({
        "count": offers.len(),
        "offers": offers
            .iter()
            .enumerate()
            .map(|(i, offer)| serde_json::json!({
                "rank": i + 1,
                "offer": offer,
            }))
            .collect::<Vec<_>>(),
    })
}

pub fn envelope_to_json(envelope: &EventEnvelope<JsonValue>) -> JsonValue {
    serde_json::json!({
        "event_id": envelope.event_id().to_string(),
        "event_type": envelope.event_type(),
        "opportunity_id": envelope.opportunity_id().to_string(),
        "sequence_number": envelope.sequence_number(),
        "occurred_at": envelope.occurred_at().to_rfc3339(),
        "payload": envelope.payload(),
    })
}
