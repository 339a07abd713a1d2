//! Deal operations over the document store (application-level orchestration).
//!
//! Every transition runs the same pipeline:
//!
//! ```text
//! operation
//!   ↓
//! 1. Read the opportunity document (and its revision)
//!   ↓
//! 2. Check it belongs to the consultant/client in the context
//!   ↓
//! 3. Decide events (pure; validation and invariants, no mutation)
//!   ↓
//! 4. Apply them and write the whole document back, CAS on the revision
//!   ↓
//! 5. Publish the events to the bus
//! ```
//!
//! A rejected operation never reaches step 4, so the stored opportunity is
//! exactly as it was. A lost CAS is reported as [`DealError::Conflict`] and
//! the caller may simply call again: the retry re-reads and re-decides. An id
//! that is already taken is [`DealError::AlreadyExists`] and never retryable.
//!
//! Once the write in step 4 lands the operation has succeeded. A bus failure
//! in step 5 is logged and the updated opportunity is still returned.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use dealflow_commission::{
    compute_commission, CommissionBreakdown, CommissionInputs, CommissionSummary, CommissionTerms, PaymentReceipt,
};
use dealflow_core::{Aggregate, AggregateRoot, ClientId, ConsultantId, DomainError, ExpectedVersion, OfferId, OpportunityId};
use dealflow_deals::{
    AcceptOffer, CompleteEscritura, CounterOffer, CpcvDraft, DocumentStatus, DocumentType, EscrituraDraft,
    ExpireOffers, FinancingMilestone, MarkFellThrough, Offer, OfferTerms, OpenOpportunity, Opportunity,
    OpportunityCommand, OpportunityEvent, PipelineStage, PrepareCpcv, PrepareEscritura, RecordCommissionPayment,
    RecordFinancingMilestone, RejectOffer, RevertCommissionPayment, SetDocumentStatus, SetFinancing,
    SetPipelineStage, SignCpcv, SubmitOffer, UpdateCommissionTerms, UpdateFinancingDetails, Viewing,
};
use dealflow_events::{Event, EventBus, EventEnvelope};

use crate::config::DealSettings;
use crate::document_store::{opportunity_path, DocumentStore, SetOptions, StoreError};

#[derive(Debug, Error)]
pub enum DealError {
    /// A single input is missing or out of range. Nothing was written.
    #[error("validation failed: {0}")]
    Validation(String),
    /// The opportunity's state forbids the transition. Nothing was written.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Another write landed first (CAS lost).
    #[error("conflict: {0}")]
    Conflict(String),
    /// The opportunity or offer id is already taken. Nothing was written.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("persistence failure: {0}")]
    Persistence(StoreError),
    #[error("stored opportunity could not be decoded: {0}")]
    Deserialize(String),
    #[error("opportunity could not be encoded: {0}")]
    Serialize(String),
    /// Handing an event to the bus failed. The write it follows has landed.
    #[error("event publication failed after write: {0}")]
    Publish(String),
    /// The document exists but belongs to another consultant or client.
    #[error("scope violation: {0}")]
    ScopeViolation(String),
}

impl DealError {
    /// Transient failures a caller may retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DealError::Conflict(_) | DealError::Persistence(_)
        )
    }
}

impl From<StoreError> for DealError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict { .. } => DealError::Conflict(value.to_string()),
            StoreError::Missing(path) => DealError::NotFound(path),
            other => DealError::Persistence(other),
        }
    }
}

impl From<DomainError> for DealError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DealError::Validation(msg),
            DomainError::InvariantViolation(msg) => DealError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => DealError::Validation(msg),
            DomainError::NotFound(msg) => DealError::NotFound(msg),
            DomainError::Conflict(msg) => DealError::AlreadyExists(msg),
        }
    }
}

/// Who owns the opportunity being operated on. Threaded explicitly into every
/// call; the service never assumes a current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealContext {
    pub consultant_id: ConsultantId,
    pub client_id: ClientId,
    pub opportunity_id: OpportunityId,
}

impl DealContext {
    pub fn new(consultant_id: ConsultantId, client_id: ClientId, opportunity_id: OpportunityId) -> Self {
        Self {
            consultant_id,
            client_id,
            opportunity_id,
        }
    }

    pub fn path(&self) -> String {
        opportunity_path(self.consultant_id, self.client_id, self.opportunity_id)
    }
}

/// Partial update of the marketing counters; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketingUpdate {
    pub viewings: Option<u32>,
    pub inquiries: Option<u32>,
    pub days_on_market: Option<u32>,
}

/// One method per deal operation, each returning the updated opportunity.
#[derive(Debug)]
pub struct DealService<S, B> {
    store: S,
    bus: B,
    settings: DealSettings,
}

impl<S, B> DealService<S, B> {
    pub fn new(store: S, bus: B, settings: DealSettings) -> Self {
        Self { store, bus, settings }
    }

    pub fn settings(&self) -> &DealSettings {
        &self.settings
    }
}

/// Commission preview without touching any opportunity.
pub fn preview_commission(inputs: &CommissionInputs) -> Result<CommissionBreakdown, DealError> {
    Ok(compute_commission(&inputs.normalized())?)
}

impl<S, B> DealService<S, B>
where
    S: DocumentStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    // ---- reads ----

    pub fn get_opportunity(&self, ctx: &DealContext) -> Result<Opportunity, DealError> {
        self.load(ctx)?
            .map(|(opportunity, _)| opportunity)
            .ok_or_else(|| DealError::NotFound(format!("opportunity {}", ctx.opportunity_id)))
    }

    pub fn commission_summary(&self, ctx: &DealContext) -> Result<CommissionSummary, DealError> {
        let opportunity = self.get_opportunity(ctx)?;
        opportunity
            .commission()
            .map(|c| c.summary())
            .ok_or_else(|| DealError::NotFound("commission: no offer has been accepted".to_string()))
    }

    /// Open offers, best first. Advisory only.
    pub fn rank_offers(&self, ctx: &DealContext) -> Result<Vec<Offer>, DealError> {
        let opportunity = self.get_opportunity(ctx)?;
        Ok(opportunity.ranked_offers().into_iter().cloned().collect())
    }

    // ---- listing ----

    pub fn open_opportunity(
        &self,
        ctx: &DealContext,
        asking_price: Decimal,
        property_ref: Option<String>,
    ) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::OpenOpportunity(OpenOpportunity {
                opportunity_id: ctx.opportunity_id,
                consultant_id: ctx.consultant_id,
                client_id: ctx.client_id,
                asking_price,
                property_ref,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn set_pipeline_stage(&self, ctx: &DealContext, stage: PipelineStage) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::SetPipelineStage(SetPipelineStage {
                opportunity_id: ctx.opportunity_id,
                stage,
                occurred_at: Utc::now(),
            }),
        )
    }

    // ---- negotiation ----

    pub fn submit_offer(&self, ctx: &DealContext, offer_id: OfferId, terms: OfferTerms) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::SubmitOffer(SubmitOffer {
                opportunity_id: ctx.opportunity_id,
                offer_id,
                terms,
                occurred_at: Utc::now(),
            }),
        )
    }

    /// Accept an offer. Without explicit terms the configured default rates apply.
    pub fn accept_offer(
        &self,
        ctx: &DealContext,
        offer_id: OfferId,
        commission_terms: Option<CommissionTerms>,
    ) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::AcceptOffer(AcceptOffer {
                opportunity_id: ctx.opportunity_id,
                offer_id,
                commission_terms: commission_terms.unwrap_or_else(|| self.settings.default_commission.clone()),
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn reject_offer(&self, ctx: &DealContext, offer_id: OfferId, reason: &str) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::RejectOffer(RejectOffer {
                opportunity_id: ctx.opportunity_id,
                offer_id,
                reason: reason.to_string(),
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn counter_offer(
        &self,
        ctx: &DealContext,
        offer_id: OfferId,
        counter_amount: Decimal,
        counter_conditions: BTreeSet<String>,
    ) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::CounterOffer(CounterOffer {
                opportunity_id: ctx.opportunity_id,
                offer_id,
                counter_amount,
                counter_conditions,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn expire_offers(&self, ctx: &DealContext, now: DateTime<Utc>) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::ExpireOffers(ExpireOffers {
                opportunity_id: ctx.opportunity_id,
                occurred_at: now,
            }),
        )
    }

    // ---- transaction progression ----

    pub fn prepare_cpcv(&self, ctx: &DealContext, draft: CpcvDraft) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::PrepareCpcv(PrepareCpcv {
                opportunity_id: ctx.opportunity_id,
                draft,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn sign_cpcv(&self, ctx: &DealContext) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::SignCpcv(SignCpcv {
                opportunity_id: ctx.opportunity_id,
                enforce_required_documents: self.settings.enforce_required_documents,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn prepare_escritura(&self, ctx: &DealContext, draft: EscrituraDraft) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::PrepareEscritura(PrepareEscritura {
                opportunity_id: ctx.opportunity_id,
                draft,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn complete_escritura(
        &self,
        ctx: &DealContext,
        registration_number: Option<String>,
    ) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::CompleteEscritura(CompleteEscritura {
                opportunity_id: ctx.opportunity_id,
                registration_number,
                enforce_required_documents: self.settings.enforce_required_documents,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn mark_fell_through(&self, ctx: &DealContext, reason: &str) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::MarkFellThrough(MarkFellThrough {
                opportunity_id: ctx.opportunity_id,
                reason: reason.to_string(),
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn set_document_status(
        &self,
        ctx: &DealContext,
        doc_type: DocumentType,
        status: DocumentStatus,
        notes: Option<String>,
    ) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::SetDocumentStatus(SetDocumentStatus {
                opportunity_id: ctx.opportunity_id,
                doc_type,
                status,
                notes,
                occurred_at: Utc::now(),
            }),
        )
    }

    // ---- financing ----

    pub fn set_financing(&self, ctx: &DealContext, enabled: bool) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::SetFinancing(SetFinancing {
                opportunity_id: ctx.opportunity_id,
                enabled,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn update_financing_details(
        &self,
        ctx: &DealContext,
        bank_name: Option<String>,
        approval_amount: Option<Decimal>,
    ) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::UpdateFinancingDetails(UpdateFinancingDetails {
                opportunity_id: ctx.opportunity_id,
                bank_name,
                approval_amount,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn record_financing_milestone(
        &self,
        ctx: &DealContext,
        milestone: FinancingMilestone,
        done: bool,
        date: Option<DateTime<Utc>>,
    ) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::RecordFinancingMilestone(RecordFinancingMilestone {
                opportunity_id: ctx.opportunity_id,
                milestone,
                done,
                date,
                occurred_at: Utc::now(),
            }),
        )
    }

    // ---- commission ----

    pub fn update_commission_terms(&self, ctx: &DealContext, inputs: CommissionInputs) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::UpdateCommissionTerms(UpdateCommissionTerms {
                opportunity_id: ctx.opportunity_id,
                inputs,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn record_commission_payment(&self, ctx: &DealContext, receipt: PaymentReceipt) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::RecordCommissionPayment(RecordCommissionPayment {
                opportunity_id: ctx.opportunity_id,
                receipt,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn revert_commission_payment(&self, ctx: &DealContext) -> Result<Opportunity, DealError> {
        self.execute(
            ctx,
            OpportunityCommand::RevertCommissionPayment(RevertCommissionPayment {
                opportunity_id: ctx.opportunity_id,
                occurred_at: Utc::now(),
            }),
        )
    }

    // ---- collaborator writes ----

    /// Append a viewing record to the opportunity document.
    pub fn record_viewing(&self, ctx: &DealContext, viewing: Viewing) -> Result<Opportunity, DealError> {
        let visitor = viewing.visitor.trim().to_string();
        if visitor.is_empty() {
            return Err(DealError::Validation("visitor is required".to_string()));
        }
        self.get_opportunity(ctx)?;

        let item = serde_json::to_value(Viewing { visitor, ..viewing })
            .map_err(|e| DealError::Serialize(e.to_string()))?;
        let revision = self.store.append_to_list(&ctx.path(), "viewings", item)?;
        info!(opportunity_id = %ctx.opportunity_id, revision, "viewing recorded");

        self.get_opportunity(ctx)
    }

    /// Merge-write the marketing counters.
    pub fn update_marketing_counters(&self, ctx: &DealContext, update: MarketingUpdate) -> Result<Opportunity, DealError> {
        self.get_opportunity(ctx)?;

        let mut counters = Map::new();
        if let Some(v) = update.viewings {
            counters.insert("viewings".to_string(), v.into());
        }
        if let Some(v) = update.inquiries {
            counters.insert("inquiries".to_string(), v.into());
        }
        if let Some(v) = update.days_on_market {
            counters.insert("days_on_market".to_string(), v.into());
        }
        if counters.is_empty() {
            return self.get_opportunity(ctx);
        }

        let mut patch = Map::new();
        patch.insert("marketing".to_string(), JsonValue::Object(counters));
        let revision = self
            .store
            .set(&ctx.path(), JsonValue::Object(patch), SetOptions::merge())?;
        info!(opportunity_id = %ctx.opportunity_id, revision, "marketing counters updated");

        self.get_opportunity(ctx)
    }

    // ---- pipeline ----

    fn load(&self, ctx: &DealContext) -> Result<Option<(Opportunity, u64)>, DealError> {
        let Some(doc) = self.store.get(&ctx.path())? else {
            return Ok(None);
        };
        let opportunity: Opportunity =
            serde_json::from_value(doc.record).map_err(|e| DealError::Deserialize(e.to_string()))?;
        ensure_scope(ctx, &opportunity)?;
        Ok(Some((opportunity, doc.revision)))
    }

    fn execute(&self, ctx: &DealContext, command: OpportunityCommand) -> Result<Opportunity, DealError> {
        let operation = command.name();

        // 1-2) Read and scope-check
        let (mut opportunity, expected) = match self.load(ctx)? {
            Some((opportunity, revision)) => (opportunity, ExpectedVersion::Exact(revision)),
            None => (Opportunity::empty(ctx.opportunity_id), ExpectedVersion::Absent),
        };

        // 3) Decide (no mutation)
        let decided = match opportunity.handle(&command) {
            Ok(events) => events,
            Err(err) => {
                debug!(opportunity_id = %ctx.opportunity_id, operation, error = %err, "operation rejected");
                return Err(err.into());
            }
        };
        if decided.is_empty() {
            return Ok(opportunity);
        }

        // 4) Apply and write back (CAS)
        let base_version = opportunity.version();
        for event in &decided {
            opportunity.apply(event);
        }
        let record = serde_json::to_value(&opportunity).map_err(|e| DealError::Serialize(e.to_string()))?;
        let revision = match self.store.set(&ctx.path(), record, SetOptions::replace(expected)) {
            Ok(revision) => revision,
            Err(err) => {
                debug!(opportunity_id = %ctx.opportunity_id, operation, error = %err, "write failed");
                return Err(err.into());
            }
        };

        for event in &decided {
            let missing = event.missing_documents();
            if !missing.is_empty() {
                let missing: Vec<&str> = missing.iter().map(|t| t.as_str()).collect();
                warn!(
                    opportunity_id = %ctx.opportunity_id,
                    event_type = event.event_type(),
                    missing = ?missing,
                    "stage committed with required documents missing"
                );
            }
        }

        info!(
            opportunity_id = %ctx.opportunity_id,
            operation,
            events = decided.len(),
            revision,
            "opportunity updated"
        );

        // 5) Publish (after the write)
        if let Err(err) = self.publish(ctx, base_version, &decided) {
            warn!(
                opportunity_id = %ctx.opportunity_id,
                operation,
                revision,
                error = %err,
                "events not published; the write stands"
            );
        }

        Ok(opportunity)
    }

    fn publish(&self, ctx: &DealContext, base_version: u64, events: &[OpportunityEvent]) -> Result<(), DealError> {
        for (offset, event) in events.iter().enumerate() {
            let payload = serde_json::to_value(event).map_err(|e| DealError::Serialize(e.to_string()))?;
            let envelope = EventEnvelope::new(
                Uuid::now_v7(),
                ctx.consultant_id,
                ctx.opportunity_id,
                event.event_type(),
                base_version + offset as u64 + 1,
                event.occurred_at(),
                payload,
            );
            self.bus
                .publish(envelope)
                .map_err(|e| DealError::Publish(format!("{e:?}")))?;
        }
        Ok(())
    }
}

fn ensure_scope(ctx: &DealContext, opportunity: &Opportunity) -> Result<(), DealError> {
    if opportunity.id_typed() != ctx.opportunity_id {
        return Err(DealError::ScopeViolation(format!(
            "document at {} holds opportunity {}",
            ctx.path(),
            opportunity.id_typed()
        )));
    }
    if opportunity.consultant_id() != Some(ctx.consultant_id) || opportunity.client_id() != Some(ctx.client_id) {
        return Err(DealError::ScopeViolation(format!(
            "opportunity {} belongs to another consultant or client",
            ctx.opportunity_id
        )));
    }
    Ok(())
}
