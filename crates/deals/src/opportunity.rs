use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealflow_commission::{Commission, CommissionInputs, CommissionPayment, CommissionTerms, PaymentReceipt};
use dealflow_core::{
    Aggregate, AggregateRoot, ClientId, ConsultantId, DomainError, DomainResult, OfferId, OpportunityId,
};
use dealflow_events::{Command, Event};

use crate::checklist::{DocumentStatus, DocumentType};
use crate::financing::FinancingMilestone;
use crate::offer::{rank_offers, Offer, OfferState, OfferTerms};
use crate::transaction::{AcceptedOfferSnapshot, CpcvDraft, EscrituraDraft, Transaction};

/// Pipeline label shown on the listing. Informational: nothing is gated on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Qualified,
    Listed,
    OffersReceived,
    UnderContract,
    DeedScheduled,
    Sold,
    Archived,
}

impl PipelineStage {
    fn rank(self) -> u8 {
        match self {
            PipelineStage::Qualified => 0,
            PipelineStage::Listed => 1,
            PipelineStage::OffersReceived => 2,
            PipelineStage::UnderContract => 3,
            PipelineStage::DeedScheduled => 4,
            PipelineStage::Sold => 5,
            PipelineStage::Archived => 6,
        }
    }
}

/// Counters maintained by collaborators through merge writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketingCounters {
    pub viewings: u32,
    pub inquiries: u32,
    pub days_on_market: u32,
}

/// Viewing record appended by collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewing {
    pub visitor: String,
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Aggregate root: one property listing for one seller, owned by one consultant.
///
/// Invariant: `accepted_offer_id` is `None` or names the single offer in
/// `offers` whose status is `accepted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    id: OpportunityId,
    consultant_id: Option<ConsultantId>,
    client_id: Option<ClientId>,
    created: bool,
    property_ref: Option<String>,
    asking_price: Decimal,
    stage: PipelineStage,
    offers: Vec<Offer>,
    accepted_offer_id: Option<OfferId>,
    transaction: Option<Transaction>,
    commission: Option<Commission>,
    #[serde(default)]
    marketing: MarketingCounters,
    #[serde(default)]
    viewings: Vec<Viewing>,
    created_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Opportunity {
    /// Create an empty, not-yet-opened instance.
    pub fn empty(id: OpportunityId) -> Self {
        Self {
            id,
            consultant_id: None,
            client_id: None,
            created: false,
            property_ref: None,
            asking_price: Decimal::ZERO,
            stage: PipelineStage::Qualified,
            offers: Vec::new(),
            accepted_offer_id: None,
            transaction: None,
            commission: None,
            marketing: MarketingCounters::default(),
            viewings: Vec::new(),
            created_at: None,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> OpportunityId {
        self.id
    }

    pub fn consultant_id(&self) -> Option<ConsultantId> {
        self.consultant_id
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn property_ref(&self) -> Option<&str> {
        self.property_ref.as_deref()
    }

    pub fn asking_price(&self) -> Decimal {
        self.asking_price
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn offer(&self, offer_id: OfferId) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id_typed() == offer_id)
    }

    pub fn accepted_offer(&self) -> Option<&Offer> {
        self.accepted_offer_id.and_then(|id| self.offer(id))
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    pub fn commission(&self) -> Option<&Commission> {
        self.commission.as_ref()
    }

    pub fn marketing(&self) -> &MarketingCounters {
        &self.marketing
    }

    pub fn viewings(&self) -> &[Viewing] {
        &self.viewings
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Open offers, best first. Advisory only.
    pub fn ranked_offers(&self) -> Vec<&Offer> {
        rank_offers(&self.offers)
    }
}

impl AggregateRoot for Opportunity {
    type Id = OpportunityId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ---- commands ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOpportunity {
    pub opportunity_id: OpportunityId,
    pub consultant_id: ConsultantId,
    pub client_id: ClientId,
    pub asking_price: Decimal,
    pub property_ref: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPipelineStage {
    pub opportunity_id: OpportunityId,
    pub stage: PipelineStage,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOffer {
    pub opportunity_id: OpportunityId,
    pub offer_id: OfferId,
    pub terms: OfferTerms,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptOffer {
    pub opportunity_id: OpportunityId,
    pub offer_id: OfferId,
    /// Rates applied to the agreed amount for the initial commission.
    pub commission_terms: CommissionTerms,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectOffer {
    pub opportunity_id: OpportunityId,
    pub offer_id: OfferId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterOffer {
    pub opportunity_id: OpportunityId,
    pub offer_id: OfferId,
    pub counter_amount: Decimal,
    pub counter_conditions: BTreeSet<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Expire every open offer whose `valid_until` is before `occurred_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpireOffers {
    pub opportunity_id: OpportunityId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareCpcv {
    pub opportunity_id: OpportunityId,
    pub draft: CpcvDraft,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignCpcv {
    pub opportunity_id: OpportunityId,
    pub enforce_required_documents: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareEscritura {
    pub opportunity_id: OpportunityId,
    pub draft: EscrituraDraft,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteEscritura {
    pub opportunity_id: OpportunityId,
    pub registration_number: Option<String>,
    pub enforce_required_documents: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkFellThrough {
    pub opportunity_id: OpportunityId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDocumentStatus {
    pub opportunity_id: OpportunityId,
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetFinancing {
    pub opportunity_id: OpportunityId,
    pub enabled: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFinancingDetails {
    pub opportunity_id: OpportunityId,
    pub bank_name: Option<String>,
    pub approval_amount: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFinancingMilestone {
    pub opportunity_id: OpportunityId,
    pub milestone: FinancingMilestone,
    pub done: bool,
    /// Defaults to `occurred_at` when marking done.
    pub date: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCommissionTerms {
    pub opportunity_id: OpportunityId,
    pub inputs: CommissionInputs,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCommissionPayment {
    pub opportunity_id: OpportunityId,
    pub receipt: PaymentReceipt,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertCommissionPayment {
    pub opportunity_id: OpportunityId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityCommand {
    OpenOpportunity(OpenOpportunity),
    SetPipelineStage(SetPipelineStage),
    SubmitOffer(SubmitOffer),
    AcceptOffer(AcceptOffer),
    RejectOffer(RejectOffer),
    CounterOffer(CounterOffer),
    ExpireOffers(ExpireOffers),
    PrepareCpcv(PrepareCpcv),
    SignCpcv(SignCpcv),
    PrepareEscritura(PrepareEscritura),
    CompleteEscritura(CompleteEscritura),
    MarkFellThrough(MarkFellThrough),
    SetDocumentStatus(SetDocumentStatus),
    SetFinancing(SetFinancing),
    UpdateFinancingDetails(UpdateFinancingDetails),
    RecordFinancingMilestone(RecordFinancingMilestone),
    UpdateCommissionTerms(UpdateCommissionTerms),
    RecordCommissionPayment(RecordCommissionPayment),
    RevertCommissionPayment(RevertCommissionPayment),
}

impl OpportunityCommand {
    /// Short operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            OpportunityCommand::OpenOpportunity(_) => "open_opportunity",
            OpportunityCommand::SetPipelineStage(_) => "set_pipeline_stage",
            OpportunityCommand::SubmitOffer(_) => "submit_offer",
            OpportunityCommand::AcceptOffer(_) => "accept_offer",
            OpportunityCommand::RejectOffer(_) => "reject_offer",
            OpportunityCommand::CounterOffer(_) => "counter_offer",
            OpportunityCommand::ExpireOffers(_) => "expire_offers",
            OpportunityCommand::PrepareCpcv(_) => "prepare_cpcv",
            OpportunityCommand::SignCpcv(_) => "sign_cpcv",
            OpportunityCommand::PrepareEscritura(_) => "prepare_escritura",
            OpportunityCommand::CompleteEscritura(_) => "complete_escritura",
            OpportunityCommand::MarkFellThrough(_) => "mark_fell_through",
            OpportunityCommand::SetDocumentStatus(_) => "set_document_status",
            OpportunityCommand::SetFinancing(_) => "set_financing",
            OpportunityCommand::UpdateFinancingDetails(_) => "update_financing_details",
            OpportunityCommand::RecordFinancingMilestone(_) => "record_financing_milestone",
            OpportunityCommand::UpdateCommissionTerms(_) => "update_commission_terms",
            OpportunityCommand::RecordCommissionPayment(_) => "record_commission_payment",
            OpportunityCommand::RevertCommissionPayment(_) => "revert_commission_payment",
        }
    }
}

impl Command for OpportunityCommand {
    fn target_opportunity_id(&self) -> OpportunityId {
        match self {
            OpportunityCommand::OpenOpportunity(c) => c.opportunity_id,
            OpportunityCommand::SetPipelineStage(c) => c.opportunity_id,
            OpportunityCommand::SubmitOffer(c) => c.opportunity_id,
            OpportunityCommand::AcceptOffer(c) => c.opportunity_id,
            OpportunityCommand::RejectOffer(c) => c.opportunity_id,
            OpportunityCommand::CounterOffer(c) => c.opportunity_id,
            OpportunityCommand::ExpireOffers(c) => c.opportunity_id,
            OpportunityCommand::PrepareCpcv(c) => c.opportunity_id,
            OpportunityCommand::SignCpcv(c) => c.opportunity_id,
            OpportunityCommand::PrepareEscritura(c) => c.opportunity_id,
            OpportunityCommand::CompleteEscritura(c) => c.opportunity_id,
            OpportunityCommand::MarkFellThrough(c) => c.opportunity_id,
            OpportunityCommand::SetDocumentStatus(c) => c.opportunity_id,
            OpportunityCommand::SetFinancing(c) => c.opportunity_id,
            OpportunityCommand::UpdateFinancingDetails(c) => c.opportunity_id,
            OpportunityCommand::RecordFinancingMilestone(c) => c.opportunity_id,
            OpportunityCommand::UpdateCommissionTerms(c) => c.opportunity_id,
            OpportunityCommand::RecordCommissionPayment(c) => c.opportunity_id,
            OpportunityCommand::RevertCommissionPayment(c) => c.opportunity_id,
        }
    }
}

// ---- events ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityOpened {
    pub opportunity_id: OpportunityId,
    pub consultant_id: ConsultantId,
    pub client_id: ClientId,
    pub asking_price: Decimal,
    pub property_ref: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStageChanged {
    pub opportunity_id: OpportunityId,
    pub from: PipelineStage,
    pub to: PipelineStage,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSubmitted {
    pub opportunity_id: OpportunityId,
    pub offer_id: OfferId,
    pub terms: OfferTerms,
    pub occurred_at: DateTime<Utc>,
}

/// Offer accepted, transaction opened and initial commission computed: one
/// fact, one atomic write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferAccepted {
    pub opportunity_id: OpportunityId,
    pub offer_id: OfferId,
    pub buyer_name: String,
    pub agreed_amount: Decimal,
    pub commission: Commission,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRejected {
    pub opportunity_id: OpportunityId,
    pub offer_id: OfferId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCountered {
    pub opportunity_id: OpportunityId,
    pub offer_id: OfferId,
    pub counter_amount: Decimal,
    pub counter_conditions: BTreeSet<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferExpired {
    pub opportunity_id: OpportunityId,
    pub offer_id: OfferId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpcvPrepared {
    pub opportunity_id: OpportunityId,
    pub draft: CpcvDraft,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpcvSigned {
    pub opportunity_id: OpportunityId,
    /// Required documents not yet received when the CPCV was signed.
    pub missing_documents: Vec<DocumentType>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrituraPrepared {
    pub opportunity_id: OpportunityId,
    pub draft: EscrituraDraft,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrituraCompleted {
    pub opportunity_id: OpportunityId,
    pub registration_number: String,
    pub missing_documents: Vec<DocumentType>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFellThrough {
    pub opportunity_id: OpportunityId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStatusChanged {
    pub opportunity_id: OpportunityId,
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingToggled {
    pub opportunity_id: OpportunityId,
    pub enabled: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingDetailsUpdated {
    pub opportunity_id: OpportunityId,
    pub bank_name: Option<String>,
    pub approval_amount: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingMilestoneRecorded {
    pub opportunity_id: OpportunityId,
    pub milestone: FinancingMilestone,
    pub done: bool,
    pub date: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTermsUpdated {
    pub opportunity_id: OpportunityId,
    pub commission: Commission,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionPaymentRecorded {
    pub opportunity_id: OpportunityId,
    pub payment: CommissionPayment,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionPaymentReverted {
    pub opportunity_id: OpportunityId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityEvent {
    OpportunityOpened(OpportunityOpened),
    PipelineStageChanged(PipelineStageChanged),
    OfferSubmitted(OfferSubmitted),
    OfferAccepted(OfferAccepted),
    OfferRejected(OfferRejected),
    OfferCountered(OfferCountered),
    OfferExpired(OfferExpired),
    CpcvPrepared(CpcvPrepared),
    CpcvSigned(CpcvSigned),
    EscrituraPrepared(EscrituraPrepared),
    EscrituraCompleted(EscrituraCompleted),
    TransactionFellThrough(TransactionFellThrough),
    DocumentStatusChanged(DocumentStatusChanged),
    FinancingToggled(FinancingToggled),
    FinancingDetailsUpdated(FinancingDetailsUpdated),
    FinancingMilestoneRecorded(FinancingMilestoneRecorded),
    CommissionTermsUpdated(CommissionTermsUpdated),
    CommissionPaymentRecorded(CommissionPaymentRecorded),
    CommissionPaymentReverted(CommissionPaymentReverted),
}

impl OpportunityEvent {
    /// Required documents reported missing by a commit event, if any.
    pub fn missing_documents(&self) -> &[DocumentType] {
        match self {
            OpportunityEvent::CpcvSigned(e) => &e.missing_documents,
            OpportunityEvent::EscrituraCompleted(e) => &e.missing_documents,
            _ => &[],
        }
    }
}

impl Event for OpportunityEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OpportunityEvent::OpportunityOpened(_) => "deals.opportunity.opened",
            OpportunityEvent::PipelineStageChanged(_) => "deals.opportunity.stage_changed",
            OpportunityEvent::OfferSubmitted(_) => "deals.offer.submitted",
            OpportunityEvent::OfferAccepted(_) => "deals.offer.accepted",
            OpportunityEvent::OfferRejected(_) => "deals.offer.rejected",
            OpportunityEvent::OfferCountered(_) => "deals.offer.countered",
            OpportunityEvent::OfferExpired(_) => "deals.offer.expired",
            OpportunityEvent::CpcvPrepared(_) => "deals.transaction.cpcv_prepared",
            OpportunityEvent::CpcvSigned(_) => "deals.transaction.cpcv_signed",
            OpportunityEvent::EscrituraPrepared(_) => "deals.transaction.escritura_prepared",
            OpportunityEvent::EscrituraCompleted(_) => "deals.transaction.escritura_completed",
            OpportunityEvent::TransactionFellThrough(_) => "deals.transaction.fell_through",
            OpportunityEvent::DocumentStatusChanged(_) => "deals.transaction.document_status_changed",
            OpportunityEvent::FinancingToggled(_) => "deals.financing.toggled",
            OpportunityEvent::FinancingDetailsUpdated(_) => "deals.financing.details_updated",
            OpportunityEvent::FinancingMilestoneRecorded(_) => "deals.financing.milestone_recorded",
            OpportunityEvent::CommissionTermsUpdated(_) => "deals.commission.terms_updated",
            OpportunityEvent::CommissionPaymentRecorded(_) => "deals.commission.payment_recorded",
            OpportunityEvent::CommissionPaymentReverted(_) => "deals.commission.payment_reverted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OpportunityEvent::OpportunityOpened(e) => e.occurred_at,
            OpportunityEvent::PipelineStageChanged(e) => e.occurred_at,
            OpportunityEvent::OfferSubmitted(e) => e.occurred_at,
            OpportunityEvent::OfferAccepted(e) => e.occurred_at,
            OpportunityEvent::OfferRejected(e) => e.occurred_at,
            OpportunityEvent::OfferCountered(e) => e.occurred_at,
            OpportunityEvent::OfferExpired(e) => e.occurred_at,
            OpportunityEvent::CpcvPrepared(e) => e.occurred_at,
            OpportunityEvent::CpcvSigned(e) => e.occurred_at,
            OpportunityEvent::EscrituraPrepared(e) => e.occurred_at,
            OpportunityEvent::EscrituraCompleted(e) => e.occurred_at,
            OpportunityEvent::TransactionFellThrough(e) => e.occurred_at,
            OpportunityEvent::DocumentStatusChanged(e) => e.occurred_at,
            OpportunityEvent::FinancingToggled(e) => e.occurred_at,
            OpportunityEvent::FinancingDetailsUpdated(e) => e.occurred_at,
            OpportunityEvent::FinancingMilestoneRecorded(e) => e.occurred_at,
            OpportunityEvent::CommissionTermsUpdated(e) => e.occurred_at,
            OpportunityEvent::CommissionPaymentRecorded(e) => e.occurred_at,
            OpportunityEvent::CommissionPaymentReverted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Opportunity {
    type Command = OpportunityCommand;
    type Event = OpportunityEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OpportunityEvent::OpportunityOpened(e) => {
                self.id = e.opportunity_id;
                self.consultant_id = Some(e.consultant_id);
                self.client_id = Some(e.client_id);
                self.asking_price = e.asking_price;
                self.property_ref = e.property_ref.clone();
                self.stage = PipelineStage::Qualified;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            OpportunityEvent::PipelineStageChanged(e) => {
                self.stage = e.to;
            }
            OpportunityEvent::OfferSubmitted(e) => {
                self.offers
                    .push(Offer::submitted(e.offer_id, e.terms.clone(), e.occurred_at));
            }
            OpportunityEvent::OfferAccepted(e) => {
                if let Some(offer) = self.offer_mut(e.offer_id) {
                    offer.set_state(
                        OfferState::Accepted {
                            agreed_amount: e.agreed_amount,
                        },
                        e.occurred_at,
                    );
                }
                self.accepted_offer_id = Some(e.offer_id);
                self.transaction = Some(Transaction::open(
                    AcceptedOfferSnapshot {
                        offer_id: e.offer_id,
                        buyer_name: e.buyer_name.clone(),
                        agreed_amount: e.agreed_amount,
                    },
                    e.occurred_at,
                ));
                self.commission = Some(e.commission.clone());
            }
            OpportunityEvent::OfferRejected(e) => {
                if let Some(offer) = self.offer_mut(e.offer_id) {
                    offer.set_state(
                        OfferState::Rejected {
                            reject_reason: e.reason.clone(),
                        },
                        e.occurred_at,
                    );
                }
            }
            OpportunityEvent::OfferCountered(e) => {
                if let Some(offer) = self.offer_mut(e.offer_id) {
                    offer.set_state(
                        OfferState::Countered {
                            counter_amount: e.counter_amount,
                            counter_conditions: e.counter_conditions.clone(),
                        },
                        e.occurred_at,
                    );
                }
            }
            OpportunityEvent::OfferExpired(e) => {
                if let Some(offer) = self.offer_mut(e.offer_id) {
                    offer.set_state(OfferState::Expired, e.occurred_at);
                }
            }
            OpportunityEvent::CpcvPrepared(e) => {
                if let Some(tx) = self.transaction.as_mut() {
                    tx.apply_prepare_cpcv(&e.draft);
                }
            }
            OpportunityEvent::CpcvSigned(e) => {
                if let Some(tx) = self.transaction.as_mut() {
                    tx.apply_sign_cpcv(e.occurred_at);
                }
            }
            OpportunityEvent::EscrituraPrepared(e) => {
                if let Some(tx) = self.transaction.as_mut() {
                    tx.apply_prepare_escritura(&e.draft);
                }
            }
            OpportunityEvent::EscrituraCompleted(e) => {
                if let Some(tx) = self.transaction.as_mut() {
                    tx.apply_complete_escritura(&e.registration_number, e.occurred_at);
                }
            }
            OpportunityEvent::TransactionFellThrough(e) => {
                if let Some(tx) = self.transaction.as_mut() {
                    tx.apply_fell_through(&e.reason, e.occurred_at);
                }
            }
            OpportunityEvent::DocumentStatusChanged(e) => {
                if let Some(tx) = self.transaction.as_mut() {
                    tx.apply_document_status(e.doc_type, e.status, e.notes.clone(), e.occurred_at);
                }
            }
            OpportunityEvent::FinancingToggled(e) => {
                if let Some(tx) = self.transaction.as_mut() {
                    tx.apply_set_financing(e.enabled);
                }
            }
            OpportunityEvent::FinancingDetailsUpdated(e) => {
                if let Some(tx) = self.transaction.as_mut() {
                    tx.apply_financing_details(e.bank_name.clone(), e.approval_amount);
                }
            }
            OpportunityEvent::FinancingMilestoneRecorded(e) => {
                if let Some(tx) = self.transaction.as_mut() {
                    tx.apply_financing_milestone(e.milestone, e.done, e.date);
                }
            }
            OpportunityEvent::CommissionTermsUpdated(e) => {
                self.commission = Some(e.commission.clone());
            }
            OpportunityEvent::CommissionPaymentRecorded(e) => {
                if let Some(c) = self.commission.as_mut() {
                    c.set_payment(e.payment.clone());
                }
            }
            OpportunityEvent::CommissionPaymentReverted(_) => {
                if let Some(c) = self.commission.as_mut() {
                    c.set_payment(CommissionPayment::pending());
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OpportunityCommand::OpenOpportunity(cmd) => self.handle_open(cmd),
            _ => {
                self.ensure_created()?;
                self.ensure_opportunity_id(command.target_opportunity_id())?;
                self.handle_existing(command)
            }
        }
    }
}

impl Opportunity {
    fn offer_mut(&mut self, offer_id: OfferId) -> Option<&mut Offer> {
        self.offers.iter_mut().find(|o| o.id_typed() == offer_id)
    }

    fn ensure_created(&self) -> DomainResult<()> {
        if !self.created {
            return Err(DomainError::not_found(format!("opportunity {}", self.id)));
        }
        Ok(())
    }

    fn ensure_opportunity_id(&self, opportunity_id: OpportunityId) -> DomainResult<()> {
        if self.id != opportunity_id {
            return Err(DomainError::invariant("opportunity_id mismatch"));
        }
        Ok(())
    }

    fn find_offer(&self, offer_id: OfferId) -> DomainResult<&Offer> {
        self.offer(offer_id)
            .ok_or_else(|| DomainError::not_found(format!("offer {offer_id}")))
    }

    fn open_transaction(&self) -> DomainResult<&Transaction> {
        self.transaction
            .as_ref()
            .ok_or_else(|| DomainError::invariant("no transaction: no offer has been accepted"))
    }

    fn existing_commission(&self) -> DomainResult<&Commission> {
        self.commission
            .as_ref()
            .ok_or_else(|| DomainError::invariant("no commission: no offer has been accepted"))
    }

    /// Forward-only pipeline hint that follows a legal milestone. Archived
    /// listings keep their label.
    fn stage_hint(&self, to: PipelineStage, at: DateTime<Utc>) -> Option<OpportunityEvent> {
        if self.stage == PipelineStage::Archived || self.stage.rank() >= to.rank() {
            return None;
        }
        Some(OpportunityEvent::PipelineStageChanged(PipelineStageChanged {
            opportunity_id: self.id,
            from: self.stage,
            to,
            occurred_at: at,
        }))
    }

    fn handle_open(&self, cmd: &OpenOpportunity) -> DomainResult<Vec<OpportunityEvent>> {
        if self.created {
            return Err(DomainError::conflict("opportunity already exists"));
        }
        if cmd.asking_price <= Decimal::ZERO {
            return Err(DomainError::validation("asking_price must be positive"));
        }

        Ok(vec![OpportunityEvent::OpportunityOpened(OpportunityOpened {
            opportunity_id: cmd.opportunity_id,
            consultant_id: cmd.consultant_id,
            client_id: cmd.client_id,
            asking_price: cmd.asking_price,
            property_ref: cmd
                .property_ref
                .as_ref()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_existing(&self, command: &OpportunityCommand) -> DomainResult<Vec<OpportunityEvent>> {
        match command {
            OpportunityCommand::OpenOpportunity(cmd) => self.handle_open(cmd),
            OpportunityCommand::SetPipelineStage(cmd) => self.handle_set_stage(cmd),
            OpportunityCommand::SubmitOffer(cmd) => self.handle_submit_offer(cmd),
            OpportunityCommand::AcceptOffer(cmd) => self.handle_accept_offer(cmd),
            OpportunityCommand::RejectOffer(cmd) => self.handle_reject_offer(cmd),
            OpportunityCommand::CounterOffer(cmd) => self.handle_counter_offer(cmd),
            OpportunityCommand::ExpireOffers(cmd) => Ok(self.handle_expire_offers(cmd)),
            OpportunityCommand::PrepareCpcv(cmd) => self.handle_prepare_cpcv(cmd),
            OpportunityCommand::SignCpcv(cmd) => self.handle_sign_cpcv(cmd),
            OpportunityCommand::PrepareEscritura(cmd) => self.handle_prepare_escritura(cmd),
            OpportunityCommand::CompleteEscritura(cmd) => self.handle_complete_escritura(cmd),
            OpportunityCommand::MarkFellThrough(cmd) => self.handle_fell_through(cmd),
            OpportunityCommand::SetDocumentStatus(cmd) => self.handle_document_status(cmd),
            OpportunityCommand::SetFinancing(cmd) => self.handle_set_financing(cmd),
            OpportunityCommand::UpdateFinancingDetails(cmd) => self.handle_financing_details(cmd),
            OpportunityCommand::RecordFinancingMilestone(cmd) => self.handle_financing_milestone(cmd),
            OpportunityCommand::UpdateCommissionTerms(cmd) => self.handle_update_commission(cmd),
            OpportunityCommand::RecordCommissionPayment(cmd) => self.handle_record_payment(cmd),
            OpportunityCommand::RevertCommissionPayment(cmd) => self.handle_revert_payment(cmd),
        }
    }

    fn handle_set_stage(&self, cmd: &SetPipelineStage) -> DomainResult<Vec<OpportunityEvent>> {
        if cmd.stage == self.stage {
            return Ok(Vec::new());
        }
        Ok(vec![OpportunityEvent::PipelineStageChanged(PipelineStageChanged {
            opportunity_id: self.id,
            from: self.stage,
            to: cmd.stage,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit_offer(&self, cmd: &SubmitOffer) -> DomainResult<Vec<OpportunityEvent>> {
        if self.accepted_offer_id.is_some() {
            return Err(DomainError::invariant(
                "an offer has already been accepted; the deal is closed to new offers",
            ));
        }
        if self.offer(cmd.offer_id).is_some() {
            return Err(DomainError::conflict(format!("offer {} already exists", cmd.offer_id)));
        }
        cmd.terms.validate()?;

        let mut terms = cmd.terms.clone();
        terms.buyer_name = terms.buyer_name.trim().to_string();

        let mut events = vec![OpportunityEvent::OfferSubmitted(OfferSubmitted {
            opportunity_id: self.id,
            offer_id: cmd.offer_id,
            terms,
            occurred_at: cmd.occurred_at,
        })];
        events.extend(self.stage_hint(PipelineStage::OffersReceived, cmd.occurred_at));
        Ok(events)
    }

    fn handle_accept_offer(&self, cmd: &AcceptOffer) -> DomainResult<Vec<OpportunityEvent>> {
        let offer = self.find_offer(cmd.offer_id)?;
        if let Some(accepted) = self.accepted_offer_id {
            return Err(DomainError::invariant(format!(
                "offer {accepted} is already accepted; a deal has exactly one accepted offer"
            )));
        }
        let agreed_amount = offer.decide_accept(cmd.occurred_at)?;
        let commission = Commission::calculate(&cmd.commission_terms.at_price(agreed_amount), cmd.occurred_at)?;

        let mut events = vec![OpportunityEvent::OfferAccepted(OfferAccepted {
            opportunity_id: self.id,
            offer_id: cmd.offer_id,
            buyer_name: offer.terms().buyer_name.clone(),
            agreed_amount,
            commission,
            occurred_at: cmd.occurred_at,
        })];
        events.extend(self.stage_hint(PipelineStage::UnderContract, cmd.occurred_at));
        Ok(events)
    }

    fn handle_reject_offer(&self, cmd: &RejectOffer) -> DomainResult<Vec<OpportunityEvent>> {
        let reason = self.find_offer(cmd.offer_id)?.decide_reject(&cmd.reason)?;

        Ok(vec![OpportunityEvent::OfferRejected(OfferRejected {
            opportunity_id: self.id,
            offer_id: cmd.offer_id,
            reason,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_counter_offer(&self, cmd: &CounterOffer) -> DomainResult<Vec<OpportunityEvent>> {
        self.find_offer(cmd.offer_id)?.decide_counter(cmd.counter_amount)?;

        Ok(vec![OpportunityEvent::OfferCountered(OfferCountered {
            opportunity_id: self.id,
            offer_id: cmd.offer_id,
            counter_amount: cmd.counter_amount,
            counter_conditions: cmd.counter_conditions.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_expire_offers(&self, cmd: &ExpireOffers) -> Vec<OpportunityEvent> {
        self.offers
            .iter()
            .filter(|o| o.is_open() && o.is_past_validity(cmd.occurred_at))
            .map(|o| {
                OpportunityEvent::OfferExpired(OfferExpired {
                    opportunity_id: self.id,
                    offer_id: o.id_typed(),
                    occurred_at: cmd.occurred_at,
                })
            })
            .collect()
    }

    fn handle_prepare_cpcv(&self, cmd: &PrepareCpcv) -> DomainResult<Vec<OpportunityEvent>> {
        let draft = self.open_transaction()?.validate_prepare_cpcv(cmd.draft.clone())?;

        Ok(vec![OpportunityEvent::CpcvPrepared(CpcvPrepared {
            opportunity_id: self.id,
            draft,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_sign_cpcv(&self, cmd: &SignCpcv) -> DomainResult<Vec<OpportunityEvent>> {
        let missing_documents = self
            .open_transaction()?
            .validate_sign_cpcv(cmd.enforce_required_documents)?;

        Ok(vec![OpportunityEvent::CpcvSigned(CpcvSigned {
            opportunity_id: self.id,
            missing_documents,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_prepare_escritura(&self, cmd: &PrepareEscritura) -> DomainResult<Vec<OpportunityEvent>> {
        let draft = self
            .open_transaction()?
            .validate_prepare_escritura(cmd.draft.clone())?;

        let mut events = vec![OpportunityEvent::EscrituraPrepared(EscrituraPrepared {
            opportunity_id: self.id,
            draft,
            occurred_at: cmd.occurred_at,
        })];
        events.extend(self.stage_hint(PipelineStage::DeedScheduled, cmd.occurred_at));
        Ok(events)
    }

    fn handle_complete_escritura(&self, cmd: &CompleteEscritura) -> DomainResult<Vec<OpportunityEvent>> {
        let (registration_number, missing_documents) = self
            .open_transaction()?
            .validate_complete_escritura(cmd.registration_number.clone(), cmd.enforce_required_documents)?;

        let mut events = vec![OpportunityEvent::EscrituraCompleted(EscrituraCompleted {
            opportunity_id: self.id,
            registration_number,
            missing_documents,
            occurred_at: cmd.occurred_at,
        })];
        events.extend(self.stage_hint(PipelineStage::Sold, cmd.occurred_at));
        Ok(events)
    }

    fn handle_fell_through(&self, cmd: &MarkFellThrough) -> DomainResult<Vec<OpportunityEvent>> {
        let reason = self.open_transaction()?.validate_fell_through(&cmd.reason)?;

        Ok(vec![OpportunityEvent::TransactionFellThrough(TransactionFellThrough {
            opportunity_id: self.id,
            reason,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_document_status(&self, cmd: &SetDocumentStatus) -> DomainResult<Vec<OpportunityEvent>> {
        self.open_transaction()?.validate_document_status(cmd.doc_type)?;

        Ok(vec![OpportunityEvent::DocumentStatusChanged(DocumentStatusChanged {
            opportunity_id: self.id,
            doc_type: cmd.doc_type,
            status: cmd.status,
            notes: cmd
                .notes
                .as_ref()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_financing(&self, cmd: &SetFinancing) -> DomainResult<Vec<OpportunityEvent>> {
        let tx = self.open_transaction()?;
        if tx.has_financing() == cmd.enabled {
            return Ok(Vec::new());
        }

        Ok(vec![OpportunityEvent::FinancingToggled(FinancingToggled {
            opportunity_id: self.id,
            enabled: cmd.enabled,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_financing_details(&self, cmd: &UpdateFinancingDetails) -> DomainResult<Vec<OpportunityEvent>> {
        let (bank_name, approval_amount) = self
            .open_transaction()?
            .validate_financing_details(cmd.bank_name.as_deref(), cmd.approval_amount)?;

        Ok(vec![OpportunityEvent::FinancingDetailsUpdated(FinancingDetailsUpdated {
            opportunity_id: self.id,
            bank_name,
            approval_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_financing_milestone(&self, cmd: &RecordFinancingMilestone) -> DomainResult<Vec<OpportunityEvent>> {
        self.open_transaction()?.validate_financing_milestone()?;

        let date = if cmd.done {
            cmd.date.or(Some(cmd.occurred_at))
        } else {
            None
        };

        Ok(vec![OpportunityEvent::FinancingMilestoneRecorded(FinancingMilestoneRecorded {
            opportunity_id: self.id,
            milestone: cmd.milestone,
            done: cmd.done,
            date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_commission(&self, cmd: &UpdateCommissionTerms) -> DomainResult<Vec<OpportunityEvent>> {
        let commission = self.existing_commission()?.revise(&cmd.inputs, cmd.occurred_at)?;

        Ok(vec![OpportunityEvent::CommissionTermsUpdated(CommissionTermsUpdated {
            opportunity_id: self.id,
            commission,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_payment(&self, cmd: &RecordCommissionPayment) -> DomainResult<Vec<OpportunityEvent>> {
        let payment = self
            .existing_commission()?
            .plan_receipt(&cmd.receipt, cmd.occurred_at)?;

        Ok(vec![OpportunityEvent::CommissionPaymentRecorded(CommissionPaymentRecorded {
            opportunity_id: self.id,
            payment,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revert_payment(&self, cmd: &RevertCommissionPayment) -> DomainResult<Vec<OpportunityEvent>> {
        if !self.existing_commission()?.payment().is_received() {
            return Err(DomainError::invariant("commission payment has not been received"));
        }

        Ok(vec![OpportunityEvent::CommissionPaymentReverted(CommissionPaymentReverted {
            opportunity_id: self.id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dealflow_commission::{PaymentStatus, SplitType};
    use dealflow_events::execute;
    use proptest::prelude::*;

    use crate::offer::{BuyerQuality, FinancingStatus, OfferStatus};
    use crate::transaction::TransactionStage;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn default_terms() -> CommissionTerms {
        CommissionTerms {
            commission_rate: d(5),
            split_type: SplitType::Full,
            my_split_percentage: d(100),
            agency_split_percentage: d(55),
        }
    }

    fn offer_terms(amount: i64) -> OfferTerms {
        OfferTerms {
            buyer_name: "Joana Silva".into(),
            amount: d(amount),
            down_payment: None,
            financing_status: FinancingStatus::Cash,
            conditions: BTreeSet::new(),
            buyer_quality_score: BuyerQuality::High,
            valid_until: None,
            notes: None,
        }
    }

    fn run(opp: &mut Opportunity, cmd: OpportunityCommand) -> DomainResult<Vec<OpportunityEvent>> {
        execute(opp, &cmd)
    }

    fn opened() -> Opportunity {
        let id = OpportunityId::new();
        let mut opp = Opportunity::empty(id);
        run(
            &mut opp,
            OpportunityCommand::OpenOpportunity(OpenOpportunity {
                opportunity_id: id,
                consultant_id: ConsultantId::new(),
                client_id: ClientId::new(),
                asking_price: d(210_000),
                property_ref: Some("T3 Avenidas Novas".into()),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        opp
    }

    fn submit(opp: &mut Opportunity, amount: i64) -> OfferId {
        let offer_id = OfferId::new();
        let opp_id = opp.id_typed();
        run(
            opp,
            OpportunityCommand::SubmitOffer(SubmitOffer {
                opportunity_id: opp_id,
                offer_id,
                terms: offer_terms(amount),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        offer_id
    }

    fn accept(opp: &mut Opportunity, offer_id: OfferId) -> DomainResult<Vec<OpportunityEvent>> {
        let opp_id = opp.id_typed();
        run(
            opp,
            OpportunityCommand::AcceptOffer(AcceptOffer {
                opportunity_id: opp_id,
                offer_id,
                commission_terms: default_terms(),
                occurred_at: test_time(),
            }),
        )
    }

    fn counter(opp: &mut Opportunity, offer_id: OfferId, amount: i64) -> DomainResult<Vec<OpportunityEvent>> {
        let opp_id = opp.id_typed();
        run(
            opp,
            OpportunityCommand::CounterOffer(CounterOffer {
                opportunity_id: opp_id,
                offer_id,
                counter_amount: d(amount),
                counter_conditions: BTreeSet::from(["mortgage_approval".to_string()]),
                occurred_at: test_time(),
            }),
        )
    }

    fn with_accepted_offer() -> Opportunity {
        let mut opp = opened();
        let offer_id = submit(&mut opp, 200_000);
        accept(&mut opp, offer_id).unwrap();
        opp
    }

    fn cpcv_draft() -> CpcvDraft {
        CpcvDraft {
            scheduled_date: Some(test_time() + Duration::days(14)),
            signal_amount: Some(d(20_000)),
            location: Some("Lisboa".into()),
            notes: None,
        }
    }

    fn escritura_draft() -> EscrituraDraft {
        EscrituraDraft {
            scheduled_date: Some(test_time() + Duration::days(90)),
            notary_name: Some("Dra. Helena Matos".into()),
            notary_location: Some("Lisboa".into()),
            final_amount: Some(d(200_000)),
            registration_number: None,
            notes: None,
        }
    }

    #[test]
    fn open_emits_opened_event_and_sets_scope() {
        let opp = opened();

        assert!(opp.is_created());
        assert!(opp.consultant_id().is_some());
        assert_eq!(opp.stage(), PipelineStage::Qualified);
        assert_eq!(opp.version(), 1);
        assert_eq!(opp.property_ref(), Some("T3 Avenidas Novas"));
    }

    #[test]
    fn commands_on_unopened_opportunity_are_not_found() {
        let opp = Opportunity::empty(OpportunityId::new());
        let err = opp
            .handle(&OpportunityCommand::SubmitOffer(SubmitOffer {
                opportunity_id: opp.id_typed(),
                offer_id: OfferId::new(),
                terms: offer_terms(1),
                occurred_at: test_time(),
            }))
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn submitting_moves_the_pipeline_label_forward() {
        let mut opp = opened();
        submit(&mut opp, 190_000);

        assert_eq!(opp.stage(), PipelineStage::OffersReceived);
        assert_eq!(opp.offers().len(), 1);
        assert_eq!(opp.offers()[0].status(), OfferStatus::Pending);
    }

    /// Scenario A: cash offer at 200000 accepted with 5% / 100 / 55.
    #[test]
    fn accepting_opens_transaction_and_computes_commission() {
        let mut opp = opened();
        let offer_id = submit(&mut opp, 200_000);

        let events = accept(&mut opp, offer_id).unwrap();

        assert!(matches!(events[0], OpportunityEvent::OfferAccepted(_)));
        assert_eq!(opp.accepted_offer().unwrap().id_typed(), offer_id);
        assert_eq!(opp.stage(), PipelineStage::UnderContract);

        let tx = opp.transaction().unwrap();
        assert_eq!(tx.stage(), TransactionStage::OfferAccepted);
        assert_eq!(tx.accepted_offer().agreed_amount, d(200_000));
        assert_eq!(tx.documents().missing_required().len(), 5);

        let c = opp.commission().unwrap().computed();
        assert_eq!(c.total_commission, d(10_000));
        assert_eq!(c.production_value, d(10_000));
        assert_eq!(c.net_commission, d(5_500));
        assert_eq!(c.agency_share, d(4_500));
    }

    #[test]
    fn second_acceptance_is_an_invariant_violation() {
        let mut opp = opened();
        let first = submit(&mut opp, 200_000);
        let second = submit(&mut opp, 205_000);
        accept(&mut opp, first).unwrap();
        let before = opp.clone();

        let err = accept(&mut opp, second).unwrap_err();

        match err {
            DomainError::InvariantViolation(msg) if msg.contains("already accepted") => {}
            other => panic!("expected InvariantViolation, got {other:?}"),
        }
        assert_eq!(opp, before);
        let accepted = opp
            .offers()
            .iter()
            .filter(|o| o.status() == OfferStatus::Accepted)
            .count();
        assert_eq!(accepted, 1);
    }

    #[test]
    fn no_new_offers_after_acceptance() {
        let opp = with_accepted_offer();
        let err = opp
            .handle(&OpportunityCommand::SubmitOffer(SubmitOffer {
                opportunity_id: opp.id_typed(),
                offer_id: OfferId::new(),
                terms: offer_terms(250_000),
                occurred_at: test_time(),
            }))
            .unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(opp.offers().len(), 1);
    }

    /// Scenario C: the latest counter overwrites the previous one.
    #[test]
    fn latest_counter_wins_and_amount_is_untouched() {
        let mut opp = opened();
        let offer_id = submit(&mut opp, 200_000);

        counter(&mut opp, offer_id, 190_000).unwrap();
        counter(&mut opp, offer_id, 195_000).unwrap();

        let offer = opp.offer(offer_id).unwrap();
        assert_eq!(offer.status(), OfferStatus::Countered);
        assert_eq!(offer.counter_amount(), Some(d(195_000)));
        assert_eq!(offer.amount(), d(200_000));
    }

    #[test]
    fn accepting_a_counter_prices_the_deal_at_the_counter() {
        let mut opp = opened();
        let offer_id = submit(&mut opp, 200_000);
        counter(&mut opp, offer_id, 195_000).unwrap();

        accept(&mut opp, offer_id).unwrap();

        assert_eq!(opp.commission().unwrap().inputs().sale_price, d(195_000));
        assert_eq!(opp.accepted_offer().unwrap().agreed_amount(), Some(d(195_000)));
    }

    #[test]
    fn rejecting_one_offer_leaves_siblings_pending() {
        let mut opp = opened();
        let a = submit(&mut opp, 180_000);
        let b = submit(&mut opp, 185_000);

        let opp_id = opp.id_typed();
        run(
            &mut opp,
            OpportunityCommand::RejectOffer(RejectOffer {
                opportunity_id: opp_id,
                offer_id: a,
                reason: "below valuation".into(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        assert_eq!(opp.offer(a).unwrap().reject_reason(), Some("below valuation"));
        assert_eq!(opp.offer(b).unwrap().status(), OfferStatus::Pending);
    }

    #[test]
    fn expire_offers_only_touches_stale_open_offers() {
        let mut opp = opened();
        let stale = OfferId::new();
        let mut terms = offer_terms(150_000);
        terms.valid_until = Some(test_time() - Duration::days(1));
        let opp_id = opp.id_typed();
        run(
            &mut opp,
            OpportunityCommand::SubmitOffer(SubmitOffer {
                opportunity_id: opp_id,
                offer_id: stale,
                terms,
                occurred_at: test_time() - Duration::days(5),
            }),
        )
        .unwrap();
        let fresh = submit(&mut opp, 160_000);

        let events = run(
            &mut opp,
            OpportunityCommand::ExpireOffers(ExpireOffers {
                opportunity_id: opp_id,
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(opp.offer(stale).unwrap().status(), OfferStatus::Expired);
        assert_eq!(opp.offer(fresh).unwrap().status(), OfferStatus::Pending);
        assert!(matches!(accept(&mut opp, stale), Err(DomainError::InvariantViolation(_))));
    }

    /// Scenario B: completing the escritura before the CPCV is signed.
    #[test]
    fn complete_escritura_before_sign_is_rejected() {
        let mut opp = with_accepted_offer();
        let before = opp.clone();

        let opp_id = opp.id_typed();
        let err = run(
            &mut opp,
            OpportunityCommand::CompleteEscritura(CompleteEscritura {
                opportunity_id: opp_id,
                registration_number: Some("AP-1".into()),
                enforce_required_documents: false,
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(opp.transaction().unwrap().stage(), TransactionStage::OfferAccepted);
        assert_eq!(opp, before);
    }

    #[test]
    fn full_pipeline_reaches_completed_and_sold() {
        let mut opp = with_accepted_offer();
        let id = opp.id_typed();

        run(&mut opp, OpportunityCommand::PrepareCpcv(PrepareCpcv {
            opportunity_id: id,
            draft: cpcv_draft(),
            occurred_at: test_time(),
        }))
        .unwrap();
        let signed = run(&mut opp, OpportunityCommand::SignCpcv(SignCpcv {
            opportunity_id: id,
            enforce_required_documents: false,
            occurred_at: test_time(),
        }))
        .unwrap();
        assert_eq!(signed[0].missing_documents().len(), 5);

        run(&mut opp, OpportunityCommand::PrepareEscritura(PrepareEscritura {
            opportunity_id: id,
            draft: escritura_draft(),
            occurred_at: test_time(),
        }))
        .unwrap();
        assert_eq!(opp.stage(), PipelineStage::DeedScheduled);

        run(&mut opp, OpportunityCommand::CompleteEscritura(CompleteEscritura {
            opportunity_id: id,
            registration_number: Some("AP-2025-118".into()),
            enforce_required_documents: false,
            occurred_at: test_time(),
        }))
        .unwrap();

        let tx = opp.transaction().unwrap();
        assert_eq!(tx.stage(), TransactionStage::Completed);
        assert_eq!(tx.escritura().registration_number.as_deref(), Some("AP-2025-118"));
        assert_eq!(opp.stage(), PipelineStage::Sold);
    }

    #[test]
    fn prepare_cpcv_twice_keeps_stage_and_record() {
        let mut opp = with_accepted_offer();
        let cmd = OpportunityCommand::PrepareCpcv(PrepareCpcv {
            opportunity_id: opp.id_typed(),
            draft: cpcv_draft(),
            occurred_at: test_time(),
        });

        run(&mut opp, cmd.clone()).unwrap();
        let first = opp.transaction().unwrap().cpcv().clone();
        run(&mut opp, cmd).unwrap();

        assert_eq!(opp.transaction().unwrap().cpcv(), &first);
        assert_eq!(opp.transaction().unwrap().stage(), TransactionStage::OfferAccepted);
    }

    /// Scenario D: received without an override pays out the net.
    #[test]
    fn payment_defaults_to_net_commission() {
        let mut opp = with_accepted_offer();

        let opp_id = opp.id_typed();
        run(
            &mut opp,
            OpportunityCommand::RecordCommissionPayment(RecordCommissionPayment {
                opportunity_id: opp_id,
                receipt: PaymentReceipt::default(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        let c = opp.commission().unwrap();
        assert_eq!(c.payment().status, PaymentStatus::Received);
        assert_eq!(c.payment().amount_received, Some(c.computed().net_commission));
        assert_eq!(c.pending_amount(), Decimal::ZERO);
    }

    #[test]
    fn terms_are_frozen_once_paid_until_reverted() {
        let mut opp = with_accepted_offer();
        let id = opp.id_typed();
        let new_inputs = CommissionInputs::full(d(200_000), d(4), d(55));

        run(&mut opp, OpportunityCommand::RecordCommissionPayment(RecordCommissionPayment {
            opportunity_id: id,
            receipt: PaymentReceipt::default(),
            occurred_at: test_time(),
        }))
        .unwrap();
        let err = opp
            .handle(&OpportunityCommand::UpdateCommissionTerms(UpdateCommissionTerms {
                opportunity_id: id,
                inputs: new_inputs.clone(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        run(&mut opp, OpportunityCommand::RevertCommissionPayment(RevertCommissionPayment {
            opportunity_id: id,
            occurred_at: test_time(),
        }))
        .unwrap();
        run(&mut opp, OpportunityCommand::UpdateCommissionTerms(UpdateCommissionTerms {
            opportunity_id: id,
            inputs: new_inputs,
            occurred_at: test_time(),
        }))
        .unwrap();

        assert_eq!(opp.commission().unwrap().computed().total_commission, d(8_000));
        assert_eq!(opp.commission().unwrap().payment().status, PaymentStatus::Pending);
    }

    #[test]
    fn financing_milestones_default_their_date() {
        let mut opp = with_accepted_offer();
        let id = opp.id_typed();
        let at = test_time();

        run(&mut opp, OpportunityCommand::SetFinancing(SetFinancing {
            opportunity_id: id,
            enabled: true,
            occurred_at: at,
        }))
        .unwrap();
        run(&mut opp, OpportunityCommand::RecordFinancingMilestone(RecordFinancingMilestone {
            opportunity_id: id,
            milestone: FinancingMilestone::EvaluationCompleted,
            done: true,
            date: None,
            occurred_at: at,
        }))
        .unwrap();

        let ledger = opp.transaction().unwrap().financing().unwrap();
        assert_eq!(ledger.evaluation_completed.date, Some(at));
        assert!(!ledger.bank_approval.done);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let opp = with_accepted_offer();
        let before = opp.clone();

        let _ = opp.handle(&OpportunityCommand::PrepareCpcv(PrepareCpcv {
            opportunity_id: opp.id_typed(),
            draft: cpcv_draft(),
            occurred_at: test_time(),
        }));

        assert_eq!(opp, before);
    }

    #[test]
    fn opportunity_survives_a_json_round_trip() {
        let opp = with_accepted_offer();

        let json = serde_json::to_value(&opp).unwrap();
        let back: Opportunity = serde_json::from_value(json).unwrap();

        assert_eq!(back, opp);
    }

    fn pipeline_command(opp: &Opportunity, op: u8) -> OpportunityCommand {
        let id = opp.id_typed();
        let at = test_time();
        match op % 7 {
            0 => OpportunityCommand::PrepareCpcv(PrepareCpcv { opportunity_id: id, draft: cpcv_draft(), occurred_at: at }),
            1 => OpportunityCommand::SignCpcv(SignCpcv {
                opportunity_id: id,
                enforce_required_documents: false,
                occurred_at: at,
            }),
            2 => OpportunityCommand::PrepareEscritura(PrepareEscritura {
                opportunity_id: id,
                draft: escritura_draft(),
                occurred_at: at,
            }),
            3 => OpportunityCommand::CompleteEscritura(CompleteEscritura {
                opportunity_id: id,
                registration_number: Some("AP-9".into()),
                enforce_required_documents: false,
                occurred_at: at,
            }),
            4 => OpportunityCommand::MarkFellThrough(MarkFellThrough {
                opportunity_id: id,
                reason: "buyer withdrew".into(),
                occurred_at: at,
            }),
            5 => OpportunityCommand::SetDocumentStatus(SetDocumentStatus {
                opportunity_id: id,
                doc_type: DocumentType::EnergyCertificate,
                status: DocumentStatus::Received,
                notes: None,
                occurred_at: at,
            }),
            _ => OpportunityCommand::SetDocumentStatus(SetDocumentStatus {
                opportunity_id: id,
                doc_type: DocumentType::EnergyCertificate,
                status: DocumentStatus::Pending,
                notes: None,
                occurred_at: at,
            }),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: whatever sequence of pipeline calls is attempted, the
        /// transaction stage never moves backwards.
        #[test]
        fn transaction_stage_never_regresses(ops in proptest::collection::vec(0u8..7, 0..24)) {
            let mut opp = with_accepted_offer();
            let mut rank = opp.transaction().map(|t| t.stage().rank()).unwrap_or_default();

            for op in ops {
                let cmd = pipeline_command(&opp, op);
                let _ = execute(&mut opp, &cmd);
                let now = opp.transaction().map(|t| t.stage().rank()).unwrap_or_default();
                prop_assert!(now >= rank);
                rank = now;
            }
        }
    }
}
