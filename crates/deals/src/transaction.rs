//! Transaction progression: the legal pipeline that follows an accepted offer.
//!
//! ```text
//! offer_accepted ──sign CPCV──► cpcv_signed ──prepare escritura──► escritura_scheduled
//!        │                           │                                   │
//!        │                           │                         complete escritura
//!        │                           │                                   ▼
//!        └───────────── mark fell through ─────────────► fell_through   completed
//! ```
//!
//! CPCV and escritura each have a repeatable *prepare* and a one-way commit.
//! Every `validate_*` method decides without mutating; the matching `apply_*`
//! method is what event application calls.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealflow_core::{DomainError, DomainResult, OfferId};

use crate::checklist::{DocumentChecklist, DocumentStatus, DocumentType};
use crate::financing::{validate_details, FinancingLedger, FinancingMilestone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStage {
    OfferAccepted,
    CpcvSigned,
    EscrituraScheduled,
    Completed,
    FellThrough,
}

impl TransactionStage {
    /// Position in the pipeline. `fell_through` ranks last: once there, nothing moves.
    pub fn rank(self) -> u8 {
        match self {
            TransactionStage::OfferAccepted => 0,
            TransactionStage::CpcvSigned => 1,
            TransactionStage::EscrituraScheduled => 2,
            TransactionStage::Completed => 3,
            TransactionStage::FellThrough => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionStage::Completed | TransactionStage::FellThrough)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStage::OfferAccepted => "offer_accepted",
            TransactionStage::CpcvSigned => "cpcv_signed",
            TransactionStage::EscrituraScheduled => "escritura_scheduled",
            TransactionStage::Completed => "completed",
            TransactionStage::FellThrough => "fell_through",
        }
    }
}

impl core::fmt::Display for TransactionStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frozen when the transaction opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedOfferSnapshot {
    pub offer_id: OfferId,
    pub buyer_name: String,
    pub agreed_amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpcvStatus {
    Pending,
    Prepared,
    Signed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpcv {
    pub status: CpcvStatus,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub signal_amount: Option<Decimal>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub signed_date: Option<DateTime<Utc>>,
    /// Checklist as it stood at signing.
    pub documents_snapshot: Option<DocumentChecklist>,
}

impl Default for Cpcv {
    fn default() -> Self {
        Self {
            status: CpcvStatus::Pending,
            scheduled_date: None,
            signal_amount: None,
            location: None,
            notes: None,
            signed_date: None,
            documents_snapshot: None,
        }
    }
}

/// Fields written by a CPCV prepare.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpcvDraft {
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub signal_amount: Option<Decimal>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscrituraStatus {
    Pending,
    Scheduled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escritura {
    pub status: EscrituraStatus,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub notary_name: Option<String>,
    pub notary_location: Option<String>,
    pub final_amount: Option<Decimal>,
    pub registration_number: Option<String>,
    pub notes: Option<String>,
    pub completed_date: Option<DateTime<Utc>>,
}

impl Default for Escritura {
    fn default() -> Self {
        Self {
            status: EscrituraStatus::Pending,
            scheduled_date: None,
            notary_name: None,
            notary_location: None,
            final_amount: None,
            registration_number: None,
            notes: None,
            completed_date: None,
        }
    }
}

/// Fields written by an escritura prepare.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrituraDraft {
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notary_name: Option<String>,
    #[serde(default)]
    pub notary_location: Option<String>,
    #[serde(default)]
    pub final_amount: Option<Decimal>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FellThrough {
    pub reason: String,
    pub at: DateTime<Utc>,
    pub from_stage: TransactionStage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    stage: TransactionStage,
    accepted_offer: AcceptedOfferSnapshot,
    opened_at: DateTime<Utc>,
    cpcv: Cpcv,
    escritura: Escritura,
    financing: Option<FinancingLedger>,
    documents: DocumentChecklist,
    fell_through: Option<FellThrough>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require<T>(value: Option<T>, field: &str) -> DomainResult<T> {
    value.ok_or_else(|| DomainError::validation(format!("{field} is required")))
}

fn ensure_positive(field: &str, value: Option<Decimal>) -> DomainResult<()> {
    match value {
        Some(v) if v <= Decimal::ZERO => Err(DomainError::validation(format!("{field} must be positive"))),
        _ => Ok(()),
    }
}

impl Transaction {
    /// Opened by offer acceptance, with a freshly seeded checklist.
    pub fn open(accepted_offer: AcceptedOfferSnapshot, at: DateTime<Utc>) -> Self {
        Self {
            stage: TransactionStage::OfferAccepted,
            accepted_offer,
            opened_at: at,
            cpcv: Cpcv::default(),
            escritura: Escritura::default(),
            financing: None,
            documents: DocumentChecklist::seeded(),
            fell_through: None,
        }
    }

    pub fn stage(&self) -> TransactionStage {
        self.stage
    }

    pub fn accepted_offer(&self) -> &AcceptedOfferSnapshot {
        &self.accepted_offer
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn cpcv(&self) -> &Cpcv {
        &self.cpcv
    }

    pub fn escritura(&self) -> &Escritura {
        &self.escritura
    }

    pub fn financing(&self) -> Option<&FinancingLedger> {
        self.financing.as_ref()
    }

    pub fn documents(&self) -> &DocumentChecklist {
        &self.documents
    }

    pub fn fell_through(&self) -> Option<&FellThrough> {
        self.fell_through.as_ref()
    }

    fn ensure_progressing(&self, action: &str) -> DomainResult<()> {
        if self.stage.is_terminal() {
            return Err(DomainError::invariant(format!(
                "cannot {action}: transaction is {}",
                self.stage
            )));
        }
        Ok(())
    }

    fn ensure_cpcv_signed(&self, action: &str) -> DomainResult<()> {
        if self.cpcv.status != CpcvStatus::Signed {
            return Err(DomainError::invariant(format!(
                "cannot {action} before the CPCV is signed"
            )));
        }
        Ok(())
    }

    /// Required documents still missing; an error instead when `enforce` is set.
    fn check_documents(&self, action: &str, enforce: bool) -> DomainResult<Vec<DocumentType>> {
        let missing = self.documents.missing_required();
        if enforce && !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|t| t.as_str()).collect();
            return Err(DomainError::invariant(format!(
                "cannot {action}: required documents missing: {}",
                names.join(", ")
            )));
        }
        Ok(missing)
    }

    // ---- CPCV ----

    pub fn validate_prepare_cpcv(&self, draft: CpcvDraft) -> DomainResult<CpcvDraft> {
        self.ensure_progressing("prepare the CPCV")?;
        if self.cpcv.status == CpcvStatus::Signed {
            return Err(DomainError::invariant("CPCV is already signed"));
        }
        require(draft.signal_amount, "signal_amount")?;
        ensure_positive("signal_amount", draft.signal_amount)?;

        Ok(CpcvDraft {
            scheduled_date: draft.scheduled_date,
            signal_amount: draft.signal_amount,
            location: clean(draft.location),
            notes: clean(draft.notes),
        })
    }

    pub fn apply_prepare_cpcv(&mut self, draft: &CpcvDraft) {
        self.cpcv.status = CpcvStatus::Prepared;
        self.cpcv.scheduled_date = draft.scheduled_date;
        self.cpcv.signal_amount = draft.signal_amount;
        self.cpcv.location = draft.location.clone();
        self.cpcv.notes = draft.notes.clone();
    }

    /// Returns the required documents still missing at signing.
    pub fn validate_sign_cpcv(&self, enforce_required_documents: bool) -> DomainResult<Vec<DocumentType>> {
        self.ensure_progressing("sign the CPCV")?;
        if self.cpcv.status == CpcvStatus::Signed {
            return Err(DomainError::invariant("CPCV is already signed"));
        }
        require(self.cpcv.scheduled_date, "cpcv.scheduled_date")?;
        require(self.cpcv.signal_amount, "cpcv.signal_amount")?;
        ensure_positive("cpcv.signal_amount", self.cpcv.signal_amount)?;
        require(self.cpcv.location.as_ref(), "cpcv.location")?;

        self.check_documents("sign the CPCV", enforce_required_documents)
    }

    pub fn apply_sign_cpcv(&mut self, at: DateTime<Utc>) {
        self.cpcv.status = CpcvStatus::Signed;
        self.cpcv.signed_date = Some(at);
        self.cpcv.documents_snapshot = Some(self.documents.clone());
        self.stage = TransactionStage::CpcvSigned;
    }

    // ---- Escritura ----

    pub fn validate_prepare_escritura(&self, draft: EscrituraDraft) -> DomainResult<EscrituraDraft> {
        self.ensure_progressing("prepare the escritura")?;
        self.ensure_cpcv_signed("prepare the escritura")?;
        require(draft.scheduled_date, "scheduled_date")?;
        ensure_positive("final_amount", draft.final_amount)?;

        Ok(EscrituraDraft {
            scheduled_date: draft.scheduled_date,
            notary_name: clean(draft.notary_name),
            notary_location: clean(draft.notary_location),
            final_amount: draft.final_amount,
            registration_number: clean(draft.registration_number),
            notes: clean(draft.notes),
        })
    }

    /// The first scheduling moves `cpcv_signed → escritura_scheduled`; later
    /// prepares only rewrite the fields.
    pub fn apply_prepare_escritura(&mut self, draft: &EscrituraDraft) {
        self.escritura.status = EscrituraStatus::Scheduled;
        self.escritura.scheduled_date = draft.scheduled_date;
        self.escritura.notary_name = draft.notary_name.clone();
        self.escritura.notary_location = draft.notary_location.clone();
        self.escritura.final_amount = draft.final_amount;
        self.escritura.registration_number = draft.registration_number.clone();
        self.escritura.notes = draft.notes.clone();
        if self.stage == TransactionStage::CpcvSigned {
            self.stage = TransactionStage::EscrituraScheduled;
        }
    }

    /// Returns the registration number to record and the required documents
    /// still missing. The number may come from the call or from the last
    /// prepare.
    pub fn validate_complete_escritura(
        &self,
        registration_number: Option<String>,
        enforce_required_documents: bool,
    ) -> DomainResult<(String, Vec<DocumentType>)> {
        self.ensure_progressing("complete the escritura")?;
        self.ensure_cpcv_signed("complete the escritura")?;
        if self.escritura.status != EscrituraStatus::Scheduled {
            return Err(DomainError::invariant(
                "cannot complete the escritura before it is scheduled",
            ));
        }
        require(self.escritura.scheduled_date, "escritura.scheduled_date")?;
        require(self.escritura.notary_name.as_ref(), "escritura.notary_name")?;
        require(self.escritura.notary_location.as_ref(), "escritura.notary_location")?;
        let registration_number = require(
            clean(registration_number).or_else(|| self.escritura.registration_number.clone()),
            "registration_number",
        )?;

        let missing = self.check_documents("complete the escritura", enforce_required_documents)?;
        Ok((registration_number, missing))
    }

    pub fn apply_complete_escritura(&mut self, registration_number: &str, at: DateTime<Utc>) {
        self.escritura.status = EscrituraStatus::Completed;
        self.escritura.registration_number = Some(registration_number.to_string());
        self.escritura.completed_date = Some(at);
        self.stage = TransactionStage::Completed;
    }

    // ---- fell through ----

    pub fn validate_fell_through(&self, reason: &str) -> DomainResult<String> {
        self.ensure_progressing("mark the deal as fallen through")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("reason is required"));
        }
        Ok(reason.to_string())
    }

    pub fn apply_fell_through(&mut self, reason: &str, at: DateTime<Utc>) {
        self.fell_through = Some(FellThrough {
            reason: reason.to_string(),
            at,
            from_stage: self.stage,
        });
        self.stage = TransactionStage::FellThrough;
    }

    // ---- documents ----

    pub fn validate_document_status(&self, doc_type: DocumentType) -> DomainResult<()> {
        self.documents.ensure_tracked(doc_type)
    }

    pub fn apply_document_status(
        &mut self,
        doc_type: DocumentType,
        status: DocumentStatus,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.documents.set_status(doc_type, status, notes, at);
    }

    // ---- financing ----

    pub fn has_financing(&self) -> bool {
        self.financing.is_some()
    }

    /// Turning financing off discards the ledger.
    pub fn apply_set_financing(&mut self, enabled: bool) {
        self.financing = match (enabled, self.financing.take()) {
            (true, Some(existing)) => Some(existing),
            (true, None) => Some(FinancingLedger::new()),
            (false, _) => None,
        };
    }

    fn ensure_financing(&self) -> DomainResult<()> {
        if self.financing.is_none() {
            return Err(DomainError::invariant("financing is not enabled for this transaction"));
        }
        Ok(())
    }

    pub fn validate_financing_details(
        &self,
        bank_name: Option<&str>,
        approval_amount: Option<Decimal>,
    ) -> DomainResult<(Option<String>, Option<Decimal>)> {
        self.ensure_financing()?;
        validate_details(bank_name, approval_amount)
    }

    pub fn apply_financing_details(&mut self, bank_name: Option<String>, approval_amount: Option<Decimal>) {
        if let Some(ledger) = self.financing.as_mut() {
            ledger.set_details(bank_name, approval_amount);
        }
    }

    pub fn validate_financing_milestone(&self) -> DomainResult<()> {
        self.ensure_financing()
    }

    pub fn apply_financing_milestone(
        &mut self,
        milestone: FinancingMilestone,
        done: bool,
        date: Option<DateTime<Utc>>,
    ) {
        if let Some(ledger) = self.financing.as_mut() {
            ledger.set_milestone(milestone, done, date);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn opened() -> Transaction {
        Transaction::open(
            AcceptedOfferSnapshot {
                offer_id: OfferId::new(),
                buyer_name: "Rui Costa".into(),
                agreed_amount: d(200_000),
            },
            Utc::now(),
        )
    }

    fn cpcv_draft() -> CpcvDraft {
        CpcvDraft {
            scheduled_date: Some(Utc::now() + Duration::days(10)),
            signal_amount: Some(d(20_000)),
            location: Some(" Lisboa ".into()),
            notes: None,
        }
    }

    fn escritura_draft() -> EscrituraDraft {
        EscrituraDraft {
            scheduled_date: Some(Utc::now() + Duration::days(60)),
            notary_name: Some("Cartório Central".into()),
            notary_location: Some("Porto".into()),
            final_amount: Some(d(200_000)),
            registration_number: None,
            notes: None,
        }
    }

    fn signed() -> Transaction {
        let mut tx = opened();
        let draft = tx.validate_prepare_cpcv(cpcv_draft()).unwrap();
        tx.apply_prepare_cpcv(&draft);
        tx.validate_sign_cpcv(false).unwrap();
        tx.apply_sign_cpcv(Utc::now());
        tx
    }

    #[test]
    fn prepare_cpcv_twice_is_idempotent() {
        let mut tx = opened();
        let payload = cpcv_draft();

        let first = tx.validate_prepare_cpcv(payload.clone()).unwrap();
        tx.apply_prepare_cpcv(&first);
        let after_first = tx.cpcv().clone();

        let second = tx.validate_prepare_cpcv(payload).unwrap();
        tx.apply_prepare_cpcv(&second);

        assert_eq!(tx.cpcv(), &after_first);
        assert_eq!(tx.cpcv().status, CpcvStatus::Prepared);
        assert_eq!(tx.cpcv().location.as_deref(), Some("Lisboa"));
        assert_eq!(tx.stage(), TransactionStage::OfferAccepted);
    }

    #[test]
    fn prepare_cpcv_needs_a_positive_signal() {
        let tx = opened();
        for signal in [None, Some(Decimal::ZERO)] {
            let draft = CpcvDraft { signal_amount: signal, ..cpcv_draft() };
            assert!(matches!(tx.validate_prepare_cpcv(draft), Err(DomainError::Validation(_))));
        }
    }

    #[test]
    fn sign_revalidates_required_fields() {
        let mut tx = opened();
        let draft = tx
            .validate_prepare_cpcv(CpcvDraft { location: None, ..cpcv_draft() })
            .unwrap();
        tx.apply_prepare_cpcv(&draft);

        match tx.validate_sign_cpcv(false).unwrap_err() {
            DomainError::Validation(msg) if msg.contains("location") => {}
            other => panic!("expected location validation error, got {other:?}"),
        }
    }

    #[test]
    fn signing_freezes_date_and_documents() {
        let mut tx = opened();
        tx.apply_document_status(DocumentType::EnergyCertificate, DocumentStatus::Received, None, Utc::now());
        let draft = tx.validate_prepare_cpcv(cpcv_draft()).unwrap();
        tx.apply_prepare_cpcv(&draft);

        let missing = tx.validate_sign_cpcv(false).unwrap();
        let at = Utc::now();
        tx.apply_sign_cpcv(at);
        tx.apply_document_status(DocumentType::FloorPlan, DocumentStatus::Received, None, at);

        assert_eq!(missing.len(), 4);
        assert_eq!(tx.stage(), TransactionStage::CpcvSigned);
        assert_eq!(tx.cpcv().signed_date, Some(at));
        let snapshot = tx.cpcv().documents_snapshot.as_ref().unwrap();
        assert_eq!(snapshot.entry(DocumentType::FloorPlan).unwrap().status, DocumentStatus::Pending);
        assert!(matches!(tx.validate_prepare_cpcv(cpcv_draft()), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn strict_gating_lists_missing_documents() {
        let mut tx = opened();
        let draft = tx.validate_prepare_cpcv(cpcv_draft()).unwrap();
        tx.apply_prepare_cpcv(&draft);

        match tx.validate_sign_cpcv(true).unwrap_err() {
            DomainError::InvariantViolation(msg) if msg.contains("property_tax_record") => {}
            other => panic!("expected missing documents error, got {other:?}"),
        }
    }

    #[test]
    fn escritura_before_cpcv_is_an_invariant_violation() {
        let tx = opened();

        assert!(matches!(
            tx.validate_prepare_escritura(escritura_draft()),
            Err(DomainError::InvariantViolation(_))
        ));
        assert!(matches!(
            tx.validate_complete_escritura(Some("REG-1".into()), false),
            Err(DomainError::InvariantViolation(_))
        ));
        assert_eq!(tx.stage(), TransactionStage::OfferAccepted);
    }

    #[test]
    fn only_the_first_escritura_prepare_moves_the_stage() {
        let mut tx = signed();

        let draft = tx.validate_prepare_escritura(escritura_draft()).unwrap();
        tx.apply_prepare_escritura(&draft);
        assert_eq!(tx.stage(), TransactionStage::EscrituraScheduled);

        let again = tx
            .validate_prepare_escritura(EscrituraDraft {
                notary_name: Some("Outro Cartório".into()),
                ..escritura_draft()
            })
            .unwrap();
        tx.apply_prepare_escritura(&again);
        assert_eq!(tx.stage(), TransactionStage::EscrituraScheduled);
        assert_eq!(tx.escritura().notary_name.as_deref(), Some("Outro Cartório"));
    }

    #[test]
    fn notary_may_be_missing_until_completion() {
        let mut tx = signed();
        let draft = tx
            .validate_prepare_escritura(EscrituraDraft {
                notary_name: None,
                notary_location: Some("   ".into()),
                ..escritura_draft()
            })
            .unwrap();
        tx.apply_prepare_escritura(&draft);
        assert_eq!(tx.stage(), TransactionStage::EscrituraScheduled);

        match tx.validate_complete_escritura(Some("AP-1".into()), false).unwrap_err() {
            DomainError::Validation(msg) if msg.contains("notary_name") => {}
            other => panic!("expected notary_name validation error, got {other:?}"),
        }

        let draft = tx
            .validate_prepare_escritura(EscrituraDraft {
                notary_location: None,
                ..escritura_draft()
            })
            .unwrap();
        tx.apply_prepare_escritura(&draft);
        match tx.validate_complete_escritura(Some("AP-1".into()), false).unwrap_err() {
            DomainError::Validation(msg) if msg.contains("notary_location") => {}
            other => panic!("expected notary_location validation error, got {other:?}"),
        }
    }

    #[test]
    fn completion_requires_a_registration_number() {
        let mut tx = signed();
        let draft = tx.validate_prepare_escritura(escritura_draft()).unwrap();
        tx.apply_prepare_escritura(&draft);

        match tx.validate_complete_escritura(Some("  ".into()), false).unwrap_err() {
            DomainError::Validation(msg) if msg.contains("registration_number") => {}
            other => panic!("expected registration_number validation error, got {other:?}"),
        }

        let (number, _) = tx.validate_complete_escritura(Some("AP-2024-77".into()), false).unwrap();
        let at = Utc::now();
        tx.apply_complete_escritura(&number, at);

        assert_eq!(tx.stage(), TransactionStage::Completed);
        assert_eq!(tx.escritura().completed_date, Some(at));
        assert!(matches!(
            tx.validate_fell_through("buyer walked"),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn fell_through_is_terminal() {
        let mut tx = signed();
        let reason = tx.validate_fell_through(" bank refused ").unwrap();
        tx.apply_fell_through(&reason, Utc::now());

        assert_eq!(tx.stage(), TransactionStage::FellThrough);
        assert_eq!(tx.fell_through().unwrap().from_stage, TransactionStage::CpcvSigned);
        assert!(matches!(
            tx.validate_prepare_escritura(escritura_draft()),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn financing_edits_need_the_ledger_enabled() {
        let mut tx = opened();
        assert!(matches!(tx.validate_financing_milestone(), Err(DomainError::InvariantViolation(_))));

        tx.apply_set_financing(true);
        tx.apply_financing_milestone(FinancingMilestone::BankApproval, true, Some(Utc::now()));
        tx.apply_set_financing(true);
        assert!(tx.financing().unwrap().bank_approval.done);

        tx.apply_set_financing(false);
        assert!(!tx.has_financing());
    }
}
