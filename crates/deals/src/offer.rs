//! Buyer offers and their negotiation state machine.
//!
//! ```text
//! pending ──► accepted
//!    │  └───► rejected
//!    │  └───► expired
//!    └──────► countered ──► accepted | rejected | countered | expired
//! ```
//!
//! A negotiation thread is collapsed onto one record: a new counter replaces
//! the previous one, no history is kept. The cross-offer "only one accepted
//! offer" rule lives on the opportunity, not here.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealflow_core::{DomainError, DomainResult, Entity, OfferId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancingStatus {
    Cash,
    PreApproved,
    Pending,
}

impl FinancingStatus {
    fn strength(self) -> u8 {
        match self {
            FinancingStatus::Cash => 2,
            FinancingStatus::PreApproved => 1,
            FinancingStatus::Pending => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuyerQuality {
    High,
    Medium,
    Low,
}

impl BuyerQuality {
    fn rank(self) -> u8 {
        match self {
            BuyerQuality::High => 2,
            BuyerQuality::Medium => 1,
            BuyerQuality::Low => 0,
        }
    }
}

/// Flat status label, for matching and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Countered,
    Expired,
}

impl OfferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Countered => "countered",
            OfferStatus::Expired => "expired",
        }
    }
}

impl core::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Negotiation state with the data that only exists in that state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OfferState {
    Pending,
    Accepted {
        agreed_amount: Decimal,
    },
    Rejected {
        reject_reason: String,
    },
    Countered {
        counter_amount: Decimal,
        #[serde(default)]
        counter_conditions: BTreeSet<String>,
    },
    Expired,
}

/// What the buyer proposes. Never changes after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTerms {
    pub buyer_name: String,
    pub amount: Decimal,
    #[serde(default)]
    pub down_payment: Option<Decimal>,
    pub financing_status: FinancingStatus,
    #[serde(default)]
    pub conditions: BTreeSet<String>,
    pub buyer_quality_score: BuyerQuality,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OfferTerms {
    pub fn validate(&self) -> DomainResult<()> {
        if self.buyer_name.trim().is_empty() {
            return Err(DomainError::validation("buyer_name is required"));
        }
        if self.amount <= Decimal::ZERO {
            return Err(DomainError::validation("amount must be positive"));
        }
        if let Some(down) = self.down_payment {
            if down < Decimal::ZERO || down > self.amount {
                return Err(DomainError::validation(
                    "down_payment must be between 0 and the offer amount",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    id: OfferId,
    #[serde(flatten)]
    terms: OfferTerms,
    #[serde(flatten)]
    state: OfferState,
    submitted_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl Entity for Offer {
    type Id = OfferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Offer {
    pub fn submitted(id: OfferId, terms: OfferTerms, at: DateTime<Utc>) -> Self {
        Self {
            id,
            terms,
            state: OfferState::Pending,
            submitted_at: at,
            responded_at: None,
        }
    }

    pub fn id_typed(&self) -> OfferId {
        self.id
    }

    pub fn terms(&self) -> &OfferTerms {
        &self.terms
    }

    pub fn amount(&self) -> Decimal {
        self.terms.amount
    }

    pub fn state(&self) -> &OfferState {
        &self.state
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }

    pub fn status(&self) -> OfferStatus {
        match self.state {
            OfferState::Pending => OfferStatus::Pending,
            OfferState::Accepted { .. } => OfferStatus::Accepted,
            OfferState::Rejected { .. } => OfferStatus::Rejected,
            OfferState::Countered { .. } => OfferStatus::Countered,
            OfferState::Expired => OfferStatus::Expired,
        }
    }

    pub fn counter_amount(&self) -> Option<Decimal> {
        match &self.state {
            OfferState::Countered { counter_amount, .. } => Some(*counter_amount),
            _ => None,
        }
    }

    pub fn counter_conditions(&self) -> Option<&BTreeSet<String>> {
        match &self.state {
            OfferState::Countered { counter_conditions, .. } => Some(counter_conditions),
            _ => None,
        }
    }

    pub fn reject_reason(&self) -> Option<&str> {
        match &self.state {
            OfferState::Rejected { reject_reason } => Some(reject_reason),
            _ => None,
        }
    }

    pub fn agreed_amount(&self) -> Option<Decimal> {
        match &self.state {
            OfferState::Accepted { agreed_amount } => Some(*agreed_amount),
            _ => None,
        }
    }

    /// Amount currently on the table: the agreed amount once accepted, the
    /// counter while countered, the buyer's amount otherwise.
    pub fn effective_amount(&self) -> Decimal {
        match &self.state {
            OfferState::Accepted { agreed_amount } => *agreed_amount,
            OfferState::Countered { counter_amount, .. } => *counter_amount,
            _ => self.terms.amount,
        }
    }

    /// Still negotiable (pending or countered).
    pub fn is_open(&self) -> bool {
        matches!(self.state, OfferState::Pending | OfferState::Countered { .. })
    }

    pub fn is_past_validity(&self, now: DateTime<Utc>) -> bool {
        self.terms.valid_until.is_some_and(|until| until < now)
    }

    fn ensure_open(&self, action: &str) -> DomainResult<()> {
        if !self.is_open() {
            return Err(DomainError::invariant(format!(
                "cannot {action} offer {} in status {}",
                self.id,
                self.status()
            )));
        }
        Ok(())
    }

    /// Decide acceptance; returns the amount the deal is agreed at.
    pub fn decide_accept(&self, now: DateTime<Utc>) -> DomainResult<Decimal> {
        self.ensure_open("accept")?;
        if self.is_past_validity(now) {
            return Err(DomainError::invariant(format!(
                "offer {} expired before it was accepted",
                self.id
            )));
        }
        let agreed = self.effective_amount();
        if agreed <= Decimal::ZERO {
            return Err(DomainError::validation("amount must be positive"));
        }
        Ok(agreed)
    }

    /// Decide rejection; returns the normalised reason.
    pub fn decide_reject(&self, reason: &str) -> DomainResult<String> {
        self.ensure_open("reject")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("reject_reason is required"));
        }
        Ok(reason.to_string())
    }

    pub fn decide_counter(&self, counter_amount: Decimal) -> DomainResult<()> {
        self.ensure_open("counter")?;
        if counter_amount <= Decimal::ZERO {
            return Err(DomainError::validation("counter_amount must be positive"));
        }
        Ok(())
    }

    pub(crate) fn set_state(&mut self, state: OfferState, at: DateTime<Utc>) {
        self.state = state;
        self.responded_at = Some(at);
    }
}

/// Advisory "best offer" ordering over open offers: effective amount, then
/// buyer quality, then financing strength, then earliest submission.
///
/// Display sugar only; nothing in the engine selects an offer from it.
pub fn rank_offers<'a>(offers: impl IntoIterator<Item = &'a Offer>) -> Vec<&'a Offer> {
    let mut open: Vec<&Offer> = offers.into_iter().filter(|o| o.is_open()).collect();
    open.sort_by(|a, b| {
        b.effective_amount()
            .cmp(&a.effective_amount())
            .then_with(|| b.terms.buyer_quality_score.rank().cmp(&a.terms.buyer_quality_score.rank()))
            .then_with(|| {
                b.terms
                    .financing_status
                    .strength()
                    .cmp(&a.terms.financing_status.strength())
            })
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
    });
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn terms(amount: i64) -> OfferTerms {
        OfferTerms {
            buyer_name: "Ana Ferreira".to_string(),
            amount: d(amount),
            down_payment: None,
            financing_status: FinancingStatus::Cash,
            conditions: BTreeSet::new(),
            buyer_quality_score: BuyerQuality::Medium,
            valid_until: None,
            notes: None,
        }
    }

    fn offer(amount: i64) -> Offer {
        Offer::submitted(OfferId::new(), terms(amount), Utc::now())
    }

    #[test]
    fn terms_validation() {
        assert!(terms(200_000).validate().is_ok());
        assert!(matches!(terms(0).validate(), Err(DomainError::Validation(_))));

        let mut nameless = terms(1);
        nameless.buyer_name = "  ".into();
        assert!(matches!(nameless.validate(), Err(DomainError::Validation(_))));

        let mut too_much_down = terms(100);
        too_much_down.down_payment = Some(d(101));
        assert!(matches!(too_much_down.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn accepting_a_counter_agrees_at_the_counter_amount() {
        let mut o = offer(200_000);
        o.set_state(
            OfferState::Countered {
                counter_amount: d(195_000),
                counter_conditions: BTreeSet::new(),
            },
            Utc::now(),
        );

        assert_eq!(o.decide_accept(Utc::now()).unwrap(), d(195_000));
        assert_eq!(o.amount(), d(200_000));
    }

    #[test]
    fn terminal_offers_refuse_every_transition() {
        let mut o = offer(100);
        o.set_state(OfferState::Rejected { reject_reason: "low".into() }, Utc::now());

        assert!(matches!(o.decide_accept(Utc::now()), Err(DomainError::InvariantViolation(_))));
        assert!(matches!(o.decide_counter(d(90)), Err(DomainError::InvariantViolation(_))));
        assert!(matches!(o.decide_reject("again"), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn reject_requires_a_reason_and_counter_a_positive_amount() {
        let o = offer(100);

        assert!(matches!(o.decide_reject("   "), Err(DomainError::Validation(_))));
        assert_eq!(o.decide_reject(" price too low ").unwrap(), "price too low");
        assert!(matches!(o.decide_counter(Decimal::ZERO), Err(DomainError::Validation(_))));
    }

    #[test]
    fn offers_past_validity_cannot_be_accepted() {
        let mut t = terms(100);
        t.valid_until = Some(Utc::now() - Duration::days(1));
        let o = Offer::submitted(OfferId::new(), t, Utc::now() - Duration::days(3));

        assert!(matches!(o.decide_accept(Utc::now()), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn status_dependent_fields_serialize_flat() {
        let mut o = offer(200_000);
        o.set_state(OfferState::Rejected { reject_reason: "financing".into() }, Utc::now());

        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reject_reason"], "financing");
        assert!(json.get("counter_amount").is_none());

        let back: Offer = serde_json::from_value(json).unwrap();
        assert_eq!(back, o);
    }

    #[test]
    fn ranking_is_advisory_and_skips_closed_offers() {
        let low = offer(180_000);
        let mut countered = offer(170_000);
        countered.set_state(
            OfferState::Countered {
                counter_amount: d(190_000),
                counter_conditions: BTreeSet::new(),
            },
            Utc::now(),
        );
        let mut high_quality = offer(180_000);
        high_quality.terms.buyer_quality_score = BuyerQuality::High;
        let mut rejected = offer(250_000);
        rejected.set_state(OfferState::Rejected { reject_reason: "x".into() }, Utc::now());

        let all = vec![low.clone(), countered.clone(), high_quality.clone(), rejected];
        let ranked: Vec<OfferId> = rank_offers(&all).iter().map(|o| o.id_typed()).collect();

        assert_eq!(
            ranked,
            vec![countered.id_typed(), high_quality.id_typed(), low.id_typed()]
        );
    }
}
