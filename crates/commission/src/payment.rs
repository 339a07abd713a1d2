//! Commission payment tracking: expected versus actually received.
//!
//! Payment state is asserted manually by the agent; nothing here talks to a
//! payment processor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealflow_core::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Received,
}

/// Payment-tracking fields of a commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionPayment {
    pub status: PaymentStatus,
    pub amount_received: Option<Decimal>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_notes: Option<String>,
}

/// Agent input when marking a commission as received. Unset fields fall back
/// to the net commission and the time of the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub amount_received: Option<Decimal>,
    pub payment_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl CommissionPayment {
    pub fn pending() -> Self {
        Self {
            status: PaymentStatus::Pending,
            amount_received: None,
            payment_date: None,
            payment_notes: None,
        }
    }

    /// Resolve a receipt into the `received` payment state.
    pub fn received(
        receipt: &PaymentReceipt,
        net_commission: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let amount = receipt.amount_received.unwrap_or(net_commission);
        if amount < Decimal::ZERO {
            return Err(DomainError::validation("amount_received must not be negative"));
        }

        Ok(Self {
            status: PaymentStatus::Received,
            amount_received: Some(amount),
            payment_date: Some(receipt.payment_date.unwrap_or(now)),
            payment_notes: receipt
                .notes
                .as_ref()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
    }

    pub fn is_received(&self) -> bool {
        self.status == PaymentStatus::Received
    }

    /// `net − received`; negative when more than the net was paid.
    pub fn pending_amount(&self, net_commission: Decimal) -> Decimal {
        net_commission - self.amount_received.unwrap_or(Decimal::ZERO)
    }
}

impl Default for CommissionPayment {
    fn default() -> Self {
        Self::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn receipt_without_override_defaults_to_net_and_now() {
        let at = now();
        let p = CommissionPayment::received(&PaymentReceipt::default(), Decimal::from(5_500), at).unwrap();

        assert_eq!(p.status, PaymentStatus::Received);
        assert_eq!(p.amount_received, Some(Decimal::from(5_500)));
        assert_eq!(p.payment_date, Some(at));
        assert_eq!(p.pending_amount(Decimal::from(5_500)), Decimal::ZERO);
    }

    #[test]
    fn partial_payment_leaves_pending_amount() {
        let receipt = PaymentReceipt {
            amount_received: Some(Decimal::from(2_000)),
            payment_date: None,
            notes: Some("  first instalment ".to_string()),
        };

        let p = CommissionPayment::received(&receipt, Decimal::from(5_500), now()).unwrap();

        assert_eq!(p.pending_amount(Decimal::from(5_500)), Decimal::from(3_500));
        assert_eq!(p.payment_notes.as_deref(), Some("first instalment"));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let receipt = PaymentReceipt {
            amount_received: Some(Decimal::from(-1)),
            ..PaymentReceipt::default()
        };

        let err = CommissionPayment::received(&receipt, Decimal::from(100), now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn pending_payment_owes_the_full_net() {
        assert_eq!(
            CommissionPayment::pending().pending_amount(Decimal::from(700)),
            Decimal::from(700)
        );
    }
}
