use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealflow_core::{DomainError, DomainResult};

use crate::calculator::{compute_commission, CommissionBreakdown, CommissionInputs};
use crate::payment::{CommissionPayment, PaymentReceipt};

/// Commission record for one agreed sale.
///
/// Inputs and computed amounts only change together through [`Commission::revise`];
/// afterwards only the payment-tracking fields move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    inputs: CommissionInputs,
    other_agent_percentage: Decimal,
    computed: CommissionBreakdown,
    payment: CommissionPayment,
    calculated_at: DateTime<Utc>,
}

/// Read-side view with the display-only pending amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSummary {
    #[serde(flatten)]
    pub commission: Commission,
    pub pending_amount: Decimal,
}

impl Commission {
    /// Compute a fresh commission with payment still pending.
    pub fn calculate(inputs: &CommissionInputs, at: DateTime<Utc>) -> DomainResult<Self> {
        let inputs = inputs.normalized();
        let computed = compute_commission(&inputs)?;

        Ok(Self {
            other_agent_percentage: inputs.other_agent_percentage(),
            inputs,
            computed,
            payment: CommissionPayment::pending(),
            calculated_at: at,
        })
    }

    /// New commission terms: everything derived is recomputed.
    ///
    /// Not allowed once the payment has been marked received, since the
    /// received amount was asserted against the previous net.
    pub fn revise(&self, inputs: &CommissionInputs, at: DateTime<Utc>) -> DomainResult<Self> {
        if self.payment.is_received() {
            return Err(DomainError::invariant(
                "commission terms cannot change after payment was received",
            ));
        }
        Self::calculate(inputs, at)
    }

    /// Payment state after recording `receipt` (does not mutate).
    pub fn plan_receipt(&self, receipt: &PaymentReceipt, now: DateTime<Utc>) -> DomainResult<CommissionPayment> {
        CommissionPayment::received(receipt, self.computed.net_commission, now)
    }

    pub fn set_payment(&mut self, payment: CommissionPayment) {
        self.payment = payment;
    }

    pub fn inputs(&self) -> &CommissionInputs {
        &self.inputs
    }

    pub fn computed(&self) -> &CommissionBreakdown {
        &self.computed
    }

    pub fn payment(&self) -> &CommissionPayment {
        &self.payment
    }

    pub fn other_agent_percentage(&self) -> Decimal {
        self.other_agent_percentage
    }

    pub fn calculated_at(&self) -> DateTime<Utc> {
        self.calculated_at
    }

    pub fn pending_amount(&self) -> Decimal {
        self.payment.pending_amount(self.computed.net_commission)
    }

    pub fn summary(&self) -> CommissionSummary {
        CommissionSummary {
            commission: self.clone(),
            pending_amount: self.pending_amount(),
        }
    }
}
