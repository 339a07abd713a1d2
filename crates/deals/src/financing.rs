//! Financing milestone ledger (mortgage-backed sales only).
//!
//! Milestones are independent flags; none of them is ordered against the
//! others or against the transaction stage.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealflow_core::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancingMilestone {
    BankApproval,
    EvaluationScheduled,
    EvaluationCompleted,
    FinalApproval,
}

impl FinancingMilestone {
    pub const ALL: [FinancingMilestone; 4] = [
        FinancingMilestone::BankApproval,
        FinancingMilestone::EvaluationScheduled,
        FinancingMilestone::EvaluationCompleted,
        FinancingMilestone::FinalApproval,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneMark {
    pub done: bool,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingLedger {
    pub bank_name: Option<String>,
    pub approval_amount: Option<Decimal>,
    pub bank_approval: MilestoneMark,
    pub evaluation_scheduled: MilestoneMark,
    pub evaluation_completed: MilestoneMark,
    pub final_approval: MilestoneMark,
}

impl FinancingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn milestone(&self, milestone: FinancingMilestone) -> &MilestoneMark {
        match milestone {
            FinancingMilestone::BankApproval => &self.bank_approval,
            FinancingMilestone::EvaluationScheduled => &self.evaluation_scheduled,
            FinancingMilestone::EvaluationCompleted => &self.evaluation_completed,
            FinancingMilestone::FinalApproval => &self.final_approval,
        }
    }

    fn milestone_mut(&mut self, milestone: FinancingMilestone) -> &mut MilestoneMark {
        match milestone {
            FinancingMilestone::BankApproval => &mut self.bank_approval,
            FinancingMilestone::EvaluationScheduled => &mut self.evaluation_scheduled,
            FinancingMilestone::EvaluationCompleted => &mut self.evaluation_completed,
            FinancingMilestone::FinalApproval => &mut self.final_approval,
        }
    }

    /// Clearing a milestone also clears its date.
    pub fn set_milestone(&mut self, milestone: FinancingMilestone, done: bool, date: Option<DateTime<Utc>>) {
        *self.milestone_mut(milestone) = MilestoneMark {
            done,
            date: if done { date } else { None },
        };
    }

    pub fn set_details(&mut self, bank_name: Option<String>, approval_amount: Option<Decimal>) {
        self.bank_name = bank_name;
        self.approval_amount = approval_amount;
    }

    pub fn completed(&self) -> Vec<FinancingMilestone> {
        FinancingMilestone::ALL
            .into_iter()
            .filter(|m| self.milestone(*m).done)
            .collect()
    }
}

/// Normalise and validate bank details before they are recorded.
pub fn validate_details(
    bank_name: Option<&str>,
    approval_amount: Option<Decimal>,
) -> DomainResult<(Option<String>, Option<Decimal>)> {
    if let Some(amount) = approval_amount {
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation("approval_amount must be positive"));
        }
    }
    let bank_name = bank_name.map(str::trim).filter(|b| !b.is_empty()).map(str::to_string);
    Ok((bank_name, approval_amount))
}
