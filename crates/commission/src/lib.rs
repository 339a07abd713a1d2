//! Commission domain module.
//!
//! Pure calculator plus the commission record and its payment tracker. No IO;
//! the opportunity aggregate owns a [`Commission`] once an offer is accepted.

pub mod calculator;
pub mod commission;
pub mod payment;

pub use calculator::{compute_commission, CommissionBreakdown, CommissionInputs, CommissionTerms, SplitType};
pub use commission::{Commission, CommissionSummary};
pub use payment::{CommissionPayment, PaymentReceipt, PaymentStatus};
