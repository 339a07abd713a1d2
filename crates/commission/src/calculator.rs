//! Commission calculator (pure).
//!
//! ```text
//! total       = sale_price × commission_rate / 100
//! production  = total × my_split / 100          (after a co-operating agent)
//! net         = production × agency_split / 100 (what the agent keeps)
//! agency      = production − net                (brokerage's retained part)
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealflow_core::{DomainError, DomainResult, ValueObject};

/// Whether the commission is shared with a co-operating agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    /// The agent's side takes the whole commission (`my_split_percentage` = 100).
    Full,
    /// Shared with another agent; `my_split_percentage` is this agent's part.
    Split,
}

/// Calculator inputs. All percentages are in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionInputs {
    pub sale_price: Decimal,
    pub commission_rate: Decimal,
    pub split_type: SplitType,
    pub my_split_percentage: Decimal,
    /// Agent's retained percentage of the production value.
    pub agency_split_percentage: Decimal,
}

impl ValueObject for CommissionInputs {}

/// Rates and splits without a sale price: what the agent (or the configured
/// defaults) supplies when an offer is accepted and the price is the agreed
/// amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTerms {
    pub commission_rate: Decimal,
    pub split_type: SplitType,
    pub my_split_percentage: Decimal,
    pub agency_split_percentage: Decimal,
}

impl ValueObject for CommissionTerms {}

impl CommissionTerms {
    pub fn at_price(&self, sale_price: Decimal) -> CommissionInputs {
        CommissionInputs {
            sale_price,
            commission_rate: self.commission_rate,
            split_type: self.split_type,
            my_split_percentage: self.my_split_percentage,
            agency_split_percentage: self.agency_split_percentage,
        }
    }
}

impl CommissionInputs {
    /// Inputs for an unshared commission.
    pub fn full(sale_price: Decimal, commission_rate: Decimal, agency_split_percentage: Decimal) -> Self {
        Self {
            sale_price,
            commission_rate,
            split_type: SplitType::Full,
            my_split_percentage: HUNDRED,
            agency_split_percentage,
        }
    }

    /// The split actually applied: a `Full` split is always 100%.
    pub fn effective_my_split(&self) -> Decimal {
        match self.split_type {
            SplitType::Full => HUNDRED,
            SplitType::Split => self.my_split_percentage,
        }
    }

    /// Co-operating agent's share of the total commission.
    pub fn other_agent_percentage(&self) -> Decimal {
        HUNDRED - self.effective_my_split()
    }

    /// Inputs with `my_split_percentage` pinned to what is applied.
    pub fn normalized(&self) -> Self {
        Self {
            my_split_percentage: self.effective_my_split(),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.sale_price <= Decimal::ZERO {
            return Err(DomainError::validation("sale_price must be positive"));
        }
        ensure_percentage("commission_rate", self.commission_rate)?;
        ensure_percentage("my_split_percentage", self.effective_my_split())?;
        ensure_percentage("agency_split_percentage", self.agency_split_percentage)?;
        Ok(())
    }
}

/// The four derived amounts. Never edited by hand: always produced by
/// [`compute_commission`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    pub total_commission: Decimal,
    pub production_value: Decimal,
    pub net_commission: Decimal,
    pub agency_share: Decimal,
}

impl ValueObject for CommissionBreakdown {}

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn ensure_percentage(field: &str, value: Decimal) -> DomainResult<()> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(DomainError::validation(format!(
            "{field} must be between 0 and 100 (got {value})"
        )));
    }
    Ok(())
}

/// Derive the commission breakdown from its inputs.
///
/// Returns `DomainError::Validation` for a non-positive sale price or any
/// percentage outside `[0, 100]`; callers decide whether that blocks a save.
pub fn compute_commission(inputs: &CommissionInputs) -> DomainResult<CommissionBreakdown> {
    inputs.validate()?;

    let total_commission = inputs.sale_price * inputs.commission_rate / HUNDRED;
    let production_value = total_commission * inputs.effective_my_split() / HUNDRED;
    let net_commission = production_value * inputs.agency_split_percentage / HUNDRED;
    let agency_share = production_value - net_commission;

    Ok(CommissionBreakdown {
        total_commission,
        production_value,
        net_commission,
        agency_share,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn full_split_sale_matches_reference_figures() {
        let inputs = CommissionInputs::full(d(200_000), d(5), d(55));

        let b = compute_commission(&inputs).unwrap();

        assert_eq!(b.total_commission, d(10_000));
        assert_eq!(b.production_value, d(10_000));
        assert_eq!(b.net_commission, d(5_500));
        assert_eq!(b.agency_share, d(4_500));
    }

    #[test]
    fn shared_commission_applies_my_split_before_agency_split() {
        let inputs = CommissionInputs {
            sale_price: d(300_000),
            commission_rate: d(4),
            split_type: SplitType::Split,
            my_split_percentage: d(50),
            agency_split_percentage: d(60),
        };

        let b = compute_commission(&inputs).unwrap();

        assert_eq!(b.total_commission, d(12_000));
        assert_eq!(b.production_value, d(6_000));
        assert_eq!(b.net_commission, d(3_600));
        assert_eq!(b.agency_share, d(2_400));
        assert_eq!(inputs.other_agent_percentage(), d(50));
    }

    #[test]
    fn full_split_ignores_a_stale_my_split_value() {
        let mut inputs = CommissionInputs::full(d(100_000), d(5), d(50));
        inputs.my_split_percentage = d(30);

        let b = compute_commission(&inputs).unwrap();

        assert_eq!(b.production_value, d(5_000));
        assert_eq!(inputs.other_agent_percentage(), Decimal::ZERO);
        assert_eq!(inputs.normalized().my_split_percentage, d(100));
    }

    #[test]
    fn fractional_rates_stay_exact() {
        let inputs = CommissionInputs::full(d(250_000), Decimal::new(35, 1), d(55));

        let b = compute_commission(&inputs).unwrap();

        assert_eq!(b.total_commission, d(8_750));
        assert_eq!(b.net_commission, Decimal::new(48_125, 1));
    }

    #[test]
    fn non_positive_sale_price_is_rejected() {
        for price in [Decimal::ZERO, d(-1)] {
            let err = compute_commission(&CommissionInputs::full(price, d(5), d(55))).unwrap_err();
            match err {
                DomainError::Validation(msg) if msg.contains("sale_price") => {}
                other => panic!("expected sale_price validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn out_of_range_percentages_are_rejected() {
        let too_high_rate = CommissionInputs::full(d(1_000), d(101), d(55));
        let negative_agency = CommissionInputs::full(d(1_000), d(5), d(-5));
        let split_over_100 = CommissionInputs {
            split_type: SplitType::Split,
            my_split_percentage: d(120),
            ..CommissionInputs::full(d(1_000), d(5), d(55))
        };

        for (inputs, field) in [
            (too_high_rate, "commission_rate"),
            (negative_agency, "agency_split_percentage"),
            (split_over_100, "my_split_percentage"),
        ] {
            match compute_commission(&inputs).unwrap_err() {
                DomainError::Validation(msg) if msg.contains(field) => {}
                other => panic!("expected {field} validation error, got {other:?}"),
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the brokerage and the agent split the production value
        /// exactly, and production never exceeds the gross commission.
        #[test]
        fn split_of_split_is_exact(
            price_cents in 1i64..1_000_000_000_00i64,
            rate_bp in 0i64..=10_000i64,
            my_split_bp in 0i64..=10_000i64,
            agency_bp in 0i64..=10_000i64,
        ) {
            let inputs = CommissionInputs {
                sale_price: Decimal::new(price_cents, 2),
                commission_rate: Decimal::new(rate_bp, 2),
                split_type: SplitType::Split,
                my_split_percentage: Decimal::new(my_split_bp, 2),
                agency_split_percentage: Decimal::new(agency_bp, 2),
            };

            let b = compute_commission(&inputs).unwrap();

            prop_assert_eq!(b.agency_share + b.net_commission, b.production_value);
            prop_assert!(b.production_value <= b.total_commission);
            prop_assert!(b.net_commission >= Decimal::ZERO);
            prop_assert!(b.agency_share >= Decimal::ZERO);
        }
    }
}
