//! Payout calculation.
//!
//! Pure arithmetic over an aggregated summary and the manually entered
//! deductions. The resulting [`Settlement`] is the single source of the numbers
//! that are displayed, saved and exported.

use super::aggregation::{DriverSummary, Period};
use crate::{
    config::SettlementPolicy,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Manually entered line items for one driver, in won. Unset fields are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deductions {
    /// Employment insurance (고용보험)
    pub ins_emp: i64,
    /// Industrial accident insurance (산재보험)
    pub ins_ind: i64,
    /// Vehicle rental / transport support fee (운송지원비)
    pub rental: i64,
    /// Damage or loss (파손/분실)
    pub damage: i64,
    /// Anything else (기타)
    pub etc: i64,
    /// Freshback credit (프레시백). Added to pay, never part of the deduction total.
    pub freshback: i64,
}

impl Deductions {
    /// Sum of the five deductions. Freshback is excluded.
    ///
    /// # Errors
    /// [`Error::Overflow`] if the sum leaves the `i64` range.
    pub fn total_deduction(&self) -> Result<i64> {
        [self.ins_ind, self.rental, self.damage, self.etc]
            .into_iter()
            .try_fold(self.ins_emp, i64::checked_add)
            .ok_or_else(|| Error::overflow("total deduction"))
    }

    /// Field name and value for every entry, deductions first, freshback last.
    #[must_use]
    pub const fn entries(&self) -> [(&'static str, i64); 6] {
        [
            ("ins_emp", self.ins_emp),
            ("ins_ind", self.ins_ind),
            ("rental", self.rental),
            ("damage", self.damage),
            ("etc", self.etc),
            ("freshback", self.freshback),
        ]
    }

    /// Applies the negative-entry policy. Negative entries are logged when allowed.
    pub fn check(&self, policy: &SettlementPolicy) -> Result<()> {
        for (field, amount) in self.entries() {
            if amount >= 0 {
                continue;
            }
            if policy.reject_negative_deductions {
                return Err(Error::NegativeAmount {
                    field: field.to_string(),
                    amount,
                });
            }
            warn!(field, amount, "Negative settlement entry accepted");
        }
        Ok(())
    }
}

/// `driver_income - total_deduction + freshback`.
///
/// # Errors
/// [`Error::Overflow`] if any step leaves the `i64` range.
pub fn compute_final_pay(summary: &DriverSummary, deductions: &Deductions) -> Result<i64> {
    summary
        .driver_income
        .checked_sub(deductions.total_deduction()?)
        .and_then(|pay| pay.checked_add(deductions.freshback))
        .ok_or_else(|| Error::overflow("final pay"))
}

/// A driver's computed settlement for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub period: Period,
    pub summary: DriverSummary,
    pub deductions: Deductions,
    pub total_deduction: i64,
    pub final_pay: i64,
}

impl Settlement {
    /// Computes the settlement after applying the deduction policy.
    pub fn compute(
        period: Period,
        summary: DriverSummary,
        deductions: Deductions,
        policy: &SettlementPolicy,
    ) -> Result<Self> {
        deductions.check(policy)?;
        let total_deduction = deductions.total_deduction()?;
        let final_pay = compute_final_pay(&summary, &deductions)?;
        Ok(Self {
            period,
            summary,
            deductions,
            total_deduction,
            final_pay,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_final_pay_with_deductions_and_freshback() -> Result<()> {
        let summary = test_summary("u1", 54_500);
        let deductions = Deductions {
            ins_emp: 10_000,
            ins_ind: 5_000,
            rental: 0,
            damage: 0,
            etc: 2_000,
            freshback: 3_000,
        };

        assert_eq!(deductions.total_deduction()?, 17_000);
        assert_eq!(compute_final_pay(&summary, &deductions)?, 40_500);
        Ok(())
    }

    #[test]
    fn test_freshback_is_not_a_deduction() -> Result<()> {
        let deductions = Deductions {
            freshback: 9_999,
            ..Deductions::default()
        };
        assert_eq!(deductions.total_deduction()?, 0);
        assert_eq!(compute_final_pay(&test_summary("u1", 1_000), &deductions)?, 10_999);
        Ok(())
    }

    #[test]
    fn test_unset_deductions_default_to_zero() {
        let parsed: Deductions = toml::from_str("ins_emp = 1500").unwrap();
        assert_eq!(
            parsed,
            Deductions {
                ins_emp: 1_500,
                ..Deductions::default()
            }
        );
        assert_eq!(
            compute_final_pay(&test_summary("u1", 5_000), &Deductions::default()).unwrap(),
            5_000
        );
    }

    #[test]
    fn test_settlement_matches_standalone_formula() {
        let deductions = Deductions {
            ins_emp: 1_200,
            ins_ind: 300,
            rental: 50_000,
            damage: 7_000,
            etc: 0,
            freshback: 2_500,
        };
        let summary = test_summary("u1", 321_000);
        let settlement = Settlement::compute(
            Period::new("2024-05-01", "2024-05-31").unwrap(),
            summary.clone(),
            deductions,
            &SettlementPolicy::default(),
        )
        .unwrap();

        assert_eq!(settlement.total_deduction, 58_500);
        assert_eq!(
            settlement.final_pay,
            compute_final_pay(&summary, &deductions).unwrap()
        );
        assert_eq!(settlement.final_pay, 321_000 - 58_500 + 2_500);
    }

    #[test]
    fn test_negative_entries_follow_policy() {
        let deductions = Deductions {
            damage: -4_000,
            ..Deductions::default()
        };
        let period = Period::new("2024-05-01", "2024-05-31").unwrap();

        let lenient = Settlement::compute(
            period.clone(),
            test_summary("u1", 10_000),
            deductions,
            &SettlementPolicy::default(),
        )
        .unwrap();
        assert_eq!(lenient.final_pay, 14_000);

        let strict = SettlementPolicy {
            reject_negative_deductions: true,
            ..SettlementPolicy::default()
        };
        let result = Settlement::compute(period, test_summary("u1", 10_000), deductions, &strict);
        assert!(matches!(
            result,
            Err(Error::NegativeAmount { ref field, amount: -4_000 }) if field == "damage"
        ));
    }

    #[test]
    fn test_overflowing_entries_are_an_error() {
        let huge = Deductions {
            ins_emp: i64::MAX,
            etc: 1,
            ..Deductions::default()
        };
        assert!(matches!(
            huge.total_deduction(),
            Err(Error::Overflow { ref what }) if what == "total deduction"
        ));

        let credit = Deductions {
            freshback: i64::MAX,
            ..Deductions::default()
        };
        assert!(matches!(
            compute_final_pay(&test_summary("u1", 1), &credit),
            Err(Error::Overflow { ref what }) if what == "final pay"
        ));

        let period = Period::new("2024-05-01", "2024-05-31").unwrap();
        let result = Settlement::compute(
            period,
            test_summary("u1", 1_000),
            huge,
            &SettlementPolicy::default(),
        );
        assert!(matches!(result, Err(Error::Overflow { .. })));
    }
}
