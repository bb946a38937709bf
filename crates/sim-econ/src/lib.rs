#![deny(warnings)]

//! Economic helpers for AI Lab Tycoon.
//!
//! This crate provides validated utilities for:
//! - Cash accrual from per-second revenue and expenses, floored at zero
//! - Multiplicative expense reductions
//! - Compact number and currency labels for headlines

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced by economic helpers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EconError {
    /// A floating point input could not be represented as money.
    #[error("non-finite numeric conversion")]
    NonFinite,
    /// Decimal arithmetic left the representable range.
    #[error("monetary overflow")]
    Overflow,
    /// Fractions must be within [0, 1].
    #[error("invalid fraction: {0}")]
    InvalidFraction(f64),
}

/// Whether `cash` covers `cost`.
pub fn can_afford(cash: Decimal, cost: Decimal) -> bool {
    cash >= cost
}

/// Net cash flow per second.
///
/// Example:
/// let net = net_rate(Decimal::new(800, 0), Decimal::new(250, 0)).unwrap();
/// assert_eq!(net, Decimal::new(550, 0));
pub fn net_rate(
    revenue_per_second: Decimal,
    expenses_per_second: Decimal,
) -> Result<Decimal, EconError> {
    revenue_per_second
        .checked_sub(expenses_per_second)
        .ok_or(EconError::Overflow)
}

/// Convert a duration in seconds to a decimal factor.
fn seconds(delta_seconds: f64) -> Result<Decimal, EconError> {
    if !delta_seconds.is_finite() {
        return Err(EconError::NonFinite);
    }
    Decimal::from_f64(delta_seconds).ok_or(EconError::NonFinite)
}

/// Cash after `delta_seconds` of flow at `net_per_second`, never below zero.
///
/// Example:
/// let cash = accrue(Decimal::ZERO, Decimal::new(-10, 0), 5.0).unwrap();
/// assert_eq!(cash, Decimal::ZERO);
pub fn accrue(
    cash: Decimal,
    net_per_second: Decimal,
    delta_seconds: f64,
) -> Result<Decimal, EconError> {
    let dt = seconds(delta_seconds)?;
    let flow = net_per_second.checked_mul(dt).ok_or(EconError::Overflow)?;
    let next = cash.checked_add(flow).ok_or(EconError::Overflow)?;
    Ok(next.max(Decimal::ZERO))
}

/// Expenses after removing `reduction` of them (`expenses * (1 - reduction)`).
///
/// Example:
/// let e = reduce_expenses(Decimal::new(250, 0), 0.2).unwrap();
/// assert_eq!(e, Decimal::new(200, 0));
pub fn reduce_expenses(expenses: Decimal, reduction: f64) -> Result<Decimal, EconError> {
    if !reduction.is_finite() {
        return Err(EconError::NonFinite);
    }
    if !(0.0..=1.0).contains(&reduction) {
        return Err(EconError::InvalidFraction(reduction));
    }
    let keep = Decimal::ONE - Decimal::from_f64(reduction).ok_or(EconError::NonFinite)?;
    expenses.checked_mul(keep).ok_or(EconError::Overflow)
}

/// Compact label: `B` and `M` with two decimals, `K` with one, otherwise a
/// whole number.
///
/// Example:
/// assert_eq!(format_number(1_500.0), "1.5K");
/// assert_eq!(format_number(2_340_000.0), "2.34M");
pub fn format_number(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

/// [`format_number`] with a dollar sign.
pub fn format_currency(value: Decimal) -> String {
    format!("${}", format_number(value.to_f64().unwrap_or(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accrue_matches_flow_exactly() {
        let net = net_rate(Decimal::new(800, 0), Decimal::new(250, 0)).unwrap();
        let mut cash = Decimal::ZERO;
        for _ in 0..10 {
            cash = accrue(cash, net, 1.0).unwrap();
        }
        assert_eq!(cash, Decimal::new(5500, 0));
    }

    #[test]
    fn net_rate_reports_overflow() {
        assert_eq!(
            net_rate(Decimal::MAX, Decimal::NEGATIVE_ONE),
            Err(EconError::Overflow)
        );
        assert_eq!(
            net_rate(Decimal::MIN, Decimal::ONE),
            Err(EconError::Overflow)
        );
    }

    #[test]
    fn accrue_floors_at_zero() {
        let cash = accrue(Decimal::new(100, 0), Decimal::new(-250, 0), 1.0).unwrap();
        assert_eq!(cash, Decimal::ZERO);
    }

    #[test]
    fn accrue_rejects_non_finite() {
        assert_eq!(
            accrue(Decimal::ONE, Decimal::ONE, f64::NAN),
            Err(EconError::NonFinite)
        );
    }

    #[test]
    fn reduce_expenses_is_multiplicative() {
        let e = reduce_expenses(Decimal::new(250, 0), 0.2).unwrap();
        assert_eq!(e, Decimal::new(200, 0));
        let e = reduce_expenses(e, 0.5).unwrap();
        assert_eq!(e, Decimal::new(100, 0));
        assert!(reduce_expenses(e, 1.5).is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1_500.0), "1.5K");
        assert_eq!(format_number(2_340_000.0), "2.34M");
        assert_eq!(format_number(6_500_000_000.0), "6.50B");
        assert_eq!(format_currency(Decimal::new(30_000_000, 0)), "$30.00M");
        assert_eq!(format_currency(Decimal::new(500, 0)), "$500");
    }

    #[test]
    fn can_afford_is_inclusive() {
        assert!(can_afford(Decimal::new(10, 0), Decimal::new(10, 0)));
        assert!(!can_afford(Decimal::new(9, 0), Decimal::new(10, 0)));
    }

    proptest! {
        #[test]
        fn accrue_never_negative(cash in 0i64..1_000_000, net in -10_000i64..10_000, dt in 0.0f64..5.0) {
            let next = accrue(Decimal::new(cash, 0), Decimal::new(net, 0), dt).unwrap();
            prop_assert!(next >= Decimal::ZERO);
        }
    }
}
