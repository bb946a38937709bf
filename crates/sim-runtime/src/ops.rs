//! Player transactions: upgrades and funding rounds.
//!
//! Every operation checks all of its preconditions before touching the
//! state, so a refusal leaves the state exactly as it was.

use rust_decimal::Decimal;
use sim_core::{CompanyState, FundingRound, Upgrade, UpgradeKind};
use sim_econ::{can_afford, format_currency, reduce_expenses, EconError};
use thiserror::Error;
use tracing::{debug, info};

/// Why a transaction was refused. The message is meant for the player.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransactionError {
    #[error("Model not found.")]
    ModelNotFound,
    #[error("Research previous model first.")]
    Locked,
    #[error("Model already researched.")]
    AlreadyResearched,
    #[error("Another project is already training.")]
    AlreadyTraining,
    #[error("Insufficient cash.")]
    InsufficientCash,
    #[error("Insufficient compute capacity.")]
    InsufficientCompute,
    #[error("Upgrade already purchased.")]
    AlreadyPurchased,
    #[error("Funding already raised.")]
    AlreadyClaimed,
    #[error("Unknown upgrade.")]
    UnknownUpgrade,
    #[error("Unknown funding round.")]
    UnknownFundingRound,
    #[error("Transaction rejected: {0}")]
    Econ(#[from] EconError),
}

/// Buy `upgrade` once, paying its cost and applying its effects in the order
/// compute, energy, research, revenue, expenses.
pub fn purchase_upgrade(
    state: &mut CompanyState,
    upgrade: &Upgrade,
) -> Result<(), TransactionError> {
    if state.purchased_upgrades.contains(&upgrade.id) {
        debug!(upgrade = %upgrade.id, "upgrade already purchased");
        return Err(TransactionError::AlreadyPurchased);
    }
    if !can_afford(state.cash, upgrade.cost) {
        debug!(upgrade = %upgrade.id, cash = %state.cash, cost = %upgrade.cost, "cannot afford upgrade");
        return Err(TransactionError::InsufficientCash);
    }

    // Fallible arithmetic first; nothing below may fail.
    let fx = &upgrade.effects;
    let revenue = match fx.revenue_boost {
        Some(boost) => state
            .revenue_per_second
            .checked_add(boost)
            .ok_or(EconError::Overflow)?,
        None => state.revenue_per_second,
    };
    let expenses = match fx.expense_reduction {
        Some(reduction) => reduce_expenses(state.expenses_per_second, reduction)?,
        None => state.expenses_per_second,
    };

    state.cash -= upgrade.cost;
    state.purchased_upgrades.insert(upgrade.id.clone());
    if upgrade.kind == UpgradeKind::Partnerships {
        state.partnerships.insert(upgrade.id.clone());
    }
    state.push_news(&format!(
        "{} deployed, improving {} operations.",
        upgrade.name, upgrade.kind
    ));

    if let Some(gain) = fx.compute_gain {
        state.compute_capacity += gain;
    }
    if let Some(energy) = fx.energy_cost {
        state.energy_usage = (state.energy_usage + energy).max(0.0);
    }
    if let Some(boost) = fx.research_boost {
        state.research_speed += boost;
    }
    state.revenue_per_second = revenue;
    state.expenses_per_second = expenses;

    info!(upgrade = %upgrade.id, kind = %upgrade.kind, cash = %state.cash, "upgrade purchased");
    Ok(())
}

/// Claim a funding round once, adding its amount to cash and to lifetime
/// funding.
pub fn unlock_funding(
    state: &mut CompanyState,
    round: &FundingRound,
) -> Result<(), TransactionError> {
    if state.funding_claimed.contains(&round.id) {
        debug!(round = %round.id, "funding already claimed");
        return Err(TransactionError::AlreadyClaimed);
    }
    let cash = checked_add(state.cash, round.amount)?;
    let funding = checked_add(state.funding, round.amount)?;

    state.cash = cash;
    state.funding = funding;
    state.funding_claimed.insert(round.id.clone());
    state.push_news(&format!(
        "{} secured for {} ({}).",
        round.name,
        format_currency(round.amount),
        round.equity
    ));

    info!(round = %round.id, amount = %round.amount, "funding raised");
    Ok(())
}

fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, EconError> {
    a.checked_add(b).ok_or(EconError::Overflow)
}
