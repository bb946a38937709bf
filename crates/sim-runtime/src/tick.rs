//! Tick engine: clock, research, economy and history, run in that order as
//! a chained single-threaded schedule.

use crate::research::update_research;
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use rust_decimal::prelude::ToPrimitive;
use sim_core::{CompanyState, HistoryPoint};
use sim_econ::{accrue, net_rate};
use tracing::warn;

/// The authoritative company state inside the ECS world.
#[derive(Resource)]
pub(crate) struct Company(pub CompanyState);

/// Input and output of the current tick.
#[derive(Resource, Default)]
pub(crate) struct Step {
    pub delta: f64,
    pub completed: Option<String>,
}

pub fn advance_clock(state: &mut CompanyState, delta: f64) {
    state.time += delta;
}

/// Accrue `(revenue - expenses) * delta`, flooring cash at zero.
///
/// Flows outside the Decimal range leave cash untouched.
pub fn update_economy(state: &mut CompanyState, delta: f64) {
    let next = net_rate(state.revenue_per_second, state.expenses_per_second)
        .and_then(|net| accrue(state.cash, net, delta));
    match next {
        Ok(cash) => state.cash = cash,
        Err(e) => warn!(error = %e, delta, "economy update skipped"),
    }
}

/// Append the end-of-tick sample.
pub fn record_history(state: &mut CompanyState) {
    let net_revenue = match net_rate(state.revenue_per_second, state.expenses_per_second) {
        Ok(net) => net.to_f64().unwrap_or(0.0),
        // out of Decimal range, fall back to the float difference
        Err(_) => {
            state.revenue_per_second.to_f64().unwrap_or(0.0)
                - state.expenses_per_second.to_f64().unwrap_or(0.0)
        }
    };
    let point = HistoryPoint {
        timestamp: state.time,
        compute: state.compute_capacity,
        net_revenue,
        ai_power: state.ai_power,
    };
    state.history.record(point);
}

fn clock_system(step: Res<Step>, mut company: ResMut<Company>) {
    advance_clock(&mut company.0, step.delta);
}

fn research_system(mut step: ResMut<Step>, mut company: ResMut<Company>) {
    step.completed = update_research(&mut company.0, step.delta);
}

fn economy_system(step: Res<Step>, mut company: ResMut<Company>) {
    update_economy(&mut company.0, step.delta);
}

fn history_system(mut company: ResMut<Company>) {
    record_history(&mut company.0);
}

/// Build the per-tick schedule.
pub(crate) fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (clock_system, research_system, economy_system, history_system).chain(),
    );
    schedule
}
