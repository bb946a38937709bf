//! Research lifecycle: Idle -> Training -> Idle, one project at a time.

use crate::ops::TransactionError;
use sim_core::{ActiveResearch, Catalog, Category, CompanyState, Effects, Model};
use sim_econ::can_afford;
use tracing::{debug, info, warn};

/// AI power earned by finishing a project.
pub fn ai_power_gain(compute_required: f64, research_boost: f64) -> f64 {
    (compute_required * (1.0 + research_boost * 5.0)).max(0.0)
}

/// The subset of a model's effects that applies on completion.
fn completion_effects(model: &Model) -> Effects {
    Effects {
        revenue_boost: model.effects.revenue_boost,
        research_boost: model.effects.research_boost,
        efficiency_boost: model.effects.efficiency_boost,
        energy_cost: model.effects.energy_cost,
        ..Effects::default()
    }
}

/// Start training the model at `index` of `category`.
///
/// Models must be trained in order: `index` has to equal the category's
/// frontier. Only one project may run company-wide.
pub fn start_research(
    state: &mut CompanyState,
    catalog: &Catalog,
    category: Category,
    index: usize,
) -> Result<(), TransactionError> {
    let result = check_start(state, catalog, category, index);
    let model = match result {
        Ok(model) => model,
        Err(e) => {
            debug!(%category, index, reason = %e, "research refused");
            return Err(e);
        }
    };

    state.cash -= model.cost;
    state.active_research = Some(ActiveResearch {
        category,
        model_id: model.id.clone(),
        model_name: model.name.clone(),
        description: model.description.clone(),
        progress: 0.0,
        duration: model.research_time,
        compute_required: model.compute_required,
        effects: completion_effects(model),
    });
    state.push_news(&format!(
        "Training {} ({}) begins. {}",
        model.name, model.year, model.description
    ));
    info!(model = %model.id, %category, index, "research started");
    Ok(())
}

fn check_start<'c>(
    state: &CompanyState,
    catalog: &'c Catalog,
    category: Category,
    index: usize,
) -> Result<&'c Model, TransactionError> {
    let model = catalog
        .model(category, index)
        .ok_or(TransactionError::ModelNotFound)?;
    let frontier = state.frontier(category);
    if index > frontier {
        return Err(TransactionError::Locked);
    }
    if state.active_research.is_some() {
        return Err(TransactionError::AlreadyTraining);
    }
    if index < frontier {
        return Err(TransactionError::AlreadyResearched);
    }
    if !can_afford(state.cash, model.cost) {
        return Err(TransactionError::InsufficientCash);
    }
    if state.compute_capacity < model.compute_required {
        return Err(TransactionError::InsufficientCompute);
    }
    Ok(model)
}

/// Clamp every research frontier to its category's catalog length, so a
/// loaded state never points past the last model.
pub fn fit_frontiers(state: &mut CompanyState, catalog: &Catalog) {
    for (category, frontier) in state.unlocked_models.iter_mut() {
        let len = catalog.models(*category).len();
        if *frontier > len {
            warn!(%category, frontier = *frontier, len, "research frontier past catalog, clamped");
            *frontier = len;
        }
    }
}

/// Advance the active project by `delta` seconds of research.
///
/// Returns the id of the model that completed during this step, if any.
pub fn update_research(state: &mut CompanyState, delta: f64) -> Option<String> {
    let speed = state.research_speed;
    let capacity = state.compute_capacity;
    let Some(project) = state.active_research.as_mut() else {
        state.compute_used = 0.0;
        return None;
    };
    project.progress += delta * speed;
    let in_use = project.compute_required.min(capacity);
    let done = project.is_complete();
    state.compute_used = in_use;
    if !done {
        return None;
    }

    let project = state.active_research.take()?;
    let id = project.model_id.clone();
    complete_research(state, project);
    state.compute_used = 0.0;
    Some(id)
}

fn complete_research(state: &mut CompanyState, project: ActiveResearch) {
    let frontier = state.unlocked_models.entry(project.category).or_insert(0);
    *frontier = frontier.saturating_add(1);
    state.completed_models.push(project.model_id.clone());

    let fx = &project.effects;
    if let Some(boost) = fx.revenue_boost {
        state.revenue_per_second = state.revenue_per_second.saturating_add(boost);
    }
    let research_boost = fx.research_boost.unwrap_or(0.0);
    state.research_speed += research_boost;
    if let Some(multiplier) = fx.efficiency_boost {
        state.compute_capacity *= multiplier;
    }
    if let Some(energy) = fx.energy_cost {
        state.energy_usage = (state.energy_usage + energy).max(0.0);
    }
    state.ai_power += ai_power_gain(project.compute_required, research_boost);

    let headline = if project.description.is_empty() {
        format!("{} deployed!", project.model_name)
    } else {
        format!("{} deployed! {}", project.model_name, project.description)
    };
    state.push_news(&headline);
    info!(
        model = %project.model_id,
        category = %project.category,
        ai_power = state.ai_power,
        "research completed"
    );
}
