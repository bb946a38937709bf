//! Read-only projections of state joined with the catalog, for display.

use sim_core::{
    ActiveResearch, Catalog, Category, CompanyState, FundingRound, Model, Upgrade, UpgradeKind,
};
use sim_econ::{format_currency, format_number};

/// The active project with its catalog model.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveModelView<'a> {
    pub project: &'a ActiveResearch,
    pub model: &'a Model,
    /// Completion in percent, capped at 100.
    pub progress_percent: f64,
}

/// The active project, if it still resolves to a catalog model.
pub fn active_model<'a>(state: &'a CompanyState, catalog: &'a Catalog) -> Option<ActiveModelView<'a>> {
    let project = state.active_research.as_ref()?;
    let model = catalog.model_by_id(&project.model_id)?;
    Some(ActiveModelView {
        project,
        model,
        progress_percent: project.progress_percent(),
    })
}

/// Display status of a model in its research tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelStatus {
    /// Behind the frontier, so it can no longer be trained.
    Deployed,
    Training,
    /// Next in line and nothing else is training.
    Available,
    /// Next in line but another project holds the slot.
    Waiting,
    Locked,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelEntry<'a> {
    pub index: usize,
    pub model: &'a Model,
    pub status: ModelStatus,
}

/// Every model of `category` with its status.
pub fn research_tree<'a>(
    state: &CompanyState,
    catalog: &'a Catalog,
    category: Category,
) -> Vec<ModelEntry<'a>> {
    let frontier = state.frontier(category);
    let training = state.active_research.as_ref().map(|r| r.model_id.as_str());
    catalog
        .models(category)
        .iter()
        .enumerate()
        .map(|(index, model)| {
            let status = if index < frontier
                || state.completed_models.iter().any(|id| *id == model.id)
            {
                ModelStatus::Deployed
            } else if training == Some(model.id.as_str()) {
                ModelStatus::Training
            } else if index > frontier {
                ModelStatus::Locked
            } else if training.is_some() {
                ModelStatus::Waiting
            } else {
                ModelStatus::Available
            };
            ModelEntry {
                index,
                model,
                status,
            }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeStatus<'a> {
    pub upgrade: &'a Upgrade,
    pub purchased: bool,
}

/// Upgrades of one kind, flagged with whether they are owned.
pub fn upgrade_statuses<'a>(
    state: &CompanyState,
    catalog: &'a Catalog,
    kind: UpgradeKind,
) -> Vec<UpgradeStatus<'a>> {
    catalog
        .upgrades_of(kind)
        .map(|upgrade| UpgradeStatus {
            upgrade,
            purchased: state.purchased_upgrades.contains(&upgrade.id),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct FundingStatus<'a> {
    pub round: &'a FundingRound,
    pub claimed: bool,
}

pub fn funding_statuses<'a>(state: &CompanyState, catalog: &'a Catalog) -> Vec<FundingStatus<'a>> {
    catalog
        .funding_rounds()
        .iter()
        .map(|round| FundingStatus {
            round,
            claimed: state.funding_claimed.contains(&round.id),
        })
        .collect()
}

/// One-line pitch for a model card.
pub fn describe_model(model: &Model) -> String {
    format!(
        "{} Requires {} compute and {}.",
        model.description,
        format_number(model.compute_required),
        format_currency(model.cost)
    )
}
