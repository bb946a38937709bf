//! The mutable company snapshot.

use crate::catalog::{Category, Effects};
use crate::log::{History, NewsLog};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// The single in-flight research project.
///
/// Everything needed to finish the project is captured when it starts, so
/// later catalog changes never affect it.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveResearch {
    pub category: Category,
    pub model_id: String,
    /// Display name and blurb used for the completion headline.
    pub model_name: String,
    pub description: String,
    /// Accumulated progress units.
    pub progress: f64,
    /// Progress units needed to complete.
    pub duration: f64,
    pub compute_required: f64,
    /// Effects applied on completion.
    pub effects: Effects,
}

impl ActiveResearch {
    pub fn is_complete(&self) -> bool {
        self.progress >= self.duration
    }

    /// Completion in percent, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.duration <= 0.0 {
            return 100.0;
        }
        (self.progress / self.duration * 100.0).clamp(0.0, 100.0)
    }
}

/// Company state owned by the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct CompanyState {
    /// Elapsed simulated seconds.
    pub time: f64,
    /// Liquid capital, never negative.
    pub cash: Decimal,
    /// Capital ever raised.
    pub funding: Decimal,
    pub expenses_per_second: Decimal,
    pub revenue_per_second: Decimal,
    pub compute_capacity: f64,
    /// Display value: the active project's requirement clamped to capacity.
    pub compute_used: f64,
    /// Never negative.
    pub energy_usage: f64,
    pub research_speed: f64,
    pub ai_power: f64,
    /// Next researchable index per category.
    pub unlocked_models: BTreeMap<Category, usize>,
    pub completed_models: Vec<String>,
    pub purchased_upgrades: BTreeSet<String>,
    pub partnerships: BTreeSet<String>,
    pub funding_claimed: BTreeSet<String>,
    pub active_research: Option<ActiveResearch>,
    pub history: History,
    pub news: NewsLog,
}

impl Default for CompanyState {
    fn default() -> Self {
        Self {
            time: 0.0,
            cash: Decimal::new(500_000, 0),
            funding: Decimal::new(500_000, 0),
            expenses_per_second: Decimal::new(250, 0),
            revenue_per_second: Decimal::new(800, 0),
            compute_capacity: 500.0,
            compute_used: 0.0,
            energy_usage: 40.0,
            research_speed: 1.0,
            ai_power: 0.0,
            unlocked_models: default_frontiers(),
            completed_models: Vec::new(),
            purchased_upgrades: BTreeSet::new(),
            partnerships: BTreeSet::new(),
            funding_claimed: BTreeSet::new(),
            active_research: None,
            history: History::new(),
            news: NewsLog::seeded(),
        }
    }
}

/// Every category starting at index zero.
pub fn default_frontiers() -> BTreeMap<Category, usize> {
    Category::ALL.into_iter().map(|c| (c, 0)).collect()
}

impl CompanyState {
    /// Next researchable index for `category`.
    pub fn frontier(&self, category: Category) -> usize {
        self.unlocked_models.get(&category).copied().unwrap_or(0)
    }

    /// Revenue minus expenses per second, saturating at the Decimal range.
    pub fn net_per_second(&self) -> Decimal {
        self.revenue_per_second.saturating_sub(self.expenses_per_second)
    }

    pub fn is_idle(&self) -> bool {
        self.active_research.is_none()
    }

    /// Append a year-stamped headline at the current time.
    pub fn push_news(&mut self, message: &str) {
        self.news.push(self.time, message);
    }
}
