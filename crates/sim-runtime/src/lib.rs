#![deny(warnings)]

//! Simulation runtime for AI Lab Tycoon.
//!
//! [`Simulation`] owns the single authoritative [`CompanyState`] inside an
//! ECS world and exposes the player transactions and the tick. All calls are
//! synchronous and strictly serialized by `&mut self`.

pub mod ops;
pub mod research;
pub mod tick;
pub mod view;

use bevy_ecs::prelude::*;
use serde_json::Value;
use sim_core::{
    sanitize, serialize, Catalog, Category, CompanyState, ConfigError, SavedState, SimConfig,
};
use std::sync::Arc;
use tick::{tick_schedule, Company, Step};
use tracing::{debug, info, warn};

pub use ops::TransactionError;
pub use view::{ActiveModelView, FundingStatus, ModelEntry, ModelStatus, UpgradeStatus};

/// What a tick did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutcome {
    /// Seconds actually simulated after clamping.
    pub delta: f64,
    /// Model id that finished during the tick.
    pub completed: Option<String>,
}

/// A running company session.
pub struct Simulation {
    world: World,
    schedule: Schedule,
    catalog: Arc<Catalog>,
    config: SimConfig,
}

impl Simulation {
    /// Start a fresh company.
    pub fn new(catalog: Arc<Catalog>, config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_state(catalog, config, CompanyState::default())
    }

    /// Resume from an existing state. Research frontiers past the end of
    /// the catalog are clamped.
    pub fn with_state(
        catalog: Arc<Catalog>,
        config: SimConfig,
        state: CompanyState,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut state = state;
        research::fit_frontiers(&mut state, &catalog);
        let mut world = World::new();
        world.insert_resource(Company(state));
        world.insert_resource(Step::default());
        Ok(Self {
            world,
            schedule: tick_schedule(),
            catalog,
            config,
        })
    }

    /// Resume from untrusted saved data.
    pub fn restore(
        catalog: Arc<Catalog>,
        config: SimConfig,
        saved: &Value,
    ) -> Result<Self, ConfigError> {
        Self::with_state(catalog, config, sanitize(saved))
    }

    pub fn state(&self) -> &CompanyState {
        &self.world.resource::<Company>().0
    }

    fn state_mut(&mut self) -> &mut CompanyState {
        &mut self.world.resource_mut::<Company>().into_inner().0
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Advance by `raw_delta` seconds, clamped into `[0, max_step_seconds]`.
    pub fn advance(&mut self, raw_delta: f64) -> TickOutcome {
        let delta = self.config.clamp_step(raw_delta);
        if !raw_delta.is_finite() || raw_delta < 0.0 {
            warn!(raw_delta, "invalid tick delta ignored");
        } else if delta != raw_delta {
            debug!(raw_delta, delta, "tick delta clamped");
        }
        {
            let mut step = self.world.resource_mut::<Step>();
            step.delta = delta;
            step.completed = None;
        }
        self.schedule.run(&mut self.world);
        let completed = self.world.resource_mut::<Step>().completed.take();
        debug!(delta, time = self.state().time, "tick");
        TickOutcome { delta, completed }
    }

    /// Buy an upgrade by id.
    pub fn purchase_upgrade(&mut self, id: &str) -> Result<(), TransactionError> {
        let catalog = Arc::clone(&self.catalog);
        let upgrade = catalog.upgrade(id).ok_or_else(|| {
            debug!(upgrade = id, "unknown upgrade");
            TransactionError::UnknownUpgrade
        })?;
        ops::purchase_upgrade(self.state_mut(), upgrade)
    }

    /// Claim a funding round by id.
    pub fn unlock_funding(&mut self, id: &str) -> Result<(), TransactionError> {
        let catalog = Arc::clone(&self.catalog);
        let round = catalog.funding_round(id).ok_or_else(|| {
            debug!(round = id, "unknown funding round");
            TransactionError::UnknownFundingRound
        })?;
        ops::unlock_funding(self.state_mut(), round)
    }

    /// Start training the model at `index` of `category`.
    pub fn start_research(
        &mut self,
        category: Category,
        index: usize,
    ) -> Result<(), TransactionError> {
        let catalog = Arc::clone(&self.catalog);
        research::start_research(self.state_mut(), &catalog, category, index)
    }

    /// Plain-data form for a persistence adapter.
    pub fn snapshot(&self) -> SavedState {
        serialize(self.state())
    }

    /// Replace the state wholesale with sanitized saved data.
    pub fn load(&mut self, saved: &Value) {
        let mut state = sanitize(saved);
        research::fit_frontiers(&mut state, &self.catalog);
        *self.state_mut() = state;
        info!("company state loaded");
    }

    /// Found a new company.
    pub fn reset(&mut self) {
        *self.state_mut() = CompanyState::default();
        info!("company state reset");
    }

    pub fn active_model(&self) -> Option<ActiveModelView<'_>> {
        view::active_model(self.state(), &self.catalog)
    }

    pub fn research_tree(&self, category: Category) -> Vec<ModelEntry<'_>> {
        view::research_tree(self.state(), &self.catalog, category)
    }

    pub fn upgrade_statuses(&self, kind: sim_core::UpgradeKind) -> Vec<UpgradeStatus<'_>> {
        view::upgrade_statuses(self.state(), &self.catalog, kind)
    }

    pub fn funding_statuses(&self) -> Vec<FundingStatus<'_>> {
        view::funding_statuses(self.state(), &self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sim_core::{Effects, FundingRound, Model, Upgrade, UpgradeKind};

    fn test_catalog() -> Arc<Catalog> {
        let model = Model {
            id: "tiny-lm".into(),
            name: "Tiny LM".into(),
            category: Category::Language,
            year: 2018,
            parameters: String::new(),
            description: "Small but it talks.".into(),
            cost: Decimal::new(1000, 0),
            compute_required: 100.0,
            research_time: 10.0,
            effects: Effects::default(),
        };
        let upgrade = Upgrade {
            id: "campus".into(),
            name: "Campus".into(),
            kind: UpgradeKind::Compute,
            description: String::new(),
            cost: Decimal::new(500_000, 0),
            effects: Effects {
                compute_gain: Some(1000.0),
                ..Effects::default()
            },
        };
        let round = FundingRound {
            id: "angel".into(),
            name: "Angel Round".into(),
            amount: Decimal::new(1_000_000, 0),
            equity: "10% equity".into(),
            description: String::new(),
        };
        Arc::new(Catalog::new(vec![model], vec![upgrade], vec![round]).unwrap())
    }

    fn sim() -> Simulation {
        Simulation::new(test_catalog(), SimConfig::default()).unwrap()
    }

    #[test]
    fn whole_treasury_upgrade_scenario() {
        let mut sim = sim();
        assert_eq!(sim.state().cash, Decimal::new(500_000, 0));
        sim.purchase_upgrade("campus").unwrap();
        assert_eq!(sim.state().cash, Decimal::ZERO);
        assert_eq!(
            sim.purchase_upgrade("campus"),
            Err(TransactionError::AlreadyPurchased)
        );
        assert_eq!(sim.state().cash, Decimal::ZERO);
        assert_eq!(
            sim.purchase_upgrade("nope"),
            Err(TransactionError::UnknownUpgrade)
        );
    }

    #[test]
    fn research_scenario_completes_after_ten_seconds() {
        let state = CompanyState {
            cash: Decimal::new(2000, 0),
            ..CompanyState::default()
        };
        let mut sim = Simulation::with_state(test_catalog(), SimConfig::default(), state).unwrap();
        sim.start_research(Category::Language, 0).unwrap();
        for _ in 0..5 {
            assert_eq!(sim.advance(1.0).completed, None);
        }
        let project = sim.state().active_research.as_ref().unwrap();
        assert_eq!(project.progress, 5.0);
        assert!(!project.is_complete());

        let mut completed = None;
        for _ in 0..5 {
            completed = completed.or(sim.advance(1.0).completed);
        }
        assert_eq!(completed.as_deref(), Some("tiny-lm"));
        let s = sim.state();
        assert!(s.is_idle());
        assert_eq!(s.frontier(Category::Language), 1);
        assert_eq!(s.completed_models, vec!["tiny-lm"]);
    }

    #[test]
    fn ten_seconds_of_flow_adds_5500() {
        let mut sim = sim();
        let start = sim.state().cash;
        for _ in 0..10 {
            sim.advance(1.0);
        }
        assert_eq!(sim.state().cash - start, Decimal::new(5500, 0));
        assert_eq!(sim.state().history.len(), 10);
    }

    #[test]
    fn oversized_and_negative_deltas_are_clamped() {
        let mut sim = sim();
        assert_eq!(sim.advance(30.0).delta, 1.0);
        assert_eq!(sim.advance(-3.0).delta, 0.0);
        assert_eq!(sim.advance(f64::NAN).delta, 0.0);
        assert_eq!(sim.state().time, 1.0);
    }

    #[test]
    fn snapshot_load_roundtrip_and_reset() {
        let mut sim = sim();
        sim.unlock_funding("angel").unwrap();
        sim.start_research(Category::Language, 0).unwrap();
        sim.advance(0.5);
        let saved = serde_json::to_value(sim.snapshot()).unwrap();
        let before = sim.state().clone();

        sim.reset();
        assert_eq!(sim.state(), &CompanyState::default());
        sim.load(&saved);
        assert_eq!(sim.state(), &before);

        let restored = Simulation::restore(test_catalog(), SimConfig::default(), &saved).unwrap();
        assert_eq!(restored.state(), &before);
        assert_eq!(restored.active_model().unwrap().model.id, "tiny-lm");
    }

    #[test]
    fn restored_extreme_flow_rates_tick_without_accrual() {
        let saved = json!({
            "revenuePerSecond": Decimal::MAX.to_string(),
            "expensesPerSecond": "-1",
        });
        let mut sim = Simulation::restore(test_catalog(), SimConfig::default(), &saved).unwrap();
        assert_eq!(sim.advance(0.1).delta, 0.1);
        assert_eq!(sim.state().cash, Decimal::new(500_000, 0));
        assert_eq!(sim.state().history.len(), 1);
        assert_eq!(sim.state().net_per_second(), Decimal::MAX);
    }

    #[test]
    fn restored_frontier_is_fitted_and_foreign_project_completes() {
        let saved = json!({
            "unlockedModels": { "language": u64::MAX },
            "activeResearch": { "category": "language", "modelId": "x", "duration": 1.0 },
        });
        let mut sim = Simulation::restore(test_catalog(), SimConfig::default(), &saved).unwrap();
        assert_eq!(sim.state().frontier(Category::Language), 1);
        assert_eq!(sim.advance(1.0).completed.as_deref(), Some("x"));
        assert_eq!(sim.state().frontier(Category::Language), 2);
        assert_eq!(
            sim.start_research(Category::Language, 0),
            Err(TransactionError::AlreadyResearched)
        );

        sim.load(&saved);
        assert_eq!(sim.state().frontier(Category::Language), 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = SimConfig {
            max_step_seconds: -1.0,
        };
        assert!(Simulation::new(test_catalog(), cfg).is_err());
    }

    #[derive(Clone, Debug)]
    enum Action {
        Tick(f64),
        Upgrade,
        Funding,
        Research,
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (0.0f64..3.0).prop_map(Action::Tick),
            Just(Action::Upgrade),
            Just(Action::Funding),
            Just(Action::Research),
        ]
    }

    fn money() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(json!(Decimal::MAX.to_string())),
            Just(json!(Decimal::MIN.to_string())),
            Just(json!("-1")),
            Just(json!("not money")),
            Just(Value::Null),
            any::<i64>().prop_map(|x| json!(x)),
            (-1.0e30f64..1.0e30).prop_map(|x| json!(x)),
        ]
    }

    fn number() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(json!(f64::MAX)),
            Just(json!(-f64::MAX)),
            Just(json!("1.5")),
            Just(Value::Null),
            (-1.0e6f64..1.0e6).prop_map(|x| json!(x)),
        ]
    }

    fn saved_project() -> impl Strategy<Value = Value> {
        (
            prop::sample::select(vec!["language", "image", "robotics"]),
            prop::sample::select(vec!["tiny-lm", "ghost"]),
            number(),
            number(),
            number(),
            money(),
            number(),
            number(),
        )
            .prop_map(
                |(category, model_id, progress, duration, compute, revenue, research, efficiency)| {
                    json!({
                        "category": category,
                        "modelId": model_id,
                        "progress": progress,
                        "duration": duration,
                        "computeRequired": compute,
                        "revenueBoost": revenue,
                        "researchBoost": research,
                        "efficiencyBoost": efficiency,
                    })
                },
            )
    }

    fn saved_company() -> impl Strategy<Value = Value> {
        (
            money(),
            money(),
            money(),
            number(),
            number(),
            number(),
            any::<u64>(),
            prop::option::of(saved_project()),
        )
            .prop_map(
                |(cash, revenue, expenses, time, speed, capacity, frontier, project)| {
                    json!({
                        "cash": cash,
                        "revenuePerSecond": revenue,
                        "expensesPerSecond": expenses,
                        "time": time,
                        "researchSpeed": speed,
                        "computeCapacity": capacity,
                        "unlockedModels": { "language": frontier, "image": frontier },
                        "activeResearch": project,
                    })
                },
            )
    }

    proptest! {
        #[test]
        fn any_restored_company_can_be_played(
            saved in saved_company(),
            deltas in proptest::collection::vec(0.0f64..2.0, 1..8),
        ) {
            let mut sim = Simulation::restore(test_catalog(), SimConfig::default(), &saved).unwrap();
            // Debug text compares NaN progress as equal
            let dump = |sim: &Simulation| format!("{:?}", sim.state());
            for d in deltas {
                let before = dump(&sim);
                if sim.unlock_funding("angel").is_err() {
                    prop_assert_eq!(dump(&sim), before);
                }
                let before = dump(&sim);
                if sim.purchase_upgrade("campus").is_err() {
                    prop_assert_eq!(dump(&sim), before);
                }
                let before = dump(&sim);
                if sim.start_research(Category::Language, 0).is_err() {
                    prop_assert_eq!(dump(&sim), before);
                }
                sim.advance(d);

                let s = sim.state();
                prop_assert!(s.cash >= Decimal::ZERO);
                prop_assert!(s.energy_usage >= 0.0);
                prop_assert!(s.compute_used <= s.compute_capacity);
                prop_assert!(s.ai_power >= 0.0);
                prop_assert!(s.history.len() <= sim_core::HISTORY_CAPACITY);
                prop_assert!(s.news.len() <= sim_core::NEWS_CAPACITY);
            }
        }

        #[test]
        fn time_accumulates_linearly(d in 0.0f64..1.0, n in 1usize..200) {
            let mut sim = sim();
            for _ in 0..n {
                sim.advance(d);
            }
            let expected = d * n as f64;
            prop_assert!((sim.state().time - expected).abs() <= 1e-9 * expected.max(1.0));
        }

        #[test]
        fn invariants_hold_under_any_sequence(actions in proptest::collection::vec(action(), 0..400)) {
            let mut sim = sim();
            for a in actions {
                let before = sim.state().clone();
                match a {
                    Action::Tick(d) => {
                        sim.advance(d);
                    }
                    Action::Upgrade => {
                        if sim.purchase_upgrade("campus").is_err() {
                            prop_assert_eq!(sim.state(), &before);
                        }
                    }
                    Action::Funding => {
                        if sim.unlock_funding("angel").is_err() {
                            prop_assert_eq!(sim.state(), &before);
                        }
                    }
                    Action::Research => {
                        let active = before.active_research.is_some();
                        match sim.start_research(Category::Language, 0) {
                            Err(e) => {
                                if active {
                                    prop_assert_eq!(e, TransactionError::AlreadyTraining);
                                }
                                prop_assert_eq!(sim.state(), &before);
                            }
                            Ok(()) => prop_assert!(!active),
                        }
                    }
                }
                let s = sim.state();
                prop_assert!(s.cash >= Decimal::ZERO);
                prop_assert!(s.energy_usage >= 0.0);
                prop_assert!(s.compute_used <= s.compute_capacity);
                prop_assert!(s.history.len() <= sim_core::HISTORY_CAPACITY);
                prop_assert!(s.news.len() <= sim_core::NEWS_CAPACITY);
                prop_assert!(s.purchased_upgrades.len() <= 1);
                prop_assert!(s.funding_claimed.len() <= 1);
                prop_assert!(s.completed_models.len() <= 1);
            }
        }
    }
}
