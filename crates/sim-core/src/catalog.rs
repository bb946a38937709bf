//! Read-only catalog of research models, upgrades and funding rounds.
//!
//! The catalog is built once, validated, and then only ever borrowed. It
//! offers two lookups: by `(category, index)` for the sequential research
//! trees and by id across every entity kind.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.yaml");

/// Model family. Each family has its own sequential research frontier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Language,
    Image,
    Video,
    Audio,
    World,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Category; 5] = [
        Category::Language,
        Category::Image,
        Category::Video,
        Category::Audio,
        Category::World,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Language => "language",
            Category::Image => "image",
            Category::Video => "video",
            Category::Audio => "audio",
            Category::World => "world",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownCategory(s.to_string()))
    }
}

/// Upgrade family; `Partnerships` upgrades are also tracked as partnerships.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Compute,
    Research,
    Revenue,
    Partnerships,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 4] = [
        UpgradeKind::Compute,
        UpgradeKind::Research,
        UpgradeKind::Revenue,
        UpgradeKind::Partnerships,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UpgradeKind::Compute => "compute",
            UpgradeKind::Research => "research",
            UpgradeKind::Revenue => "revenue",
            UpgradeKind::Partnerships => "partnerships",
        }
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional adjustments attached to an upgrade or a model.
///
/// Absent fields have no effect. Upgrades apply them on purchase in the order
/// compute, energy, research, revenue, expenses; models apply revenue,
/// research, efficiency and energy on completion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effects {
    /// Additive compute capacity.
    pub compute_gain: Option<f64>,
    /// Additive energy usage (may be negative; usage is floored at zero).
    pub energy_cost: Option<f64>,
    /// Additive research speed.
    pub research_boost: Option<f64>,
    /// Additive revenue per second.
    pub revenue_boost: Option<Decimal>,
    /// Fraction in [0, 1) removed from expenses per second.
    pub expense_reduction: Option<f64>,
    /// Multiplier applied to compute capacity.
    pub efficiency_boost: Option<f64>,
}

/// A research model in one of the category trees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub year: i32,
    #[serde(default)]
    pub parameters: String,
    #[serde(default)]
    pub description: String,
    /// Cash deducted when training starts.
    pub cost: Decimal,
    /// Compute capacity needed to start; also the basis of the AI power gain.
    pub compute_required: f64,
    /// Progress units needed to finish (seconds at research speed 1).
    pub research_time: f64,
    #[serde(default)]
    pub effects: Effects,
}

/// A one-time infrastructure, research, revenue or partnership purchase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub id: String,
    pub name: String,
    pub kind: UpgradeKind,
    #[serde(default)]
    pub description: String,
    pub cost: Decimal,
    #[serde(default)]
    pub effects: Effects,
}

/// A funding round that can be claimed once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FundingRound {
    pub id: String,
    pub name: String,
    pub amount: Decimal,
    /// Free-form equity terms, e.g. "10% equity".
    pub equity: String,
    #[serde(default)]
    pub description: String,
}

/// Errors raised while building or parsing a catalog.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("duplicate catalog id: {0}")]
    DuplicateId(String),
    #[error("negative cost or amount for {0}")]
    NegativeMoney(String),
    #[error("invalid numeric field `{field}` for {id}")]
    InvalidNumber { id: String, field: &'static str },
    #[error("catalog parse error: {0}")]
    Parse(String),
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    models: Vec<Model>,
    #[serde(default)]
    upgrades: Vec<Upgrade>,
    #[serde(default)]
    funding_rounds: Vec<FundingRound>,
}

/// Where an id resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    Model(Category, usize),
    Upgrade(usize),
    FundingRound(usize),
}

/// Immutable registry of every catalog entity.
#[derive(Clone, Debug)]
pub struct Catalog {
    models: BTreeMap<Category, Vec<Model>>,
    upgrades: Vec<Upgrade>,
    funding_rounds: Vec<FundingRound>,
    by_id: HashMap<String, Entry>,
}

impl Catalog {
    /// Validate and index the given tables. Models keep their relative order
    /// within each category; that order is the research order.
    pub fn new(
        models: Vec<Model>,
        upgrades: Vec<Upgrade>,
        funding_rounds: Vec<FundingRound>,
    ) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::new();
        let mut grouped: BTreeMap<Category, Vec<Model>> =
            Category::ALL.into_iter().map(|c| (c, Vec::new())).collect();

        for model in models {
            validate_model(&model)?;
            let list = grouped.entry(model.category).or_default();
            let entry = Entry::Model(model.category, list.len());
            insert_id(&mut by_id, &model.id, entry)?;
            list.push(model);
        }
        for (idx, upgrade) in upgrades.iter().enumerate() {
            validate_upgrade(upgrade)?;
            insert_id(&mut by_id, &upgrade.id, Entry::Upgrade(idx))?;
        }
        for (idx, round) in funding_rounds.iter().enumerate() {
            validate_funding_round(round)?;
            insert_id(&mut by_id, &round.id, Entry::FundingRound(idx))?;
        }

        Ok(Self {
            models: grouped,
            upgrades,
            funding_rounds,
            by_id,
        })
    }

    /// Parse a catalog from its YAML form.
    pub fn from_yaml(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_yaml::from_str(text).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(file.models, file.upgrades, file.funding_rounds)
    }

    /// The catalog shipped with the game.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Models of a category in research order.
    pub fn models(&self, category: Category) -> &[Model] {
        self.models
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn model(&self, category: Category, index: usize) -> Option<&Model> {
        self.models(category).get(index)
    }

    pub fn model_by_id(&self, id: &str) -> Option<&Model> {
        match self.by_id.get(id)? {
            Entry::Model(category, index) => self.model(*category, *index),
            _ => None,
        }
    }

    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }

    /// Upgrades of one kind, in catalog order.
    pub fn upgrades_of(&self, kind: UpgradeKind) -> impl Iterator<Item = &Upgrade> {
        self.upgrades.iter().filter(move |u| u.kind == kind)
    }

    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        match self.by_id.get(id)? {
            Entry::Upgrade(index) => self.upgrades.get(*index),
            _ => None,
        }
    }

    pub fn funding_rounds(&self) -> &[FundingRound] {
        &self.funding_rounds
    }

    pub fn funding_round(&self, id: &str) -> Option<&FundingRound> {
        match self.by_id.get(id)? {
            Entry::FundingRound(index) => self.funding_rounds.get(*index),
            _ => None,
        }
    }

    /// Resolve any id to the kind of entity it names.
    pub fn lookup(&self, id: &str) -> Option<Entry> {
        self.by_id.get(id).copied()
    }
}

fn insert_id(
    by_id: &mut HashMap<String, Entry>,
    id: &str,
    entry: Entry,
) -> Result<(), CatalogError> {
    if by_id.insert(id.to_string(), entry).is_some() {
        return Err(CatalogError::DuplicateId(id.to_string()));
    }
    Ok(())
}

fn invalid(id: &str, field: &'static str) -> CatalogError {
    CatalogError::InvalidNumber {
        id: id.to_string(),
        field,
    }
}

fn validate_effects(id: &str, effects: &Effects) -> Result<(), CatalogError> {
    let finite = [
        ("compute_gain", effects.compute_gain),
        ("energy_cost", effects.energy_cost),
        ("research_boost", effects.research_boost),
        ("expense_reduction", effects.expense_reduction),
        ("efficiency_boost", effects.efficiency_boost),
    ];
    for (field, value) in finite {
        if matches!(value, Some(v) if !v.is_finite()) {
            return Err(invalid(id, field));
        }
    }
    if matches!(effects.research_boost, Some(v) if v < 0.0) {
        return Err(invalid(id, "research_boost"));
    }
    if matches!(effects.expense_reduction, Some(v) if !(0.0..1.0).contains(&v)) {
        return Err(invalid(id, "expense_reduction"));
    }
    if matches!(effects.efficiency_boost, Some(v) if v <= 0.0) {
        return Err(invalid(id, "efficiency_boost"));
    }
    Ok(())
}

/// Validate a research model.
pub fn validate_model(m: &Model) -> Result<(), CatalogError> {
    if m.cost < Decimal::ZERO {
        return Err(CatalogError::NegativeMoney(m.id.clone()));
    }
    if !m.compute_required.is_finite() || m.compute_required < 0.0 {
        return Err(invalid(&m.id, "compute_required"));
    }
    if !m.research_time.is_finite() || m.research_time <= 0.0 {
        return Err(invalid(&m.id, "research_time"));
    }
    validate_effects(&m.id, &m.effects)
}

/// Validate an upgrade.
pub fn validate_upgrade(u: &Upgrade) -> Result<(), CatalogError> {
    if u.cost < Decimal::ZERO {
        return Err(CatalogError::NegativeMoney(u.id.clone()));
    }
    validate_effects(&u.id, &u.effects)
}

/// Validate a funding round.
pub fn validate_funding_round(r: &FundingRound) -> Result<(), CatalogError> {
    if r.amount <= Decimal::ZERO {
        return Err(CatalogError::NegativeMoney(r.id.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str, category: Category) -> Model {
        Model {
            id: id.to_string(),
            name: id.to_uppercase(),
            category,
            year: 2020,
            parameters: String::new(),
            description: String::new(),
            cost: Decimal::new(1000, 0),
            compute_required: 100.0,
            research_time: 10.0,
            effects: Effects::default(),
        }
    }

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        for category in Category::ALL {
            assert!(
                !catalog.models(category).is_empty(),
                "no models for {category}"
            );
        }
        for kind in UpgradeKind::ALL {
            assert!(catalog.upgrades_of(kind).next().is_some(), "no {kind} upgrades");
        }
        assert!(!catalog.funding_rounds().is_empty());
        let first = catalog.model(Category::Language, 0).unwrap();
        assert_eq!(first.id, "gpt-1");
        assert!(first.compute_required <= 500.0);
    }

    #[test]
    fn lookups_by_index_and_id_agree() {
        let catalog = Catalog::new(
            vec![
                model("a0", Category::Audio),
                model("l0", Category::Language),
                model("a1", Category::Audio),
            ],
            vec![],
            vec![],
        )
        .unwrap();
        assert_eq!(catalog.model(Category::Audio, 1).unwrap().id, "a1");
        assert_eq!(catalog.model_by_id("a1").unwrap().category, Category::Audio);
        assert_eq!(catalog.lookup("l0"), Some(Entry::Model(Category::Language, 0)));
        assert!(catalog.model(Category::Video, 0).is_none());
        assert!(catalog.upgrade("a0").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Catalog::new(
            vec![model("x", Category::Image)],
            vec![Upgrade {
                id: "x".into(),
                name: "X".into(),
                kind: UpgradeKind::Compute,
                description: String::new(),
                cost: Decimal::ZERO,
                effects: Effects::default(),
            }],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("x".into()));
    }

    #[test]
    fn invalid_effects_are_rejected() {
        let mut m = model("m", Category::World);
        m.effects.expense_reduction = Some(1.5);
        assert!(validate_model(&m).is_err());
        m.effects.expense_reduction = None;
        m.research_time = 0.0;
        assert_eq!(validate_model(&m), Err(invalid("m", "research_time")));
    }

    #[test]
    fn category_parses_from_str() {
        assert_eq!("video".parse::<Category>().unwrap(), Category::Video);
        assert!("robotics".parse::<Category>().is_err());
    }
}
