//! Plain-data save form and the sanitizer that rebuilds a state from it.
//!
//! `serialize` flattens sets into sorted arrays and money into decimal
//! strings. `sanitize` accepts any JSON value and always yields a usable
//! state: unknown or mistyped fields fall back to defaults, floors are
//! re-applied, and bounded logs are trimmed to capacity. Sanitizing the
//! serialized form of a sanitized state is a no-op.

use crate::catalog::{Category, Effects};
use crate::log::{History, HistoryPoint, NewsLog, NEWS_CAPACITY};
use crate::state::{ActiveResearch, CompanyState};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Flattened, storage-friendly form of [`CompanyState`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    pub time: f64,
    pub cash: Decimal,
    pub funding: Decimal,
    pub expenses_per_second: Decimal,
    pub revenue_per_second: Decimal,
    pub compute_capacity: f64,
    pub compute_used: f64,
    pub energy_usage: f64,
    pub research_speed: f64,
    pub ai_power: f64,
    pub unlocked_models: BTreeMap<Category, usize>,
    pub completed_models: Vec<String>,
    pub purchased_upgrades: Vec<String>,
    pub partnerships: Vec<String>,
    pub funding_claimed: Vec<String>,
    pub active_research: Option<SavedResearch>,
    pub history: SavedHistory,
    pub news: Vec<String>,
}

/// Flattened active research project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedResearch {
    pub category: Category,
    pub model_id: String,
    pub model_name: String,
    #[serde(default)]
    pub description: String,
    pub progress: f64,
    pub duration: f64,
    pub compute_required: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_boost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_cost: Option<f64>,
}

/// History as four parallel series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedHistory {
    pub timestamps: Vec<f64>,
    pub compute: Vec<f64>,
    /// Net revenue per second.
    pub revenue: Vec<f64>,
    pub ai_power: Vec<f64>,
}

impl From<&CompanyState> for SavedState {
    fn from(s: &CompanyState) -> Self {
        Self {
            time: s.time,
            cash: s.cash,
            funding: s.funding,
            expenses_per_second: s.expenses_per_second,
            revenue_per_second: s.revenue_per_second,
            compute_capacity: s.compute_capacity,
            compute_used: s.compute_used,
            energy_usage: s.energy_usage,
            research_speed: s.research_speed,
            ai_power: s.ai_power,
            unlocked_models: s.unlocked_models.clone(),
            completed_models: s.completed_models.clone(),
            purchased_upgrades: s.purchased_upgrades.iter().cloned().collect(),
            partnerships: s.partnerships.iter().cloned().collect(),
            funding_claimed: s.funding_claimed.iter().cloned().collect(),
            active_research: s.active_research.as_ref().map(|r| SavedResearch {
                category: r.category,
                model_id: r.model_id.clone(),
                model_name: r.model_name.clone(),
                description: r.description.clone(),
                progress: r.progress,
                duration: r.duration,
                compute_required: r.compute_required,
                revenue_boost: r.effects.revenue_boost,
                research_boost: r.effects.research_boost,
                efficiency_boost: r.effects.efficiency_boost,
                energy_cost: r.effects.energy_cost,
            }),
            history: SavedHistory {
                timestamps: s.history.timestamps(),
                compute: s.history.compute(),
                revenue: s.history.net_revenue(),
                ai_power: s.history.ai_power(),
            },
            news: s.news.entries().map(String::from).collect(),
        }
    }
}

/// Produce the plain-data form of a state.
pub fn serialize(state: &CompanyState) -> SavedState {
    SavedState::from(state)
}

/// Parse and sanitize a JSON document; unparsable text yields the default
/// state.
pub fn sanitize_json(text: &str) -> CompanyState {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => sanitize(&value),
        Err(e) => {
            warn!(error = %e, "saved snapshot is not valid JSON, starting fresh");
            CompanyState::default()
        }
    }
}

/// Rebuild a well-formed state from arbitrary plain data.
pub fn sanitize(value: &Value) -> CompanyState {
    let Some(obj) = value.as_object() else {
        if !value.is_null() {
            warn!("saved snapshot is not an object, starting fresh");
        }
        return CompanyState::default();
    };
    let mut s = Sanitizer {
        obj,
        repaired: Vec::new(),
    };
    let d = CompanyState::default();

    let compute_capacity = s.number("computeCapacity", d.compute_capacity).max(0.0);
    let state = CompanyState {
        time: s.number("time", d.time).max(0.0),
        cash: s.money("cash", d.cash).max(Decimal::ZERO),
        funding: s.money("funding", d.funding),
        expenses_per_second: s.money("expensesPerSecond", d.expenses_per_second),
        revenue_per_second: s.money("revenuePerSecond", d.revenue_per_second),
        compute_capacity,
        compute_used: s
            .number("computeUsed", d.compute_used)
            .clamp(0.0, compute_capacity),
        energy_usage: s.number("energyUsage", d.energy_usage).max(0.0),
        research_speed: s.number("researchSpeed", d.research_speed),
        ai_power: s.number("aiPower", d.ai_power).max(0.0),
        unlocked_models: s.frontiers(d.unlocked_models),
        completed_models: s.strings("completedModels").unwrap_or_default(),
        purchased_upgrades: s.id_set("purchasedUpgrades"),
        partnerships: s.id_set("partnerships"),
        funding_claimed: s.id_set("fundingClaimed"),
        active_research: s.active_research(),
        history: s.history(),
        news: s.news(d.news),
    };

    if !s.repaired.is_empty() {
        warn!(fields = ?s.repaired, "repaired malformed fields in saved snapshot");
    }
    state
}

struct Sanitizer<'a> {
    obj: &'a Map<String, Value>,
    repaired: Vec<String>,
}

impl<'a> Sanitizer<'a> {
    /// Look up a key, treating `null` as absent.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).filter(|v| !v.is_null())
    }

    fn repair(&mut self, key: &str) {
        self.repaired.push(key.to_string());
    }

    fn number(&mut self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            None => default,
            Some(v) => finite(v).unwrap_or_else(|| {
                self.repair(key);
                default
            }),
        }
    }

    fn money(&mut self, key: &str, default: Decimal) -> Decimal {
        match self.get(key) {
            None => default,
            Some(v) => decimal(v).unwrap_or_else(|| {
                self.repair(key);
                default
            }),
        }
    }

    fn strings(&mut self, key: &str) -> Option<Vec<String>> {
        let v = self.get(key)?;
        let Some(items) = v.as_array() else {
            self.repair(key);
            return None;
        };
        let out: Vec<String> = items
            .iter()
            .filter_map(|i| i.as_str().map(String::from))
            .collect();
        if out.len() != items.len() {
            self.repair(key);
        }
        Some(out)
    }

    fn id_set(&mut self, key: &str) -> BTreeSet<String> {
        self.strings(key).unwrap_or_default().into_iter().collect()
    }

    fn frontiers(&mut self, mut frontiers: BTreeMap<Category, usize>) -> BTreeMap<Category, usize> {
        let Some(v) = self.get("unlockedModels") else {
            return frontiers;
        };
        let Some(map) = v.as_object() else {
            self.repair("unlockedModels");
            return frontiers;
        };
        for (name, index) in map {
            let parsed = name
                .parse::<Category>()
                .ok()
                .zip(index.as_u64().and_then(|i| usize::try_from(i).ok()));
            match parsed {
                Some((category, index)) => {
                    frontiers.insert(category, index);
                }
                None => self.repair(&format!("unlockedModels.{name}")),
            }
        }
        frontiers
    }

    fn active_research(&mut self) -> Option<ActiveResearch> {
        let v = self.get("activeResearch")?;
        let parsed = parse_research(v);
        if parsed.is_none() {
            self.repair("activeResearch");
        }
        parsed
    }

    fn history(&mut self) -> History {
        let Some(v) = self.get("history") else {
            return History::new();
        };
        let Some(h) = v.as_object() else {
            self.repair("history");
            return History::new();
        };
        let series = |key: &str| -> Vec<f64> {
            h.get(key)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(finite).collect())
                .unwrap_or_default()
        };
        let timestamps = series("timestamps");
        let compute = series("compute");
        let revenue = series("revenue");
        let ai_power = series("aiPower");
        let len = timestamps
            .len()
            .min(compute.len())
            .min(revenue.len())
            .min(ai_power.len());
        let lens = [timestamps.len(), compute.len(), revenue.len(), ai_power.len()];
        if lens.iter().any(|&l| l != len) {
            self.repair("history");
        }
        let newest = |xs: &[f64]| xs[xs.len() - len..].to_vec();
        let (timestamps, compute, revenue, ai_power) = (
            newest(&timestamps),
            newest(&compute),
            newest(&revenue),
            newest(&ai_power),
        );
        (0..len)
            .map(|i| HistoryPoint {
                timestamp: timestamps[i],
                compute: compute[i],
                net_revenue: revenue[i],
                ai_power: ai_power[i],
            })
            .collect()
    }

    fn news(&mut self, default: NewsLog) -> NewsLog {
        match self.strings("news") {
            None => default,
            Some(lines) => {
                if lines.len() > NEWS_CAPACITY {
                    self.repair("news");
                }
                lines.into_iter().collect()
            }
        }
    }
}

fn finite(v: &Value) -> Option<f64> {
    v.as_f64().filter(|x| x.is_finite())
}

fn decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Decimal::from_u64(u)
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn parse_research(v: &Value) -> Option<ActiveResearch> {
    let obj = v.as_object()?;
    let category = obj.get("category")?.as_str()?.parse::<Category>().ok()?;
    let model_id = obj.get("modelId")?.as_str()?.to_string();
    let duration = obj.get("duration").and_then(finite).filter(|d| *d > 0.0)?;
    let model_name = obj
        .get("modelName")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| model_id.clone());
    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let progress = obj.get("progress").and_then(finite).unwrap_or(0.0);
    let compute_required = obj
        .get("computeRequired")
        .and_then(finite)
        .unwrap_or(0.0)
        .max(0.0);
    Some(ActiveResearch {
        category,
        model_id,
        model_name,
        description,
        progress,
        duration,
        compute_required,
        effects: Effects {
            revenue_boost: obj.get("revenueBoost").and_then(decimal),
            research_boost: obj.get("researchBoost").and_then(finite),
            efficiency_boost: obj
                .get("efficiencyBoost")
                .and_then(finite)
                .filter(|e| *e > 0.0),
            energy_cost: obj.get("energyCost").and_then(finite),
            ..Effects::default()
        },
    })
}
