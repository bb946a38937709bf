#![deny(warnings)]

//! Headless driver: runs a company session for a number of simulated seconds
//! and prints a KPI summary.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sim_core::{Catalog, Category, SimConfig, UpgradeKind};
use sim_econ::{format_currency, format_number};
use sim_runtime::{ModelStatus, Simulation, TransactionError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    seconds: Option<f64>,
    fps: Option<f64>,
    config: Option<PathBuf>,
    load: Option<PathBuf>,
    save: Option<PathBuf>,
    autoplay: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seconds" => args.seconds = it.next().and_then(|s| s.parse().ok()),
            "--fps" => args.fps = it.next().and_then(|s| s.parse().ok()),
            "--config" => args.config = it.next().map(PathBuf::from),
            "--load" => args.load = it.next().map(PathBuf::from),
            "--save" => args.save = it.next().map(PathBuf::from),
            "--autoplay" => args.autoplay = true,
            _ => {}
        }
    }
    args
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: SimConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

fn open_session(catalog: Arc<Catalog>, cfg: SimConfig, load: Option<&Path>) -> Result<Simulation> {
    let state = match load {
        Some(path) if path.exists() => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading save {}", path.display()))?;
            info!(path = %path.display(), "resuming saved company");
            sim_core::sanitize_json(&text)
        }
        Some(path) => {
            warn!(path = %path.display(), "save not found, founding a new company");
            Default::default()
        }
        None => Default::default(),
    };
    Ok(Simulation::with_state(catalog, cfg, state)?)
}

/// Log a refused autoplay action; true when it went through.
fn attempted(action: &str, id: &str, result: Result<(), TransactionError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            debug!(action, id, reason = %e, "autoplay action refused");
            false
        }
    }
}

/// Greedy policy: keep one project training, buy cheap upgrades, and raise
/// the next round when the next model is out of reach.
fn autoplay(sim: &mut Simulation) {
    if sim.state().is_idle() {
        let mut blocked_on_cash = false;
        for category in Category::ALL {
            let index = sim.state().frontier(category);
            let result = sim.start_research(category, index);
            if result == Err(TransactionError::InsufficientCash) {
                blocked_on_cash = true;
            }
            if attempted("research", category.as_str(), result) {
                blocked_on_cash = false;
                break;
            }
        }
        if blocked_on_cash {
            let next = sim
                .funding_statuses()
                .into_iter()
                .find(|f| !f.claimed)
                .map(|f| f.round.id.clone());
            if let Some(id) = next {
                attempted("funding", &id, sim.unlock_funding(&id));
            }
        }
    }

    let session: &Simulation = sim;
    let half_cash = session.state().cash / Decimal::TWO;
    let affordable: Vec<String> = UpgradeKind::ALL
        .into_iter()
        .flat_map(move |kind| session.upgrade_statuses(kind))
        .filter(|s| !s.purchased && s.upgrade.cost <= half_cash)
        .map(|s| s.upgrade.id.clone())
        .collect();
    for id in affordable {
        attempted("upgrade", &id, sim.purchase_upgrade(&id));
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(?args, "starting CLI");

    let catalog = Arc::new(Catalog::builtin()?);
    let cfg = load_config(args.config.as_deref())?;
    let mut sim = open_session(catalog, cfg, args.load.as_deref())?;

    let seconds = args.seconds.unwrap_or(120.0).max(0.0);
    let fps = args.fps.filter(|f| *f > 0.0).unwrap_or(10.0);
    let frames = (seconds * fps).round() as u64;
    for _ in 0..frames {
        if args.autoplay {
            autoplay(&mut sim);
        }
        let outcome = sim.advance(1.0 / fps);
        if let Some(model) = outcome.completed {
            info!(%model, time = sim.state().time, "model deployed");
        }
    }

    if let Some(path) = args.save.as_deref() {
        let json = serde_json::to_string_pretty(&sim.snapshot())?;
        std::fs::write(path, json).with_context(|| format!("writing save {}", path.display()))?;
        info!(path = %path.display(), "company saved");
    }

    let s = sim.state();
    let deployed: usize = Category::ALL
        .into_iter()
        .map(|c| {
            sim.research_tree(c)
                .iter()
                .filter(|m| m.status == ModelStatus::Deployed)
                .count()
        })
        .sum();
    println!(
        "Company OK | t: {:.1}s | cash: {} | raised: {} | net/s: {} | compute: {} | AI power: {} | models: {}",
        s.time,
        format_currency(s.cash),
        format_currency(s.funding),
        format_currency(s.net_per_second()),
        format_number(s.compute_capacity),
        format_number(s.ai_power),
        deployed
    );
    match sim.active_model() {
        Some(active) => println!(
            "Training {} ({:.0}%)",
            active.model.name, active.progress_percent
        ),
        None => println!("Lab idle"),
    }
    for line in s.news.entries().rev().take(5) {
        println!("  {line}");
    }

    Ok(())
}
