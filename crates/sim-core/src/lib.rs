#![deny(warnings)]

//! Core domain model for AI Lab Tycoon.
//!
//! This crate defines the read-only catalog, the mutable company state, the
//! bounded history/news logs and the plain-data snapshot form with its
//! sanitizer. It holds no simulation rules; those live in `sim-runtime`.

pub mod catalog;
pub mod config;
pub mod log;
pub mod snapshot;
pub mod state;

pub use catalog::{
    Catalog, CatalogError, Category, Effects, Entry, FundingRound, Model, Upgrade, UpgradeKind,
};
pub use config::{ConfigError, SimConfig};
pub use log::{History, HistoryPoint, NewsLog, HISTORY_CAPACITY, NEWS_CAPACITY};
pub use snapshot::{sanitize, sanitize_json, serialize, SavedHistory, SavedResearch, SavedState};
pub use state::{ActiveResearch, CompanyState};
