//! Bounded bookkeeping: the rolling history series and the news feed.

use std::collections::VecDeque;

/// Maximum number of history samples kept.
pub const HISTORY_CAPACITY: usize = 240;
/// Maximum number of news lines kept.
pub const NEWS_CAPACITY: usize = 40;
/// In-game year at time zero.
pub const BASE_YEAR: i64 = 2024;
/// Simulated seconds per in-game year.
pub const SECONDS_PER_YEAR: f64 = 60.0;

/// In-game year label for a simulation time.
pub fn year_at(time: f64) -> i64 {
    if !time.is_finite() || time <= 0.0 {
        return BASE_YEAR;
    }
    BASE_YEAR.saturating_add((time / SECONDS_PER_YEAR).floor() as i64)
}

/// One history sample taken at the end of a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistoryPoint {
    pub timestamp: f64,
    pub compute: f64,
    /// Revenue minus expenses per second.
    pub net_revenue: f64,
    pub ai_power: f64,
}

/// Sliding window of samples; the four series stay index-aligned because
/// they are stored as one sequence of points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct History {
    points: VecDeque<HistoryPoint>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, evicting the oldest past capacity.
    pub fn record(&mut self, point: HistoryPoint) {
        self.points.push_back(point);
        while self.points.len() > HISTORY_CAPACITY {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn compute(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.compute).collect()
    }

    pub fn net_revenue(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.net_revenue).collect()
    }

    pub fn ai_power(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.ai_power).collect()
    }
}

impl FromIterator<HistoryPoint> for History {
    fn from_iter<I: IntoIterator<Item = HistoryPoint>>(iter: I) -> Self {
        let mut history = History::new();
        for point in iter {
            history.record(point);
        }
        history
    }
}

/// Append-only news feed with FIFO eviction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewsLog {
    entries: VecDeque<String>,
}

impl NewsLog {
    /// The feed a new company starts with.
    pub fn seeded() -> Self {
        [
            "Founders secure seed capital and repurpose a warehouse into a compute lab.",
            "Talent joins from academia, ready to train GPT-1.",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    /// Append `message` prefixed with the in-game year at `time`.
    pub fn push(&mut self, time: f64, message: &str) {
        self.push_raw(format!("Year {}: {}", year_at(time), message));
    }

    /// Append an already formatted line.
    pub fn push_raw(&mut self, line: String) {
        self.entries.push_back(line);
        while self.entries.len() > NEWS_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }
}

impl FromIterator<String> for NewsLog {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut log = NewsLog::default();
        for line in iter {
            log.push_raw(line);
        }
        log
    }
}
