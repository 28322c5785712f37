//! Trend analytics over a CI build's test-result history.
//!
//! Three views are computed from a newest-first walk of the history: per-build
//! counts, tests running longer than their baseline, and flaky tests ranked
//! for plotting. Results are plain datasets; nothing here renders.

pub mod config;
pub mod counts;
pub mod dataset;
pub mod engine;
mod errors;
pub mod filter;
pub mod flaky;
pub mod lengthy;
pub mod model;
pub mod projects;
pub mod provider;
pub mod ranking;
pub mod summary;
pub mod tooltip;
pub mod walker;

pub use config::{EngineSettings, TrendQuery, TrendType};
pub use dataset::{CategoryTrend, TrendDataset};
pub use engine::TrendEngine;
pub use errors::{Result, TrendError};
pub use filter::{ProjectFilter, ALL_PROJECTS};
pub use flaky::FlakyTrend;
pub use model::{BuildTestRecord, ResultKind, ResultSummary, TestCase};
pub use provider::{BuildHistory, HistoryDir, HistoryProvider};
