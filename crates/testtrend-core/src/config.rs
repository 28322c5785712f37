//! Query options and engine settings.
//!
//! Query options come from an untrusted surface (URL parameters, CLI flags).
//! Every parser here is total: unknown or missing values fall back to the
//! documented default instead of failing the request.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::filter::ALL_PROJECTS;

/// Environment override for [`EngineSettings::max_builds`].
pub const MAX_BUILDS_ENV: &str = "TESTTREND_TEST_TREND_MAX";

pub const PROJECT_LEVEL: &str = "projectLevel";
pub const TREND_TYPE: &str = "trendType";
pub const METRIC_NAME: &str = "metricName";
pub const ORDER_BY: &str = "orderBy";
pub const FAILURE_ONLY: &str = "failureOnly";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendType {
    #[default]
    BuildAnalysis,
    LengthyTests,
    FlakyTests,
}

impl TrendType {
    pub fn parse(s: &str) -> Self {
        match s {
            "LengthyTests" => Self::LengthyTests,
            "FlakyTests" => Self::FlakyTests,
            "BuildAnalysis" => Self::BuildAnalysis,
            other => {
                tracing::debug!(value = other, "unknown trend type, using BuildAnalysis");
                Self::BuildAnalysis
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuildAnalysis => "BuildAnalysis",
            Self::LengthyTests => "LengthyTests",
            Self::FlakyTests => "FlakyTests",
        }
    }
}

/// Baseline used to decide whether a passed test ran longer than usual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationMetric {
    /// Exponentially weighted moving average of earlier passes.
    #[default]
    Mean,
    /// Longest earlier pass.
    Max,
    /// Duration of the previous pass.
    Prev,
    /// Fixed threshold, no history.
    Threshold,
}

impl DurationMetric {
    pub fn parse(s: &str) -> Self {
        match s {
            "mean" => Self::Mean,
            "max" => Self::Max,
            "prev" => Self::Prev,
            "threshold" => Self::Threshold,
            other => {
                tracing::debug!(value = other, "unknown duration metric, using mean");
                Self::Mean
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Max => "max",
            Self::Prev => "prev",
            Self::Threshold => "threshold",
        }
    }
}

/// Ranking key for the flaky-test view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlapOrder {
    #[default]
    Fail,
    Flap,
}

impl FlapOrder {
    pub fn parse(s: &str) -> Self {
        match s {
            "flap" => Self::Flap,
            "fail" => Self::Fail,
            other => {
                tracing::debug!(value = other, "unknown ordering, ranking by fail count");
                Self::Fail
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Flap => "flap",
        }
    }
}

/// One trend request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendQuery {
    pub project_level: String,
    pub trend_type: TrendType,
    pub metric: DurationMetric,
    pub order_by: FlapOrder,
    pub failure_only: bool,
}

impl Default for TrendQuery {
    fn default() -> Self {
        Self {
            project_level: ALL_PROJECTS.to_string(),
            trend_type: TrendType::default(),
            metric: DurationMetric::default(),
            order_by: FlapOrder::default(),
            failure_only: false,
        }
    }
}

impl TrendQuery {
    /// Build a query from raw option values; `None` means "not supplied".
    pub fn parse(
        project_level: Option<&str>,
        trend_type: Option<&str>,
        metric: Option<&str>,
        order_by: Option<&str>,
        failure_only: Option<&str>,
    ) -> Self {
        Self {
            project_level: project_level
                .filter(|s| !s.is_empty())
                .unwrap_or(ALL_PROJECTS)
                .to_string(),
            trend_type: trend_type.map(TrendType::parse).unwrap_or_default(),
            metric: metric.map(DurationMetric::parse).unwrap_or_default(),
            order_by: order_by.map(FlapOrder::parse).unwrap_or_default(),
            failure_only: failure_only.is_some_and(|s| s.eq_ignore_ascii_case("true")),
        }
    }

    /// Query from `projectLevel` / `trendType` / `metricName` / `orderBy` / `failureOnly` parameters.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let get = |k: &str| params.get(k).map(String::as_str);
        Self::parse(
            get(PROJECT_LEVEL),
            get(TREND_TYPE),
            get(METRIC_NAME),
            get(ORDER_BY),
            get(FAILURE_ONLY),
        )
    }
}

/// Whether the history walk may force loading of builds that are not in memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkMode {
    #[default]
    Eager,
    /// Stop at the first build that is not materialized yet.
    LoadedOnly,
}

/// How a project level matches a fully-qualified test name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixRule {
    /// Plain string prefix: `com` matches `comX.Y`.
    #[default]
    Literal,
    /// Prefix followed by `.` or end of name.
    PackageBoundary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Most builds any single computation visits. `None` is unbounded.
    pub max_builds: Option<usize>,
    pub walk: WalkMode,
    /// Trailing build window of the flaky-test detector.
    pub flaky_window: u32,
    /// Ranked rows in the flaky-test view.
    pub top_k: usize,
    /// Largest project list offered for selection.
    pub project_cap: usize,
    /// Characters of test names collected per tool-tip.
    pub tooltip_budget: usize,
    /// Seconds above which the `threshold` metric flags a test.
    pub lengthy_threshold: f64,
    /// Smoothing factor of the `mean` metric.
    pub ewma_alpha: f64,
    pub prefix_rule: PrefixRule,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_builds: None,
            walk: WalkMode::Eager,
            flaky_window: crate::flaky::DEFAULT_WINDOW,
            top_k: crate::flaky::DEFAULT_TOP_K,
            project_cap: crate::projects::DEFAULT_PROJECT_CAP,
            tooltip_budget: crate::tooltip::DEFAULT_BUDGET,
            lengthy_threshold: crate::lengthy::DEFAULT_THRESHOLD,
            ewma_alpha: crate::lengthy::DEFAULT_ALPHA,
            prefix_rule: PrefixRule::Literal,
        }
    }
}

impl EngineSettings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Apply [`MAX_BUILDS_ENV`] if set to a valid number.
    pub fn with_env_overrides(self) -> Self {
        let value = std::env::var(MAX_BUILDS_ENV).ok();
        self.with_max_builds_override(value.as_deref())
    }

    pub fn with_max_builds_override(mut self, value: Option<&str>) -> Self {
        if let Some(raw) = value {
            match raw.trim().parse::<usize>() {
                Ok(n) => self.max_builds = Some(n),
                Err(_) => tracing::debug!(value = raw, "ignoring unparsable build cap"),
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_options_use_defaults() {
        let q = TrendQuery::parse(None, None, None, None, None);
        assert_eq!(q, TrendQuery::default());
        assert_eq!(q.project_level, "AllProjects");
        assert_eq!(q.metric, DurationMetric::Mean);
    }

    #[test]
    fn unknown_options_degrade_silently() {
        let q = TrendQuery::parse(
            Some("com.acme"),
            Some("PieChart"),
            Some("median"),
            Some("alphabetical"),
            Some("yes"),
        );
        assert_eq!(q.project_level, "com.acme");
        assert_eq!(q.trend_type, TrendType::BuildAnalysis);
        assert_eq!(q.metric, DurationMetric::Mean);
        assert_eq!(q.order_by, FlapOrder::Fail);
        assert!(!q.failure_only);
    }

    #[test]
    fn params_map_uses_option_names() {
        let params: HashMap<String, String> = [
            ("trendType", "FlakyTests"),
            ("orderBy", "flap"),
            ("metricName", "prev"),
            ("failureOnly", "TRUE"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let q = TrendQuery::from_params(&params);
        assert_eq!(q.trend_type, TrendType::FlakyTests);
        assert_eq!(q.order_by, FlapOrder::Flap);
        assert_eq!(q.metric, DurationMetric::Prev);
        assert!(q.failure_only);
        assert_eq!(q.project_level, ALL_PROJECTS);
    }

    #[test]
    fn settings_yaml_fills_defaults() {
        let s = EngineSettings::from_yaml_str("max_builds: 25\nwalk: loaded_only\n").unwrap();
        assert_eq!(s.max_builds, Some(25));
        assert_eq!(s.walk, WalkMode::LoadedOnly);
        assert_eq!(s.flaky_window, 10);
        assert_eq!(s.top_k, 20);
        assert_eq!(s.project_cap, 50);
        assert_eq!(s.prefix_rule, PrefixRule::Literal);
    }

    #[test]
    fn build_cap_override() {
        let s = EngineSettings::default().with_max_builds_override(Some(" 12 "));
        assert_eq!(s.max_builds, Some(12));
        let s = EngineSettings::default().with_max_builds_override(Some("lots"));
        assert_eq!(s.max_builds, None);
        let s = EngineSettings::default().with_max_builds_override(None);
        assert_eq!(s.max_builds, None);
    }
}
