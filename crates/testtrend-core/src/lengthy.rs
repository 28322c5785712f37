//! Duration-regression detection ("Lengthy Tests" view).
//!
//! Builds are processed oldest first so each metric can carry a per-test
//! baseline forward. A passed test is flagged when its duration exceeds its
//! baseline; the first pass ever seen for a test is never flagged, it only
//! seeds the baseline. This holds for the fixed `threshold` metric too.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DurationMetric;
use crate::dataset::{CategoryDatasetBuilder, CategoryTrend, ToolTips};
use crate::errors::Result;
use crate::filter::ProjectFilter;
use crate::model::BuildTestRecord;
use crate::tooltip::ToolTipBuilder;

pub const LENGTHY_TESTS: &str = "Lengthy Tests";

/// Seconds above which the `threshold` metric flags a pass.
pub const DEFAULT_THRESHOLD: f64 = 0.002;
/// Smoothing factor of the `mean` metric.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Round to 5 decimal places.
pub fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

/// Per-test duration baselines for one metric.
#[derive(Debug, Clone)]
pub struct Baselines {
    metric: DurationMetric,
    alpha: f64,
    threshold: f64,
    seen: HashMap<String, f64>,
}

impl Baselines {
    pub fn new(metric: DurationMetric) -> Self {
        Self::with_params(metric, DEFAULT_ALPHA, DEFAULT_THRESHOLD)
    }

    pub fn with_params(metric: DurationMetric, alpha: f64, threshold: f64) -> Self {
        Self {
            metric,
            alpha,
            threshold,
            seen: HashMap::new(),
        }
    }

    pub fn metric(&self) -> DurationMetric {
        self.metric
    }

    pub fn baseline(&self, test: &str) -> Option<f64> {
        self.seen.get(test).copied()
    }

    /// Record a pass of `test` and report whether it ran longer than its baseline.
    pub fn observe(&mut self, test: &str, duration: f64) -> bool {
        match self.metric {
            DurationMetric::Threshold => {
                let threshold = self.threshold;
                match self.seen.get_mut(test) {
                    Some(last) => {
                        *last = duration;
                        duration > threshold
                    }
                    None => self.seed(test, duration),
                }
            }
            DurationMetric::Max => match self.seen.get_mut(test) {
                Some(max) => {
                    let flagged = duration > *max;
                    *max = max.max(duration);
                    flagged
                }
                None => self.seed(test, duration),
            },
            DurationMetric::Prev => match self.seen.get_mut(test) {
                Some(prev) => {
                    let flagged = duration > *prev;
                    *prev = duration;
                    flagged
                }
                None => self.seed(test, duration),
            },
            DurationMetric::Mean => {
                let alpha = self.alpha;
                match self.seen.get_mut(test) {
                    Some(ewma) => {
                        let flagged = duration > *ewma;
                        *ewma = round5(alpha * duration + (1.0 - alpha) * *ewma);
                        flagged
                    }
                    None => self.seed(test, duration),
                }
            }
        }
    }

    fn seed(&mut self, test: &str, duration: f64) -> bool {
        self.seen.insert(test.to_string(), duration);
        false
    }
}

/// Walk `chain` (newest first) and return its records oldest first.
pub fn oldest_first<I>(chain: I) -> Result<Vec<Arc<BuildTestRecord>>>
where
    I: IntoIterator<Item = Result<Arc<BuildTestRecord>>>,
{
    let mut stack = chain.into_iter().collect::<Result<Vec<_>>>()?;
    stack.reverse();
    Ok(stack)
}

/// Count, per build, the matching passed tests that ran longer than their baseline.
pub fn detect<I>(
    chain: I,
    filter: &ProjectFilter,
    mut baselines: Baselines,
    tooltip_budget: usize,
) -> Result<CategoryTrend>
where
    I: IntoIterator<Item = Result<Arc<BuildTestRecord>>>,
{
    let builds = oldest_first(chain)?;
    let mut dsb = CategoryDatasetBuilder::new();
    let mut tooltips = ToolTips::default();

    for record in &builds {
        let mut lengthy = 0usize;
        let mut tip = ToolTipBuilder::new(tooltip_budget);
        for case in record
            .passed
            .iter()
            .filter(|c| filter.matches(&c.full_name))
        {
            if baselines.observe(&case.full_name, case.duration) {
                lengthy += 1;
                tip.push(case.short_name());
            }
        }
        dsb.add(lengthy as f64, LENGTHY_TESTS, record.build_number);
        tooltips.insert(LENGTHY_TESTS, record.build_number, tip.finish());
    }
    tracing::trace!(
        visited = builds.len(),
        metric = baselines.metric().as_str(),
        "lengthy tests trend"
    );

    Ok(CategoryTrend {
        dataset: dsb.build(),
        tooltips,
    })
}
