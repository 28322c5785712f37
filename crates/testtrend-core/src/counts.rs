//! Per-build failed / skipped / passed counts ("Build Analysis" view).

use std::sync::Arc;

use crate::dataset::{CategoryDatasetBuilder, CategoryTrend, ToolTips};
use crate::errors::Result;
use crate::filter::ProjectFilter;
use crate::model::{BuildTestRecord, Outcome, ResultSummary};
use crate::tooltip::ToolTipBuilder;

pub const FAILED: &str = "failed";
pub const SKIPPED: &str = "skipped";
/// Passed tests. Stacked on top of failed and skipped it reads as the total.
pub const TOTAL: &str = "total";

fn series_for(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Failed => FAILED,
        Outcome::Skipped => SKIPPED,
        Outcome::Passed => TOTAL,
    }
}

/// Count matching tests of `outcome` in `record` and describe them in a tool-tip.
pub fn count_matching(
    record: &BuildTestRecord,
    outcome: Outcome,
    filter: &ProjectFilter,
    tooltip_budget: usize,
) -> (usize, String) {
    let mut count = 0;
    let mut tip = ToolTipBuilder::new(tooltip_budget);
    for case in record
        .tests(outcome)
        .iter()
        .filter(|c| filter.matches(&c.full_name))
    {
        count += 1;
        tip.push(case.short_name());
    }
    (count, tip.finish())
}

/// Filtered per-build counts over `chain`.
///
/// Emits the `failed` series, plus `skipped` and `total` unless `failure_only`.
pub fn aggregate<I>(
    chain: I,
    filter: &ProjectFilter,
    failure_only: bool,
    tooltip_budget: usize,
) -> Result<CategoryTrend>
where
    I: IntoIterator<Item = Result<Arc<BuildTestRecord>>>,
{
    let outcomes: &[Outcome] = if failure_only {
        &[Outcome::Failed]
    } else {
        &[Outcome::Failed, Outcome::Skipped, Outcome::Passed]
    };

    let mut dsb = CategoryDatasetBuilder::new();
    let mut tooltips = ToolTips::default();
    let mut visited = 0usize;
    for record in chain {
        let record = record?;
        visited += 1;
        for &outcome in outcomes {
            let series = series_for(outcome);
            let (count, tip) = count_matching(&record, outcome, filter, tooltip_budget);
            dsb.add(count as f64, series, record.build_number);
            tooltips.insert(series, record.build_number, tip);
        }
    }
    tracing::trace!(visited, project = filter.level(), "build analysis trend");

    Ok(CategoryTrend {
        dataset: dsb.build(),
        tooltips,
    })
}

/// Unfiltered counts straight from each record's summary, without tool-tips.
///
/// `total` here is `total - failed - skipped`, i.e. the passed tests.
pub fn aggregate_totals<I>(chain: I, failure_only: bool) -> Result<CategoryTrend>
where
    I: IntoIterator<Item = Result<Arc<BuildTestRecord>>>,
{
    let mut dsb = CategoryDatasetBuilder::new();
    let mut visited = 0usize;
    for record in chain {
        let record = record?;
        visited += 1;
        let build = record.build_number;
        let failed = record.fail_count();
        dsb.add(failed as f64, FAILED, build);
        if !failure_only {
            let skipped = record.skip_count();
            let passed = record.total_count().saturating_sub(failed + skipped);
            dsb.add(skipped as f64, SKIPPED, build);
            dsb.add(passed as f64, TOTAL, build);
        }
    }
    tracing::trace!(visited, "unfiltered build analysis trend");

    Ok(CategoryTrend {
        dataset: dsb.build(),
        tooltips: ToolTips::default(),
    })
}
