use std::sync::Arc;

use serde::Serialize;
use testtrend_core::model::ResultSummary;
use testtrend_core::summary::{BuildResultTrend, RunSummary};
use testtrend_core::TrendEngine;

use super::super::args::{ResultTrendArg, SummaryArgs};
use super::history;
use super::output::emit;
use crate::exit_codes::EXIT_SUCCESS;

impl From<ResultTrendArg> for BuildResultTrend {
    fn from(arg: ResultTrendArg) -> Self {
        match arg {
            ResultTrendArg::Success => Self::Success,
            ResultTrendArg::Fixed => Self::Fixed,
            ResultTrendArg::Failure => Self::Failure,
            ResultTrendArg::NowUnstable => Self::NowUnstable,
            ResultTrendArg::Unstable => Self::Unstable,
            ResultTrendArg::StillUnstable => Self::StillUnstable,
            ResultTrendArg::StillFailing => Self::StillFailing,
            ResultTrendArg::Aborted => Self::Aborted,
            ResultTrendArg::NotBuilt => Self::NotBuilt,
        }
    }
}

#[derive(Serialize)]
struct SummaryReport {
    build: u32,
    result_trend: BuildResultTrend,
    failed: usize,
    skipped: usize,
    total: usize,
    failure_diff: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<RunSummary>,
}

pub(crate) fn run(args: SummaryArgs) -> anyhow::Result<i32> {
    let settings = history::settings(&args.history)?;
    let loaded = history::load(&args.history)?;
    let engine = TrendEngine::new(&*loaded.provider, settings);
    let start = loaded.start;
    let trend = BuildResultTrend::from(args.result_trend);

    let report = SummaryReport {
        build: start.build_number(),
        result_trend: trend,
        failed: start.fail_count(),
        skipped: start.skip_count(),
        total: start.total_count(),
        failure_diff: engine.failure_diff(Arc::clone(&start))?,
        summary: engine.summarize(start, trend)?,
    };
    emit(&args.output, &report, || {
        let mut line = format!(
            "#{}: {} failed{}",
            report.build, report.failed, report.failure_diff
        );
        if let Some(s) = &report.summary {
            line.push_str(&format!(" ({}{})", s.message, if s.worse { ", worse" } else { "" }));
        }
        line.push('\n');
        line
    })?;
    Ok(EXIT_SUCCESS)
}
