use std::collections::HashMap;

use serde::Serialize;
use testtrend_core::{TrendDataset, TrendEngine, TrendQuery, ALL_PROJECTS};

use super::super::args::{TopFailedArgs, TrendArgs};
use super::history;
use super::output::{emit, now, render_dataset};
use crate::exit_codes::EXIT_SUCCESS;

#[derive(Serialize)]
struct TrendReport<'a> {
    generated_at: String,
    build: u32,
    query: &'a TrendQuery,
    dataset: &'a TrendDataset,
}

/// Query from the dedicated flags, or from `--param` pairs when none is given.
fn query(args: &TrendArgs) -> TrendQuery {
    let flags = [
        &args.project_level,
        &args.trend_type,
        &args.metric,
        &args.order_by,
        &args.failure_only,
    ];
    if flags.iter().all(|f| f.is_none()) && !args.params.is_empty() {
        let params: HashMap<String, String> = args
            .params
            .iter()
            .filter_map(|p| match p.split_once('=') {
                Some((k, v)) => Some((k.trim().to_string(), v.trim().to_string())),
                None => {
                    tracing::warn!(param = %p, "ignoring parameter without '='");
                    None
                }
            })
            .collect();
        return TrendQuery::from_params(&params);
    }
    TrendQuery::parse(
        args.project_level.as_deref(),
        args.trend_type.as_deref(),
        args.metric.as_deref(),
        args.order_by.as_deref(),
        args.failure_only.as_deref(),
    )
}

pub(crate) fn run(args: TrendArgs) -> anyhow::Result<i32> {
    let settings = history::settings(&args.history)?;
    let loaded = history::load(&args.history)?;
    let query = query(&args);
    let engine = TrendEngine::new(&*loaded.provider, settings);
    let build = loaded.start.build_number;

    tracing::info!(
        build,
        trend = query.trend_type.as_str(),
        project = %query.project_level,
        "computing test trend"
    );
    let dataset = engine.compute(loaded.start, &query)?;

    let report = TrendReport {
        generated_at: now(),
        build,
        query: &query,
        dataset: &dataset,
    };
    emit(&args.output, &report, || render_dataset(&dataset))?;
    Ok(EXIT_SUCCESS)
}

#[derive(Serialize)]
struct RankedTest {
    name: String,
    fail_count: u32,
}

#[derive(Serialize)]
struct TopFailedReport {
    generated_at: String,
    build: u32,
    project_level: String,
    tests: Vec<RankedTest>,
}

pub(crate) fn run_top_failed(args: TopFailedArgs) -> anyhow::Result<i32> {
    let settings = history::settings(&args.history)?;
    let loaded = history::load(&args.history)?;
    let engine = TrendEngine::new(&*loaded.provider, settings);
    let level = args.project_level.as_deref().unwrap_or(ALL_PROJECTS);
    let filter = engine.filter(level);
    let build = loaded.start.build_number;

    let tests: Vec<RankedTest> = engine
        .most_failed(loaded.start, &filter)?
        .into_iter()
        .map(|(name, fail_count)| RankedTest { name, fail_count })
        .collect();

    let report = TopFailedReport {
        generated_at: now(),
        build,
        project_level: level.to_string(),
        tests,
    };
    emit(&args.output, &report, || {
        report
            .tests
            .iter()
            .map(|t| format!("{}\t{}\n", t.fail_count, t.name))
            .collect()
    })?;
    Ok(EXIT_SUCCESS)
}
