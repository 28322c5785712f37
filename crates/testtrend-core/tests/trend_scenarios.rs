use std::sync::Arc;

use testtrend_core::config::{DurationMetric, FlapOrder, PrefixRule};
use testtrend_core::counts::{FAILED, SKIPPED, TOTAL};
use testtrend_core::lengthy::{Baselines, LENGTHY_TESTS};
use testtrend_core::{
    BuildHistory, BuildTestRecord, EngineSettings, HistoryDir, ResultKind, TrendEngine,
    TrendError, TrendQuery, TrendType,
};

const T1: &str = "com.acme.suite.T1.check";

/// T1 oldest to newest: fail, fail, pass, fail, pass.
fn alternating_history() -> BuildHistory {
    BuildHistory::from_records([
        BuildTestRecord::new(1).fail(T1, 0.2),
        BuildTestRecord::new(2).fail(T1, 0.2),
        BuildTestRecord::new(3).pass(T1, 0.2),
        BuildTestRecord::new(4).fail(T1, 0.2).pass("com.acme.suite.T2.other", 0.1),
        BuildTestRecord::new(5).pass(T1, 0.2),
    ])
}

fn latest(h: &BuildHistory) -> Arc<BuildTestRecord> {
    h.latest(ResultKind::Junit).unwrap()
}

#[test]
fn alternating_test_fails_three_times_and_flaps_once() {
    let h = alternating_history();
    let engine = TrendEngine::new(&h, EngineSettings::default());
    let q = TrendQuery::parse(None, Some("FlakyTests"), None, None, None);

    let ds = engine.compute(latest(&h), &q).unwrap();
    let flaky = ds.as_xy().unwrap();
    assert_eq!(flaky.ranked_names(), vec![T1]);
    assert_eq!(flaky.rows[0].fail_count, 3);
    assert_eq!(flaky.rows[0].flap_count, 1);

    let ds = engine.compute(latest(&h), &TrendQuery::default()).unwrap();
    let counts = ds.as_category().unwrap();
    assert_eq!(counts.dataset.value(FAILED, 4), Some(1.0));
    assert_eq!(counts.dataset.value(TOTAL, 4), Some(1.0));
    assert_eq!(counts.tooltips.get(FAILED, 4), Some("check"));
}

#[test]
fn ewma_flags_growing_durations() {
    let t = "com.acme.Slow.grow";
    let h = BuildHistory::from_records([
        BuildTestRecord::new(1).pass(t, 1.0),
        BuildTestRecord::new(2).pass(t, 2.0),
        BuildTestRecord::new(3).pass(t, 3.0),
    ]);
    let engine = TrendEngine::new(&h, EngineSettings::default());
    let q = TrendQuery {
        trend_type: TrendType::LengthyTests,
        ..TrendQuery::default()
    };
    let ds = engine.compute(latest(&h), &q).unwrap();
    let trend = ds.as_category().unwrap();
    assert_eq!(trend.dataset.column(LENGTHY_TESTS), vec![0.0, 1.0, 1.0]);
    assert_eq!(trend.tooltips.get(LENGTHY_TESTS, 3), Some("grow"));

    let mut b = Baselines::new(DurationMetric::Mean);
    for d in [1.0, 2.0, 3.0] {
        b.observe(t, d);
    }
    assert_eq!(b.baseline(t), Some(2.25));
}

#[test]
fn literal_project_prefix_counts_only_matching_failures() {
    let h = BuildHistory::from_records([BuildTestRecord::new(1)
        .fail("com.a.T1", 0.0)
        .fail("org.b.T2", 0.0)]);
    let engine = TrendEngine::new(&h, EngineSettings::default());
    let q = TrendQuery::parse(Some("com"), None, None, None, Some("true"));
    let ds = engine.compute(latest(&h), &q).unwrap();
    let trend = ds.as_category().unwrap();
    assert_eq!(trend.dataset.value(FAILED, 1), Some(1.0));
    assert_eq!(trend.dataset.value(SKIPPED, 1), None);
}

#[test]
fn literal_prefix_crosses_package_boundaries_unless_configured() {
    let h = BuildHistory::from_records([BuildTestRecord::new(1)
        .fail("comX.pkg.Y.t", 0.0)
        .fail("com.pkg.Z.t", 0.0)]);
    let start = latest(&h);

    let engine = TrendEngine::new(&h, EngineSettings::default());
    let filter = engine.filter("com");
    let trend = engine
        .build_analysis(Arc::clone(&start), &filter, true)
        .unwrap();
    assert_eq!(trend.dataset.value(FAILED, 1), Some(2.0));

    let strict = TrendEngine::new(
        &h,
        EngineSettings {
            prefix_rule: PrefixRule::PackageBoundary,
            ..EngineSettings::default()
        },
    );
    let filter = strict.filter("com");
    let trend = strict.build_analysis(start, &filter, true).unwrap();
    assert_eq!(trend.dataset.value(FAILED, 1), Some(1.0));
}

#[test]
fn gaps_break_the_flaky_polyline() {
    let h = BuildHistory::from_records([
        BuildTestRecord::new(10).fail(T1, 0.0),
        BuildTestRecord::new(11).fail(T1, 0.0),
        BuildTestRecord::new(14).fail(T1, 0.0),
    ]);
    let engine = TrendEngine::new(&h, EngineSettings::default());
    let q = TrendQuery {
        trend_type: TrendType::FlakyTests,
        order_by: FlapOrder::Flap,
        ..TrendQuery::default()
    };
    let ds = engine.compute(latest(&h), &q).unwrap();
    let flaky = ds.as_xy().unwrap();
    let points: Vec<(f64, Option<f64>)> = flaky.dataset.series[1]
        .points
        .iter()
        .map(|p| (p.x, p.y))
        .collect();
    assert_eq!(
        points,
        vec![
            (10.0, Some(1.0)),
            (11.0, Some(1.0)),
            (12.0, None),
            (14.0, Some(1.0)),
        ]
    );
}

#[test]
fn record_shared_between_builds_aborts_every_view() {
    let mut h = BuildHistory::new();
    let shared = h.insert(BuildTestRecord::new(2).fail(T1, 0.0));
    h.attach(1, Arc::clone(&shared));
    let engine = TrendEngine::new(&h, EngineSettings::default());

    for trend_type in [
        TrendType::BuildAnalysis,
        TrendType::LengthyTests,
        TrendType::FlakyTests,
    ] {
        let q = TrendQuery {
            trend_type,
            ..TrendQuery::default()
        };
        let err = engine.compute(Arc::clone(&shared), &q).unwrap_err();
        assert!(err.is_data_consistency(), "{trend_type:?}: {err}");
        assert!(matches!(err, TrendError::SharedRecord { .. }));
    }
}

#[test]
fn lazy_directory_walk_stops_at_unreadable_build() {
    let dir = tempfile::tempdir().unwrap();
    let write = |n: u32, rec: &BuildTestRecord| {
        let path = dir.path().join(format!("{n}.json"));
        std::fs::write(path, serde_json::to_string(rec).unwrap()).unwrap();
    };
    write(1, &BuildTestRecord::new(1).fail(T1, 0.0));
    write(3, &BuildTestRecord::new(3).fail(T1, 0.0));
    write(4, &BuildTestRecord::new(4).pass(T1, 0.0));
    std::fs::write(dir.path().join("2.json"), "{ not json").unwrap();

    let history = HistoryDir::open(dir.path()).unwrap();
    let start = history.latest(ResultKind::Junit).unwrap().unwrap();
    let engine = TrendEngine::new(&history, EngineSettings::default());
    let ds = engine.compute(start, &TrendQuery::default()).unwrap();
    assert_eq!(ds.as_category().unwrap().dataset.builds, vec![3, 4]);
}
