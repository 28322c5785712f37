//! Flaky-test detection ("Flaky Tests" view).
//!
//! History is scanned once, newest build first. Per test the detector keeps
//! only scalars (fail count, flap count, last outcome seen), the builds it
//! failed in, and a queue of builds at which a flap was counted. A flap is a
//! failure seen right after the same test was seen passing, where that pass
//! was itself preceded in the scan by a failure.
//!
//! A trailing window of the last `window` builds is kept. When a build leaves
//! the window, each test that failed in it is checked for a flap recorded at
//! an older build; the number of such tests is that build's "currently
//! flapping" count.
//!
//! After the scan, tests are ranked by fail count or flap count and the top
//! rows become XY polylines: one point per failing build at the test's row,
//! broken with an empty point across gaps of more than one build.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use serde::Serialize;

use crate::config::FlapOrder;
use crate::dataset::{XyDataset, XySeries};
use crate::errors::Result;
use crate::filter::ProjectFilter;
use crate::model::BuildTestRecord;
use crate::ranking::top_k;

/// Trailing build window.
pub const DEFAULT_WINDOW: u32 = 10;
/// Ranked rows shown.
pub const DEFAULT_TOP_K: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastSeen {
    Unknown,
    Failed,
    Passed,
}

#[derive(Debug, Clone)]
struct TestStat {
    name: String,
    fail_count: u32,
    flap_count: u32,
    last: LastSeen,
    /// Newest first.
    failed_builds: Vec<u32>,
    /// Builds at which a flap was counted, newest first.
    flaps: VecDeque<u32>,
}

impl TestStat {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail_count: 0,
            flap_count: 0,
            last: LastSeen::Unknown,
            failed_builds: Vec::new(),
            flaps: VecDeque::new(),
        }
    }

    fn score(&self, order_by: FlapOrder) -> u32 {
        match order_by {
            FlapOrder::Fail => self.fail_count,
            FlapOrder::Flap => self.flap_count,
        }
    }
}

#[derive(Debug)]
struct WindowEntry {
    build: u32,
    failing: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlakyRow {
    /// Display row; the best-ranked test has the highest row.
    pub row: usize,
    pub name: String,
    pub fail_count: u32,
    pub flap_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlakyTrend {
    /// Series 0 is an invisible scaffold; series `i` belongs to the rank-`i` test.
    pub dataset: XyDataset,
    /// Rank order, best first.
    pub rows: Vec<FlakyRow>,
    /// Per build: tests failing there that flapped again at an older build within the window.
    pub flapping: BTreeMap<u32, usize>,
    pub order_by: FlapOrder,
}

impl FlakyTrend {
    pub fn ranked_names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn row(&self, row: usize) -> Option<&FlakyRow> {
        self.rows.iter().find(|r| r.row == row)
    }

    pub fn flapping_at(&self, build: u32) -> usize {
        self.flapping.get(&build).copied().unwrap_or(0)
    }

    /// Hover text for the point at `build` on display row `row`.
    pub fn tooltip(&self, build: u32, row: usize) -> Option<String> {
        let r = self.row(row)?;
        Some(format!(
            "#{build}\n{}\nfailed: {}\nflaps: {}\nflapping in build: {}",
            r.name,
            r.fail_count,
            r.flap_count,
            self.flapping_at(build)
        ))
    }
}

/// Incremental flaky-test detector. Feed records newest first, then [`finish`](Self::finish).
#[derive(Debug)]
pub struct FlakyDetector<'f> {
    filter: &'f ProjectFilter,
    order_by: FlapOrder,
    window: u32,
    top_k: usize,
    start: Option<u32>,
    index: HashMap<String, usize>,
    stats: Vec<TestStat>,
    window_builds: VecDeque<WindowEntry>,
    flapping: BTreeMap<u32, usize>,
    visited: Vec<u32>,
}

impl<'f> FlakyDetector<'f> {
    pub fn new(filter: &'f ProjectFilter, order_by: FlapOrder) -> Self {
        Self {
            filter,
            order_by,
            window: DEFAULT_WINDOW,
            top_k: DEFAULT_TOP_K,
            start: None,
            index: HashMap::new(),
            stats: Vec::new(),
            window_builds: VecDeque::new(),
            flapping: BTreeMap::new(),
            visited: Vec::new(),
        }
    }

    pub fn with_window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn observe(&mut self, record: &BuildTestRecord) {
        let build = record.build_number;
        let filter = self.filter;
        let start = *self.start.get_or_insert(build);
        if start.saturating_sub(build) >= self.window {
            self.evict();
        }

        let mut failing = Vec::new();
        for case in record
            .failed
            .iter()
            .filter(|c| filter.matches(&c.full_name))
        {
            let idx = match self.index.get(&case.full_name) {
                Some(idx) => *idx,
                None => {
                    self.stats.push(TestStat::new(&case.full_name));
                    let idx = self.stats.len() - 1;
                    self.index.insert(case.full_name.clone(), idx);
                    idx
                }
            };
            let stat = &mut self.stats[idx];
            stat.fail_count += 1;
            if stat.last == LastSeen::Passed {
                stat.flap_count += 1;
                stat.flaps.push_back(build);
            }
            stat.last = LastSeen::Failed;
            stat.failed_builds.push(build);
            failing.push(idx);
        }

        for case in record
            .passed
            .iter()
            .filter(|c| filter.matches(&c.full_name))
        {
            if let Some(idx) = self.index.get(&case.full_name) {
                self.stats[*idx].last = LastSeen::Passed;
            }
        }

        self.visited.push(build);
        self.window_builds.push_back(WindowEntry { build, failing });
    }

    fn evict(&mut self) {
        let Some(entry) = self.window_builds.pop_front() else {
            return;
        };
        let mut count = 0;
        for idx in entry.failing {
            let flaps = &mut self.stats[idx].flaps;
            while flaps.front().is_some_and(|b| *b >= entry.build) {
                flaps.pop_front();
            }
            if !flaps.is_empty() {
                count += 1;
            }
        }
        self.flapping.insert(entry.build, count);
    }

    pub fn finish(mut self) -> FlakyTrend {
        while !self.window_builds.is_empty() {
            self.evict();
        }

        let order_by = self.order_by;
        let ranked = top_k(
            self.stats
                .iter()
                .map(|s| (s.name.as_str(), s.score(order_by))),
            self.top_k,
        );
        let shown = ranked.len();

        let mut scaffold = XySeries::new(0);
        for build in &self.visited {
            scaffold.add(f64::from(*build), None);
        }
        if let Some(start) = self.start {
            scaffold.add(f64::from(start) + 0.5, Some(shown as f64 + 0.5));
        }
        scaffold.sort();

        let mut series = vec![scaffold];
        let mut rows = Vec::with_capacity(shown);
        for (rank, (name, _)) in ranked.into_iter().enumerate() {
            let idx = self.index[&name];
            let stat = &self.stats[idx];
            let row = shown - rank;
            let y = Some(row as f64);

            let mut line = XySeries::new(rank + 1);
            let mut prev: Option<u32> = None;
            for &x in &stat.failed_builds {
                if prev.is_some_and(|p| p.saturating_sub(x) > 1) {
                    line.add(f64::from(x) + 1.0, None);
                }
                line.add(f64::from(x), y);
                prev = Some(x);
            }
            line.sort();
            series.push(line);

            rows.push(FlakyRow {
                row,
                name,
                fail_count: stat.fail_count,
                flap_count: stat.flap_count,
            });
        }
        tracing::trace!(
            visited = self.visited.len(),
            tests = self.stats.len(),
            shown,
            "flaky tests trend"
        );

        FlakyTrend {
            dataset: XyDataset { series },
            rows,
            flapping: self.flapping,
            order_by,
        }
    }
}

/// Scan `chain` (newest first) for flaky tests.
pub fn detect_flappers<I>(
    chain: I,
    filter: &ProjectFilter,
    order_by: FlapOrder,
    window: u32,
    top_k: usize,
) -> Result<FlakyTrend>
where
    I: IntoIterator<Item = Result<Arc<BuildTestRecord>>>,
{
    let mut detector = FlakyDetector::new(filter, order_by)
        .with_window(window)
        .with_top_k(top_k);
    for record in chain {
        let record = record?;
        detector.observe(&record);
    }
    Ok(detector.finish())
}
