//! Newest-first walk over a build's test-result history.
//!
//! The walk is a lazy iterator over a [`HistoryProvider`]. It ends when there
//! is no earlier build, when the build cap is reached, when (in
//! [`WalkMode::LoadedOnly`]) the next build is not materialized, or when a
//! provider reports missing history. A corrupted association between a
//! build and its record ends the walk with an error instead.

use std::sync::Arc;

use crate::config::WalkMode;
use crate::errors::{Result, TrendError};
use crate::model::BuildTestRecord;
use crate::provider::HistoryProvider;

pub struct BuildChain<'p, P: HistoryProvider + ?Sized> {
    provider: &'p P,
    start: Option<Arc<BuildTestRecord>>,
    last: Option<Arc<BuildTestRecord>>,
    cap: Option<usize>,
    mode: WalkMode,
    visited: usize,
    done: bool,
}

/// Walk history from `start` (inclusive), newest first.
pub fn walk<'p, P: HistoryProvider + ?Sized>(
    provider: &'p P,
    start: Arc<BuildTestRecord>,
    cap: Option<usize>,
    mode: WalkMode,
) -> BuildChain<'p, P> {
    BuildChain {
        provider,
        start: Some(start),
        last: None,
        cap,
        mode,
        visited: 0,
        done: false,
    }
}

impl<P: HistoryProvider + ?Sized> BuildChain<'_, P> {
    /// Records produced so far.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Whether the cap is reached; checked before the provider is asked for another record.
    fn capped(&mut self, build: u32) -> bool {
        let Some(cap) = self.cap else {
            return false;
        };
        if self.visited < cap {
            return false;
        }
        tracing::debug!(build, cap, "capping test trend");
        self.done = true;
        true
    }

    fn admit(&mut self, record: Arc<BuildTestRecord>) -> Option<Result<Arc<BuildTestRecord>>> {
        self.visited += 1;
        self.last = Some(Arc::clone(&record));
        Some(Ok(record))
    }

    fn fail(&mut self, err: TrendError) -> Option<Result<Arc<BuildTestRecord>>> {
        self.done = true;
        Some(Err(err))
    }

    fn previous(&mut self, last: Arc<BuildTestRecord>) -> Option<Result<Arc<BuildTestRecord>>> {
        let mut build = last.build_number;
        if self.capped(build) {
            return None;
        }
        loop {
            if self.mode == WalkMode::LoadedOnly
                && !(build > 0 && self.provider.is_materialized(build - 1))
            {
                tracing::debug!(build, "previous build not loaded, stopping walk");
                self.done = true;
                return None;
            }
            let Some(prev) = self.provider.previous_build(build) else {
                self.done = true;
                return None;
            };
            match self.provider.load_record(prev, last.kind) {
                Ok(None) => build = prev,
                Ok(Some(record)) => {
                    if Arc::ptr_eq(&record, &last) {
                        return self.fail(TrendError::SharedRecord {
                            first: prev,
                            second: last.build_number,
                        });
                    }
                    if record.build_number != prev {
                        return self.fail(TrendError::MisattachedRecord {
                            build: prev,
                            record: record.build_number,
                        });
                    }
                    return self.admit(record);
                }
                Err(TrendError::MissingHistory { build, reason }) => {
                    tracing::debug!(build, %reason, "history unavailable, stopping walk");
                    self.done = true;
                    return None;
                }
                Err(err) => return self.fail(err),
            }
        }
    }
}

impl<P: HistoryProvider + ?Sized> Iterator for BuildChain<'_, P> {
    type Item = Result<Arc<BuildTestRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(start) = self.start.take() {
            if self.capped(start.build_number) {
                return None;
            }
            return self.admit(start);
        }
        let last = self.last.clone()?;
        self.previous(last)
    }
}

impl<P: HistoryProvider + ?Sized> std::iter::FusedIterator for BuildChain<'_, P> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResultKind;
    use crate::provider::BuildHistory;

    fn numbers<P: HistoryProvider + ?Sized>(chain: BuildChain<'_, P>) -> Vec<u32> {
        chain.map(|r| r.unwrap().build_number).collect()
    }

    fn history(builds: &[u32]) -> BuildHistory {
        BuildHistory::from_records(builds.iter().map(|n| BuildTestRecord::new(*n)))
    }

    #[test]
    fn walks_newest_first_across_gaps() {
        let h = history(&[1, 2, 5, 6]);
        let start = h.record(6, ResultKind::Junit).unwrap();
        assert_eq!(numbers(walk(&h, start, None, WalkMode::Eager)), vec![6, 5, 2, 1]);
    }

    #[test]
    fn cap_bounds_the_walk() {
        let h = history(&[1, 2, 3, 4, 5]);
        let start = h.record(5, ResultKind::Junit).unwrap();
        let mut chain = walk(&h, start, Some(2), WalkMode::Eager);
        assert_eq!(chain.next().unwrap().unwrap().build_number, 5);
        assert_eq!(chain.next().unwrap().unwrap().build_number, 4);
        assert!(chain.next().is_none());
        assert_eq!(chain.visited(), 2);
    }

    #[test]
    fn builds_without_results_are_skipped() {
        let mut h = history(&[1, 4]);
        h.add_build(2);
        h.add_build(3);
        h.insert(BuildTestRecord::new(3).with_kind(ResultKind::Aggregated));
        let start = h.record(4, ResultKind::Junit).unwrap();
        assert_eq!(numbers(walk(&h, start, None, WalkMode::Eager)), vec![4, 1]);
    }

    #[test]
    fn loaded_only_stops_before_unloaded_build() {
        let mut h = history(&[1, 2, 3, 4]);
        h.set_materialized(2, false);
        let start = h.record(4, ResultKind::Junit).unwrap();
        assert_eq!(
            numbers(walk(&h, Arc::clone(&start), None, WalkMode::LoadedOnly)),
            vec![4, 3]
        );
        assert_eq!(
            numbers(walk(&h, start, None, WalkMode::Eager)),
            vec![4, 3, 2, 1]
        );
    }

    #[test]
    fn loaded_only_stops_at_number_gap() {
        let h = history(&[1, 3]);
        let start = h.record(3, ResultKind::Junit).unwrap();
        assert_eq!(numbers(walk(&h, start, None, WalkMode::LoadedOnly)), vec![3]);
    }

    #[test]
    fn record_attached_to_two_builds_fails_fast() {
        let mut h = history(&[1, 3]);
        let shared = h.record(3, ResultKind::Junit).unwrap();
        h.attach(2, Arc::clone(&shared));
        let mut chain = walk(&h, shared, None, WalkMode::Eager);
        assert!(chain.next().unwrap().is_ok());
        let err = chain.next().unwrap().unwrap_err();
        assert!(err.is_data_consistency());
        assert!(matches!(err, TrendError::SharedRecord { first: 2, second: 3 }));
        assert!(chain.next().is_none());
    }

    #[test]
    fn record_with_wrong_number_fails_fast() {
        let mut h = history(&[5]);
        h.attach(4, Arc::new(BuildTestRecord::new(9)));
        let start = h.record(5, ResultKind::Junit).unwrap();
        let results: Vec<_> = walk(&h, start, None, WalkMode::Eager).collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[1],
            Err(TrendError::MisattachedRecord { build: 4, record: 9 })
        ));
    }

    struct Flaky {
        inner: BuildHistory,
        broken: u32,
    }

    impl HistoryProvider for Flaky {
        fn previous_build(&self, build: u32) -> Option<u32> {
            self.inner.previous_build(build)
        }

        fn is_materialized(&self, build: u32) -> bool {
            self.inner.is_materialized(build)
        }

        fn load_record(
            &self,
            build: u32,
            kind: ResultKind,
        ) -> Result<Option<Arc<BuildTestRecord>>> {
            if build == self.broken {
                return Err(TrendError::missing(build, "disk error"));
            }
            self.inner.load_record(build, kind)
        }
    }

    struct Counting {
        inner: BuildHistory,
        loads: std::cell::Cell<usize>,
    }

    impl HistoryProvider for Counting {
        fn previous_build(&self, build: u32) -> Option<u32> {
            self.inner.previous_build(build)
        }

        fn is_materialized(&self, build: u32) -> bool {
            self.inner.is_materialized(build)
        }

        fn load_record(
            &self,
            build: u32,
            kind: ResultKind,
        ) -> Result<Option<Arc<BuildTestRecord>>> {
            self.loads.set(self.loads.get() + 1);
            self.inner.load_record(build, kind)
        }
    }

    #[test]
    fn capped_walk_loads_no_extra_record() {
        let provider = Counting {
            inner: history(&[1, 2, 3, 4, 5]),
            loads: std::cell::Cell::new(0),
        };
        let start = provider.inner.record(5, ResultKind::Junit).unwrap();
        assert_eq!(
            numbers(walk(&provider, Arc::clone(&start), Some(2), WalkMode::Eager)),
            vec![5, 4]
        );
        assert_eq!(provider.loads.get(), 1);

        provider.loads.set(0);
        assert!(numbers(walk(&provider, start, Some(0), WalkMode::Eager)).is_empty());
        assert_eq!(provider.loads.get(), 0);
    }

    #[test]
    fn missing_history_ends_walk_quietly() {
        let provider = Flaky {
            inner: history(&[1, 2, 3, 4]),
            broken: 2,
        };
        let start = provider.inner.record(4, ResultKind::Junit).unwrap();
        assert_eq!(numbers(walk(&provider, start, None, WalkMode::Eager)), vec![4, 3]);
    }
}
