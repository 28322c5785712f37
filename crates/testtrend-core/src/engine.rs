//! Request-level entry point tying the walk, the filter and the analyses together.
//!
//! A [`TrendEngine`] only borrows the history and holds immutable settings.
//! Every computation walks the chain again and builds its accumulators on the
//! stack, so concurrent requests against one engine never share mutable state.

use std::sync::Arc;

use crate::config::{EngineSettings, TrendQuery, TrendType};
use crate::dataset::{CategoryTrend, TrendDataset};
use crate::errors::{Result, TrendError};
use crate::filter::{ProjectFilter, ALL_PROJECTS};
use crate::flaky::{detect_flappers, FlakyTrend};
use crate::lengthy::{self, Baselines};
use crate::model::BuildTestRecord;
use crate::provider::HistoryProvider;
use crate::summary::{self, BuildResultTrend, RunSummary};
use crate::walker::{walk, BuildChain};
use crate::{counts, projects, ranking};

pub struct TrendEngine<'p, P: HistoryProvider + ?Sized> {
    provider: &'p P,
    settings: EngineSettings,
}

impl<'p, P: HistoryProvider + ?Sized> TrendEngine<'p, P> {
    pub fn new(provider: &'p P, settings: EngineSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Capped newest-first walk from `start`.
    pub fn chain(&self, start: Arc<BuildTestRecord>) -> BuildChain<'p, P> {
        walk(
            self.provider,
            start,
            self.settings.max_builds,
            self.settings.walk,
        )
    }

    pub fn filter(&self, project_level: &str) -> ProjectFilter {
        ProjectFilter::new(project_level, self.settings.prefix_rule)
    }

    /// Selectable project levels for the history ending at `start`.
    pub fn project_list(&self, start: &BuildTestRecord) -> Vec<String> {
        projects::record_projects(start, self.settings.project_cap)
    }

    /// Whether `project_level` can be offered for `start`.
    pub fn is_known_project(&self, start: &BuildTestRecord, project_level: &str) -> bool {
        project_level == ALL_PROJECTS
            || self
                .project_list(start)
                .iter()
                .any(|p| p == project_level)
    }

    /// Run the trend view selected by `query`.
    ///
    /// A project level that is neither `AllProjects` nor in the project list
    /// yields the unfiltered build analysis, whatever the trend type.
    pub fn compute(&self, start: Arc<BuildTestRecord>, query: &TrendQuery) -> Result<TrendDataset> {
        if !self.is_known_project(&start, &query.project_level) {
            tracing::warn!(
                project = %query.project_level,
                build = start.build_number,
                "unknown project level, showing unfiltered build analysis"
            );
            return counts::aggregate_totals(self.chain(start), query.failure_only)
                .map(TrendDataset::Category);
        }

        let filter = self.filter(&query.project_level);
        match query.trend_type {
            TrendType::BuildAnalysis => self
                .build_analysis(start, &filter, query.failure_only)
                .map(TrendDataset::Category),
            TrendType::LengthyTests => self
                .lengthy_tests(start, &filter, query)
                .map(TrendDataset::Category),
            TrendType::FlakyTests => self
                .flaky_tests(start, &filter, query)
                .map(TrendDataset::Xy),
        }
    }

    pub fn build_analysis(
        &self,
        start: Arc<BuildTestRecord>,
        filter: &ProjectFilter,
        failure_only: bool,
    ) -> Result<CategoryTrend> {
        counts::aggregate(
            self.chain(start),
            filter,
            failure_only,
            self.settings.tooltip_budget,
        )
    }

    pub fn lengthy_tests(
        &self,
        start: Arc<BuildTestRecord>,
        filter: &ProjectFilter,
        query: &TrendQuery,
    ) -> Result<CategoryTrend> {
        let baselines = Baselines::with_params(
            query.metric,
            self.settings.ewma_alpha,
            self.settings.lengthy_threshold,
        );
        lengthy::detect(
            self.chain(start),
            filter,
            baselines,
            self.settings.tooltip_budget,
        )
    }

    pub fn flaky_tests(
        &self,
        start: Arc<BuildTestRecord>,
        filter: &ProjectFilter,
        query: &TrendQuery,
    ) -> Result<FlakyTrend> {
        detect_flappers(
            self.chain(start),
            filter,
            query.order_by,
            self.settings.flaky_window,
            self.settings.top_k,
        )
    }

    /// Tests failing most often, with fail counts.
    pub fn most_failed(
        &self,
        start: Arc<BuildTestRecord>,
        filter: &ProjectFilter,
    ) -> Result<Vec<(String, u32)>> {
        ranking::most_failed(self.chain(start), filter, self.settings.top_k)
    }

    /// Result of the same kind in the nearest earlier build.
    ///
    /// Ignores the build cap; a summary always looks one build back.
    pub fn previous_result(&self, start: Arc<BuildTestRecord>) -> Result<Option<Arc<BuildTestRecord>>> {
        walk(self.provider, start, None, self.settings.walk)
            .nth(1)
            .transpose()
    }

    /// Result of the same kind attached to the immediately preceding build.
    ///
    /// `None` when that build has no such result or its history is gone.
    pub fn previous_build_result(&self, start: &BuildTestRecord) -> Result<Option<Arc<BuildTestRecord>>> {
        let Some(prev) = self.provider.previous_build(start.build_number) else {
            return Ok(None);
        };
        match self.provider.load_record(prev, start.kind) {
            Ok(record) => Ok(record),
            Err(TrendError::MissingHistory { build, reason }) => {
                tracing::debug!(build, %reason, "previous build history unavailable");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Summary against the immediately preceding build only.
    pub fn summarize(
        &self,
        start: Arc<BuildTestRecord>,
        trend: BuildResultTrend,
    ) -> Result<Option<RunSummary>> {
        let previous = self.previous_build_result(&start)?;
        Ok(summary::summarize(start.as_ref(), previous.as_deref(), trend))
    }

    pub fn failure_diff(&self, start: Arc<BuildTestRecord>) -> Result<String> {
        let previous = self.previous_result(Arc::clone(&start))?;
        Ok(summary::failure_diff(start.as_ref(), previous.as_deref()))
    }
}
