//! Loading history and settings for a command.

use std::sync::Arc;

use anyhow::Context;
use testtrend_core::config::WalkMode;
use testtrend_core::{
    BuildHistory, BuildTestRecord, EngineSettings, HistoryDir, HistoryProvider, ResultKind,
    TrendError,
};

use super::super::args::{HistoryArgs, KindArg};

/// A provider plus the build the walk starts from.
pub(crate) struct LoadedHistory {
    pub provider: Box<dyn HistoryProvider>,
    pub start: Arc<BuildTestRecord>,
}

impl From<KindArg> for ResultKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Junit => ResultKind::Junit,
            KindArg::Aggregated => ResultKind::Aggregated,
        }
    }
}

pub(crate) fn settings(args: &HistoryArgs) -> anyhow::Result<EngineSettings> {
    let mut settings = match &args.config {
        Some(path) => EngineSettings::load(path)
            .with_context(|| format!("failed to load settings: {}", path.display()))?,
        None => EngineSettings::default(),
    }
    .with_env_overrides();
    if let Some(n) = args.max_builds {
        settings.max_builds = Some(n);
    }
    if args.lazy {
        settings.walk = WalkMode::LoadedOnly;
    }
    Ok(settings)
}

pub(crate) fn load(args: &HistoryArgs) -> anyhow::Result<LoadedHistory> {
    let kind = ResultKind::from(args.kind);
    if let Some(path) = &args.history {
        let history = BuildHistory::load(path)
            .with_context(|| format!("failed to read history: {}", path.display()))?;
        let start = match args.build {
            Some(n) => history.record(n, kind).ok_or(TrendError::UnknownBuild(n))?,
            None => history
                .latest(kind)
                .with_context(|| format!("no {kind:?} result in {}", path.display()))?,
        };
        tracing::debug!(builds = history.len(), start = start.build_number, "loaded history");
        return Ok(LoadedHistory {
            provider: Box::new(history),
            start,
        });
    }

    let Some(dir) = &args.history_dir else {
        anyhow::bail!("one of --history or --history-dir is required");
    };
    let history = HistoryDir::open(dir)
        .with_context(|| format!("failed to open history directory: {}", dir.display()))?;
    let start = match args.build {
        Some(n) => match history.load_record(n, kind) {
            Ok(Some(record)) => record,
            Ok(None) | Err(TrendError::MissingHistory { .. }) => {
                return Err(TrendError::UnknownBuild(n).into())
            }
            Err(e) => return Err(e.into()),
        },
        None => history
            .latest(kind)?
            .with_context(|| format!("no {kind:?} result in {}", dir.display()))?,
    };
    Ok(LoadedHistory {
        provider: Box::new(history),
        start,
    })
}
