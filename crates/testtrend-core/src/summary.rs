//! One-line build status summaries from fail counts.

use serde::{Deserialize, Serialize};

use crate::model::ResultSummary;

/// How a build's overall result moved relative to the previous build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildResultTrend {
    Success,
    Fixed,
    Failure,
    NowUnstable,
    Unstable,
    StillUnstable,
    StillFailing,
    Aborted,
    NotBuilt,
}

impl BuildResultTrend {
    /// Forced `worse` value for unstable trends; `None` lets the counts decide.
    fn worse_override(self) -> Option<Option<bool>> {
        match self {
            Self::NowUnstable => Some(Some(false)),
            Self::Unstable => Some(Some(true)),
            Self::StillUnstable => Some(None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub worse: bool,
    pub message: String,
}

fn tests_are(n: usize) -> &'static str {
    if n == 1 {
        "test is"
    } else {
        "tests are"
    }
}

/// Summarize `current` against the previous build's result, if any.
///
/// Only unstable trends produce a summary, and only when `current` has failures.
pub fn summarize<C, P>(
    current: &C,
    previous: Option<&P>,
    trend: BuildResultTrend,
) -> Option<RunSummary>
where
    C: ResultSummary + ?Sized,
    P: ResultSummary + ?Sized,
{
    let forced = trend.worse_override()?;
    let now = current.fail_count();
    if now == 0 {
        return None;
    }

    let (default_worse, message) = match previous.map(|p| p.fail_count()) {
        None if now == 1 => (true, "1 test failure".to_string()),
        None => (true, format!("{now} test failures")),
        Some(0) => (true, "tests started to fail".to_string()),
        Some(before) if before < now => (
            true,
            format!(
                "{} more {} failing (total {now})",
                now - before,
                tests_are(now - before)
            ),
        ),
        Some(before) if before > now => (
            false,
            format!(
                "{} less {} failing (total {now})",
                before - now,
                tests_are(before - now)
            ),
        ),
        Some(_) => (false, format!("{now} {} still failing", tests_are(now))),
    };

    Some(RunSummary {
        worse: forced.unwrap_or(default_worse),
        message,
    })
}

/// `" / +N"`, `" / -N"` or `" / ±0"` against the previous fail count; empty without one.
pub fn failure_diff<C, P>(current: &C, previous: Option<&P>) -> String
where
    C: ResultSummary + ?Sized,
    P: ResultSummary + ?Sized,
{
    let Some(previous) = previous else {
        return String::new();
    };
    let diff = current.fail_count() as i64 - previous.fail_count() as i64;
    match diff {
        0 => " / ±0".to_string(),
        d if d > 0 => format!(" / +{d}"),
        d => format!(" / {d}"),
    }
}
