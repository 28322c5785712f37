use clap::{Args, ValueEnum};

use super::{HistoryArgs, OutputArgs};

#[derive(Args, Clone, Debug)]
pub struct TrendArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    /// Package prefix to scope the view to
    #[arg(long)]
    pub project_level: Option<String>,

    /// BuildAnalysis, LengthyTests or FlakyTests; anything else means BuildAnalysis
    #[arg(long)]
    pub trend_type: Option<String>,

    /// mean, max, prev or threshold
    #[arg(long)]
    pub metric: Option<String>,

    /// fail or flap
    #[arg(long)]
    pub order_by: Option<String>,

    /// "true" keeps only the failed series
    #[arg(long)]
    pub failure_only: Option<String>,

    /// Query options as NAME=VALUE (projectLevel, trendType, metricName, orderBy, failureOnly).
    /// Ignored when any of the dedicated flags is given.
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Clone, Debug)]
pub struct ProjectsArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum ResultTrendArg {
    Success,
    Fixed,
    Failure,
    NowUnstable,
    Unstable,
    #[default]
    StillUnstable,
    StillFailing,
    Aborted,
    NotBuilt,
}

#[derive(Args, Clone, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    /// How the build's overall result moved against the previous build
    #[arg(long, value_enum, default_value_t)]
    pub result_trend: ResultTrendArg,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Clone, Debug)]
pub struct TopFailedArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    #[arg(long)]
    pub project_level: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}
