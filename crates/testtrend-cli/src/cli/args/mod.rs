use clap::{Parser, Subcommand};

pub mod common;
pub mod trend;
pub use common::*;
pub use trend::*;

#[derive(Parser)]
#[command(
    name = "testtrend",
    version,
    about = "Trend analytics over CI test history: build counts, lengthy tests and flaky tests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute one trend view from the history ending at a build
    Trend(TrendArgs),
    /// List the project levels a trend can be scoped to
    Projects(ProjectsArgs),
    /// Summarize a build's failures against the previous build
    Summary(SummaryArgs),
    /// Rank the tests that failed most often
    TopFailed(TopFailedArgs),
    Version,
}
