use std::path::PathBuf;

use clap::{ArgGroup, Args, ValueEnum};

#[derive(ValueEnum, Clone, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum KindArg {
    #[default]
    Junit,
    Aggregated,
}

/// Where the build history comes from and which build to start at.
#[derive(Args, Clone, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["history", "history_dir"])))]
pub struct HistoryArgs {
    /// JSON history document holding every build
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Directory of `<build>.json` records, read lazily
    #[arg(long)]
    pub history_dir: Option<PathBuf>,

    /// Build to start from (default: newest build with a result of --kind)
    #[arg(long)]
    pub build: Option<u32>,

    #[arg(long, value_enum, default_value_t)]
    pub kind: KindArg,

    /// Engine settings (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Most builds to visit; overrides config and TESTTREND_TEST_TREND_MAX
    #[arg(long)]
    pub max_builds: Option<usize>,

    /// Stop at the first build that is not loaded yet
    #[arg(long)]
    pub lazy: bool,
}

#[derive(Args, Clone, Debug)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Write to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}
