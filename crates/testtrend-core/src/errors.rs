use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendError {
    /// The walker found the record it just yielded attached to an earlier build.
    #[error("test result of build #{second} is also attached to build #{first}")]
    SharedRecord { first: u32, second: u32 },

    /// A provider returned a record whose stored number disagrees with the build it was read from.
    #[error("test result for build #{record} was found attached to build #{build}")]
    MisattachedRecord { build: u32, record: u32 },

    /// History for a build is not available. Recovered by the walker; never surfaced by an analysis.
    #[error("history for build #{build} is unavailable: {reason}")]
    MissingHistory { build: u32, reason: String },

    #[error("build #{0} has no test result")]
    UnknownBuild(u32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid history json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid settings yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TrendError {
    pub fn missing(build: u32, reason: impl Into<String>) -> Self {
        Self::MissingHistory {
            build,
            reason: reason.into(),
        }
    }

    /// Corrupted build/result associations. These abort a scan.
    pub fn is_data_consistency(&self) -> bool {
        matches!(
            self,
            Self::SharedRecord { .. } | Self::MisattachedRecord { .. }
        )
    }
}

pub type Result<T, E = TrendError> = std::result::Result<T, E>;
