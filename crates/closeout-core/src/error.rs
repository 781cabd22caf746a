use crate::types::FetchErrorKind;

/// No live path to the data source could be used.
///
/// Raised by providers while probing and by accessors when the transport is gone.
/// The resolver absorbs it; the fetcher records it against a single project.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{provider} unavailable: {reason}")]
pub struct ConnectionUnavailable {
    pub provider: String,
    pub reason: String,
}

impl ConnectionUnavailable {
    pub fn new(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

/// A single project's fetch failed. Never aborts the batch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Unavailable(#[from] ConnectionUnavailable),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Unavailable(_) => FetchErrorKind::Unavailable,
            FetchError::Malformed(_) => FetchErrorKind::Malformed,
            FetchError::Timeout { .. } => FetchErrorKind::Timeout,
        }
    }
}

/// A record's resolution date is absent or unreadable. The record is dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("resolution date missing")]
    Missing,

    #[error("unparsable resolution date: {0:?}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("window length must be at least 1 day")]
    ZeroDays,

    #[error("window of {0} days reaches before the representable range")]
    OutOfRange(u32),
}

/// The aggregated report breaks its own invariants. Fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("project {project}: count {count} does not match {issues} listed issues")]
    CountMismatch {
        project: String,
        count: usize,
        issues: usize,
    },

    #[error("project {project}: fetch failed but {count} issues are reported")]
    UnavailableWithIssues { project: String, count: usize },

    #[error("total {total} does not match per-project sum {sum}")]
    TotalMismatch { total: usize, sum: usize },

    #[error("serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
