use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::parse_resolution_date;
use crate::error::{DateParseError, FetchError};
use crate::window::TimeWindow;

/// One configured project lookup. Built once per project, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectQuery {
    pub project_key: String,
    pub status_code: String,
    pub limit: u32,
}

impl ProjectQuery {
    pub fn new(project_key: impl Into<String>, status_code: impl Into<String>, limit: u32) -> Self {
        Self {
            project_key: project_key.into(),
            status_code: status_code.into(),
            limit,
        }
    }
}

/// A closed issue as returned by the data source.
///
/// `resolution_date` is kept as the raw string the source sent; it is parsed
/// (and possibly rejected) by the date filter, not at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub key: String,
    pub summary: String,
    pub priority: String,
    pub resolution_date: Option<String>,
    pub project: String,
}

impl IssueRecord {
    pub fn resolved_at(&self) -> Result<DateTime<Utc>, DateParseError> {
        match self.resolution_date.as_deref() {
            Some(raw) => parse_resolution_date(raw),
            None => Err(DateParseError::Missing),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    Unavailable,
    Malformed,
    Timeout,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Unavailable => "unavailable",
            FetchErrorKind::Malformed => "malformed",
            FetchErrorKind::Timeout => "timeout",
        }
    }
}

/// Serializable trace of a [`FetchError`], carried through to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl From<&FetchError> for FetchFailure {
    fn from(err: &FetchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of fetching one project. When `fetch_error` is set, `issues` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResult {
    pub project_key: String,
    pub issues: Vec<IssueRecord>,
    pub fetch_error: Option<FetchFailure>,
}

impl ProjectResult {
    pub fn fetched(project_key: impl Into<String>, issues: Vec<IssueRecord>) -> Self {
        Self {
            project_key: project_key.into(),
            issues,
            fetch_error: None,
        }
    }

    pub fn failed(project_key: impl Into<String>, err: &FetchError) -> Self {
        Self {
            project_key: project_key.into(),
            issues: Vec::new(),
            fetch_error: Some(FetchFailure::from(err)),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.fetch_error.is_some()
    }
}

/// Which provider the run's data came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub provider: String,
    pub synthetic: bool,
}

/// One project's line in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_key: String,
    pub count: usize,
    /// Most recently resolved first; ties by key ascending.
    pub issues: Vec<IssueRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<FetchFailure>,
}

/// Aggregated, ordered report data. Input to the renderers.
///
/// Invariant: `total_count == per_project.iter().map(|p| p.count).sum()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub generated_at: DateTime<Utc>,
    pub window: TimeWindow,
    pub per_project: Vec<ProjectSummary>,
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceInfo>,
}

impl AggregatedReport {
    pub fn with_source(mut self, source: SourceInfo) -> Self {
        self.source = Some(source);
        self
    }

    pub fn is_synthetic(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.synthetic)
    }

    /// Project with the highest count; the earliest one wins a tie. `None` when nothing closed.
    pub fn most_active(&self) -> Option<&ProjectSummary> {
        let mut best: Option<&ProjectSummary> = None;
        for p in &self.per_project {
            if p.count == 0 {
                continue;
            }
            if best.map_or(true, |b| p.count > b.count) {
                best = Some(p);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectionUnavailable;
    use chrono::TimeZone;

    fn issue(key: &str, date: Option<&str>) -> IssueRecord {
        IssueRecord {
            key: key.into(),
            summary: "s".into(),
            priority: "3".into(),
            resolution_date: date.map(|d| d.to_string()),
            project: "A".into(),
        }
    }

    fn summary(key: &str, count: usize) -> ProjectSummary {
        ProjectSummary {
            project_key: key.into(),
            count,
            issues: vec![],
            fetch_error: None,
        }
    }

    #[test]
    fn resolved_at_missing_and_malformed() {
        assert_eq!(issue("A-1", None).resolved_at(), Err(DateParseError::Missing));
        assert!(matches!(
            issue("A-1", Some("yesterday")).resolved_at(),
            Err(DateParseError::Malformed(_))
        ));
        assert_eq!(
            issue("A-1", Some("2026-10-18")).resolved_at().unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn failed_result_is_empty_and_flagged() {
        let err = FetchError::from(ConnectionUnavailable::new("registry", "gone"));
        let r = ProjectResult::failed("B", &err);
        assert!(r.issues.is_empty());
        assert!(r.is_unavailable());
        let failure = r.fetch_error.unwrap();
        assert_eq!(failure.kind, FetchErrorKind::Unavailable);
        assert!(failure.message.contains("gone"));
    }

    #[test]
    fn most_active_prefers_first_on_tie() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let report = AggregatedReport {
            generated_at: now,
            window: TimeWindow::trailing(now, 7).unwrap(),
            per_project: vec![summary("A", 0), summary("B", 2), summary("C", 2)],
            total_count: 4,
            source: None,
        };
        assert_eq!(report.most_active().unwrap().project_key, "B");
    }

    #[test]
    fn most_active_none_when_empty() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let report = AggregatedReport {
            generated_at: now,
            window: TimeWindow::trailing(now, 7).unwrap(),
            per_project: vec![summary("A", 0)],
            total_count: 0,
            source: None,
        };
        assert!(report.most_active().is_none());
        assert!(!report.is_synthetic());
    }

    #[test]
    fn fetch_error_kind_serializes_snake_case() {
        let v = serde_json::to_value(FetchErrorKind::Timeout).unwrap();
        assert_eq!(v, "timeout");
    }
}
