//! Placeholder data for runs with no live source.
//!
//! Records are derived only from the anchor time and the project key, so two
//! accessors with the same anchor produce identical data.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use closeout_core::{ConnectionUnavailable, FetchError, IssueRecord, ProjectQuery};

use crate::accessor::{Accessor, ConnectionProvider};

pub const SYNTHETIC_NAME: &str = "synthetic";
pub const SYNTHETIC_PREFIX: &str = "[synthetic]";
pub const DEFAULT_PER_PROJECT: usize = 3;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    anchor: DateTime<Utc>,
    per_project: usize,
}

impl SyntheticProvider {
    /// `per_project` is at least 1, so every project shows labeled data.
    pub fn new(anchor: DateTime<Utc>, per_project: usize) -> Self {
        Self {
            anchor,
            per_project: per_project.max(1),
        }
    }

    pub fn with_per_project(mut self, per_project: usize) -> Self {
        self.per_project = per_project.max(1);
        self
    }

    /// Infallible counterpart of [`ConnectionProvider::connect`].
    pub fn accessor(&self) -> SyntheticAccessor {
        SyntheticAccessor {
            anchor: self.anchor,
            per_project: self.per_project,
        }
    }
}

#[async_trait]
impl ConnectionProvider for SyntheticProvider {
    fn name(&self) -> &str {
        SYNTHETIC_NAME
    }

    async fn connect(&self) -> Result<Box<dyn Accessor>, ConnectionUnavailable> {
        Ok(Box::new(self.accessor()))
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticAccessor {
    anchor: DateTime<Utc>,
    per_project: usize,
}

impl SyntheticAccessor {
    pub fn records_for(&self, query: &ProjectQuery) -> Vec<IssueRecord> {
        (1..=self.per_project)
            .take(query.limit as usize)
            .map(|i| {
                let resolved = TimeDelta::try_days(i as i64)
                    .and_then(|d| self.anchor.checked_sub_signed(d))
                    .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true));
                IssueRecord {
                    key: format!("{}-DEMO-{i:03}", query.project_key),
                    summary: format!(
                        "{SYNTHETIC_PREFIX} Placeholder closed issue {i} for {}",
                        query.project_key
                    ),
                    priority: "3".to_string(),
                    resolution_date: resolved,
                    project: query.project_key.clone(),
                }
            })
            .collect()
    }
}

#[async_trait]
impl Accessor for SyntheticAccessor {
    fn name(&self) -> &str {
        SYNTHETIC_NAME
    }

    fn is_synthetic(&self) -> bool {
        true
    }

    async fn fetch(&self, query: &ProjectQuery) -> Result<Vec<IssueRecord>, FetchError> {
        Ok(self.records_for(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn records_are_labeled_and_deterministic() {
        let provider = SyntheticProvider::new(anchor(), DEFAULT_PER_PROJECT);
        let accessor = provider.connect().await.unwrap();
        assert!(accessor.is_synthetic());

        let q = ProjectQuery::new("QEHS", "6", 50);
        let first = accessor.fetch(&q).await.unwrap();
        let second = accessor.fetch(&q).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].key, "QEHS-DEMO-001");
        assert!(first.iter().all(|r| r.summary.starts_with(SYNTHETIC_PREFIX)));
        assert_eq!(
            first[0].resolution_date.as_deref(),
            Some("2026-10-18T08:00:00Z")
        );
    }

    #[test]
    fn zero_per_project_still_yields_a_record() {
        let q = ProjectQuery::new("A", "6", 10);
        let accessor = SyntheticProvider::new(anchor(), 0).accessor();
        assert_eq!(accessor.records_for(&q).len(), 1);
        let accessor = SyntheticProvider::new(anchor(), 4)
            .with_per_project(0)
            .accessor();
        assert_eq!(accessor.records_for(&q)[0].key, "A-DEMO-001");
    }

    #[test]
    fn honours_limit() {
        let accessor = SyntheticProvider::new(anchor(), 5).accessor();
        let records = accessor.records_for(&ProjectQuery::new("A", "6", 2));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn resolution_dates_parse() {
        let accessor = SyntheticProvider::new(anchor(), 3).accessor();
        for r in accessor.records_for(&ProjectQuery::new("A", "6", 10)) {
            assert!(r.resolved_at().is_ok());
        }
    }
}
