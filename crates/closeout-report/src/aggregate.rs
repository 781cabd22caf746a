use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use closeout_core::{AggregatedReport, IssueRecord, ProjectResult, ProjectSummary, TimeWindow};

/// Group filtered results into report order.
///
/// Projects keep their input order. `generated_at` is the window end, so one
/// captured `now` drives both.
pub fn aggregate(results: Vec<ProjectResult>, window: &TimeWindow) -> AggregatedReport {
    let per_project: Vec<ProjectSummary> = results
        .into_iter()
        .map(|r| {
            let issues = sort_issues(r.issues);
            ProjectSummary {
                project_key: r.project_key,
                count: issues.len(),
                issues,
                fetch_error: r.fetch_error,
            }
        })
        .collect();
    let total_count = per_project.iter().map(|p| p.count).sum();

    AggregatedReport {
        generated_at: window.end,
        window: *window,
        per_project,
        total_count,
        source: None,
    }
}

/// Most recent first, ties by key ascending. Unparseable dates sort last.
fn sort_issues(issues: Vec<IssueRecord>) -> Vec<IssueRecord> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, IssueRecord)> = issues
        .into_iter()
        .map(|i| (i.resolved_at().ok(), i))
        .collect();
    keyed.sort_by(|(da, a), (db, b)| newest_first(da, db).then_with(|| a.key.cmp(&b.key)));
    keyed.into_iter().map(|(_, i)| i).collect()
}

fn newest_first(a: &Option<DateTime<Utc>>, b: &Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
