use closeout_core::{IssueRecord, ProjectResult, TimeWindow};
use tracing::debug;

/// Keep only issues resolved inside `window`.
///
/// Project order and fetch errors pass through untouched. Records without a
/// parseable resolution date are dropped here rather than failing the fetch.
/// Applying the same window twice gives the same result as applying it once.
pub fn filter(results: Vec<ProjectResult>, window: &TimeWindow) -> Vec<ProjectResult> {
    results
        .into_iter()
        .map(|mut result| {
            let project = result.project_key.clone();
            result
                .issues
                .retain(|issue| in_window(issue, window, &project));
            result
        })
        .collect()
}

fn in_window(issue: &IssueRecord, window: &TimeWindow, project: &str) -> bool {
    match issue.resolved_at() {
        Ok(ts) if window.contains(&ts) => true,
        Ok(ts) => {
            debug!(project, key = %issue.key, resolved = %ts, "outside window");
            false
        }
        Err(e) => {
            debug!(project, key = %issue.key, error = %e, "dropping record");
            false
        }
    }
}
