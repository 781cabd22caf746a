use std::time::Duration;

use closeout_core::{FetchError, ProjectQuery, ProjectResult};
use tracing::{debug, warn};

use crate::accessor::Accessor;

/// Fetch every project through one accessor.
///
/// Projects are fetched one after another, in input order, and the output has
/// exactly one entry per query. A failed or timed-out project is recorded on
/// its own entry and does not stop the others.
pub async fn fetch_all(
    queries: &[ProjectQuery],
    accessor: &dyn Accessor,
    timeout: Duration,
) -> Vec<ProjectResult> {
    let mut results = Vec::with_capacity(queries.len());

    for query in queries {
        let outcome = match tokio::time::timeout(timeout, accessor.fetch(query)).await {
            Ok(r) => r,
            Err(_) => Err(FetchError::Timeout {
                secs: timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(issues) => {
                debug!(
                    project = %query.project_key,
                    count = issues.len(),
                    source = accessor.name(),
                    "fetched"
                );
                results.push(ProjectResult::fetched(&query.project_key, issues));
            }
            Err(e) => {
                warn!(project = %query.project_key, error = %e, "fetch failed");
                results.push(ProjectResult::failed(&query.project_key, &e));
            }
        }
    }

    results
}
