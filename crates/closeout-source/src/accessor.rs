use async_trait::async_trait;
use closeout_core::{ConnectionUnavailable, FetchError, IssueRecord, ProjectQuery};

/// A resolved handle to the issue data source.
///
/// Shared by every project fetch of a run. Implementations may apply their own
/// transport timeouts; the fetcher applies a per-project one on top.
#[async_trait]
pub trait Accessor: Send + Sync {
    /// Label shown in logs and in the report header.
    fn name(&self) -> &str;

    /// True for placeholder data that did not come from a live source.
    fn is_synthetic(&self) -> bool {
        false
    }

    async fn fetch(&self, query: &ProjectQuery) -> Result<Vec<IssueRecord>, FetchError>;
}

/// One integration strategy. The resolver asks each in priority order.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Probe reachability and hand back an accessor, or say why not.
    async fn connect(&self) -> Result<Box<dyn Accessor>, ConnectionUnavailable>;
}
