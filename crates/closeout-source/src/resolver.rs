use closeout_core::{ConnectionUnavailable, SourceInfo};
use tracing::{debug, info, warn};

use crate::accessor::{Accessor, ConnectionProvider};
use crate::spec::{BuildContext, SourceSpec};
use crate::synthetic::SyntheticProvider;

/// The accessor a run will use, and how it was chosen.
pub struct Resolution {
    pub accessor: Box<dyn Accessor>,
    /// Provider that produced the accessor.
    pub provider: String,
    pub synthetic: bool,
    /// Providers tried before this one, in order, with the reason each was skipped.
    pub skipped: Vec<ConnectionUnavailable>,
}

impl Resolution {
    pub fn source_info(&self) -> SourceInfo {
        SourceInfo {
            provider: self.accessor.name().to_string(),
            synthetic: self.synthetic,
        }
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("accessor", &self.accessor.name())
            .field("provider", &self.provider)
            .field("synthetic", &self.synthetic)
            .field("skipped", &self.skipped)
            .finish()
    }
}

/// Picks the first reachable provider in priority order.
///
/// The synthetic provider always closes the chain, so [`resolve`](Self::resolve)
/// cannot fail: an unreachable data source resolves to placeholder data.
pub struct ConnectionResolver {
    live: Vec<Box<dyn ConnectionProvider>>,
    fallback: SyntheticProvider,
}

impl ConnectionResolver {
    pub fn new(live: Vec<Box<dyn ConnectionProvider>>, fallback: SyntheticProvider) -> Self {
        Self { live, fallback }
    }

    /// Build the chain from configuration. A `synthetic` entry ends the live
    /// list; entries after it are never reached and are dropped with a warning.
    pub fn from_specs(specs: &[SourceSpec], ctx: &BuildContext) -> Self {
        let mut live = Vec::new();
        let mut fallback = ctx.synthetic();
        for (i, spec) in specs.iter().enumerate() {
            if let SourceSpec::Synthetic { per_project } = spec {
                fallback = fallback.with_per_project(*per_project);
                if i + 1 < specs.len() {
                    warn!(
                        ignored = specs.len() - i - 1,
                        "sources listed after `synthetic` are never tried"
                    );
                }
                break;
            }
            if let Some(provider) = spec.build(ctx) {
                live.push(provider);
            }
        }
        Self::new(live, fallback)
    }

    /// Provider names in the order they are tried.
    pub fn chain(&self) -> Vec<&str> {
        self.providers().map(|p| p.name()).collect()
    }

    fn providers(&self) -> impl Iterator<Item = &dyn ConnectionProvider> {
        self.live
            .iter()
            .map(|p| p.as_ref())
            .chain(std::iter::once(&self.fallback as &dyn ConnectionProvider))
    }

    pub async fn resolve(&self) -> Resolution {
        let mut skipped = Vec::new();

        for provider in self.providers() {
            debug!(provider = provider.name(), "trying provider");
            match provider.connect().await {
                Ok(accessor) => {
                    let synthetic = accessor.is_synthetic();
                    if synthetic {
                        warn!(
                            tried = skipped.len(),
                            "no live issue source reachable; reporting placeholder data"
                        );
                    } else {
                        info!(accessor = accessor.name(), "issue source resolved");
                    }
                    return Resolution {
                        accessor,
                        provider: provider.name().to_string(),
                        synthetic,
                        skipped,
                    };
                }
                Err(e) => {
                    warn!(provider = provider.name(), reason = %e.reason, "provider unavailable");
                    skipped.push(e);
                }
            }
        }

        // The synthetic provider never refuses a connection.
        Resolution {
            accessor: Box::new(self.fallback.accessor()),
            provider: self.fallback.name().to_string(),
            synthetic: true,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use closeout_core::{FetchError, IssueRecord, ProjectQuery};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct Down(&'static str);

    #[async_trait]
    impl ConnectionProvider for Down {
        fn name(&self) -> &str {
            self.0
        }
        async fn connect(&self) -> Result<Box<dyn Accessor>, ConnectionUnavailable> {
            Err(ConnectionUnavailable::new(self.0, "refused"))
        }
    }

    struct Up {
        name: &'static str,
        connects: Arc<AtomicUsize>,
    }

    struct Live(&'static str);

    #[async_trait]
    impl Accessor for Live {
        fn name(&self) -> &str {
            self.0
        }
        async fn fetch(&self, _query: &ProjectQuery) -> Result<Vec<IssueRecord>, FetchError> {
            Ok(vec![])
        }
    }

    #[async_trait]
    impl ConnectionProvider for Up {
        fn name(&self) -> &str {
            self.name
        }
        async fn connect(&self) -> Result<Box<dyn Accessor>, ConnectionUnavailable> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Live(self.name)))
        }
    }

    fn fallback() -> SyntheticProvider {
        SyntheticProvider::new(Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap(), 3)
    }

    #[tokio::test]
    async fn first_reachable_wins() {
        let second = Arc::new(AtomicUsize::new(0));
        let third = Arc::new(AtomicUsize::new(0));
        let resolver = ConnectionResolver::new(
            vec![
                Box::new(Down("registry")),
                Box::new(Up {
                    name: "command",
                    connects: second.clone(),
                }),
                Box::new(Up {
                    name: "http",
                    connects: third.clone(),
                }),
            ],
            fallback(),
        );

        let res = resolver.resolve().await;
        assert_eq!(res.provider, "command");
        assert!(!res.synthetic);
        assert_eq!(res.skipped.len(), 1);
        assert_eq!(res.skipped[0].provider, "registry");
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(third.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_down_falls_back_to_synthetic() {
        let resolver = ConnectionResolver::new(
            vec![Box::new(Down("registry")), Box::new(Down("http"))],
            fallback(),
        );
        let res = resolver.resolve().await;
        assert!(res.synthetic);
        assert_eq!(res.provider, "synthetic");
        assert_eq!(res.skipped.len(), 2);
        assert!(res.source_info().synthetic);

        let records = res
            .accessor
            .fetch(&ProjectQuery::new("A", "6", 10))
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn empty_chain_is_synthetic() {
        let resolver = ConnectionResolver::new(vec![], fallback());
        assert_eq!(resolver.chain(), vec!["synthetic"]);
        let res = resolver.resolve().await;
        assert!(res.synthetic);
        assert!(res.skipped.is_empty());
    }

    #[tokio::test]
    async fn from_specs_stops_at_synthetic() {
        let ctx = BuildContext::new(
            Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap(),
            Duration::from_secs(2),
        );
        let specs = vec![
            SourceSpec::defaults().remove(0),
            SourceSpec::Synthetic { per_project: 1 },
            SourceSpec::Http {
                base_url: "http://127.0.0.1:9".into(),
                health_path: "/health".into(),
                issues_path: "/issues".into(),
                headers: Default::default(),
            },
        ];
        let resolver = ConnectionResolver::from_specs(&specs, &ctx);
        assert_eq!(resolver.chain(), vec!["registry", "synthetic"]);

        let res = resolver.resolve().await;
        assert!(res.synthetic);
        let records = res
            .accessor
            .fetch(&ProjectQuery::new("A", "6", 10))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn zero_per_project_fallback_still_labels_every_project() {
        let ctx = BuildContext::new(Utc::now(), Duration::from_secs(2));
        let resolver =
            ConnectionResolver::from_specs(&[SourceSpec::Synthetic { per_project: 0 }], &ctx);
        let res = resolver.resolve().await;
        assert!(res.synthetic);
        let records = res
            .accessor
            .fetch(&ProjectQuery::new("A", "6", 10))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn from_specs_uses_registered_tool() {
        let mut registry = crate::ToolRegistry::new();
        registry.register("list_jira_issues", |_, _, _| Ok(serde_json::json!([])));
        let ctx = BuildContext::new(Utc::now(), Duration::from_secs(2)).with_registry(registry);
        let resolver = ConnectionResolver::from_specs(&SourceSpec::defaults(), &ctx);
        let res = resolver.resolve().await;
        assert!(!res.synthetic);
        assert_eq!(res.accessor.name(), "registry:list_jira_issues");
    }
}
