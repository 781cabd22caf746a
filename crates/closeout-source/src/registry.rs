//! In-process tool registry.
//!
//! A host embedding closeout (an agent runtime, a test harness) registers a
//! callable under one or more well-known names. The registry provider looks
//! those names up in order; nothing is discovered by reflection.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use closeout_core::{ConnectionUnavailable, FetchError, IssueRecord, ProjectQuery};
use tracing::debug;

use crate::accessor::{Accessor, ConnectionProvider};
use crate::decode::decode_issues;

/// `(project, status, limit) -> issue payload`.
///
/// Tools may block; each call runs on the blocking pool so the per-project
/// timeout still applies.
pub type IssueListFn = dyn Fn(&str, &str, u32) -> anyhow::Result<serde_json::Value> + Send + Sync;

/// Names tried when the configuration does not list any.
pub const DEFAULT_TOOL_NAMES: [&str; 2] = ["list_jira_issues", "jira.list_issues"];

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<IssueListFn>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, tool: F)
    where
        F: Fn(&str, &str, u32) -> anyhow::Result<serde_json::Value> + Send + Sync + 'static,
    {
        self.tools.insert(name.into(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<IssueListFn>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ── Provider ──

pub struct RegistryProvider {
    registry: ToolRegistry,
    candidates: Vec<String>,
}

impl RegistryProvider {
    pub fn new(registry: ToolRegistry, candidates: Vec<String>) -> Self {
        Self {
            registry,
            candidates,
        }
    }
}

#[async_trait]
impl ConnectionProvider for RegistryProvider {
    fn name(&self) -> &str {
        "registry"
    }

    async fn connect(&self) -> Result<Box<dyn Accessor>, ConnectionUnavailable> {
        for name in &self.candidates {
            if let Some(tool) = self.registry.get(name) {
                debug!(tool = %name, "registry tool found");
                return Ok(Box::new(RegistryAccessor {
                    label: format!("registry:{name}"),
                    tool,
                }));
            }
        }
        let registered = if self.registry.is_empty() {
            "no tools registered".to_string()
        } else {
            format!(
                "registered: {}",
                self.registry.names().collect::<Vec<_>>().join(", ")
            )
        };
        Err(ConnectionUnavailable::new(
            "registry",
            format!(
                "none of [{}] is registered ({registered})",
                self.candidates.join(", ")
            ),
        ))
    }
}

// ── Accessor ──

pub struct RegistryAccessor {
    label: String,
    tool: Arc<IssueListFn>,
}

#[async_trait]
impl Accessor for RegistryAccessor {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, query: &ProjectQuery) -> Result<Vec<IssueRecord>, FetchError> {
        let tool = Arc::clone(&self.tool);
        let (project, status, limit) = (
            query.project_key.clone(),
            query.status_code.clone(),
            query.limit,
        );
        let payload = tokio::task::spawn_blocking(move || tool(&project, &status, limit))
            .await
            .map_err(|e| {
                ConnectionUnavailable::new(self.label.as_str(), format!("tool task failed: {e}"))
            })?
            .map_err(|e| ConnectionUnavailable::new(self.label.as_str(), format!("{e:#}")))?;
        decode_issues(payload, query, &self.label)
    }
}
