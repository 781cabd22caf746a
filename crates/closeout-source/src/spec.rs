use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accessor::ConnectionProvider;
use crate::command::CommandProvider;
use crate::http::HttpProvider;
use crate::registry::{RegistryProvider, ToolRegistry, DEFAULT_TOOL_NAMES};
use crate::synthetic::{SyntheticProvider, DEFAULT_PER_PROJECT};

/// One entry of the `sources:` list, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    Registry {
        #[serde(default = "default_functions")]
        functions: Vec<String>,
    },
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        probe_args: Vec<String>,
    },
    Http {
        base_url: String,
        #[serde(default = "default_health_path")]
        health_path: String,
        #[serde(default = "default_issues_path")]
        issues_path: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
    Synthetic {
        #[serde(default = "default_per_project")]
        per_project: usize,
    },
}

fn default_functions() -> Vec<String> {
    DEFAULT_TOOL_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_issues_path() -> String {
    "/issues".to_string()
}

fn default_per_project() -> usize {
    DEFAULT_PER_PROJECT
}

impl SourceSpec {
    pub fn type_name(&self) -> &'static str {
        match self {
            SourceSpec::Registry { .. } => "registry",
            SourceSpec::Command { .. } => "command",
            SourceSpec::Http { .. } => "http",
            SourceSpec::Synthetic { .. } => "synthetic",
        }
    }

    /// Used when the configuration lists no sources: the in-process registry,
    /// then placeholders.
    pub fn defaults() -> Vec<SourceSpec> {
        vec![SourceSpec::Registry {
            functions: default_functions(),
        }]
    }

    /// Build the live provider for this spec. `None` for `synthetic`, which
    /// the resolver holds separately as its last resort.
    pub fn build(&self, ctx: &BuildContext) -> Option<Box<dyn ConnectionProvider>> {
        match self {
            SourceSpec::Registry { functions } => Some(Box::new(RegistryProvider::new(
                ctx.registry.clone(),
                functions.clone(),
            ))),
            SourceSpec::Command {
                program,
                args,
                probe_args,
            } => Some(Box::new(CommandProvider::new(
                program.clone(),
                args.clone(),
                probe_args.clone(),
                ctx.timeout,
            ))),
            SourceSpec::Http {
                base_url,
                health_path,
                issues_path,
                headers,
            } => Some(Box::new(HttpProvider::new(
                base_url.clone(),
                health_path.clone(),
                issues_path.clone(),
                headers.clone(),
                ctx.timeout,
            ))),
            SourceSpec::Synthetic { .. } => None,
        }
    }
}

/// Inputs every provider may need, fixed once per run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub registry: ToolRegistry,
    /// The run's `now`; anchors synthetic data.
    pub anchor: DateTime<Utc>,
    /// Transport timeout handed to network and process providers.
    pub timeout: Duration,
}

impl BuildContext {
    pub fn new(anchor: DateTime<Utc>, timeout: Duration) -> Self {
        Self {
            registry: ToolRegistry::new(),
            anchor,
            timeout,
        }
    }

    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn synthetic(&self) -> SyntheticProvider {
        SyntheticProvider::new(self.anchor, DEFAULT_PER_PROJECT)
    }
}
