//! `closeout.yaml` loading and validation.
//!
//! File values are defaults; command-line flags override them. Everything the
//! pipeline receives has been checked here.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Args;
use closeout_core::{ProjectQuery, DEFAULT_LIMIT, DEFAULT_WINDOW_DAYS, STATUS_CLOSED};
use closeout_report::{PipelineConfig, ReportFormat};
use closeout_source::SourceSpec;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "closeout.yaml";
pub const DEFAULT_OUTPUT_STEM: &str = "reports/closed_issues_report";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Report order follows this list.
    pub projects: Vec<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub window_days: Option<u32>,
    pub fetch_timeout_secs: Option<u64>,
    pub output: Option<PathBuf>,
    pub format: Option<ReportFormat>,
    /// Priority order. Empty means the built-in defaults.
    pub sources: Vec<SourceSpec>,
}

/// Flags shared with the file config.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Project key to report on (repeatable; replaces the configured list)
    #[arg(short, long = "project")]
    pub projects: Vec<String>,
    /// Window length in days
    #[arg(long)]
    pub days: Option<u32>,
    /// Status code to query (6 = closed)
    #[arg(long)]
    pub status: Option<String>,
    /// Max issues fetched per project
    #[arg(long)]
    pub limit: Option<u32>,
    /// Report file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Report format: markdown or json
    #[arg(long)]
    pub format: Option<ReportFormat>,
    /// Per-project fetch timeout in seconds
    #[arg(long)]
    pub fetch_timeout: Option<u64>,
}

/// Validated run settings.
#[derive(Debug)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    pub output: PathBuf,
    pub sources: Vec<SourceSpec>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// An explicit path must exist; the default file is optional.
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load(path)
                } else {
                    debug!("no {DEFAULT_CONFIG_FILE}; using defaults and flags");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn source_specs(&self) -> Vec<SourceSpec> {
        if self.sources.is_empty() {
            SourceSpec::defaults()
        } else {
            self.sources.clone()
        }
    }

    pub fn fetch_timeout(&self, flag: Option<u64>) -> anyhow::Result<Duration> {
        let secs = flag
            .or(self.fetch_timeout_secs)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        if secs == 0 {
            bail!("fetch timeout must be at least 1 second");
        }
        Ok(Duration::from_secs(secs))
    }

    pub fn into_settings(self, flags: &Overrides) -> anyhow::Result<Settings> {
        let projects = if flags.projects.is_empty() {
            self.projects.clone()
        } else {
            flags.projects.clone()
        };
        let projects = validate_projects(projects)?;

        let status = flags
            .status
            .clone()
            .or_else(|| self.status.clone())
            .unwrap_or_else(|| STATUS_CLOSED.to_string());
        if status.trim().is_empty() {
            bail!("status must not be empty");
        }

        let limit = flags.limit.or(self.limit).unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            bail!("limit must be greater than 0");
        }
        let window_days = flags
            .days
            .or(self.window_days)
            .unwrap_or(DEFAULT_WINDOW_DAYS);
        if window_days == 0 {
            bail!("window must be at least 1 day");
        }
        let fetch_timeout = self.fetch_timeout(flags.fetch_timeout)?;
        let sources = self.source_specs();
        if sources
            .iter()
            .any(|s| matches!(s, SourceSpec::Synthetic { per_project: 0 }))
        {
            bail!("synthetic source per_project must be at least 1");
        }

        let format = flags.format.or(self.format).unwrap_or_default();
        let output = flags
            .output
            .clone()
            .or_else(|| self.output.clone())
            .unwrap_or_else(|| {
                PathBuf::from(format!("{DEFAULT_OUTPUT_STEM}.{}", format.extension()))
            });

        let queries = projects
            .into_iter()
            .map(|p| ProjectQuery::new(p, status.trim(), limit))
            .collect();

        Ok(Settings {
            pipeline: PipelineConfig {
                queries,
                window_days,
                fetch_timeout,
                format,
            },
            output,
            sources,
        })
    }
}

fn validate_projects(projects: Vec<String>) -> anyhow::Result<Vec<String>> {
    if projects.is_empty() {
        bail!("no projects configured: add `projects:` to {DEFAULT_CONFIG_FILE} or pass --project");
    }
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(projects.len());
    for p in projects {
        let key = p.trim().to_string();
        if key.is_empty() {
            bail!("project keys must not be empty");
        }
        if !seen.insert(key.clone()) {
            bail!("project '{key}' is listed more than once");
        }
        out.push(key);
    }
    Ok(out)
}
