use std::time::Duration;

use chrono::{DateTime, Utc};
use closeout_core::{
    AggregatedReport, ConnectionUnavailable, ProjectQuery, RenderError, TimeWindow, WindowError,
};
use closeout_source::{fetch_all, ConnectionResolver};
use tracing::info;

use crate::aggregate::aggregate;
use crate::filter::filter;
use crate::render::{render, ReportFormat};

/// Validated inputs for one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// In report order.
    pub queries: Vec<ProjectQuery>,
    pub window_days: u32,
    pub fetch_timeout: Duration,
    pub format: ReportFormat,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub report: AggregatedReport,
    /// Rendered in the configured format.
    pub document: String,
    /// Providers passed over before the one that served the data.
    pub skipped: Vec<ConnectionUnavailable>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Resolve, collect, filter, aggregate and render.
///
/// The source is resolved once and shared by every project. Unreachable
/// sources and failed projects show up in the report instead of failing the
/// run; only a bad window or a report that breaks its own invariants does.
pub async fn run(
    config: &PipelineConfig,
    resolver: &ConnectionResolver,
    now: DateTime<Utc>,
) -> Result<PipelineOutput, PipelineError> {
    let window = TimeWindow::trailing(now, config.window_days)?;

    let resolution = resolver.resolve().await;
    let results = fetch_all(
        &config.queries,
        resolution.accessor.as_ref(),
        config.fetch_timeout,
    )
    .await;
    let results = filter(results, &window);
    let report = aggregate(results, &window).with_source(resolution.source_info());

    info!(
        projects = report.per_project.len(),
        total = report.total_count,
        source = %resolution.provider,
        "report aggregated"
    );

    let document = render(&report, config.format)?;
    Ok(PipelineOutput {
        report,
        document,
        skipped: resolution.skipped,
    })
}
