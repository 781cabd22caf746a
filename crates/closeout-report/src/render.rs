//! Report renderers.
//!
//! Both renderers are pure: the same [`AggregatedReport`] always gives the
//! same bytes. The only timestamp in the output is the report's own
//! `generated_at`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use closeout_core::{AggregatedReport, IssueRecord, ProjectSummary, RenderError};
use serde::{Deserialize, Serialize};

pub const REPORT_TITLE: &str = "Weekly Closed Issues Report";
pub const UNAVAILABLE_MARKER: &str = "DATA UNAVAILABLE";
pub const SYNTHETIC_MARKER: &str = "SYNTHETIC PLACEHOLDER DATA";
pub const EMPTY_PROJECT: &str = "_No issues closed in this window._";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Markdown => f.write_str("markdown"),
            ReportFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{other}' (expected markdown or json)")),
        }
    }
}

pub fn render(report: &AggregatedReport, format: ReportFormat) -> Result<String, RenderError> {
    match format {
        ReportFormat::Markdown => render_markdown(report),
        ReportFormat::Json => render_json(report),
    }
}

/// Refuse reports whose counts disagree with their contents.
fn validate(report: &AggregatedReport) -> Result<(), RenderError> {
    for p in &report.per_project {
        if p.count != p.issues.len() {
            return Err(RenderError::CountMismatch {
                project: p.project_key.clone(),
                count: p.count,
                issues: p.issues.len(),
            });
        }
        if p.fetch_error.is_some() && p.count > 0 {
            return Err(RenderError::UnavailableWithIssues {
                project: p.project_key.clone(),
                count: p.count,
            });
        }
    }
    let sum: usize = report.per_project.iter().map(|p| p.count).sum();
    if sum != report.total_count {
        return Err(RenderError::TotalMismatch {
            total: report.total_count,
            sum,
        });
    }
    Ok(())
}

// ── JSON ──

pub fn render_json(report: &AggregatedReport) -> Result<String, RenderError> {
    validate(report)?;
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

// ── Markdown ──

pub fn render_markdown(report: &AggregatedReport) -> Result<String, RenderError> {
    validate(report)?;

    let mut out = String::new();
    write_header(&mut out, report);
    write_executive_summary(&mut out, report);
    write_project_details(&mut out, report);
    write_statistics(&mut out, report);
    Ok(out)
}

fn write_header(out: &mut String, report: &AggregatedReport) {
    out.push_str(&format!("# {REPORT_TITLE}\n\n"));
    out.push_str(&format!(
        "**Report period:** {} to {}  \n",
        fmt_ts(&report.window.start),
        fmt_ts(&report.window.end)
    ));
    out.push_str(&format!(
        "**Generated:** {}  \n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    match &report.source {
        Some(src) if src.synthetic => {
            out.push_str(&format!(
                "**Data source:** {} ({SYNTHETIC_MARKER})\n\n",
                src.provider
            ));
            out.push_str(&format!(
                "> **{SYNTHETIC_MARKER}:** no live issue source was reachable. \
                 Every issue below is generated and does not reflect real work.\n"
            ));
        }
        Some(src) => out.push_str(&format!("**Data source:** {}\n", src.provider)),
        None => {}
    }
    out.push('\n');
}

fn write_executive_summary(out: &mut String, report: &AggregatedReport) {
    out.push_str("## Executive Summary\n\n");
    out.push_str(&format!(
        "- **Total issues closed:** {}\n",
        report.total_count
    ));
    for p in &report.per_project {
        if p.fetch_error.is_some() {
            out.push_str(&format!(
                "- **{}:** {} ({UNAVAILABLE_MARKER})\n",
                cell(&p.project_key),
                p.count
            ));
        } else {
            out.push_str(&format!("- **{}:** {}\n", cell(&p.project_key), p.count));
        }
    }
    out.push('\n');
}

fn write_project_details(out: &mut String, report: &AggregatedReport) {
    out.push_str("## Project Details\n");
    for p in &report.per_project {
        out.push('\n');
        write_project(out, p);
    }
    out.push('\n');
}

fn write_project(out: &mut String, p: &ProjectSummary) {
    out.push_str(&format!("### {} ({})\n\n", cell(&p.project_key), p.count));

    if let Some(failure) = &p.fetch_error {
        out.push_str(&format!(
            "**{UNAVAILABLE_MARKER}** ({}): {}\n",
            failure.kind.as_str(),
            cell(&failure.message)
        ));
        return;
    }
    if p.issues.is_empty() {
        out.push_str(EMPTY_PROJECT);
        out.push('\n');
        return;
    }

    out.push_str("| Key | Summary | Priority | Resolved |\n");
    out.push_str("|-----|---------|----------|----------|\n");
    for issue in &p.issues {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(&issue.key),
            cell(&issue.summary),
            cell(&issue.priority),
            resolved_cell(issue)
        ));
    }
}

fn write_statistics(out: &mut String, report: &AggregatedReport) {
    let days = report.window.days();
    let per_day = if days > 0.0 {
        report.total_count as f64 / days
    } else {
        0.0
    };

    out.push_str("## Summary Statistics\n\n");
    out.push_str(&format!("- **Total closed:** {}\n", report.total_count));
    out.push_str(&format!("- **Average per day:** {per_day:.2}\n"));
    match report.most_active() {
        Some(p) => out.push_str(&format!(
            "- **Most active project:** {} ({})\n",
            cell(&p.project_key),
            p.count
        )),
        None => out.push_str("- **Most active project:** none\n"),
    }
}

fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn resolved_cell(issue: &IssueRecord) -> String {
    match issue.resolved_at() {
        Ok(ts) => fmt_ts(&ts),
        Err(_) => cell(issue.resolution_date.as_deref().unwrap_or("")),
    }
}

/// Make a value safe inside a markdown table cell or heading.
fn cell(raw: &str) -> String {
    raw.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\\', "\\\\")
        .replace('|', "\\|")
}
