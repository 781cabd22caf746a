use std::io::Write;

use chrono::Utc;
use closeout_report::{pipeline, write_report};
use closeout_source::{BuildContext, ConnectionResolver};
use tracing::info;

use crate::config::Settings;

pub fn execute(settings: &Settings, to_stdout: bool) -> anyhow::Result<()> {
    let now = Utc::now();
    let ctx = BuildContext::new(now, settings.pipeline.fetch_timeout);
    let resolver = ConnectionResolver::from_specs(&settings.sources, &ctx);

    let out = crate::runtime()?.block_on(pipeline::run(&settings.pipeline, &resolver, now))?;

    if to_stdout {
        std::io::stdout().write_all(out.document.as_bytes())?;
        return Ok(());
    }

    write_report(&settings.output, &out.document)?;
    info!(path = %settings.output.display(), "report written");

    let unavailable = out
        .report
        .per_project
        .iter()
        .filter(|p| p.fetch_error.is_some())
        .count();
    println!(
        "Wrote {} ({} closed across {} projects)",
        settings.output.display(),
        out.report.total_count,
        out.report.per_project.len()
    );
    if unavailable > 0 {
        println!("  {unavailable} project(s) marked DATA UNAVAILABLE");
    }
    if out.report.is_synthetic() {
        println!("  no live source reachable: report contains synthetic placeholder data");
    }
    Ok(())
}
