use chrono::Utc;
use closeout_source::{BuildContext, ConnectionResolver};
use serde_json::json;

use crate::config::FileConfig;

pub fn execute(file: &FileConfig, as_json: bool) -> anyhow::Result<()> {
    let ctx = BuildContext::new(Utc::now(), file.fetch_timeout(None)?);
    let resolver = ConnectionResolver::from_specs(&file.source_specs(), &ctx);
    let chain: Vec<String> = resolver.chain().into_iter().map(String::from).collect();

    let resolution = crate::runtime()?.block_on(resolver.resolve());

    if as_json {
        let skipped: Vec<_> = resolution
            .skipped
            .iter()
            .map(|s| json!({ "provider": s.provider, "reason": s.reason }))
            .collect();
        let out = json!({
            "chain": chain,
            "selected": resolution.provider,
            "accessor": resolution.accessor.name(),
            "synthetic": resolution.synthetic,
            "skipped": skipped,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Priority order: {}", chain.join(" -> "));
    for s in &resolution.skipped {
        println!("  {:<10} skipped: {}", s.provider, s.reason);
    }
    if resolution.synthetic {
        println!(
            "  {:<10} selected (placeholder data, no live source reachable)",
            resolution.provider
        );
    } else {
        println!(
            "  {:<10} selected via {}",
            resolution.provider,
            resolution.accessor.name()
        );
    }
    Ok(())
}
