use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

/// Write the report document, replacing any previous one atomically.
///
/// The text goes to a temp file next to `path` and is renamed into place, so a
/// reader never sees a half-written report.
pub fn write_report(path: &Path, text: &str) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("create report directory {}", parent.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(text.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("write report {}", path.display()))?;
    Ok(())
}
