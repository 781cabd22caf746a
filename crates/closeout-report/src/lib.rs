//! Filter, aggregate and render closed-issue reports, and the pipeline that
//! runs those stages after a source has been resolved.

pub mod aggregate;
pub mod artifact;
pub mod filter;
pub mod pipeline;
pub mod render;

pub use aggregate::aggregate;
pub use artifact::write_report;
pub use filter::filter;
pub use pipeline::{run, PipelineConfig, PipelineError, PipelineOutput};
pub use render::{render, render_json, render_markdown, ReportFormat};
