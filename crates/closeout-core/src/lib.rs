pub mod dates;
pub mod error;
pub mod types;
pub mod window;

pub use error::*;
pub use types::*;
pub use window::{TimeWindow, DEFAULT_WINDOW_DAYS};

/// Status code the data source uses for closed issues.
pub const STATUS_CLOSED: &str = "6";

/// Default per-project result cap.
pub const DEFAULT_LIMIT: u32 = 50;
