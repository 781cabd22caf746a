use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WindowError;

pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Closed interval `[start, end]` of resolution times that count as recent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// `[now - days, now]`.
    pub fn trailing(now: DateTime<Utc>, days: u32) -> Result<Self, WindowError> {
        if days == 0 {
            return Err(WindowError::ZeroDays);
        }
        let start = TimeDelta::try_days(i64::from(days))
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or(WindowError::OutOfRange(days))?;
        Ok(Self { start, end: now })
    }

    /// Inclusive at both ends.
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.start <= *ts && *ts <= self.end
    }

    /// Window length in (fractional) days.
    pub fn days(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 86_400.0
    }
}
