//! Forecast time steps for the WMS `TIME` dimension.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use super::WmsError;

/// One frame of a forecast animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeStep(DateTime<Utc>);

impl TimeStep {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self(time)
    }

    /// Parses an RFC 3339 timestamp, normalising it to UTC.
    pub fn parse(value: &str) -> Result<Self, WmsError> {
        DateTime::parse_from_rfc3339(value.trim())
            .map(|time| Self(time.with_timezone(&Utc)))
            .map_err(|e| WmsError::InvalidTime {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.0
    }

    /// ISO 8601 UTC form used in `TIME` parameters.
    pub fn to_wms_string(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Compact form safe for use as a directory name.
    pub fn label(&self) -> String {
        self.0.format("%Y%m%dT%H%MZ").to_string()
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wms_string())
    }
}

/// Builds `count` evenly spaced time steps starting at `start`.
///
/// Fails if a step would fall outside the representable date range.
pub fn timeline(
    start: TimeStep,
    step: Duration,
    count: usize,
) -> Result<Vec<TimeStep>, WmsError> {
    let mut steps = Vec::with_capacity(count);
    let mut time = start.0;
    for index in 0..count {
        if index > 0 {
            time = time
                .checked_add_signed(step)
                .ok_or_else(|| WmsError::InvalidTime {
                    value: TimeStep(time).to_wms_string(),
                    reason: format!("adding a step of {}s overflows", step.num_seconds()),
                })?;
        }
        steps.push(TimeStep(time));
    }
    Ok(steps)
}
