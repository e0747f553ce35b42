//! Error types for throttled tile loads.

use std::time::Duration;

use thiserror::Error;

use crate::target::LoadError;

/// Terminal failure of a throttled request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThrottleError {
    /// The load was active for longer than the tile timeout.
    #[error("Tile load timed out after {}ms: {url}", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    /// The target reported a failure before the timeout.
    #[error("Tile load failed: {0}")]
    Load(#[from] LoadError),

    /// The request's execution ended without reporting a result.
    ///
    /// Happens when the target panics or the runtime shuts down.
    #[error("Tile load abandoned: {url}")]
    Abandoned { url: String },
}

impl ThrottleError {
    /// Check if this is a timeout (as opposed to a load failure).
    pub fn is_timeout(&self) -> bool {
        matches!(self, ThrottleError::Timeout { .. })
    }
}
