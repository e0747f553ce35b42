//! Application error types.

use std::fmt;

use crate::target::LoadError;
use crate::wms::WmsError;

/// Errors that can occur while bootstrapping the application.
#[derive(Debug)]
pub enum AppError {
    /// Configuration error.
    Config(String),

    /// Failed to create the HTTP tile target.
    TargetCreation(LoadError),

    /// The configured WMS layer is invalid.
    Layer(WmsError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::TargetCreation(e) => write!(f, "Failed to create tile target: {}", e),
            AppError::Layer(e) => write!(f, "Invalid WMS layer: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(_) => None,
            AppError::TargetCreation(e) => Some(e),
            AppError::Layer(e) => Some(e),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(e: LoadError) -> Self {
        AppError::TargetCreation(e)
    }
}

impl From<WmsError> for AppError {
    fn from(e: WmsError) -> Self {
        AppError::Layer(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config("max_concurrent must be > 0".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("max_concurrent"));
        assert!(err.source().is_none());
    }

    #[test]
    fn test_app_error_from_wms_error() {
        let app_err: AppError = WmsError::MissingHost("file:///tmp".to_string()).into();
        assert!(matches!(app_err, AppError::Layer(_)));
        assert!(app_err.source().is_some());
    }
}
