use thiserror::Error;

/// Application-specific error types.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// A required field was missing or empty. Raised before any network call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The platform answered, but with a failure (HTTP status or envelope code).
    #[error("{}", describe_api_error(.status_code, .platform_code, .message))]
    Api {
        /// HTTP status, when the failure was at the HTTP layer.
        status_code: Option<u16>,
        /// Platform `code` field of the response envelope.
        platform_code: Option<i64>,
        /// Platform `message` field, or the HTTP reason.
        message: String,
        /// Response body as received.
        raw_body: String,
    },

    /// Network-level failure (connect, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(String),

    /// An expected resource is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Intentional short-circuit in dry-run mode.
    #[error("DRY RUN")]
    DryRun,

    /// A platform response did not match the expected schema.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Local file system error (reports, CSV input).
    #[error("IO error: {0}")]
    Io(String),

    /// CSV read or write error.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Error with context chain for better debugging.
    #[error("{context}: {source}")]
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

fn describe_api_error(
    status_code: &Option<u16>,
    platform_code: &Option<i64>,
    message: &str,
) -> String {
    match (*status_code, *platform_code) {
        (_, Some(code)) => format!("API error (code {}): {}", code, message),
        (Some(status), None) => format!("API error (HTTP {}): {}", status, message),
        (None, None) => format!("API error: {}", message),
    }
}

impl AppError {
    /// Innermost error, with any context layers removed.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the error (or its root) is the dry-run short-circuit.
    pub fn is_dry_run(&self) -> bool {
        matches!(self.root(), AppError::DryRun)
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_prefers_platform_code() {
        let err = AppError::Api {
            status_code: Some(200),
            platform_code: Some(40002),
            message: "Invalid adgroup".to_string(),
            raw_body: "{}".to_string(),
        };
        assert_eq!(err.to_string(), "API error (code 40002): Invalid adgroup");
    }

    #[test]
    fn test_context_chain_keeps_root() {
        let result: Result<(), AppError> = Err(AppError::DryRun);
        let err = result.context("update smart creative").unwrap_err();

        assert_eq!(err.to_string(), "update smart creative: DRY RUN");
        assert!(err.is_dry_run());
    }
}
