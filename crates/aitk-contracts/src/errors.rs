use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    Timeout,
    Resolution,
    Connection,
}

impl NetworkFailure {
    pub fn category(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Resolution => "resolution failure",
            Self::Connection => "network",
        }
    }
}

/// Failure of a single tool invocation.
///
/// Every variant is terminal: callers report it once and never retry.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{} error: {message}", failure.category())]
    Network {
        failure: NetworkFailure,
        message: String,
    },

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("{service} request failed: {message}")]
    Api { service: String, message: String },

    #[error("failed writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn api(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn network(failure: NetworkFailure, message: impl Into<String>) -> Self {
        Self::Network {
            failure,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::Network { failure, .. } => failure.category(),
            Self::Navigation(_) => "navigation",
            Self::Api { .. } => "api",
            Self::Io { .. } => "io",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// One-line message for terminal and HTTP output.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network {
                failure: NetworkFailure::Timeout,
                ..
            } => "Website took too long to load. Please check the URL and try again.".to_string(),
            Self::Network {
                failure: NetworkFailure::Resolution,
                ..
            } => "Could not resolve the website address. Please check the URL.".to_string(),
            Self::Network {
                failure: NetworkFailure::Connection,
                message,
            } => format!("Network error: {message}"),
            Self::Configuration(message) | Self::Validation(message) => message.clone(),
            Self::Navigation(message) => format!("Could not load the website: {message}"),
            Self::Api { service, message } => format!("{service} error: {message}"),
            Self::Io { path, source } => {
                format!("Could not write {}: {source}", path.display())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{NetworkFailure, ToolError};

    #[test]
    fn network_failures_have_distinct_categories() {
        let timeout = ToolError::network(NetworkFailure::Timeout, "deadline elapsed");
        let dns = ToolError::network(NetworkFailure::Resolution, "net::ERR_NAME_NOT_RESOLVED");
        assert_eq!(timeout.category(), "timeout");
        assert_eq!(dns.category(), "resolution failure");
        assert_ne!(timeout.user_message(), dns.user_message());
        assert!(!timeout.user_message().contains("deadline elapsed"));
    }

    #[test]
    fn user_message_keeps_validation_text_verbatim() {
        let err = ToolError::validation("Search query cannot be empty");
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "Search query cannot be empty");
    }

    #[test]
    fn io_error_mentions_path() {
        let err = ToolError::io(
            "/tmp/out/images",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.category(), "io");
        assert!(err.user_message().contains("/tmp/out/images"));
    }
}
