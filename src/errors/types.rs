//! # Error Types
//!
//! Error types for the routeplane compiler using `thiserror`.

use std::fmt;

/// Custom result type for routeplane operations
pub type Result<T> = std::result::Result<T, RouteplaneError>;

/// Main error type for the routeplane compiler
#[derive(thiserror::Error, Debug)]
pub enum RouteplaneError {
    /// The build context lacks the object a feature or build step requires
    #[error("Missing build context: no {what} present")]
    MissingContext { what: ContextKind },

    /// A credential reference could not be resolved
    #[error("Cannot resolve {role} secret for {owner}")]
    SecretResolution {
        owner: String,
        role: String,
        #[source]
        source: crate::secrets::SecretsError,
    },

    /// The gateway admin API answered with an unexpected status
    #[error("Admin API {operation} failed (status: {status}): {body}")]
    AdminApi { operation: String, status: u16, body: String },

    /// Network transport errors
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Which part of the build context was missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Route,
    Consumer,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKind::Route => write!(f, "route"),
            ContextKind::Consumer => write!(f, "consumer"),
        }
    }
}

impl RouteplaneError {
    /// No route in the build context
    pub fn no_route() -> Self {
        Self::MissingContext { what: ContextKind::Route }
    }

    /// No consumer in the build context
    pub fn no_consumer() -> Self {
        Self::MissingContext { what: ContextKind::Consumer }
    }

    /// Wrap a secrets failure with its owner and credential role
    pub fn secret<O: Into<String>, R: Into<String>>(
        owner: O,
        role: R,
        source: crate::secrets::SecretsError,
    ) -> Self {
        Self::SecretResolution { owner: owner.into(), role: role.into(), source }
    }

    /// Create an admin API error
    pub fn admin_api<O: Into<String>, B: Into<String>>(operation: O, status: u16, body: B) -> Self {
        Self::AdminApi { operation: operation.into(), status, body: body.into() }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport { message: message.into(), source: None }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// True for the "nothing to compile" sentinels
    pub fn is_missing_context(&self) -> bool {
        matches!(self, RouteplaneError::MissingContext { .. })
    }

    /// Check if this error should be retried by the caller's next pass
    pub fn is_retryable(&self) -> bool {
        match self {
            RouteplaneError::Transport { .. } => true,
            RouteplaneError::AdminApi { status, .. } => *status >= 500 || *status == 429,
            RouteplaneError::SecretResolution { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for RouteplaneError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for RouteplaneError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            context: "JSON serialization failed".to_string(),
            source: Box::new(error),
        }
    }
}

impl From<serde_yaml::Error> for RouteplaneError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Serialization { context: "YAML parsing failed".to_string(), source: Box::new(error) }
    }
}

impl From<reqwest::Error> for RouteplaneError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            message: format!("Admin API request failed: {}", error),
            source: Some(Box::new(error)),
        }
    }
}

impl From<::config::ConfigError> for RouteplaneError {
    fn from(error: ::config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for RouteplaneError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
