use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A daemon command that ran to completion but exited non-zero.
///
/// `message` is the trimmed combined stdout+stderr of the process; it is the
/// only diagnostic the daemon gives us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub message: String,
    pub exit_code: Option<i32>,
}

impl CommandError {
    pub fn new(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            return f.write_str(&self.message);
        }
        match self.exit_code {
            Some(code) => write!(f, "command exited with status {}", code),
            None => f.write_str("command terminated by signal"),
        }
    }
}

impl std::error::Error for CommandError {}

#[derive(Error, Debug)]
pub enum TwintailError {
    #[error("Failed to run `{command}`: {source}")]
    Execution {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse serve status: {0}")]
    Parse(#[source] serde_json::Error),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Endpoint {removed_destination} was removed but the new destination could not be added: {source}")]
    PartialUpdate {
        removed_destination: String,
        #[source]
        source: CommandError,
    },

    #[error("tailscale is not installed or could not be recognized")]
    NotInstalled,

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl TwintailError {
    pub fn is_not_installed(&self) -> bool {
        matches!(self, TwintailError::NotInstalled)
    }

    /// Whether an update left the service with neither destination installed.
    pub fn is_partial_update(&self) -> bool {
        matches!(self, TwintailError::PartialUpdate { .. })
    }

    /// The daemon's own failure report, for both plain and partial failures.
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            TwintailError::Command(err) => Some(err),
            TwintailError::PartialUpdate { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn to_error_code(&self) -> &'static str {
        match self {
            TwintailError::Execution { .. } => "EXECUTION_ERROR",
            TwintailError::Parse(_) => "PARSE_ERROR",
            TwintailError::Command(_) => "COMMAND_FAILED",
            TwintailError::PartialUpdate { .. } => "PARTIAL_UPDATE",
            TwintailError::NotInstalled => "NOT_INSTALLED",
            TwintailError::ServiceNotFound(_) => "SERVICE_NOT_FOUND",
            TwintailError::InvalidInput(_) => "INVALID_INPUT",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.to_error_code().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TwintailError>;
