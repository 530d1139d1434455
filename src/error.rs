//! Error handling for handle-sniper

use thiserror::Error;

/// Main error type for handle-sniper
#[derive(Error, Debug, Clone)]
pub enum SniperError {
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        url: Option<String>,
    },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: String,
        timeout_ms: u64,
    },

    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        path: Option<String>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("CLI error: {message}")]
    Cli { message: String },
}

impl SniperError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>, url: Option<String>) -> Self {
        Self::Transport {
            message: message.into(),
            url,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>, path: Option<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            path,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a CLI error
    pub fn cli(message: impl Into<String>) -> Self {
        Self::Cli {
            message: message.into(),
        }
    }

    /// Whether this error must abort the run before any probe is issued.
    ///
    /// Everything else is contained within the worker that hit it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. } | Self::Cli { .. })
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidConfiguration { message } => {
                format!("❌ Configuration problem: {}\n💡 Check your flags, .env file or SNIPER_* variables", message)
            }
            Self::Transport { message, url } => {
                let url_info = url.as_ref().map_or(String::new(), |u| format!(" ({})", u));
                format!("❌ Network error{}: {}\n💡 Check your internet connection", url_info, message)
            }
            Self::Timeout { operation, timeout_ms } => {
                format!("⏱️  Operation '{}' timed out after {}ms\n💡 Try increasing --timeout or reducing --concurrency", operation, timeout_ms)
            }
            Self::Persistence { message, path } => {
                let path_info = path.as_ref().map_or(String::new(), |p| format!(" ({})", p));
                format!("❌ File error{}: {}\n💡 Check file permissions and paths", path_info, message)
            }
            Self::Internal { message } => {
                format!("❌ Internal error: {}\n💡 This is a bug, please report it", message)
            }
            Self::Cli { message } => {
                format!("❌ Command error: {}\n💡 Use --help for usage information", message)
            }
        }
    }
}

impl From<serde_json::Error> for SniperError {
    fn from(err: serde_json::Error) -> Self {
        Self::persistence(format!("Failed to serialize record: {}", err), None)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SniperError>;

/// Build a configuration error with `format!` arguments
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::SniperError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::SniperError::config(format!($fmt, $($arg)*))
    };
}
