//! Error handling for the pi_status crate.

/// A specialized `Result` type for pi_status operations.
pub type Result<T> = std::result::Result<T, StatusError>;

/// The main error type for metric collection, rendering and output.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request to the DNS-filter API failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A metric source returned data we could not understand
    #[error("Failed to parse metric: {0}")]
    ParseError(String),

    /// Network operation failed
    #[error("Network error: {0}")]
    Network(String),

    /// The DNS-filter API refused our credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A remote command exited unsuccessfully
    #[error("Remote command failed: {0}")]
    Remote(String),

    /// An operation exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Panel output failed
    #[error("Display error: {0}")]
    Display(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StatusError {
    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a new network error
    pub fn network_error(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new authentication error
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a new remote command error
    pub fn remote_error(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new display error
    pub fn display_error(msg: impl Into<String>) -> Self {
        Self::Display(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
