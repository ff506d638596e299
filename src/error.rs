use std::fmt;

/// Main error type for the transfer stats crate
///
/// Tracker operations themselves never fail; this covers configuration
/// loading, snapshot serialization and the stream copy helper.
#[derive(Debug)]
pub enum TransferStatsError {
    // Configuration Errors
    ConfigFileNotFound(String),
    ConfigFileParseError(String),
    InvalidConfigValue(String),

    // Snapshot Errors
    Serialization(String),

    // IO Errors
    Io(std::io::Error),

    // General errors
    Other(String),
}

impl fmt::Display for TransferStatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Configuration Errors
            Self::ConfigFileNotFound(msg) => write!(f, "Config file not found: {}", msg),
            Self::ConfigFileParseError(msg) => write!(f, "Config file parse error: {}", msg),
            Self::InvalidConfigValue(msg) => write!(f, "Invalid config value: {}", msg),

            // Snapshot Errors
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),

            // IO Errors
            Self::Io(err) => write!(f, "IO error: {}", err),

            // General
            Self::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for TransferStatsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransferStatsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for TransferStatsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for TransferStatsError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigFileParseError(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TransferStatsError>;
