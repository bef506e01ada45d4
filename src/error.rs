use thiserror::Error;

/// Errors surfaced by listing and mutation operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    #[error("Network failure: {0}")]
    Network(String),
    #[error("Logical failure: {0}")]
    Logical(String),
    #[error("User validation error: {0}")]
    ValidationError(String),
    #[error("Delete already in flight for user {0}")]
    DeleteInFlight(i64),
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// Errors raised by key/value storage slots.
///
/// `Corrupt` never leaves the overlay store: reads recover by treating the
/// slot as empty.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Storage lock poisoned")]
    Poisoned,
    #[error("Stored content under {key} is corrupt: {message}")]
    Corrupt { key: String, message: String },
    #[error("Storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
