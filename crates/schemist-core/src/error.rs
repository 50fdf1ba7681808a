use thiserror::Error;

/// Core error type shared across Schemist crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error or adapter failure.
    #[error("database error: {0}")]
    Db(String),
    /// The declared or introspected schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A requested feature is not supported by the backend.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// A migration statement failed; the transaction was rolled back.
    #[error("statement failed: {statement}: {message}")]
    Execution { statement: String, message: String },
    /// Failure writing a rendered migration script.
    #[error("io error: {0}")]
    Io(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

/// Convenience alias for results returned by Schemist crates.
pub type Result<T> = std::result::Result<T, Error>;
