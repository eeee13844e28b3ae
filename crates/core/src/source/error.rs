use thiserror::Error;

/// Failure of a data-source call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The source has nothing for this request. Callers turn this into
    /// missing values.
    #[error("data unavailable: {0}")]
    Unavailable(String),

    /// Timeout, rate limit or outage; worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("{what} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        what: String,
        attempts: u32,
        last: String,
    },

    #[error("data source failed: {0}")]
    Failed(String),
}

impl SourceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}

/// Result alias for data-source calls.
pub type SourceResult<T> = std::result::Result<T, SourceError>;
