use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// The data source was unreachable or answered with a non-success status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The player document does not match the expected schema.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid activity range: {first} is after {last}")]
    InvalidRange { first: NaiveDate, last: NaiveDate },
}

impl ReportError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        ReportError::MalformedInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
