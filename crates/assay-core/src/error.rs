//! Error types for Assay

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing parameter: {0}")]
    ParameterMissing(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Unexpected upstream response: {0}")]
    UnexpectedResponse(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Disabled: {0}")]
    Disabled(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Engine task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Coarse error category, used to pick HTTP status codes and exit messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ParameterMissing,
    Parse,
    Computation,
    Upstream,
    Timeout,
    Disabled,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ParameterMissing(_) => ErrorKind::ParameterMissing,
            Error::Parse(_) | Error::Csv(_) | Error::Zip(_) | Error::Json(_) => ErrorKind::Parse,
            Error::Computation(_) => ErrorKind::Computation,
            Error::Upstream(_) | Error::UnexpectedResponse(_) => ErrorKind::Upstream,
            Error::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            Error::Http(_) => ErrorKind::Upstream,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Disabled(_) => ErrorKind::Disabled,
            Error::Io(_) | Error::Regex(_) | Error::Task(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            Error::ParameterMissing("url".into()).kind(),
            ErrorKind::ParameterMissing
        );
        assert_eq!(Error::Parse("bad".into()).kind(), ErrorKind::Parse);
        assert_eq!(
            Error::UnexpectedResponse("no choices".into()).kind(),
            ErrorKind::Upstream
        );
        assert_eq!(Error::Timeout("sleep".into()).kind(), ErrorKind::Timeout);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(Error::from(io).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_display_includes_message() {
        let err = Error::ParameterMissing("column".into());
        assert_eq!(err.to_string(), "Missing parameter: column");
    }
}
