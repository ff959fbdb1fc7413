use crate::model::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("publish failed: {0}")]
    PublishFailure(String),
    /// A resource vanished between a list call and a follow-up call.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ReportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportError::AccessDenied(_) => ErrorKind::AccessDenied,
            ReportError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ReportError::ServiceUnavailable(_) | ReportError::NotFound(_) => {
                ErrorKind::ServiceUnavailable
            }
            ReportError::PublishFailure(_) => ErrorKind::PublishFailure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::NotFound(_))
    }
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Run-level outcome errors that are not tied to one AWS or wiki call.
#[derive(Debug, Error)]
pub enum RunError {
    /// `code` is the shared exit code when every set failed the same way, else 1.
    #[error("{} of {total} credential sets failed: {}", .failed.len(), .failed.join(", "))]
    SetsFailed {
        failed: Vec<String>,
        total: usize,
        code: i32,
    },
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::SetsFailed { code, .. } => *code,
        }
    }
}
