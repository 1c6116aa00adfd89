//! Job error types.

use hyu_core::HyuError;
use thiserror::Error;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Job-related errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job execution failed.
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    /// No job registered under that name.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// Scheduler error.
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A service call inside the job failed.
    #[error(transparent)]
    Service(#[from] HyuError),
}

impl From<JobError> for HyuError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(name) => HyuError::not_found("Job", name),
            JobError::Configuration(message) => HyuError::Configuration(message),
            JobError::Service(inner) => inner,
            other => HyuError::Internal(other.to_string()),
        }
    }
}
