//! Boolean and empty-value forms of operation results.
//!
//! Callers that only want "did it work" or "whatever came back" use these
//! instead of matching on [`AppError`]. The error is logged before it is
//! collapsed.

use tracing::error;

use common::errors::{AppError, AppResult};

pub trait Outcome<T> {
    /// `true` on success; logs and returns `false` on any error.
    fn succeeded(self, operation: &str) -> bool;

    /// The value on success; logs and returns `T::default()` on any error.
    fn or_empty(self, operation: &str) -> T
    where
        T: Default;
}

fn log_failure(operation: &str, err: &AppError) {
    error!(
        operation,
        kind = ?err.kind(),
        code = err.code(),
        error = %err,
        "Operation failed"
    );
}

impl<T> Outcome<T> for AppResult<T> {
    fn succeeded(self, operation: &str) -> bool {
        match self {
            Ok(_) => true,
            Err(e) => {
                log_failure(operation, &e);
                false
            }
        }
    }

    fn or_empty(self, operation: &str) -> T
    where
        T: Default,
    {
        self.unwrap_or_else(|e| {
            log_failure(operation, &e);
            T::default()
        })
    }
}
