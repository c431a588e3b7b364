//! Error handling module for elapse.

use thiserror::Error;

/// Custom error type for Timer operations.
#[derive(Error, Debug)]
pub enum TimerError {
    /// Operation attempted on a disposed timer.
    #[error("Operation attempted on a disposed timer.")]
    Disposed,

    /// No Tokio runtime was available to arm the timer on.
    #[error("No Tokio runtime available to drive the timer.")]
    NoRuntime,

    /// Callback execution failed.
    #[error("Callback execution failed: {0}")]
    CallbackError(String),
}
