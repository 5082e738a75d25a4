//! Shared error-code contract.
//!
//! Every error enum surfaced by the stores implements [`ErrorCode`] so callers
//! (UI layers, the CLI) can branch on a stable grepable code instead of the
//! display text.

/// Grepable error code and retryable flag for structured error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
