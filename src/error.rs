//! Shared error conventions.
//!
//! Every error type in the crate carries a grepable `E_*` code so log lines
//! and API envelopes can be matched without parsing human-readable text.

/// Grepable error code plus a retry hint.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
