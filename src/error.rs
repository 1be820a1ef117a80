// src/error.rs
//! Error taxonomy surfaced by the aggregation core.
//!
//! Source outages and summarizer failures never appear here: fetchers turn
//! them into absent signals and the aggregator falls back to a templated
//! summary. Only conditions the caller must react to are modeled.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LikabilityError {
    /// Empty or whitespace-only subject name.
    #[error("subject name must not be empty")]
    InvalidSubject,

    /// Unexpected failure while serving one request. Fatal for that request only.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, LikabilityError>;
