//! Error taxonomy for signal extraction.
//!
//! All failures here are configuration or resource failures detected while
//! a component is being set up. Per-document computation never fails:
//! degenerate inputs (empty text, documents shorter than a window) produce
//! documented default values instead of errors.

use thiserror::Error;

/// Errors surfaced while configuring a signal component or loading its
/// shared resources.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Out-of-range or inconsistent configuration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A tokenizer source that is neither a parseable serialized payload
    /// nor a loadable file.
    #[error("invalid tokenizer source: {0}")]
    InvalidTokenizerSource(String),

    /// The classifier model path is unreadable or the file is malformed.
    #[error("classifier model load failed: {0}")]
    ModelLoad(String),

    /// A word or scrub pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
