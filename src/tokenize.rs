//! Tokenizer adapters.
//!
//! Two token layers feed the signal computations:
//!
//! - **Word patterns**: a compiled regex whose non-overlapping matches are
//!   the word stream consumed by the repetition and MinHash components.
//!   Tokens are string slices compared by value; separators carry no
//!   character mass.
//! - **Subword definitions**: a serialized `tokenizers` definition (inline
//!   JSON payload or file path), resolved once per source and shared as an
//!   immutable handle across every document-processing call.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use cached::proc_macro::cached;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokenizers::tokenizer::Tokenizer;
use tracing::debug;

use crate::error::SignalError;

/// Compiled word-boundary pattern.
///
/// Tokens are the non-overlapping matches of the pattern (match semantics,
/// e.g. `\w+`), in document order.
#[derive(Debug, Clone)]
pub struct WordPattern {
    pattern: Regex,
}

impl WordPattern {
    /// Word pattern used by the production pipelines when none is given.
    pub const DEFAULT: &'static str = r"\w+";

    pub fn new(pattern: &str) -> Result<Self, SignalError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Iterate the words of `text` in document order.
    pub fn words<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pattern.find_iter(text).map(|m| m.as_str())
    }
}

impl Default for WordPattern {
    fn default() -> Self {
        Self::new(Self::DEFAULT).unwrap()
    }
}

/// Where a serialized subword tokenizer definition comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenizerSource {
    /// A serialized tokenizer definition, passed inline as JSON.
    Json(String),
    /// Path to a serialized tokenizer definition on disk.
    File(PathBuf),
}

// Loaded definitions are cached by source and refreshed on a timer, so a
// long run re-reads a replaced file eventually but never loads per row.
#[cached(time = 60, time_refresh = true, sync_writes = "by_key")]
fn tokenizer_from_file(path: String) -> Result<Arc<Tokenizer>, String> {
    let tok =
        Tokenizer::from_file(&path).map_err(|_| format!("unloadable tokenizer file: {path}"))?;
    Ok(Arc::new(tok))
}

#[cached(time = 60, time_refresh = true, sync_writes = "by_key")]
fn tokenizer_from_json(payload: String) -> Result<Arc<Tokenizer>, String> {
    let tok = Tokenizer::from_str(&payload).map_err(|_| "unparseable tokenizer payload".to_string())?;
    Ok(Arc::new(tok))
}

/// Shared handle to a loaded subword tokenizer.
///
/// Cloning is cheap; every clone refers to the same immutable definition.
#[derive(Debug, Clone)]
pub struct SubwordTokenizer {
    inner: Arc<Tokenizer>,
}

impl SubwordTokenizer {
    /// Resolve a tokenizer source to a shared handle.
    pub fn load(source: &TokenizerSource) -> Result<Self, SignalError> {
        let inner = match source {
            TokenizerSource::Json(payload) => tokenizer_from_json(payload.clone()),
            TokenizerSource::File(path) => tokenizer_from_file(path.display().to_string()),
        }
        .map_err(SignalError::InvalidTokenizerSource)?;
        debug!(target: "signals::tokenize", "subword tokenizer ready");
        Ok(Self { inner })
    }

    /// Token ids for `text`, without special tokens.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>, SignalError> {
        let encoding = self
            .inner
            .encode_fast(text, false)
            .map_err(|e| SignalError::InvalidTokenizerSource(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_matches_words() {
        let pattern = WordPattern::default();
        let words: Vec<&str> = pattern.words("the cat, the mat!").collect();
        assert_eq!(words, vec!["the", "cat", "the", "mat"]);
    }

    #[test]
    fn whitespace_pattern_splits_runs() {
        let pat = WordPattern::new(r"\S+").unwrap();
        let words: Vec<&str> = pat.words("a  b\tc\n").collect();
        assert_eq!(words, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_text_yields_no_words() {
        assert_eq!(WordPattern::default().words("").count(), 0);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(matches!(
            WordPattern::new("(unclosed"),
            Err(SignalError::Pattern(_))
        ));
    }

    #[test]
    fn garbage_payload_is_invalid_source() {
        let source = TokenizerSource::Json("not a tokenizer".into());
        assert!(matches!(
            SubwordTokenizer::load(&source),
            Err(SignalError::InvalidTokenizerSource(_))
        ));
    }

    #[test]
    fn missing_file_is_invalid_source() {
        let source = TokenizerSource::File("/nonexistent/tokenizer.json".into());
        assert!(matches!(
            SubwordTokenizer::load(&source),
            Err(SignalError::InvalidTokenizerSource(_))
        ));
    }
}
