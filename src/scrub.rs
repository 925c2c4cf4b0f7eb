//! Pattern-based scrubbing.
//!
//! Replaces every match of a set of patterns (PII, boilerplate markers)
//! with a fixed replacement string. Matches from all patterns are collected
//! as byte spans, sorted, and fused, so a region covered by several
//! overlapping or touching matches is replaced exactly once.

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// Configuration for the scrubber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrubConfig {
    /// Patterns whose matches are replaced. An empty list scrubs nothing.
    pub patterns: Vec<String>,
    /// Replacement for each fused match span.
    pub replacement: String,
}

impl ScrubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_replacement(mut self, replacement: &str) -> Self {
        self.replacement = replacement.to_string();
        self
    }
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            replacement: "REDACTED".to_string(),
        }
    }
}

/// Sort match spans and merge every overlapping or touching pair.
fn fuse_bounds(bounds: impl Iterator<Item = (usize, usize)>) -> Vec<(usize, usize)> {
    let mut bounds: Vec<(usize, usize)> = bounds.collect();
    if bounds.is_empty() {
        return bounds;
    }
    bounds.sort_unstable_by_key(|k| k.0);

    let mut merged = Vec::with_capacity(bounds.len());
    let mut current = bounds[0];
    for &(next_start, next_stop) in &bounds[1..] {
        if next_start <= current.1 {
            current.1 = current.1.max(next_stop);
        } else {
            merged.push(current);
            current = (next_start, next_stop);
        }
    }
    merged.push(current);
    merged
}

/// Replaces matches of a compiled pattern set.
///
/// The `RegexSet` prefilters which patterns match at all; only those are
/// run for their individual spans.
#[derive(Debug, Clone)]
pub struct Scrubber {
    set: RegexSet,
    patterns: Vec<Regex>,
    replacement: String,
}

impl Scrubber {
    pub fn new(config: &ScrubConfig) -> Result<Self, SignalError> {
        let set = RegexSet::new(&config.patterns)?;
        let patterns = config
            .patterns
            .iter()
            .map(|pat| Regex::new(pat))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            set,
            patterns,
            replacement: config.replacement.clone(),
        })
    }

    /// `text` with every fused match span replaced.
    pub fn scrub(&self, text: &str) -> String {
        let bounds = self
            .set
            .matches(text)
            .into_iter()
            .map(|index| &self.patterns[index])
            .flat_map(|pattern| pattern.find_iter(text).map(|m| (m.start(), m.end())));

        let mut res = String::with_capacity(text.len());
        let mut last_stop = 0;
        for (start, stop) in fuse_bounds(bounds) {
            res.push_str(&text[last_stop..start]);
            res.push_str(&self.replacement);
            last_stop = stop;
        }
        res.push_str(&text[last_stop..]);
        res
    }
}
