//! Compression-based size and ratio estimation.
//!
//! Boilerplate and templated text compresses far better than natural prose,
//! so the size of a document under a general-purpose compressor is a cheap
//! low-quality heuristic. The estimator runs a raw DEFLATE stream into a
//! byte-counting sink; the compressed bytes are measured, never stored.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// Counts the bytes written to it and drops them.
struct CountingSink {
    count: usize,
}

impl CountingSink {
    fn new() -> Self {
        Self { count: 0 }
    }
}

impl Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.count += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Configuration for the compression estimator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompressionConfig {
    /// DEFLATE compression level, `0..=9`.
    pub level: u32,
}

impl CompressionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        if self.level > 9 {
            return Err(SignalError::InvalidArgument(format!(
                "compression level must be in 0..=9 (got {})",
                self.level
            )));
        }
        Ok(())
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self { level: 6 }
    }
}

/// Deterministic per-document compression measurements.
///
/// A fresh encoder is used for every document; no dictionary state is
/// carried across calls.
#[derive(Debug, Clone)]
pub struct CompressionEstimator {
    compression: Compression,
}

impl CompressionEstimator {
    pub fn new(config: &CompressionConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self {
            compression: Compression::new(config.level),
        })
    }

    /// Byte size of the document's full DEFLATE stream.
    ///
    /// An empty document reports the encoder's fixed terminator overhead,
    /// not zero.
    pub fn compressed_size(&self, text: &str) -> u64 {
        let mut encoder = DeflateEncoder::new(CountingSink::new(), self.compression);
        // The counting sink never fails, so neither does the encoder.
        encoder
            .write_all(text.as_bytes())
            .expect("counting sink never fails");
        let sink = encoder.finish().expect("counting sink never fails");
        sink.count as u64
    }

    /// Ratio of compressed to original byte size; `0.0` for an empty
    /// document.
    ///
    /// Stored-block output (notably `level = 0`) can push the value above
    /// `1.0` for incompressible input.
    pub fn compression_ratio(&self, text: &str) -> f32 {
        let original = text.len();
        if original == 0 {
            return 0.0;
        }
        self.compressed_size(text) as f32 / original as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator(level: u32) -> CompressionEstimator {
        CompressionEstimator::new(&CompressionConfig::new().with_level(level)).unwrap()
    }

    #[test]
    fn config_default_level() {
        assert_eq!(CompressionConfig::default().level, 6);
    }

    #[test]
    fn all_valid_levels_accepted() {
        for level in 0..=9 {
            assert!(CompressionConfig::new().with_level(level).validate().is_ok());
        }
    }

    #[test]
    fn level_ten_rejected() {
        assert!(matches!(
            CompressionConfig::new().with_level(10).validate(),
            Err(SignalError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_document_has_fixed_overhead() {
        let est = estimator(6);
        let size = est.compressed_size("");
        assert!(size > 0);
        assert_eq!(size, est.compressed_size(""));
    }

    #[test]
    fn empty_document_ratio_is_zero() {
        assert_eq!(estimator(6).compression_ratio(""), 0.0);
    }

    #[test]
    fn ratio_matches_size_over_length() {
        let text = "the quick brown fox jumps over the lazy dog. ".repeat(20);
        for level in 0..=9 {
            let est = estimator(level);
            let expected = est.compressed_size(&text) as f32 / text.len() as f32;
            assert_eq!(est.compression_ratio(&text), expected, "level {level}");
        }
    }

    #[test]
    fn repetitive_text_compresses_below_one() {
        let est = estimator(6);
        let text = "boilerplate ".repeat(100);
        assert!(est.compression_ratio(&text) < 1.0);
    }

    #[test]
    fn deterministic_across_calls() {
        let est = estimator(9);
        let text = "some moderately compressible text, repeated a little, repeated a little";
        assert_eq!(est.compressed_size(text), est.compressed_size(text));
    }

    #[test]
    fn higher_level_never_larger_on_redundant_text() {
        let text = "aaaa bbbb aaaa bbbb ".repeat(50);
        assert!(estimator(9).compressed_size(&text) <= estimator(1).compressed_size(&text));
    }
}
