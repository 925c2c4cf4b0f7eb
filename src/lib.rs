//! # Text Signals
//!
//! Per-document quality, duplication, and language signals for web-scale
//! text corpora. Each component scores one document at a time and is meant
//! to be driven per-row by a columnar execution engine that handles
//! batching, null propagation, and persistence.
//!
//! ## Contract
//!
//! - Every per-document call is a pure function of `(text, config)` plus
//!   shared read-only resources (a subword tokenizer definition, a
//!   classifier model) loaded once at setup.
//! - Configuration problems fail eagerly at construction, before any
//!   document is processed. Degenerate documents (empty text, fewer words
//!   than a window) produce documented default values, never errors.
//! - No component keeps state across documents, so the host may fan out
//!   across rows freely; results never depend on processing order.
//!
//! ## Components
//!
//! 1. [`repetition`] — top and duplicate n-gram character ratios, the
//!    Gopher boilerplate heuristics.
//! 2. [`minhash`] — fixed-length bucketed MinHash signatures over word
//!    shingles for near-duplicate detection.
//! 3. [`compression`] — compressed size and compression ratio under
//!    DEFLATE, a cheap templated-text heuristic.
//! 4. [`classifier`] — multi-label fastText score aggregation restricted
//!    to a requested label subset.
//! 5. [`tokenize`] — regex word patterns and shared subword tokenizer
//!    handles feeding the components above.
//! 6. [`scrub`] — pattern-based replacement of sensitive spans.
//! 7. [`sample`] — flat per-row sampling and identifier helpers.
//!
//! ## Example
//!
//! ```
//! use signals::{
//!     CompressionConfig, CompressionEstimator, MinHashConfig, MinHasher,
//!     RepetitionComputer, RepetitionConfig,
//! };
//!
//! let text = "the cat sat on the mat and the cat sat on the mat again";
//!
//! let repetition = RepetitionComputer::new(&RepetitionConfig::default())?;
//! for (name, ratio) in repetition.record(text) {
//!     assert!((0.0..=1.0).contains(&ratio), "{name} out of range");
//! }
//!
//! let minhash = MinHasher::new(&MinHashConfig::default())?;
//! let signature = minhash.signature(text);
//! assert_eq!(signature.len(), 14 * 32);
//!
//! let compression = CompressionEstimator::new(&CompressionConfig::default())?;
//! assert!(compression.compression_ratio(&text.repeat(10)) < 1.0);
//! # Ok::<(), signals::SignalError>(())
//! ```

pub mod classifier;
pub mod compression;
pub mod error;
pub mod minhash;
pub mod repetition;
pub mod sample;
pub mod scrub;
pub mod tokenize;

pub use classifier::{ClassifierConfig, ClassifierScorer, ScoreAggregate, ScoreRecord};
pub use compression::{CompressionConfig, CompressionEstimator};
pub use error::SignalError;
pub use minhash::{expand_seed, MinHashConfig, MinHasher};
pub use repetition::{RepetitionComputer, RepetitionConfig};
pub use sample::{random_id, sample_byte};
pub use scrub::{ScrubConfig, Scrubber};
pub use tokenize::{SubwordTokenizer, TokenizerSource, WordPattern};
