//! MinHash signatures for near-duplicate detection.
//!
//! A document is shingled into overlapping `window`-word windows, each
//! shingle is hashed once, and every configured seed simulates one random
//! permutation of the shingle universe by mixing the shingle hash with that
//! seed. The minimum mixed value per seed is the MinHash property: two
//! documents with high Jaccard similarity between their shingle sets agree
//! on each minimum with probability equal to that similarity.
//!
//! The `buckets * bsize` minima are grouped in seed order into `buckets`
//! chunks. A chunk of one hash is rendered directly as 16 hex characters; a
//! chunk of several is folded through a 128-bit hash of its big-endian
//! bytes (order-sensitive) and rendered as 32, so two buckets agree only
//! when every minimum inside them agrees. Signature length is a function of
//! `(buckets, bsize)` alone, never of the document.
//!
//! Invariant: for a fixed configuration the signature is a pure function of
//! the document text; the sequential and parallel paths are bit identical.

use std::collections::VecDeque;
use std::hash::{BuildHasher, Hasher};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::{xxh3_128, xxh3_64_with_seed, Xxh3Builder};

use crate::error::SignalError;
use crate::tokenize::WordPattern;

/// Fixed seed for the shingle content hash. Permutation variety comes from
/// the configured seed vector, not from this constant.
const SHINGLE_HASH_SEED: u64 = 0x5eed;

/// Base value the default configuration expands its seed vector from.
const DEFAULT_SEED_BASE: u64 = 0x5ca1_ab1e;

macro_rules! into_bytes {
    ($x:expr) => {
        $x.iter()
            .flat_map(|v| v.to_be_bytes())
            .collect::<Vec<u8>>()
    };
}

/// Configuration for the MinHash signature generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MinHashConfig {
    /// Shingling pattern; words are its non-overlapping matches.
    pub tokenizer_pattern: String,
    /// One seed per simulated permutation; must hold exactly
    /// `buckets * bsize` values. See [`expand_seed`].
    pub seed: Vec<u64>,
    /// Number of sub-signatures in the output.
    pub buckets: usize,
    /// Minima folded into each sub-signature.
    pub bsize: usize,
    /// Words per shingle.
    pub window: usize,
    /// Compute per-seed minima on the rayon pool. Output is identical to
    /// the sequential path.
    pub use_parallel: bool,
}

impl MinHashConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.tokenizer_pattern = pattern.to_string();
        self
    }

    pub fn with_seed(mut self, seed: Vec<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn with_bsize(mut self, bsize: usize) -> Self {
        self.bsize = bsize;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        if self.buckets < 1 {
            return Err(SignalError::InvalidArgument(
                "buckets must be >= 1".into(),
            ));
        }
        if self.bsize < 1 {
            return Err(SignalError::InvalidArgument("bsize must be >= 1".into()));
        }
        if self.window < 1 {
            return Err(SignalError::InvalidArgument("window must be >= 1".into()));
        }
        if self.seed.len() != self.buckets * self.bsize {
            return Err(SignalError::InvalidArgument(format!(
                "seed vector must hold buckets * bsize = {} values (got {})",
                self.buckets * self.bsize,
                self.seed.len()
            )));
        }
        Ok(())
    }
}

impl Default for MinHashConfig {
    fn default() -> Self {
        Self {
            tokenizer_pattern: WordPattern::DEFAULT.to_string(),
            seed: expand_seed(DEFAULT_SEED_BASE, 14 * 8),
            buckets: 14,
            bsize: 8,
            window: 5,
            use_parallel: false,
        }
    }
}

/// Derive a seed vector of length `len` from a single base value.
///
/// Pipelines usually configure one 64-bit seed; this expands it into the
/// per-permutation vector deterministically.
pub fn expand_seed(base: u64, len: usize) -> Vec<u64> {
    (0..len as u64)
        .map(|i| splitmix64(base.wrapping_add(i.wrapping_mul(0x9E37_79B9_7F4A_7C15))))
        .collect()
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Mix a shingle hash with one permutation seed.
#[inline]
fn mix(shingle: u64, seed: u64) -> u64 {
    let mut h = xxh3_64_with_seed(&shingle.to_le_bytes(), seed);
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^ (h >> 33)
}

#[inline]
fn min_for_seed(shingles: &[u64], seed: u64) -> u64 {
    shingles
        .iter()
        .map(|&h| mix(h, seed))
        .min()
        .unwrap_or(u64::MAX)
}

/// Generates per-document MinHash signatures.
pub struct MinHasher {
    words: WordPattern,
    seed: Vec<u64>,
    bsize: usize,
    window: usize,
    use_parallel: bool,
    hash_builder: Xxh3Builder,
}

impl MinHasher {
    pub fn new(config: &MinHashConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self {
            words: WordPattern::new(&config.tokenizer_pattern)?,
            seed: config.seed.clone(),
            bsize: config.bsize,
            window: config.window,
            use_parallel: config.use_parallel,
            hash_builder: Xxh3Builder::new().with_seed(SHINGLE_HASH_SEED),
        })
    }

    /// Hash every `window`-word shingle of `text`, in document order.
    fn shingle_hashes(&self, text: &str) -> Vec<u64> {
        let mut builder: VecDeque<&str> = VecDeque::with_capacity(self.window + 1);
        let mut hashes = Vec::new();
        for word in self.words.words(text) {
            builder.push_front(word);
            builder.truncate(self.window);
            if builder.len() == self.window {
                let mut hasher = self.hash_builder.build_hasher();
                for v in &builder {
                    hasher.update(v.as_bytes());
                    hasher.write_u8(0xff);
                }
                hashes.push(hasher.digest());
            }
        }
        hashes
    }

    /// One minimum per seed, in seed order.
    ///
    /// A document with fewer than `window` words has no shingles; every
    /// minimum is then the sentinel `u64::MAX`, so short documents share
    /// one reproducible signature instead of an undefined one.
    fn minima(&self, shingles: &[u64]) -> Vec<u64> {
        if shingles.is_empty() {
            return vec![u64::MAX; self.seed.len()];
        }
        if self.use_parallel {
            self.seed
                .par_iter()
                .map(|&s| min_for_seed(shingles, s))
                .collect()
        } else {
            self.seed
                .iter()
                .map(|&s| min_for_seed(shingles, s))
                .collect()
        }
    }

    /// The hex signature of one document.
    ///
    /// Exactly `buckets * 16` characters when `bsize == 1`, `buckets * 32`
    /// otherwise.
    pub fn signature(&self, text: &str) -> String {
        let minima = self.minima(&self.shingle_hashes(text));
        if self.bsize > 1 {
            let folded: Vec<u128> = minima
                .chunks(self.bsize)
                .map(|bucket| xxh3_128(&into_bytes!(bucket)))
                .collect();
            hex::encode(into_bytes!(folded))
        } else {
            hex::encode(into_bytes!(minima))
        }
    }
}
