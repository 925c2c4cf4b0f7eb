//! Repetition signals: top and duplicate n-gram character ratios.
//!
//! These are the "Gopher" repetition heuristics for flagging boilerplate:
//! for small n, how much of the document's character mass is claimed by the
//! single most frequent n-gram; for larger n, how much is covered by
//! n-grams that occur more than once.
//!
//! Everything is computed in one left-to-right pass over the word stream.
//! A ring of the most recent `num_dup` words is kept so that every n-gram
//! ending at the current word can be hashed incrementally; n-grams are
//! keyed by 128-bit digests of their `0xff`-separated word bytes. Hash
//! collisions conflate distinct n-grams, which overestimates the signals
//! with negligible probability for real documents.
//!
//! Invariant: for a fixed configuration the output depends only on the
//! document's own word order. All scan state is local to one call.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hasher};

use itertools::izip;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3Builder;

use crate::error::SignalError;
use crate::tokenize::WordPattern;

/// Fixed seed for the n-gram digest hasher. Changing it changes no signal
/// value, only the internal keying.
const NGRAM_HASH_SEED: u64 = 0x5eed;

/// Configuration for the repetition signal computer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepetitionConfig {
    /// Word-boundary pattern; tokens are its non-overlapping matches.
    pub tokenizer_pattern: String,
    /// Largest n for which a `top_n_gram_char_ratio` is produced.
    pub num_top: usize,
    /// Largest n for which a `dup_n_gram_char_ratio` is produced.
    /// Duplicate signals cover `num_top + 1 ..= num_dup`.
    pub num_dup: usize,
}

impl RepetitionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.tokenizer_pattern = pattern.to_string();
        self
    }

    pub fn with_num_top(mut self, num_top: usize) -> Self {
        self.num_top = num_top;
        self
    }

    pub fn with_num_dup(mut self, num_dup: usize) -> Self {
        self.num_dup = num_dup;
        self
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        if self.num_top < 1 {
            return Err(SignalError::InvalidArgument(format!(
                "num_top must be >= 1 (got {})",
                self.num_top
            )));
        }
        if self.num_dup <= self.num_top {
            return Err(SignalError::InvalidArgument(format!(
                "num_dup must be greater than num_top (got {} <= {})",
                self.num_dup, self.num_top
            )));
        }
        Ok(())
    }
}

impl Default for RepetitionConfig {
    fn default() -> Self {
        Self {
            tokenizer_pattern: WordPattern::DEFAULT.to_string(),
            num_top: 4,
            num_dup: 10,
        }
    }
}

/// Computes per-document repetition signals.
pub struct RepetitionComputer {
    words: WordPattern,
    num_top: usize,
    num_dup: usize,
    hash_builder: Xxh3Builder,
}

impl std::fmt::Debug for RepetitionComputer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepetitionComputer")
            .field("words", &self.words)
            .field("num_top", &self.num_top)
            .field("num_dup", &self.num_dup)
            .finish_non_exhaustive()
    }
}

impl RepetitionComputer {
    pub fn new(config: &RepetitionConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self {
            words: WordPattern::new(&config.tokenizer_pattern)?,
            num_top: config.num_top,
            num_dup: config.num_dup,
            hash_builder: Xxh3Builder::new().with_seed(NGRAM_HASH_SEED),
        })
    }

    /// Signal names, index-aligned with the output of [`compute`].
    ///
    /// [`compute`]: RepetitionComputer::compute
    pub fn field_names(&self) -> Vec<String> {
        (0..self.num_dup).map(|i| self.field_name(i)).collect()
    }

    fn field_name(&self, i: usize) -> String {
        if i < self.num_top {
            format!("top_{}_gram_char_ratio", i + 1)
        } else {
            format!("dup_{}_gram_char_ratio", i + 1)
        }
    }

    /// All `num_dup` ratios for one document, each in `[0, 1]`.
    ///
    /// A document with no words (total character length zero) yields all
    /// zeros rather than an error, so the signals stay total-orderable.
    pub fn compute(&self, text: &str) -> Vec<f32> {
        self.scan(self.words.words(text))
    }

    /// Named variant of [`compute`].
    ///
    /// [`compute`]: RepetitionComputer::compute
    pub fn record(&self, text: &str) -> Vec<(String, f32)> {
        self.field_names()
            .into_iter()
            .zip(self.compute(text))
            .collect()
    }

    fn scan<'a>(&self, words: impl Iterator<Item = &'a str>) -> Vec<f32> {
        // window holds the most recent num_dup words, newest first;
        // window_chars[i] is the character length of the last i+1 words.
        let mut window: VecDeque<&str> = VecDeque::with_capacity(self.num_dup + 1);
        let mut window_chars: VecDeque<usize> = VecDeque::with_capacity(self.num_dup + 1);
        // mass accumulates char_len x occurrence_count per distinct top
        // n-gram; seen records duplicate-range n-grams already observed.
        let mut mass: HashMap<u128, usize> = HashMap::new();
        let mut seen: HashSet<u128> = HashSet::new();
        // last_dup[i] is the word position of the most recent duplicate
        // (i+1)-gram; covered[i] is the running character count claimed by
        // signal i (max product for top, duplicate coverage for dup).
        let mut last_dup = vec![0usize; self.num_dup];
        let mut covered = vec![0usize; self.num_dup];
        let mut total_chars = 0usize;

        for (pos, word) in words.enumerate() {
            let wlen = word.chars().count();
            window.push_front(word);
            window_chars.push_front(0);
            window.truncate(self.num_dup);
            window_chars.truncate(self.num_dup);
            total_chars += wlen;

            // One incremental hasher per position: after feeding the i-th
            // buffered word, the digest identifies the (i+1)-gram ending
            // here.
            let mut hasher = self.hash_builder.build_hasher();
            for (i, gram_word, covered_i) in izip!(0.., &window, covered.iter_mut()) {
                window_chars[i] += wlen;
                hasher.update(gram_word.as_bytes());
                hasher.write_u8(0xff);
                let digest = hasher.digest128();
                if i < self.num_top {
                    let product = mass.entry(digest).or_insert(0);
                    *product += window_chars[i];
                    *covered_i = (*covered_i).max(*product);
                } else if !seen.insert(digest) {
                    // Repeat: count only the words that entered the window
                    // since the previous duplicate of this size, so
                    // overlapping duplicate spans are not double counted.
                    let fresh = i.min(pos - last_dup[i] - 1);
                    *covered_i += window_chars[fresh];
                    last_dup[i] = pos;
                }
            }
        }

        // total_chars == 0 forces every ratio to 0.
        let denom = total_chars.max(1);
        covered
            .iter()
            .map(|c| ((*c as f64) / (denom as f64)) as f32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computer(num_top: usize, num_dup: usize) -> RepetitionComputer {
        RepetitionComputer::new(
            &RepetitionConfig::new()
                .with_num_top(num_top)
                .with_num_dup(num_dup),
        )
        .unwrap()
    }

    #[test]
    fn config_defaults() {
        let cfg = RepetitionConfig::default();
        assert_eq!(cfg.tokenizer_pattern, r"\w+");
        assert_eq!(cfg.num_top, 4);
        assert_eq!(cfg.num_dup, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn num_top_zero_rejected() {
        assert!(matches!(
            RepetitionConfig::new().with_num_top(0).validate(),
            Err(SignalError::InvalidArgument(_))
        ));
    }

    #[test]
    fn num_dup_not_above_num_top_rejected() {
        for num_dup in [2, 4] {
            assert!(matches!(
                RepetitionConfig::new()
                    .with_num_top(4)
                    .with_num_dup(num_dup)
                    .validate(),
                Err(SignalError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn field_names_follow_schema() {
        let names = computer(2, 4).field_names();
        assert_eq!(
            names,
            vec![
                "top_1_gram_char_ratio",
                "top_2_gram_char_ratio",
                "dup_3_gram_char_ratio",
                "dup_4_gram_char_ratio",
            ]
        );
    }

    #[test]
    fn empty_document_yields_zeros() {
        let signals = computer(4, 10).compute("");
        assert_eq!(signals.len(), 10);
        assert!(signals.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn whitespace_only_document_yields_zeros() {
        let signals = computer(4, 10).compute("  \n\t  ");
        assert!(signals.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn single_repeated_token_dominates() {
        // "x x x": the unigram "x" claims all three characters of mass.
        let signals = computer(1, 2).compute("x x x");
        assert_eq!(signals[0], 1.0);
    }

    #[test]
    fn overlapping_duplicates_not_double_counted() {
        // "a b a b a b", bigrams: ab ba ab ba ab. The first repeat at the
        // third bigram covers both of its characters; each later repeat
        // adds only the one word that entered the window since the repeat
        // before it. Covered mass is 2 + 1 + 1 = 4 of 6 characters.
        let signals = computer(1, 2).compute("a b a b a b");
        assert_eq!(signals[1], 4.0 / 6.0);
    }

    #[test]
    fn top_unigram_on_mixed_text() {
        // "a" occurs three times out of six one-character words.
        let signals = computer(1, 2).compute("a b a c a d");
        assert_eq!(signals[0], 0.5);
    }

    #[test]
    fn distinct_words_have_no_duplicates() {
        let signals = computer(2, 5).compute("one two three four five six seven");
        for (i, s) in signals.iter().enumerate().skip(2) {
            assert_eq!(*s, 0.0, "dup signal {i}");
        }
    }

    #[test]
    fn character_mass_ignores_separators() {
        // Longer separators must not change any ratio.
        let a = computer(1, 2).compute("spam ham spam ham");
        let b = computer(1, 2).compute("spam,  ham...   spam --- ham");
        assert_eq!(a, b);
    }

    #[test]
    fn ratios_stay_in_unit_interval() {
        let comp = computer(4, 10);
        let texts = [
            "the cat sat on the mat and the cat sat on the mat again",
            "x",
            "one two one two one two one two one two",
            "entirely unique words with no repetition whatsoever here",
        ];
        for text in texts {
            for (name, value) in comp.record(text) {
                assert!(
                    (0.0..=1.0).contains(&value),
                    "{name} out of range for {text:?}: {value}"
                );
            }
        }
    }

    #[test]
    fn fully_duplicated_passage_covers_second_copy() {
        // Two copies of a six-word sentence. The first repeated trigram
        // covers its full span; each later repeat adds one fresh word, so
        // exactly the second copy's 30 characters of 60 are covered.
        let text = "alpha beta gamma delta epsilon zeta alpha beta gamma delta epsilon zeta";
        let signals = computer(2, 3).compute(text);
        assert_eq!(signals[2], 0.5);
    }

    #[test]
    fn deterministic_across_calls() {
        let comp = computer(4, 10);
        let text = "the rain in spain falls mainly on the plain the rain in spain";
        assert_eq!(comp.compute(text), comp.compute(text));
    }

    #[test]
    fn unicode_words_counted_by_chars() {
        // Four two-char words, "αβ" repeated twice: top unigram mass 4/8.
        let signals = computer(1, 2).compute("αβ γδ αβ εζ");
        assert_eq!(signals[0], 0.5);
    }
}
