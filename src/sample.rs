//! Per-row sampling and identifier helpers.
//!
//! The only intentionally nondeterministic functions in the crate. Both are
//! flat per-row utilities: a geometric sample byte for reservoir-style
//! subsampling, and a random document identifier.

use rand::RngCore;
use uuid::Uuid;

/// A geometric sample in `1..=64`: one plus the leading zero bits of a
/// uniformly random nonzero `u64`, so value `k` occurs with probability
/// `2^-k`. Comparing against a threshold subsamples rows at any power-of-two
/// rate without a second pass.
pub fn sample_byte() -> u8 {
    let mut rng = rand::rng();
    loop {
        let v = rng.next_u64();
        if v != 0 {
            return (v.leading_zeros() + 1) as u8;
        }
    }
}

/// A random 32-character lowercase hex identifier (UUIDv4, simple format).
pub fn random_id() -> String {
    Uuid::new_v4().simple().to_string()
}
