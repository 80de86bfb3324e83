//! Succinct bitvector primitives
//!
//! The packed bitvector and its rank/select accelerations that the trie
//! tiers are built on. Bits are stored MSB-first within 64-bit words so
//! the packed form matches the big-endian wire layout word for word.

mod bit_vector;
mod rank;
mod select;

pub use bit_vector::BitVector;
pub use rank::RankVector;
pub use select::SelectVector;

/// Number of bits per storage word
pub const WORD_BITS: usize = 64;

/// Mask selecting the first (most significant) bit of a word
pub const MSB_MASK: u64 = 1u64 << 63;

/// Rank acceleration block size in bits
pub const RANK_BLOCK_SIZE: usize = 512;

/// Select table sampling interval in set bits
pub const SELECT_SAMPLE_INTERVAL: usize = 64;
