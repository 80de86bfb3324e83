//! Per-leaf suffix bits
//!
//! Each leaf may carry extra bits of the key it stands for: the low bits
//! of a 64-bit key hash, the key bits just beyond the trie prefix, or
//! both. The bits for all leaves are packed back to back into one
//! buffer; a leaf's slot is `suffix_index * suffix_len`.

use std::hash::BuildHasher;

use ahash::RandomState;

use crate::config::{SuffixConfig, SuffixKind};
use crate::error::{Result, SurfError};
use crate::io::{DataInput, DataOutput};
use crate::succinct::BitVector;

/// Outcome of an ordered comparison against stored suffix bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixCompare {
    /// The stored suffix orders before the probe key's suffix
    Less,
    /// The stored suffix orders after the probe key's suffix
    Greater,
    /// The stored bits cannot decide (hash bits, no bits, or equal bits)
    CouldBePositive,
}

/// Fixed seeds keep the suffix hash stable for the lifetime of a filter
const HASH_SEEDS: (u64, u64, u64, u64) = (
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
);

/// 64-bit key hash used for hash suffixes
#[inline]
pub fn hash64(key: &[u8]) -> u64 {
    RandomState::with_seeds(HASH_SEEDS.0, HASH_SEEDS.1, HASH_SEEDS.2, HASH_SEEDS.3).hash_one(key)
}

#[inline]
fn low_mask(len: u32) -> u64 {
    match len {
        0 => 0,
        64.. => u64::MAX,
        n => (1u64 << n) - 1,
    }
}

/// The next `len` key bits starting at byte `level`, MSB-first and
/// zero-padded past the end of the key, right-aligned in the result.
pub(crate) fn construct_real_suffix(key: &[u8], level: usize, len: u32) -> u64 {
    let len = len as usize;
    if len == 0 || key.len() <= level {
        return 0;
    }
    let byte_at = |i: usize| key.get(level + i).copied().unwrap_or(0) as u64;
    let mut suffix = 0u64;
    let num_complete = len / 8;
    for i in 0..num_complete {
        suffix = (suffix << 8) | byte_at(i);
    }
    let tail = len % 8;
    if tail > 0 {
        suffix = (suffix << tail) | (byte_at(num_complete) >> (8 - tail));
    }
    suffix
}

/// Packed suffix bits for every leaf of one trie tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixStore {
    bits: BitVector,
    kind: SuffixKind,
    hash_len: u32,
    real_len: u32,
}

impl SuffixStore {
    /// A store holding no suffix bits
    pub fn empty() -> Self {
        Self {
            bits: BitVector::new(),
            kind: SuffixKind::None,
            hash_len: 0,
            real_len: 0,
        }
    }

    /// Build from the builder's per-level packed suffix words over
    /// `[start_level, end_level)`
    pub fn from_level_words(
        config: SuffixConfig,
        words_per_level: &[Vec<u64>],
        bits_per_level: &[usize],
        start_level: usize,
        end_level: usize,
    ) -> Self {
        if config.kind == SuffixKind::None {
            return Self::empty();
        }
        Self {
            bits: BitVector::from_level_words(words_per_level, bits_per_level, start_level, end_level),
            kind: config.kind,
            hash_len: config.hash_len,
            real_len: config.real_len,
        }
    }

    /// The suffix bits a leaf for (`key`, `level`) is expected to carry
    pub fn construct(&self, key: &[u8], level: usize) -> u64 {
        Self::construct_with(self.kind, key, self.hash_len, level, self.real_len)
    }

    /// Suffix construction shared with the builder
    pub fn construct_with(
        kind: SuffixKind,
        key: &[u8],
        hash_len: u32,
        level: usize,
        real_len: u32,
    ) -> u64 {
        match kind {
            SuffixKind::None => 0,
            SuffixKind::Hash => hash64(key) & low_mask(hash_len),
            SuffixKind::Real => construct_real_suffix(key, level, real_len),
            SuffixKind::Mixed => {
                let hash = hash64(key) & low_mask(hash_len);
                (hash << real_len) | construct_real_suffix(key, level, real_len)
            }
        }
    }

    /// Total suffix bits per leaf
    #[inline]
    pub fn suffix_len(&self) -> usize {
        (self.hash_len + self.real_len) as usize
    }

    /// Which suffix bits this store holds
    #[inline]
    pub fn kind(&self) -> SuffixKind {
        self.kind
    }

    /// Number of real key bits per leaf
    #[inline]
    pub fn real_len(&self) -> u32 {
        self.real_len
    }

    /// Stored suffix bits of the given leaf, right-aligned
    pub fn read(&self, idx: usize) -> u64 {
        let suffix_len = self.suffix_len();
        if suffix_len == 0 {
            return 0;
        }
        let bit_pos = idx * suffix_len;
        if bit_pos >= self.bits.num_bits() {
            return 0;
        }
        let word_id = bit_pos / 64;
        let offset = bit_pos % 64;
        let word_remaining = 64 - offset;
        if suffix_len <= word_remaining {
            (self.bits.word(word_id) << offset) >> (64 - suffix_len)
        } else {
            let left = (self.bits.word(word_id) << offset) >> offset;
            let spill = suffix_len - word_remaining;
            (left << spill) | (self.bits.word(word_id + 1) >> (64 - spill))
        }
    }

    /// Stored real-suffix bits of the given leaf, right-aligned
    pub fn read_real(&self, idx: usize) -> u64 {
        self.read(idx) & low_mask(self.real_len)
    }

    /// True iff the stored suffix matches the one derived from
    /// (`key`, `level`); trivially true when no bits are stored.
    pub fn check_equality(&self, idx: usize, key: &[u8], level: usize) -> bool {
        if self.kind == SuffixKind::None {
            return true;
        }
        if idx * self.suffix_len() >= self.bits.num_bits() {
            return false;
        }
        let stored = self.read(idx);
        if self.kind == SuffixKind::Real {
            // a zero real suffix means the stored key had no bits there
            if stored == 0 {
                return true;
            }
            if key.len() < level || (key.len() - level) * 8 < self.real_len as usize {
                return false;
            }
        }
        stored == self.construct(key, level)
    }

    /// Ordered comparison of the stored suffix against the probe key's.
    ///
    /// Hash bits never order the key space, so only real bits can give a
    /// definite answer.
    pub fn compare(&self, idx: usize, key: &[u8], level: usize) -> SuffixCompare {
        if idx * self.suffix_len() >= self.bits.num_bits()
            || self.kind == SuffixKind::None
            || self.kind == SuffixKind::Hash
        {
            return SuffixCompare::CouldBePositive;
        }
        let mut stored = self.read(idx);
        if self.kind == SuffixKind::Mixed {
            stored &= low_mask(self.real_len);
        }
        let querying = construct_real_suffix(key, level, self.real_len);
        if stored == 0 && querying == 0 {
            SuffixCompare::CouldBePositive
        } else if stored == 0 || stored < querying {
            SuffixCompare::Less
        } else if stored == querying {
            SuffixCompare::CouldBePositive
        } else {
            SuffixCompare::Greater
        }
    }

    /// Bytes occupied by the packed suffix bits
    pub fn memory_usage(&self) -> usize {
        self.bits.bytes_occupied()
    }

    /// Byte length of the serialized form
    pub fn serialized_size(&self) -> usize {
        16 + self.bits.bytes_occupied()
    }

    /// Write `kind | hash_len | real_len | num_bits | words`
    pub fn serialize<W: DataOutput>(&self, out: &mut W) -> Result<()> {
        out.write_u32(self.kind.as_u32())?;
        out.write_u32(self.hash_len)?;
        out.write_u32(self.real_len)?;
        self.bits.serialize(out)
    }

    /// Read back a store written by [`serialize`](Self::serialize)
    pub fn deserialize<R: DataInput>(input: &mut R) -> Result<Self> {
        let kind = SuffixKind::from_u32(input.read_u32()?)?;
        let hash_len = input.read_u32()?;
        let real_len = input.read_u32()?;
        let config = SuffixConfig {
            kind,
            hash_len,
            real_len,
        };
        config
            .validate()
            .map_err(|e| SurfError::corrupt_stream(format!("bad suffix header: {}", e)))?;
        let bits = BitVector::deserialize(input)?;
        let total_len = (hash_len + real_len) as usize;
        if total_len == 0 {
            if bits.num_bits() != 0 {
                return Err(SurfError::corrupt_stream(
                    "suffix store has bits but zero suffix length".to_string(),
                ));
            }
        } else if bits.num_bits() % total_len != 0 {
            return Err(SurfError::corrupt_stream(format!(
                "suffix store bit count {} is not a multiple of suffix length {}",
                bits.num_bits(),
                total_len
            )));
        }
        Ok(Self {
            bits,
            kind,
            hash_len,
            real_len,
        })
    }
}
