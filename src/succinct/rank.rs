//! Constant-time rank over a packed bit vector
//!
//! A [`BitVector`] plus a cumulative popcount table sampled every
//! [`RANK_BLOCK_SIZE`] bits. Space overhead is one u32 per block
//! (~0.8% at the default 512-bit block).

use crate::error::{Result, SurfError};
use crate::io::{DataInput, DataOutput};
use crate::succinct::{BitVector, RANK_BLOCK_SIZE, WORD_BITS};

/// Bit vector with an O(1) inclusive rank operation
///
/// `rank(pos)` counts the set bits in positions `[0, pos]`. The counting
/// is one-based while positions are zero-based, matching the LOUDS
/// navigation arithmetic in the trie tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankVector {
    bits: BitVector,
    block_size: usize,
    rank_table: Vec<u32>,
}

/// Count the first `num_bits` bits starting at word `start_word`
#[inline]
fn popcount_prefix(words: &[u64], start_word: usize, num_bits: usize) -> usize {
    let mut count = 0;
    let mut idx = start_word;
    let mut left = num_bits;
    while left >= WORD_BITS {
        count += words[idx].count_ones() as usize;
        idx += 1;
        left -= WORD_BITS;
    }
    if left > 0 {
        count += (words[idx] >> (WORD_BITS - left)).count_ones() as usize;
    }
    count
}

impl RankVector {
    /// Wrap a bit vector, building the rank table for the given block size
    pub fn new(bits: BitVector, block_size: usize) -> Self {
        let rank_table = Self::build_table(&bits, block_size);
        Self {
            bits,
            block_size,
            rank_table,
        }
    }

    /// Wrap with the default 512-bit block
    pub fn with_default_block(bits: BitVector) -> Self {
        Self::new(bits, RANK_BLOCK_SIZE)
    }

    fn build_table(bits: &BitVector, block_size: usize) -> Vec<u32> {
        let words_per_block = block_size / WORD_BITS;
        let num_blocks = bits.num_bits() / block_size + 1;
        let mut table = Vec::with_capacity(num_blocks);
        let mut cumulative = 0u32;
        for block in 0..num_blocks - 1 {
            table.push(cumulative);
            cumulative +=
                popcount_prefix(bits.words(), block * words_per_block, block_size) as u32;
        }
        table.push(cumulative);
        table
    }

    /// Count the set bits in positions `[0, pos]`.
    ///
    /// Positions at or past the end clamp to the total set-bit count.
    #[inline]
    pub fn rank(&self, pos: usize) -> usize {
        if self.bits.num_bits() == 0 {
            return 0;
        }
        let pos = pos.min(self.bits.num_bits() - 1);
        let block = pos / self.block_size;
        let offset = pos % self.block_size;
        self.rank_table[block] as usize
            + popcount_prefix(
                self.bits.words(),
                block * (self.block_size / WORD_BITS),
                offset + 1,
            )
    }

    /// Total number of set bits
    pub fn num_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Read the bit at the specified position
    #[inline]
    pub fn read_bit(&self, pos: usize) -> bool {
        self.bits.read_bit(pos)
    }

    /// Number of bits in the underlying vector
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.bits.num_bits()
    }

    /// Access the underlying bit vector
    #[inline]
    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    /// The rank acceleration table
    pub fn rank_table(&self) -> &[u32] {
        &self.rank_table
    }

    /// Bytes occupied by bits plus the rank table
    pub fn memory_usage(&self) -> usize {
        self.bits.bytes_occupied() + self.rank_table.len() * 4
    }

    /// Byte length of the serialized form
    pub fn serialized_size(&self) -> usize {
        4 + 4 + self.bits.bytes_occupied() + self.rank_table.len() * 4
    }

    /// Write `num_bits | block_size | words | rank table`, big-endian
    pub fn serialize<W: DataOutput>(&self, out: &mut W) -> Result<()> {
        out.write_u32(self.bits.num_bits() as u32)?;
        out.write_u32(self.block_size as u32)?;
        for &word in self.bits.words() {
            out.write_u64(word)?;
        }
        for &entry in &self.rank_table {
            out.write_u32(entry)?;
        }
        Ok(())
    }

    /// Read back a vector written by [`serialize`](Self::serialize)
    pub fn deserialize<R: DataInput>(input: &mut R) -> Result<Self> {
        let num_bits = input.read_u32()? as usize;
        let block_size = input.read_u32()? as usize;
        if block_size == 0 || block_size % WORD_BITS != 0 {
            return Err(SurfError::corrupt_stream(format!(
                "invalid rank block size {}",
                block_size
            )));
        }
        let num_words = (num_bits + WORD_BITS - 1) / WORD_BITS;
        let num_blocks = num_bits / block_size + 1;
        if input.remaining() < num_words * 8 + num_blocks * 4 {
            return Err(SurfError::corrupt_stream(
                "rank vector truncated".to_string(),
            ));
        }
        let mut words = Vec::with_capacity(num_words);
        for _ in 0..num_words {
            words.push(input.read_u64()?);
        }
        let mut rank_table = Vec::with_capacity(num_blocks);
        for _ in 0..num_blocks {
            rank_table.push(input.read_u32()?);
        }
        let bits = BitVector::from_raw(words, num_bits);
        Ok(Self {
            bits,
            block_size,
            rank_table,
        })
    }
}
