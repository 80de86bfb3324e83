//! Constant-time select over a packed bit vector
//!
//! A [`BitVector`] plus a table holding the position of every
//! [`SELECT_SAMPLE_INTERVAL`]-th set bit. A query reads one sample and
//! scans forward at most one sample interval of words.

use crate::error::{Result, SurfError};
use crate::io::{DataInput, DataOutput};
use crate::succinct::{BitVector, SELECT_SAMPLE_INTERVAL, WORD_BITS};

/// Bit vector with an O(1) one-based select operation
///
/// `select(k)` returns the zero-based position of the k-th set bit.
/// The first table slot stores the position of the first set bit; slot
/// `i > 0` stores the position of the `i * interval`-th set bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectVector {
    bits: BitVector,
    sample_interval: usize,
    num_ones: usize,
    select_table: Vec<u32>,
}

/// Position (MSB-first) of the k-th (one-based) set bit within a word
#[inline]
pub(crate) fn select_in_word(word: u64, k: usize) -> usize {
    debug_assert!(k >= 1 && k <= word.count_ones() as usize);
    let mut remaining = k;
    for byte_idx in 0..8 {
        let byte = (word >> (56 - 8 * byte_idx)) as u8;
        let ones = byte.count_ones() as usize;
        if remaining <= ones {
            for bit in 0..8 {
                if byte & (0x80u8 >> bit) != 0 {
                    remaining -= 1;
                    if remaining == 0 {
                        return byte_idx * 8 + bit;
                    }
                }
            }
        }
        remaining -= ones;
    }
    unreachable!("select_in_word called with rank beyond popcount")
}

impl SelectVector {
    /// Wrap a bit vector, building the sample table for the given interval
    pub fn new(bits: BitVector, sample_interval: usize) -> Self {
        let (select_table, num_ones) = Self::build_table(&bits, sample_interval);
        Self {
            bits,
            sample_interval,
            num_ones,
            select_table,
        }
    }

    /// Wrap with the default 64-set-bit sampling interval
    pub fn with_default_interval(bits: BitVector) -> Self {
        Self::new(bits, SELECT_SAMPLE_INTERVAL)
    }

    fn build_table(bits: &BitVector, sample_interval: usize) -> (Vec<u32>, usize) {
        let first_one = bits
            .words()
            .iter()
            .enumerate()
            .find(|(_, &w)| w != 0)
            .map(|(i, &w)| i * WORD_BITS + w.leading_zeros() as usize)
            .unwrap_or(0);
        let mut table = vec![first_one as u32];
        let mut sampling = sample_interval;
        let mut cumulative = 0usize;
        for (i, &word) in bits.words().iter().enumerate() {
            let ones = word.count_ones() as usize;
            while sampling <= cumulative + ones {
                let diff = sampling - cumulative;
                table.push((i * WORD_BITS + select_in_word(word, diff)) as u32);
                sampling += sample_interval;
            }
            cumulative += ones;
        }
        (table, cumulative)
    }

    /// Position of the k-th set bit (k is one-based).
    ///
    /// Ranks past the last set bit return `num_bits` as a one-past-the-end
    /// sentinel.
    pub fn select(&self, k: usize) -> usize {
        debug_assert!(k >= 1);
        if k > self.num_ones {
            return self.bits.num_bits();
        }
        let lut_idx = k / self.sample_interval;
        let mut rank_left = k % self.sample_interval;
        // the first slot stores the position of the very first set bit
        if lut_idx == 0 {
            rank_left -= 1;
        }
        let pos = self.select_table[lut_idx] as usize;
        if rank_left == 0 {
            return pos;
        }

        let mut word_id = pos / WORD_BITS;
        let offset = pos % WORD_BITS;
        let mut word = if offset == WORD_BITS - 1 {
            word_id += 1;
            self.bits.word(word_id)
        } else {
            // clear the bits at and before the sampled position
            (self.bits.word(word_id) << (offset + 1)) >> (offset + 1)
        };
        let mut ones = word.count_ones() as usize;
        while ones < rank_left {
            word_id += 1;
            word = self.bits.word(word_id);
            rank_left -= ones;
            ones = word.count_ones() as usize;
        }
        word_id * WORD_BITS + select_in_word(word, rank_left)
    }

    /// Total number of set bits
    #[inline]
    pub fn num_ones(&self) -> usize {
        self.num_ones
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

    /// Distance from `pos` to the next set bit after it
    #[inline]
    pub fn distance_to_next_set_bit(&self, pos: usize) -> usize {
        self.bits.distance_to_next_set_bit(pos)
    }

    /// Access the underlying bit vector
    #[inline]
    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    /// The select sample table
    pub fn select_table(&self) -> &[u32] {
        &self.select_table
    }

    /// Bytes occupied by bits plus the select table
    pub fn memory_usage(&self) -> usize {
        self.bits.bytes_occupied() + self.select_table.len() * 4
    }

    /// Byte length of the serialized form
    pub fn serialized_size(&self) -> usize {
        4 + 4 + 4 + self.bits.bytes_occupied() + (self.num_ones / self.sample_interval + 1) * 4
    }

    /// Write `num_bits | interval | num_ones | words | select table`
    pub fn serialize<W: DataOutput>(&self, out: &mut W) -> Result<()> {
        out.write_u32(self.bits.num_bits() as u32)?;
        out.write_u32(self.sample_interval as u32)?;
        out.write_u32(self.num_ones as u32)?;
        for &word in self.bits.words() {
            out.write_u64(word)?;
        }
        for &entry in &self.select_table {
            out.write_u32(entry)?;
        }
        Ok(())
    }

    /// Read back a vector written by [`serialize`](Self::serialize)
    pub fn deserialize<R: DataInput>(input: &mut R) -> Result<Self> {
        let num_bits = input.read_u32()? as usize;
        let sample_interval = input.read_u32()? as usize;
        let num_ones = input.read_u32()? as usize;
        if sample_interval == 0 {
            return Err(SurfError::corrupt_stream(
                "select sample interval is zero".to_string(),
            ));
        }
        if num_ones > num_bits {
            return Err(SurfError::corrupt_stream(format!(
                "select vector claims {} set bits in {} bits",
                num_ones, num_bits
            )));
        }
        let num_words = (num_bits + WORD_BITS - 1) / WORD_BITS;
        let num_samples = num_ones / sample_interval + 1;
        if input.remaining() < num_words * 8 + num_samples * 4 {
            return Err(SurfError::corrupt_stream(
                "select vector truncated".to_string(),
            ));
        }
        let mut words = Vec::with_capacity(num_words);
        for _ in 0..num_words {
            words.push(input.read_u64()?);
        }
        let mut select_table = Vec::with_capacity(num_samples);
        for _ in 0..num_samples {
            select_table.push(input.read_u32()?);
        }
        Ok(Self {
            bits: BitVector::from_raw(words, num_bits),
            sample_interval,
            num_ones,
            select_table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{SliceDataInput, VecDataOutput};
    use crate::succinct::{RankVector, MSB_MASK};

    fn from_bools(bits: &[bool]) -> SelectVector {
        let mut words = vec![0u64; (bits.len() + 63) / 64];
        for (i, &b) in bits.iter().enumerate() {
            if b {
                words[i / 64] |= MSB_MASK >> (i % 64);
            }
        }
        let bv = BitVector::from_level_words(&[words], &[bits.len()], 0, 1);
        SelectVector::with_default_interval(bv)
    }

    fn naive_select(bits: &[bool], k: usize) -> Option<usize> {
        let mut seen = 0;
        for (i, &b) in bits.iter().enumerate() {
            if b {
                seen += 1;
                if seen == k {
                    return Some(i);
                }
            }
        }
        None
    }

    #[test]
    fn test_select_in_word() {
        assert_eq!(select_in_word(MSB_MASK, 1), 0);
        assert_eq!(select_in_word(1, 1), 63);
        assert_eq!(select_in_word(u64::MAX, 1), 0);
        assert_eq!(select_in_word(u64::MAX, 64), 63);
        assert_eq!(select_in_word(u64::MAX, 33), 32);
        // 100101000...
        let word = MSB_MASK | (MSB_MASK >> 3) | (MSB_MASK >> 5);
        assert_eq!(select_in_word(word, 1), 0);
        assert_eq!(select_in_word(word, 2), 3);
        assert_eq!(select_in_word(word, 3), 5);
    }

    #[test]
    fn test_select_small() {
        // 100101000
        let bits = [
            true, false, false, true, false, true, false, false, false,
        ];
        let sv = from_bools(&bits);
        assert_eq!(sv.num_ones(), 3);
        assert_eq!(sv.select(1), 0);
        assert_eq!(sv.select(2), 3);
        assert_eq!(sv.select(3), 5);
        // beyond the last set bit: one-past-the-end sentinel
        assert_eq!(sv.select(4), 9);
    }

    #[test]
    fn test_select_across_samples() {
        let bits: Vec<bool> = (0..3000).map(|i| i % 3 == 0).collect();
        let sv = from_bools(&bits);
        let total = sv.num_ones();
        assert_eq!(total, 1000);
        for k in [1, 2, 63, 64, 65, 127, 128, 129, 500, 999, 1000] {
            assert_eq!(sv.select(k), naive_select(&bits, k).unwrap(), "k {}", k);
        }
    }

    #[test]
    fn test_select_sparse_pattern() {
        let mut bits = vec![false; 5000];
        let positions = [0usize, 63, 64, 500, 1500, 4999];
        for &p in &positions {
            bits[p] = true;
        }
        let sv = from_bools(&bits);
        for (k, &p) in positions.iter().enumerate() {
            assert_eq!(sv.select(k + 1), p);
        }
        assert_eq!(sv.select(positions.len() + 1), 5000);
    }

    #[test]
    fn test_rank_select_duality() {
        let bits: Vec<bool> = (0..2048)
            .map(|i| (i * i + 3 * i) % 7 == 0 || i % 13 == 0)
            .collect();
        let sv = from_bools(&bits);
        let mut words = vec![0u64; (bits.len() + 63) / 64];
        for (i, &b) in bits.iter().enumerate() {
            if b {
                words[i / 64] |= MSB_MASK >> (i % 64);
            }
        }
        let rv = RankVector::with_default_block(BitVector::from_level_words(
            &[words],
            &[bits.len()],
            0,
            1,
        ));
        for k in 1..=sv.num_ones() {
            let pos = sv.select(k);
            assert_eq!(rv.rank(pos), k, "rank(select({})) mismatch", k);
        }
    }

    #[test]
    fn test_empty() {
        let sv = SelectVector::with_default_interval(BitVector::new());
        assert_eq!(sv.num_ones(), 0);
        assert_eq!(sv.select(1), 0);
        assert_eq!(sv.select_table(), &[0]);
    }

    #[test]
    fn test_serialize_round_trip_is_byte_identical() {
        let bits: Vec<bool> = (0..900).map(|i| i % 4 == 0).collect();
        let sv = from_bools(&bits);

        let mut out = VecDataOutput::new();
        sv.serialize(&mut out).unwrap();
        assert_eq!(out.bytes_written(), sv.serialized_size());
        let bytes = out.into_vec();

        let mut input = SliceDataInput::new(&bytes);
        let sv2 = SelectVector::deserialize(&mut input).unwrap();
        assert_eq!(sv, sv2);

        let rebuilt = SelectVector::new(sv2.bits().clone(), SELECT_SAMPLE_INTERVAL);
        assert_eq!(sv2.select_table(), rebuilt.select_table());
    }

    #[test]
    fn test_deserialize_inconsistent_counts() {
        let mut out = VecDataOutput::new();
        out.write_u32(8).unwrap(); // num_bits
        out.write_u32(64).unwrap(); // interval
        out.write_u32(20).unwrap(); // num_ones > num_bits
        out.write_u64(0).unwrap();
        out.write_u32(0).unwrap();
        let bytes = out.into_vec();
        assert!(SelectVector::deserialize(&mut SliceDataInput::new(&bytes)).is_err());
    }
}
