//! Packed bit vector with efficient storage and access
//!
//! Provides the immutable bit array underneath the rank/select structures
//! and the suffix store. Bit `i` lives in word `i / 64` at mask
//! `MSB >> (i % 64)`, so concatenated words read in big-endian byte order
//! reproduce the bit stream.

use std::fmt;

use crate::error::{Result, SurfError};
use crate::io::{DataInput, DataOutput};
use crate::succinct::{MSB_MASK, WORD_BITS};

/// A compact bit vector storing bits MSB-first in u64 words
///
/// Built once from per-level packed words and read-only afterwards. All
/// positions are zero-based bit indices.
#[derive(Clone, PartialEq, Eq)]
pub struct BitVector {
    words: Vec<u64>,
    num_bits: usize,
}

impl BitVector {
    /// Create a new empty bit vector
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            num_bits: 0,
        }
    }

    /// Build by concatenating per-level packed word vectors bit-wise.
    ///
    /// Levels in `[start_level, end_level)` contribute
    /// `bits_per_level[level]` bits each, taken MSB-first from
    /// `words_per_level[level]`. The concatenation is contiguous: no
    /// padding is inserted between levels.
    pub fn from_level_words(
        words_per_level: &[Vec<u64>],
        bits_per_level: &[usize],
        start_level: usize,
        end_level: usize,
    ) -> Self {
        let total: usize = bits_per_level[start_level..end_level].iter().sum();
        let mut bv = Self {
            words: Vec::with_capacity((total + WORD_BITS - 1) / WORD_BITS),
            num_bits: 0,
        };
        for level in start_level..end_level {
            bv.append_packed(&words_per_level[level], bits_per_level[level]);
        }
        bv
    }

    /// Build directly from packed words; callers guarantee `words` holds
    /// exactly `ceil(num_bits / 64)` entries with clean padding.
    pub(crate) fn from_raw(words: Vec<u64>, num_bits: usize) -> Self {
        debug_assert_eq!(words.len(), (num_bits + WORD_BITS - 1) / WORD_BITS);
        Self { words, num_bits }
    }

    /// Append the first `num_bits` bits (MSB-first) of `src`
    fn append_packed(&mut self, src: &[u64], num_bits: usize) {
        let mut remaining = num_bits;
        let mut idx = 0;
        while remaining > 0 {
            let take = remaining.min(WORD_BITS);
            self.push_word_bits(src[idx], take);
            idx += 1;
            remaining -= take;
        }
    }

    /// Append the top `n` bits of `word` (1 <= n <= 64)
    fn push_word_bits(&mut self, word: u64, n: usize) {
        let mask = if n == WORD_BITS {
            u64::MAX
        } else {
            u64::MAX << (WORD_BITS - n)
        };
        let w = word & mask;
        let offset = self.num_bits % WORD_BITS;
        if offset == 0 {
            self.words.push(w);
        } else {
            *self.words.last_mut().unwrap() |= w >> offset;
            if offset + n > WORD_BITS {
                self.words.push(w << (WORD_BITS - offset));
            }
        }
        self.num_bits += n;
    }

    /// Get the number of bits in the vector
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Check if the bit vector is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    /// Number of storage words occupied
    #[inline]
    pub fn num_words(&self) -> usize {
        (self.num_bits + WORD_BITS - 1) / WORD_BITS
    }

    /// Number of bytes occupied by the packed bits
    #[inline]
    pub fn bytes_occupied(&self) -> usize {
        self.num_words() * 8
    }

    /// Read the bit at the specified position
    #[inline]
    pub fn read_bit(&self, pos: usize) -> bool {
        debug_assert!(pos < self.num_bits);
        self.words[pos / WORD_BITS] & (MSB_MASK >> (pos % WORD_BITS)) != 0
    }

    /// Get the storage word at the specified word index
    #[inline]
    pub fn word(&self, idx: usize) -> u64 {
        self.words[idx]
    }

    /// Access the underlying packed words
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Count the set bits in the entire vector
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Distance from `pos` to the next set bit after it.
    ///
    /// Returns `num_bits - pos` when no later bit is set, so `pos + d`
    /// lands one past the end in that case.
    pub fn distance_to_next_set_bit(&self, pos: usize) -> usize {
        debug_assert!(pos < self.num_bits);
        let start = pos + 1;
        if start >= self.num_bits {
            return self.num_bits - pos;
        }
        let mut word_id = start / WORD_BITS;
        let offset = start % WORD_BITS;
        let test = self.words[word_id] << offset;
        if test != 0 {
            let cand = start + test.leading_zeros() as usize;
            if cand < self.num_bits {
                return cand - pos;
            }
            return self.num_bits - pos;
        }
        let last = self.num_words() - 1;
        while word_id < last {
            word_id += 1;
            let w = self.words[word_id];
            if w != 0 {
                let cand = word_id * WORD_BITS + w.leading_zeros() as usize;
                if cand < self.num_bits {
                    return cand - pos;
                }
                return self.num_bits - pos;
            }
        }
        self.num_bits - pos
    }

    /// Distance from `pos` back to the nearest set bit before it, or
    /// `None` when no earlier bit is set.
    pub fn distance_to_prev_set_bit(&self, pos: usize) -> Option<usize> {
        if pos == 0 {
            return None;
        }
        let p = pos - 1;
        let mut word_id = p / WORD_BITS;
        let offset = p % WORD_BITS;
        let test = self.words[word_id] >> (WORD_BITS - 1 - offset);
        if test != 0 {
            return Some(pos - p + test.trailing_zeros() as usize);
        }
        while word_id > 0 {
            word_id -= 1;
            let w = self.words[word_id];
            if w != 0 {
                let bitpos = word_id * WORD_BITS + WORD_BITS - 1 - w.trailing_zeros() as usize;
                return Some(pos - bitpos);
            }
        }
        None
    }

    /// Byte length of the raw serialized form
    pub fn serialized_size(&self) -> usize {
        4 + self.bytes_occupied()
    }

    /// Write `num_bits` then the packed words, big-endian
    pub fn serialize<W: DataOutput>(&self, out: &mut W) -> Result<()> {
        out.write_u32(self.num_bits as u32)?;
        for &word in &self.words {
            out.write_u64(word)?;
        }
        Ok(())
    }

    /// Read back a vector written by [`serialize`](Self::serialize)
    pub fn deserialize<R: DataInput>(input: &mut R) -> Result<Self> {
        let num_bits = input.read_u32()? as usize;
        let num_words = (num_bits + WORD_BITS - 1) / WORD_BITS;
        if input.remaining() < num_words * 8 {
            return Err(SurfError::corrupt_stream(format!(
                "bit vector claims {} bits but only {} bytes remain",
                num_bits,
                input.remaining()
            )));
        }
        let mut words = Vec::with_capacity(num_words);
        for _ in 0..num_words {
            words.push(input.read_u64()?);
        }
        Ok(Self::from_raw(words, num_bits))
    }
}

impl Default for BitVector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector {{ num_bits: {}, bits: [", self.num_bits)?;
        for i in 0..self.num_bits.min(64) {
            write!(f, "{}", if self.read_bit(i) { '1' } else { '0' })?;
        }
        if self.num_bits > 64 {
            write!(f, "...")?;
        }
        write!(f, "] }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{SliceDataInput, VecDataOutput};

    /// Pack a bool slice MSB-first into words, builder-style.
    pub(crate) fn pack(bits: &[bool]) -> (Vec<u64>, usize) {
        let mut words = vec![0u64; (bits.len() + 63) / 64];
        for (i, &b) in bits.iter().enumerate() {
            if b {
                words[i / 64] |= MSB_MASK >> (i % 64);
            }
        }
        (words, bits.len())
    }

    fn from_bools(bits: &[bool]) -> BitVector {
        let (words, n) = pack(bits);
        BitVector::from_level_words(&[words], &[n], 0, 1)
    }

    #[test]
    fn test_empty() {
        let bv = BitVector::new();
        assert_eq!(bv.num_bits(), 0);
        assert_eq!(bv.num_words(), 0);
        assert!(bv.is_empty());
        assert_eq!(bv.count_ones(), 0);
    }

    #[test]
    fn test_read_bit() {
        let bv = from_bools(&[true, false, true, true, false]);
        assert!(bv.read_bit(0));
        assert!(!bv.read_bit(1));
        assert!(bv.read_bit(2));
        assert!(bv.read_bit(3));
        assert!(!bv.read_bit(4));
        assert_eq!(bv.count_ones(), 3);
    }

    #[test]
    fn test_msb_first_layout() {
        let bv = from_bools(&[true]);
        assert_eq!(bv.word(0), MSB_MASK);
    }

    #[test]
    fn test_level_concatenation_is_bitwise() {
        // 5 bits + 3 bits must pack into one contiguous 8-bit prefix
        let (w0, _) = pack(&[true, false, true, false, true]);
        let (w1, _) = pack(&[true, true, false]);
        let bv = BitVector::from_level_words(&[w0, w1], &[5, 3], 0, 2);
        assert_eq!(bv.num_bits(), 8);
        let expected = [true, false, true, false, true, true, true, false];
        for (i, &b) in expected.iter().enumerate() {
            assert_eq!(bv.read_bit(i), b, "bit {}", i);
        }
    }

    #[test]
    fn test_concatenation_across_word_boundary() {
        let a: Vec<bool> = (0..70).map(|i| i % 3 == 0).collect();
        let b: Vec<bool> = (0..50).map(|i| i % 7 == 0).collect();
        let (wa, na) = pack(&a);
        let (wb, nb) = pack(&b);
        let bv = BitVector::from_level_words(&[wa, wb], &[na, nb], 0, 2);
        assert_eq!(bv.num_bits(), 120);
        for i in 0..70 {
            assert_eq!(bv.read_bit(i), i % 3 == 0, "bit {}", i);
        }
        for i in 0..50 {
            assert_eq!(bv.read_bit(70 + i), i % 7 == 0, "bit {}", 70 + i);
        }
    }

    #[test]
    fn test_level_range_selection() {
        let (w0, _) = pack(&[true, true]);
        let (w1, _) = pack(&[false, true, false]);
        let (w2, _) = pack(&[true]);
        let levels = vec![w0, w1, w2];
        let bits = vec![2usize, 3, 1];
        let bv = BitVector::from_level_words(&levels, &bits, 1, 3);
        assert_eq!(bv.num_bits(), 4);
        assert!(!bv.read_bit(0));
        assert!(bv.read_bit(1));
        assert!(!bv.read_bit(2));
        assert!(bv.read_bit(3));
    }

    #[test]
    fn test_distance_to_next_set_bit() {
        let mut bits = vec![false; 200];
        bits[0] = true;
        bits[5] = true;
        bits[70] = true;
        bits[199] = true;
        let bv = from_bools(&bits);
        assert_eq!(bv.distance_to_next_set_bit(0), 5);
        assert_eq!(bv.distance_to_next_set_bit(5), 65);
        assert_eq!(bv.distance_to_next_set_bit(70), 129);
        // past the last set bit: distance to one-past-the-end
        assert_eq!(bv.distance_to_next_set_bit(199), 1);
        assert_eq!(bv.distance_to_next_set_bit(100), 99);
    }

    #[test]
    fn test_distance_to_prev_set_bit() {
        let mut bits = vec![false; 200];
        bits[3] = true;
        bits[64] = true;
        bits[130] = true;
        let bv = from_bools(&bits);
        assert_eq!(bv.distance_to_prev_set_bit(0), None);
        assert_eq!(bv.distance_to_prev_set_bit(3), None);
        assert_eq!(bv.distance_to_prev_set_bit(4), Some(1));
        assert_eq!(bv.distance_to_prev_set_bit(64), Some(61));
        assert_eq!(bv.distance_to_prev_set_bit(65), Some(1));
        assert_eq!(bv.distance_to_prev_set_bit(130), Some(66));
        assert_eq!(bv.distance_to_prev_set_bit(199), Some(69));
    }

    #[test]
    fn test_serialize_round_trip() {
        let bits: Vec<bool> = (0..300).map(|i| i % 5 == 0 || i % 7 == 0).collect();
        let bv = from_bools(&bits);

        let mut out = VecDataOutput::new();
        bv.serialize(&mut out).unwrap();
        assert_eq!(out.bytes_written(), bv.serialized_size());

        let bytes = out.into_vec();
        let mut input = SliceDataInput::new(&bytes);
        let bv2 = BitVector::deserialize(&mut input).unwrap();
        assert_eq!(bv, bv2);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_deserialize_truncated() {
        let bv = from_bools(&[true; 100]);
        let mut out = VecDataOutput::new();
        bv.serialize(&mut out).unwrap();
        let bytes = out.into_vec();
        let mut input = SliceDataInput::new(&bytes[..bytes.len() - 1]);
        assert!(BitVector::deserialize(&mut input).is_err());
    }
}
