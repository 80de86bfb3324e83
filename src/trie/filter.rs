//! The composed range filter
//!
//! [`Surf`] owns the two tier encodings and routes every query through
//! them: point lookups descend the dense bitmaps and hand over to the
//! sparse arrays at the cutover; ordered queries drive a tier-crossing
//! iterator. Built once from sorted keys, immutable afterwards, and
//! freely shareable across threads.

use crate::config::SurfConfig;
use crate::error::{Result, SurfError};
use crate::io::{DataOutput, SliceDataInput, VecDataOutput};
use crate::trie::dense::{DenseIter, DenseLookup, LoudsDense};
use crate::trie::sparse::{LoudsSparse, SparseIter};
use crate::trie::{KeyCompare, SurfBuilder};

/// Succinct range filter over a static set of byte-string keys.
///
/// Answers point and range membership with no false negatives and a
/// false-positive rate bounded by the configured suffix length.
///
/// # Examples
///
/// ```rust
/// use rsurf::Surf;
///
/// let keys: Vec<&[u8]> = vec![b"apple", b"banana", b"cherry"];
/// let filter = Surf::new(&keys)?;
///
/// assert!(filter.lookup(b"banana"));
/// assert!(filter.lookup_range(b"apricot", true, b"blueberry", true));
/// # Ok::<(), rsurf::SurfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Surf {
    dense: LoudsDense,
    sparse: LoudsSparse,
}

impl Surf {
    /// Build a filter over sorted, unique keys with the default
    /// configuration
    pub fn new<K: AsRef<[u8]>>(keys: &[K]) -> Result<Self> {
        Self::with_config(keys, SurfConfig::default())
    }

    /// Build a filter over sorted, unique keys
    pub fn with_config<K: AsRef<[u8]>>(keys: &[K], config: SurfConfig) -> Result<Self> {
        let mut builder = SurfBuilder::new(config)?;
        builder.build(keys)?;
        let dense = LoudsDense::from_builder(&builder);
        let sparse = LoudsSparse::from_builder(&builder);
        log::debug!(
            "filter over {} keys occupies {} bytes",
            builder.num_keys(),
            dense.memory_usage() + sparse.memory_usage()
        );
        Ok(Self { dense, sparse })
    }

    /// Point membership: false means definitely absent
    pub fn lookup(&self, key: &[u8]) -> bool {
        match self.dense.lookup(key) {
            DenseLookup::Miss => false,
            DenseLookup::Leaf(verdict) => verdict,
            DenseLookup::PassToSparse(node_num) => self.sparse.lookup(key, node_num),
        }
    }

    /// Range membership: false means no key lies in the interval
    pub fn lookup_range(
        &self,
        left: &[u8],
        left_inclusive: bool,
        right: &[u8],
        right_inclusive: bool,
    ) -> bool {
        let iter = self.seek(left, left_inclusive);
        if !iter.is_valid() {
            return false;
        }
        match iter.compare(right) {
            KeyCompare::CouldBePositive => true,
            KeyCompare::Less => true,
            KeyCompare::Equal => right_inclusive,
            KeyCompare::Greater => false,
        }
    }

    /// Position an iterator at the first key `>= key` (`> key` when not
    /// inclusive)
    pub fn move_to_key_greater_than(&self, key: &[u8], inclusive: bool) -> SurfIter<'_> {
        self.seek(key, inclusive)
    }

    fn seek(&self, key: &[u8], inclusive: bool) -> SurfIter<'_> {
        let mut iter = SurfIter::new(self);
        if self.height() == 0 {
            return iter;
        }
        iter.could_be_fp = self
            .dense
            .move_to_key_greater_than(key, inclusive, &mut iter.dense);
        if !iter.dense.is_valid() || iter.dense.is_complete() {
            return iter;
        }
        if !iter.dense.is_search_complete() {
            iter.pass_to_sparse();
            iter.could_be_fp = self
                .sparse
                .move_to_key_greater_than(key, inclusive, &mut iter.sparse);
            if !iter.sparse.is_valid() {
                iter.increment_dense();
            }
        } else if !iter.dense.is_move_left_complete() {
            iter.pass_to_sparse();
            iter.sparse.move_to_leftmost_key();
        }
        iter
    }

    /// Position an iterator at the last key `<= key` (`< key` when not
    /// inclusive)
    pub fn move_to_key_less_than(&self, key: &[u8], inclusive: bool) -> SurfIter<'_> {
        let mut iter = self.seek(key, false);
        if !iter.is_valid() {
            return self.move_to_last();
        }
        if !iter.could_be_fp {
            iter.prev();
            if !inclusive && self.lookup(key) {
                iter.prev();
            }
        }
        iter
    }

    /// Position an iterator at the smallest stored key
    pub fn move_to_first(&self) -> SurfIter<'_> {
        let mut iter = SurfIter::new(self);
        if self.height() == 0 {
            return iter;
        }
        if self.dense.height() > 0 {
            iter.dense.set_to_first_label_in_root();
            iter.dense.move_to_leftmost_key();
            if iter.dense.is_move_left_complete() {
                return iter;
            }
            iter.pass_to_sparse();
            iter.sparse.move_to_leftmost_key();
        } else {
            iter.dense.set_pass_through();
            iter.sparse.set_to_first_label_in_root();
            iter.sparse.move_to_leftmost_key();
        }
        iter
    }

    /// Position an iterator at the largest stored key
    pub fn move_to_last(&self) -> SurfIter<'_> {
        let mut iter = SurfIter::new(self);
        if self.height() == 0 {
            return iter;
        }
        if self.dense.height() > 0 {
            iter.dense.set_to_last_label_in_root();
            iter.dense.move_to_rightmost_key();
            if iter.dense.is_move_right_complete() {
                return iter;
            }
            iter.pass_to_sparse();
            iter.sparse.move_to_rightmost_key();
        } else {
            iter.dense.set_pass_through();
            iter.sparse.set_to_last_label_in_root();
            iter.sparse.move_to_rightmost_key();
        }
        iter
    }

    /// Estimate of `|keys strictly between left and right|`; may
    /// undercount by at most two at the interval boundaries
    pub fn approx_count(&self, left: &[u8], right: &[u8]) -> u64 {
        if self.height() == 0 {
            return 0;
        }
        let left_iter = self.seek(left, true);
        if !left_iter.is_valid() {
            return 0;
        }
        let mut right_iter = self.seek(right, true);
        if !right_iter.is_valid() {
            right_iter = self.move_to_last();
        }
        if !right_iter.is_valid() {
            return 0;
        }
        self.approx_count_between(&left_iter, &right_iter)
    }

    /// Count leaves strictly between two positioned iterators
    pub fn approx_count_between(&self, left: &SurfIter<'_>, right: &SurfIter<'_>) -> u64 {
        if !left.is_valid() || !right.is_valid() {
            return 0;
        }
        let (count, out_left, out_right) = self.dense.approx_count(&left.dense, &right.dense);
        count + self.sparse.approx_count(&left.sparse, &right.sparse, out_left, out_right)
    }

    /// Trie height (number of levels across both tiers)
    pub fn height(&self) -> usize {
        self.sparse.height()
    }

    /// First level encoded by the sparse tier
    pub fn sparse_start_level(&self) -> usize {
        self.sparse.start_level()
    }

    /// Bytes used by both tiers, including rank/select tables
    pub fn memory_usage(&self) -> usize {
        self.dense.memory_usage() + self.sparse.memory_usage()
    }

    /// Byte length of the serialized form, computed without serializing
    pub fn serialized_size(&self) -> usize {
        self.dense.serialized_size() + self.sparse.serialized_size()
    }

    /// Write the filter (dense tier then sparse tier) to `out`
    pub fn serialize_into<W: DataOutput>(&self, out: &mut W) -> Result<()> {
        self.dense.serialize(out)?;
        self.sparse.serialize(out)
    }

    /// Serialize into a fresh byte vector
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = VecDataOutput::with_capacity(self.serialized_size());
        self.serialize_into(&mut out)?;
        Ok(out.into_vec())
    }

    /// Rebuild a filter from bytes written by
    /// [`serialize`](Self::serialize). Header inconsistencies yield
    /// [`SurfError::CorruptStream`] and no partial filter.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let mut input = SliceDataInput::new(bytes);
        let dense = LoudsDense::deserialize(&mut input)?;
        let sparse = LoudsSparse::deserialize(&mut input)?;
        if dense.height() != sparse.start_level() {
            return Err(SurfError::corrupt_stream(format!(
                "dense tier ends at level {} but sparse tier starts at {}",
                dense.height(),
                sparse.start_level()
            )));
        }
        Ok(Self { dense, sparse })
    }
}

/// Tier-crossing iterator over a filter's stored keys.
///
/// Composes one iterator per tier; the key is the concatenation of the
/// dense and sparse key fragments. Borrowed from the filter and never
/// outlives it; not shareable across threads while in use.
#[derive(Debug, Clone)]
pub struct SurfIter<'a> {
    dense: DenseIter<'a>,
    sparse: SparseIter<'a>,
    could_be_fp: bool,
}

impl<'a> SurfIter<'a> {
    fn new(filter: &'a Surf) -> Self {
        Self {
            dense: DenseIter::new(&filter.dense),
            sparse: SparseIter::new(&filter.sparse),
            could_be_fp: false,
        }
    }

    /// True when the iterator points at a key
    pub fn is_valid(&self) -> bool {
        self.dense.is_valid() && (self.dense.is_complete() || self.sparse.is_valid())
    }

    /// True when the current position may be a false positive (the
    /// stored suffix could not disambiguate the seek key)
    pub fn could_be_false_positive(&self) -> bool {
        self.could_be_fp
    }

    /// Reset to the cleared, invalid state
    pub fn clear(&mut self) {
        self.dense.clear();
        self.sparse.clear();
        self.could_be_fp = false;
    }

    /// The current key (dense fragment then sparse fragment)
    pub fn key(&self) -> Vec<u8> {
        if !self.is_valid() {
            return Vec::new();
        }
        if self.dense.is_complete() {
            return self.dense.key().to_vec();
        }
        let mut key = self.dense.key().to_vec();
        key.extend_from_slice(self.sparse.key());
        key
    }

    /// Stored real-suffix bits at the current leaf, with their length
    pub fn suffix(&self) -> (u64, u32) {
        if !self.is_valid() {
            return (0, 0);
        }
        if self.dense.is_complete() {
            self.dense.suffix()
        } else {
            self.sparse.suffix()
        }
    }

    /// The current key extended with the whole bytes of its stored real
    /// suffix; the second value is how many bits of the final byte are
    /// significant (0 means all of them)
    pub fn key_with_suffix(&self) -> (Vec<u8>, u32) {
        let mut key = self.key();
        let (suffix, len) = self.suffix();
        let mut bit_len = 0;
        if len > 0 && suffix > 0 {
            bit_len = len % 8;
            let shifted = suffix << (64 - len);
            let mut consumed = 0;
            let mut byte_idx = 0;
            while consumed < len {
                key.push((shifted >> (56 - 8 * byte_idx)) as u8);
                consumed += 8;
                byte_idx += 1;
            }
        }
        (key, bit_len)
    }

    /// Compare the current key against a probe key
    pub fn compare(&self, key: &[u8]) -> KeyCompare {
        debug_assert!(self.is_valid());
        let dense_compare = self.dense.compare(key);
        if self.dense.is_complete() || dense_compare != KeyCompare::Equal {
            return dense_compare;
        }
        self.sparse.compare(key)
    }

    /// Advance to the next stored key; returns the resulting validity
    pub fn next(&mut self) -> bool {
        if !self.is_valid() {
            return false;
        }
        if self.increment_sparse() {
            return true;
        }
        self.increment_dense()
    }

    /// Step back to the previous stored key; returns the resulting
    /// validity
    pub fn prev(&mut self) -> bool {
        if !self.is_valid() {
            return false;
        }
        if self.decrement_sparse() {
            return true;
        }
        self.decrement_dense()
    }

    fn pass_to_sparse(&mut self) {
        self.sparse.set_start_node_num(self.dense.send_out_node_num());
    }

    fn increment_sparse(&mut self) -> bool {
        if !self.sparse.is_valid() {
            return false;
        }
        self.sparse.next();
        self.sparse.is_valid()
    }

    fn increment_dense(&mut self) -> bool {
        if !self.dense.is_valid() {
            return false;
        }
        self.dense.next();
        if !self.dense.is_valid() {
            return false;
        }
        if self.dense.is_move_left_complete() {
            return true;
        }
        self.pass_to_sparse();
        self.sparse.move_to_leftmost_key();
        true
    }

    fn decrement_sparse(&mut self) -> bool {
        if !self.sparse.is_valid() {
            return false;
        }
        self.sparse.prev();
        self.sparse.is_valid()
    }

    fn decrement_dense(&mut self) -> bool {
        if !self.dense.is_valid() {
            return false;
        }
        self.dense.prev();
        if !self.dense.is_valid() {
            return false;
        }
        if self.dense.is_move_right_complete() {
            return true;
        }
        self.pass_to_sparse();
        self.sparse.move_to_rightmost_key();
        true
    }
}
