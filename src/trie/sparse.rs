//! LOUDS-sparse lower trie tier
//!
//! Levels below the cutover store one (label, child bit, LOUDS bit)
//! triple per edge. Positions are global across the sparse levels; node
//! `n`'s first edge is found by select over the LOUDS bits, offset by
//! the number of nodes living in the dense tier.

use crate::config::SuffixKind;
use crate::error::{Result, SurfError};
use crate::io::{DataInput, DataOutput, SliceDataInput};
use crate::succinct::{BitVector, RankVector, SelectVector};
use crate::trie::suffix::SuffixCompare;
use crate::trie::{
    KeyCompare, LabelVector, SuffixStore, SurfBuilder, POSITION_MAX, TERMINATOR,
};

/// Lower trie levels in LOUDS-sparse form
#[derive(Debug, Clone)]
pub struct LoudsSparse {
    /// total trie height
    height: usize,
    /// first level encoded here; everything above lives in the dense tier
    start_level: usize,
    dense_node_count: usize,
    dense_child_count: usize,
    /// last edge position belonging to each level (zero below the cutover)
    level_cuts: Vec<u32>,
    labels: LabelVector,
    child_indicator_bits: RankVector,
    louds_bits: SelectVector,
    suffixes: SuffixStore,
}

impl LoudsSparse {
    /// Build the sparse tier from a finished builder
    pub fn from_builder(builder: &SurfBuilder) -> Self {
        let height = builder.tree_height();
        let start_level = builder.sparse_start_level();

        let dense_node_count: usize = builder.node_counts()[..start_level].iter().sum();
        let sparse_root_count = if start_level < height {
            builder.node_counts()[start_level]
        } else {
            0
        };
        let dense_child_count = if start_level == 0 {
            0
        } else {
            dense_node_count + sparse_root_count - 1
        };

        let num_items: Vec<usize> = (0..height).map(|l| builder.num_items(l)).collect();
        let mut level_cuts = vec![0u32; height];
        let mut bit_count = 0usize;
        for level in start_level..height {
            bit_count += num_items[level];
            level_cuts[level] = (bit_count - 1) as u32;
        }

        let suffix_len = builder.suffix_config().total_len() as usize;
        let suffix_bits: Vec<usize> = (0..height)
            .map(|l| builder.suffix_counts()[l] * suffix_len)
            .collect();

        Self {
            height,
            start_level,
            dense_node_count,
            dense_child_count,
            level_cuts,
            labels: LabelVector::from_level_labels(builder.labels(), start_level, height),
            child_indicator_bits: RankVector::with_default_block(BitVector::from_level_words(
                builder.child_indicator_bits(),
                &num_items,
                start_level,
                height,
            )),
            louds_bits: SelectVector::with_default_interval(BitVector::from_level_words(
                builder.louds_bits(),
                &num_items,
                start_level,
                height,
            )),
            suffixes: SuffixStore::from_level_words(
                builder.suffix_config(),
                builder.suffixes(),
                &suffix_bits,
                start_level,
                height,
            ),
        }
    }

    /// Total trie height
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// First trie level encoded by this tier
    #[inline]
    pub fn start_level(&self) -> usize {
        self.start_level
    }

    /// Check whether this tier encodes any levels
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    fn child_node_num(&self, pos: usize) -> usize {
        self.child_indicator_bits.rank(pos) + self.dense_child_count
    }

    #[inline]
    fn first_label_pos(&self, node_num: usize) -> usize {
        self.louds_bits
            .select(node_num + 1 - self.dense_node_count)
    }

    fn last_label_pos(&self, node_num: usize) -> usize {
        let next_rank = node_num + 2 - self.dense_node_count;
        if next_rank > self.louds_bits.num_ones() {
            return self.louds_bits.num_bits() - 1;
        }
        self.louds_bits.select(next_rank) - 1
    }

    #[inline]
    fn suffix_pos(&self, pos: usize) -> usize {
        pos - self.child_indicator_bits.rank(pos)
    }

    #[inline]
    fn node_size(&self, pos: usize) -> usize {
        debug_assert!(self.louds_bits.read_bit(pos));
        self.louds_bits.distance_to_next_set_bit(pos)
    }

    #[inline]
    fn is_end_of_node(&self, pos: usize) -> bool {
        pos == self.louds_bits.num_bits() - 1 || self.louds_bits.read_bit(pos + 1)
    }

    /// Point lookup continuing a dense-tier walk at `in_node_num`
    pub fn lookup(&self, key: &[u8], in_node_num: usize) -> bool {
        if self.is_empty() {
            return false;
        }
        let mut node_num = in_node_num;
        let mut pos = self.first_label_pos(node_num);
        for level in self.start_level..key.len() {
            match self.labels.search(key[level], pos, self.node_size(pos)) {
                None => return false,
                Some(p) => pos = p,
            }
            if !self.child_indicator_bits.read_bit(pos) {
                return self
                    .suffixes
                    .check_equality(self.suffix_pos(pos), key, level + 1);
            }
            node_num = self.child_node_num(pos);
            pos = self.first_label_pos(node_num);
        }
        self.labels.read(pos) == TERMINATOR
            && !self.child_indicator_bits.read_bit(pos)
            && self
                .suffixes
                .check_equality(self.suffix_pos(pos), key, key.len() + 1)
    }

    /// Position `iter` at the first key `>= key` (`> key` when not
    /// inclusive), starting at the iterator's start node. Returns the
    /// could-be-false-positive flag.
    pub fn move_to_key_greater_than(
        &self,
        key: &[u8],
        inclusive: bool,
        iter: &mut SparseIter<'_>,
    ) -> bool {
        if self.is_empty() {
            iter.valid = false;
            return false;
        }
        let mut node_num = iter.start_node_num;
        let mut pos = self.first_label_pos(node_num);
        let mut level = self.start_level;
        while level < key.len() {
            let node_size = self.node_size(pos);
            match self.labels.search(key[level], pos, node_size) {
                None => {
                    self.move_to_left_in_next_subtrie(pos, node_size, key[level], iter);
                    return false;
                }
                Some(p) => pos = p,
            }
            iter.append_with_label(key[level], pos);
            if !self.child_indicator_bits.read_bit(pos) {
                return self.compare_suffix_greater_than(pos, key, level + 1, inclusive, iter);
            }
            node_num = self.child_node_num(pos);
            pos = self.first_label_pos(node_num);
            level += 1;
        }

        if self.labels.read(pos) == TERMINATOR
            && !self.child_indicator_bits.read_bit(pos)
            && !self.is_end_of_node(pos)
        {
            iter.append_with_label(TERMINATOR, pos);
            iter.is_at_terminator = true;
            iter.valid = true;
            if !inclusive {
                iter.next();
            }
            return false;
        }

        // the probe is a proper prefix of everything below this node
        iter.move_to_leftmost_key();
        false
    }

    fn move_to_left_in_next_subtrie(
        &self,
        pos: usize,
        node_size: usize,
        label: u8,
        iter: &mut SparseIter<'_>,
    ) {
        match self.labels.search_greater_than(label, pos, node_size) {
            None => {
                // nothing greater in this node: climb and advance
                iter.append(pos + node_size - 1);
                iter.next()
            }
            Some(p) => {
                iter.append(p);
                iter.move_to_leftmost_key()
            }
        }
    }

    fn compare_suffix_greater_than(
        &self,
        pos: usize,
        key: &[u8],
        level: usize,
        _inclusive: bool,
        iter: &mut SparseIter<'_>,
    ) -> bool {
        match self.suffixes.compare(self.suffix_pos(pos), key, level) {
            SuffixCompare::Less => {
                iter.next();
                false
            }
            _ => {
                iter.valid = true;
                true
            }
        }
    }

    /// Leaves strictly between two positioned iterators within the
    /// sparse levels. `in_node_left` / `in_node_right` are the bridge
    /// node numbers handed over by the dense tier ([`POSITION_MAX`] when
    /// an endpoint never reaches this tier).
    pub fn approx_count(
        &self,
        left: &SparseIter<'_>,
        right: &SparseIter<'_>,
        in_node_left: usize,
        in_node_right: usize,
    ) -> u64 {
        if in_node_left == POSITION_MAX || self.is_empty() {
            return 0;
        }
        let mut left_list: Vec<usize> = left.pos_in_trie[..left.key_len].to_vec();
        let ori_left_len = left_list.len();
        let mut right_list: Vec<usize> = if in_node_right == POSITION_MAX {
            vec![POSITION_MAX; self.height - self.start_level]
        } else {
            right.pos_in_trie[..right.key_len].to_vec()
        };
        self.extend_pos_lists(&mut left_list, &mut right_list, in_node_left, in_node_right);

        let num_bits = self.louds_bits.num_bits();
        let mut count = 0u64;
        let depth = left_list.len().min(right_list.len());
        for i in 0..depth {
            let left_pos = left_list[i];
            if left_pos == POSITION_MAX {
                break;
            }
            let mut right_pos = right_list[i];
            if right_pos == POSITION_MAX {
                right_pos = self.level_cuts[self.start_level + i] as usize + 1;
            }
            if left_pos >= right_pos {
                continue;
            }
            let rank_left = self.child_indicator_bits.rank(left_pos) as i64;
            let rank_right = self.child_indicator_bits.rank(right_pos) as i64;
            let mut num_leaves = (right_pos - left_pos) as i64 - (rank_right - rank_left);
            if right_pos < num_bits && self.child_indicator_bits.read_bit(right_pos) {
                num_leaves += 1;
            }
            if self.child_indicator_bits.read_bit(left_pos) {
                num_leaves -= 1;
            }
            if i + 1 == ori_left_len {
                num_leaves -= 1;
            }
            if num_leaves > 0 {
                count += num_leaves as u64;
            }
        }
        count
    }

    fn append_to_pos_list(
        &self,
        pos_list: &mut Vec<usize>,
        node_num: usize,
        level: usize,
        is_left: bool,
        done: &mut bool,
    ) -> usize {
        let mut pos = self.first_label_pos(node_num);
        if pos > self.level_cuts[self.start_level + level] as usize {
            pos = POSITION_MAX;
            if is_left {
                pos_list.push(pos);
            } else {
                let remaining = (self.height - self.start_level - level).saturating_sub(1);
                for _ in 0..remaining {
                    pos_list.push(pos);
                }
            }
            *done = true;
        }
        pos_list.push(pos);
        pos
    }

    fn extend_pos_lists(
        &self,
        left_list: &mut Vec<usize>,
        right_list: &mut Vec<usize>,
        in_node_left: usize,
        in_node_right: usize,
    ) {
        let mut left_done = false;
        let mut right_done = false;
        let mut start_depth = left_list.len().min(right_list.len());
        if start_depth == 0 {
            if left_list.is_empty() {
                self.append_to_pos_list(left_list, in_node_left, 0, true, &mut left_done);
            }
            if right_list.is_empty() {
                self.append_to_pos_list(right_list, in_node_right, 0, false, &mut right_done);
            }
            start_depth = 1;
        }

        let mut left_pos = *left_list.last().unwrap();
        let mut right_pos = *right_list.last().unwrap();
        for i in start_depth..(self.height - self.start_level) {
            if left_pos == right_pos {
                break;
            }
            if !left_done && left_list.len() <= i && left_pos != POSITION_MAX {
                let mut left_node = self.child_node_num(left_pos);
                if !self.child_indicator_bits.read_bit(left_pos) {
                    left_node += 1;
                }
                left_pos = self.append_to_pos_list(left_list, left_node, i, true, &mut left_done);
            }
            if !right_done && right_list.len() <= i && right_pos != POSITION_MAX {
                let mut right_node = self.child_node_num(right_pos);
                if !self.child_indicator_bits.read_bit(right_pos) {
                    right_node += 1;
                }
                right_pos =
                    self.append_to_pos_list(right_list, right_node, i, false, &mut right_done);
            }
        }
    }

    /// Bytes used by labels, bit vectors, tables, and suffixes
    pub fn memory_usage(&self) -> usize {
        self.labels.memory_usage()
            + self.child_indicator_bits.memory_usage()
            + self.louds_bits.memory_usage()
            + self.suffixes.memory_usage()
    }

    /// Byte length of the serialized form
    pub fn serialized_size(&self) -> usize {
        16 + 4 * self.height
            + self.labels.serialized_size()
            + self.child_indicator_bits.serialized_size()
            + self.louds_bits.serialized_size()
            + self.suffixes.serialized_size()
    }

    /// Write the sparse header, level cuts, and the four packed vectors
    pub fn serialize<W: DataOutput>(&self, out: &mut W) -> Result<()> {
        out.write_u32(self.height as u32)?;
        out.write_u32(self.start_level as u32)?;
        out.write_u32(self.dense_node_count as u32)?;
        out.write_u32(self.dense_child_count as u32)?;
        for &cut in &self.level_cuts {
            out.write_u32(cut)?;
        }
        self.labels.serialize(out)?;
        self.child_indicator_bits.serialize(out)?;
        self.louds_bits.serialize(out)?;
        self.suffixes.serialize(out)
    }

    /// Read back a tier written by [`serialize`](Self::serialize)
    pub fn deserialize(input: &mut SliceDataInput<'_>) -> Result<Self> {
        let height = input.read_u32()? as usize;
        let start_level = input.read_u32()? as usize;
        if start_level > height {
            return Err(SurfError::corrupt_stream(format!(
                "sparse start level {} exceeds height {}",
                start_level, height
            )));
        }
        let dense_node_count = input.read_u32()? as usize;
        let dense_child_count = input.read_u32()? as usize;
        if input.remaining() < height * 4 {
            return Err(SurfError::corrupt_stream(
                "sparse level cuts truncated".to_string(),
            ));
        }
        let mut level_cuts = Vec::with_capacity(height);
        for _ in 0..height {
            level_cuts.push(input.read_u32()?);
        }
        let labels = LabelVector::deserialize(input)?;
        let child_indicator_bits = RankVector::deserialize(input)?;
        let louds_bits = SelectVector::deserialize(input)?;
        let suffixes = SuffixStore::deserialize(input)?;
        if labels.len() != child_indicator_bits.num_bits()
            || labels.len() != louds_bits.num_bits()
        {
            return Err(SurfError::corrupt_stream(format!(
                "sparse vectors disagree on edge count: {} labels, {} child bits, {} louds bits",
                labels.len(),
                child_indicator_bits.num_bits(),
                louds_bits.num_bits()
            )));
        }
        Ok(Self {
            height,
            start_level,
            dense_node_count,
            dense_child_count,
            level_cuts,
            labels,
            child_indicator_bits,
            louds_bits,
            suffixes,
        })
    }
}

/// Iterator over the sparse levels.
///
/// Keeps one (label, edge position) pair per descended level, counting
/// levels from the tier's start level. A dense-tier iterator hands over
/// via [`set_start_node_num`](Self::set_start_node_num).
#[derive(Debug, Clone)]
pub struct SparseIter<'a> {
    trie: &'a LoudsSparse,
    pub(crate) valid: bool,
    pub(crate) start_node_num: usize,
    key: Vec<u8>,
    pos_in_trie: Vec<usize>,
    key_len: usize,
    pub(crate) is_at_terminator: bool,
}

impl<'a> SparseIter<'a> {
    /// A cleared iterator over the given tier
    pub fn new(trie: &'a LoudsSparse) -> Self {
        let depth = trie.height - trie.start_level;
        Self {
            trie,
            valid: false,
            start_node_num: 0,
            key: vec![0; depth],
            pos_in_trie: vec![0; depth],
            key_len: 0,
            is_at_terminator: false,
        }
    }

    /// True when the iterator points at a key
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Reset to the cleared state, keeping the start node
    pub fn clear(&mut self) {
        self.valid = false;
        self.key_len = 0;
        self.is_at_terminator = false;
    }

    /// Node this iterator's descent begins at (set by the dense tier)
    pub fn set_start_node_num(&mut self, node_num: usize) {
        self.start_node_num = node_num;
    }

    fn append(&mut self, pos: usize) {
        self.key[self.key_len] = self.trie.labels.read(pos);
        self.pos_in_trie[self.key_len] = pos;
        self.key_len += 1;
    }

    fn append_with_label(&mut self, label: u8, pos: usize) {
        self.key[self.key_len] = label;
        self.pos_in_trie[self.key_len] = pos;
        self.key_len += 1;
    }

    fn set(&mut self, level: usize, pos: usize) {
        self.key[level] = self.trie.labels.read(pos);
        self.pos_in_trie[level] = pos;
    }

    /// Park on the root node's first edge (no descent yet)
    pub fn set_to_first_label_in_root(&mut self) {
        debug_assert!(self.trie.start_level == 0);
        self.key_len = 0;
        self.is_at_terminator = false;
        self.append(0);
    }

    /// Park on the root node's last edge (no descent yet)
    pub fn set_to_last_label_in_root(&mut self) {
        debug_assert!(self.trie.start_level == 0);
        self.key_len = 0;
        self.is_at_terminator = false;
        self.append(self.trie.last_label_pos(0));
    }

    /// Descend along first edges until a leaf is reached
    pub fn move_to_leftmost_key(&mut self) {
        if self.key_len == 0 {
            if self.trie.is_empty() {
                self.valid = false;
                return;
            }
            let pos = self.trie.first_label_pos(self.start_node_num);
            self.append(pos);
        }
        let mut pos = self.pos_in_trie[self.key_len - 1];
        if !self.trie.child_indicator_bits.read_bit(pos) {
            if self.trie.labels.read(pos) == TERMINATOR && !self.trie.is_end_of_node(pos) {
                self.is_at_terminator = true;
            }
            self.valid = true;
            return;
        }
        loop {
            let node_num = self.trie.child_node_num(pos);
            pos = self.trie.first_label_pos(node_num);
            self.append(pos);
            if !self.trie.child_indicator_bits.read_bit(pos) {
                if self.trie.labels.read(pos) == TERMINATOR && !self.trie.is_end_of_node(pos) {
                    self.is_at_terminator = true;
                }
                self.valid = true;
                return;
            }
        }
    }

    /// Descend along last edges until a leaf is reached
    pub fn move_to_rightmost_key(&mut self) {
        if self.key_len == 0 {
            if self.trie.is_empty() {
                self.valid = false;
                return;
            }
            let pos = self.trie.last_label_pos(self.start_node_num);
            self.append(pos);
        }
        let mut pos = self.pos_in_trie[self.key_len - 1];
        if !self.trie.child_indicator_bits.read_bit(pos) {
            if self.trie.labels.read(pos) == TERMINATOR && !self.trie.is_end_of_node(pos) {
                self.is_at_terminator = true;
            }
            self.valid = true;
            return;
        }
        loop {
            let node_num = self.trie.child_node_num(pos);
            pos = self.trie.last_label_pos(node_num);
            self.append(pos);
            if !self.trie.child_indicator_bits.read_bit(pos) {
                if self.trie.labels.read(pos) == TERMINATOR && !self.trie.is_end_of_node(pos) {
                    self.is_at_terminator = true;
                }
                self.valid = true;
                return;
            }
        }
    }

    /// Advance to the next key; invalid past the last key of the start
    /// node's subtree
    pub fn next(&mut self) {
        debug_assert!(self.key_len > 0);
        self.is_at_terminator = false;
        let mut pos = self.pos_in_trie[self.key_len - 1] + 1;
        while pos >= self.trie.louds_bits.num_bits() || self.trie.louds_bits.read_bit(pos) {
            // walked past the node's last edge: climb one level
            self.key_len -= 1;
            if self.key_len == 0 {
                self.valid = false;
                return;
            }
            pos = self.pos_in_trie[self.key_len - 1] + 1;
        }
        self.set(self.key_len - 1, pos);
        self.move_to_leftmost_key()
    }

    /// Step back to the previous key; invalid before the first
    pub fn prev(&mut self) {
        debug_assert!(self.key_len > 0);
        self.is_at_terminator = false;
        let mut pos = self.pos_in_trie[self.key_len - 1];
        if pos == 0 {
            self.valid = false;
            return;
        }
        while self.trie.louds_bits.read_bit(pos) {
            // at the node's first edge: climb one level
            self.key_len -= 1;
            if self.key_len == 0 {
                self.valid = false;
                return;
            }
            pos = self.pos_in_trie[self.key_len - 1];
        }
        self.set(self.key_len - 1, pos - 1);
        self.move_to_rightmost_key()
    }

    /// Key bytes accumulated in the sparse levels
    pub fn key(&self) -> &[u8] {
        if !self.valid {
            return &[];
        }
        let len = self.key_len - usize::from(self.is_at_terminator);
        &self.key[..len]
    }

    /// Compare the current position against a probe key (full key, not
    /// just its sparse part)
    pub fn compare(&self, key: &[u8]) -> KeyCompare {
        let key_sparse: &[u8] = if key.len() > self.trie.start_level {
            &key[self.trie.start_level..]
        } else {
            &[]
        };
        if self.is_at_terminator && self.key_len - 1 < key_sparse.len() {
            return KeyCompare::Less;
        }
        let iter_key = self.key();
        let truncated = &key_sparse[..key_sparse.len().min(iter_key.len())];
        match iter_key.cmp(truncated) {
            std::cmp::Ordering::Equal => {}
            other => return KeyCompare::from_ordering(other),
        }
        let suffix_pos = self.trie.suffix_pos(self.pos_in_trie[self.key_len - 1]);
        match self.trie.suffixes.compare(suffix_pos, key_sparse, self.key_len) {
            SuffixCompare::Less => KeyCompare::Less,
            SuffixCompare::Greater => KeyCompare::Greater,
            SuffixCompare::CouldBePositive => KeyCompare::CouldBePositive,
        }
    }

    /// Stored real-suffix bits at the current leaf, with their bit length
    pub fn suffix(&self) -> (u64, u32) {
        if matches!(
            self.trie.suffixes.kind(),
            SuffixKind::Real | SuffixKind::Mixed
        ) {
            let pos = self.trie.suffix_pos(self.pos_in_trie[self.key_len - 1]);
            (
                self.trie.suffixes.read_real(pos),
                self.trie.suffixes.real_len(),
            )
        } else {
            (0, 0)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SuffixConfig, SurfConfig};
    use crate::io::VecDataOutput;

    fn build_sparse(keys: &[&[u8]], config: SurfConfig) -> LoudsSparse {
        let mut builder = SurfBuilder::new(config.with_dense(false)).unwrap();
        builder.build(keys).unwrap();
        LoudsSparse::from_builder(&builder)
    }

    const KEYS: [&[u8]; 6] = [b"ab", b"abc", b"ad", b"b", b"cde", b"cdf"];

    #[test]
    fn test_lookup() {
        let sparse = build_sparse(&KEYS, SurfConfig::default());
        assert_eq!(sparse.start_level(), 0);
        for key in KEYS {
            assert!(sparse.lookup(key, 0), "key {:?}", key);
        }
        assert!(!sparse.lookup(b"a", 0));
        assert!(!sparse.lookup(b"ac", 0));
        assert!(!sparse.lookup(b"ce", 0));
        assert!(!sparse.lookup(b"x", 0));
    }

    #[test]
    fn test_lookup_with_real_suffix() {
        let config = SurfConfig::default().with_suffix(SuffixConfig::real(8));
        let sparse = build_sparse(&[b"cart", b"dart"], config);
        assert!(sparse.lookup(b"cart", 0));
        assert!(sparse.lookup(b"dart", 0));
        // leaf at level 0 stores the next key byte, rejecting this probe
        assert!(!sparse.lookup(b"cort", 0));
    }

    #[test]
    fn test_iterator_forward_walk() {
        let sparse = build_sparse(&KEYS, SurfConfig::default());
        let mut iter = SparseIter::new(&sparse);
        iter.move_to_leftmost_key();
        let mut seen: Vec<Vec<u8>> = Vec::new();
        while iter.is_valid() {
            seen.push(iter.key().to_vec());
            iter.next();
        }
        let expected: Vec<Vec<u8>> = KEYS.iter().map(|k| k.to_vec()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_iterator_backward_walk() {
        let sparse = build_sparse(&KEYS, SurfConfig::default());
        let mut iter = SparseIter::new(&sparse);
        iter.move_to_rightmost_key();
        let mut seen: Vec<Vec<u8>> = Vec::new();
        while iter.is_valid() {
            seen.push(iter.key().to_vec());
            iter.prev();
        }
        let mut expected: Vec<Vec<u8>> = KEYS.iter().map(|k| k.to_vec()).collect();
        expected.reverse();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_move_to_key_greater_than() {
        let sparse = build_sparse(&KEYS, SurfConfig::default());

        let mut iter = SparseIter::new(&sparse);
        sparse.move_to_key_greater_than(b"abb", true, &mut iter);
        assert!(iter.is_valid());
        assert_eq!(iter.key(), b"abc");

        let mut iter = SparseIter::new(&sparse);
        sparse.move_to_key_greater_than(b"ab", true, &mut iter);
        assert!(iter.is_valid());
        assert_eq!(iter.key(), b"ab");

        // exclusive seek moves past the exact match
        let mut iter = SparseIter::new(&sparse);
        sparse.move_to_key_greater_than(b"ab", false, &mut iter);
        assert!(iter.is_valid());
        assert_eq!(iter.key(), b"abc");

        let mut iter = SparseIter::new(&sparse);
        sparse.move_to_key_greater_than(b"zzz", true, &mut iter);
        assert!(!iter.is_valid());

        // "b" is a leaf with no suffix bits, so the seek cannot prove it
        // is smaller than "ba" and conservatively stays on it
        let mut iter = SparseIter::new(&sparse);
        let could_be_fp = sparse.move_to_key_greater_than(b"ba", true, &mut iter);
        assert!(iter.is_valid());
        assert!(could_be_fp);
        assert_eq!(iter.key(), b"b");
    }

    #[test]
    fn test_approx_count_between_iterators() {
        let sparse = build_sparse(&KEYS, SurfConfig::default());
        let mut left = SparseIter::new(&sparse);
        sparse.move_to_key_greater_than(b"ab", true, &mut left);
        let mut right = SparseIter::new(&sparse);
        sparse.move_to_key_greater_than(b"cde", true, &mut right);
        // keys strictly between "ab" and "cde": abc, ad, b
        let count = sparse.approx_count(&left, &right, 0, 0);
        assert!((1..=3).contains(&count), "count {}", count);
    }

    #[test]
    fn test_empty_tier() {
        let mut builder = SurfBuilder::new(SurfConfig::default().with_dense(false)).unwrap();
        builder.build::<&[u8]>(&[]).unwrap();
        let sparse = LoudsSparse::from_builder(&builder);
        assert!(sparse.is_empty());
        assert!(!sparse.lookup(b"a", 0));
        let mut iter = SparseIter::new(&sparse);
        iter.move_to_leftmost_key();
        assert!(!iter.is_valid());
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = SurfConfig::default().with_suffix(SuffixConfig::mixed(4, 8));
        let sparse = build_sparse(&KEYS, config);
        let mut out = VecDataOutput::new();
        sparse.serialize(&mut out).unwrap();
        assert_eq!(out.bytes_written(), sparse.serialized_size());
        let bytes = out.into_vec();
        let sparse2 = LoudsSparse::deserialize(&mut SliceDataInput::new(&bytes)).unwrap();
        for key in KEYS.iter().map(|k| *k).chain([&b"nope"[..], b"a"]) {
            assert_eq!(sparse.lookup(key, 0), sparse2.lookup(key, 0), "key {:?}", key);
        }
        let mut out2 = VecDataOutput::new();
        sparse2.serialize(&mut out2).unwrap();
        assert_eq!(bytes, out2.into_vec());
    }

    #[test]
    fn test_deserialize_detects_corruption() {
        let sparse = build_sparse(&KEYS, SurfConfig::default());
        let mut out = VecDataOutput::new();
        sparse.serialize(&mut out).unwrap();
        let mut bytes = out.into_vec();
        // truncate
        bytes.pop();
        assert!(LoudsSparse::deserialize(&mut SliceDataInput::new(&bytes)).is_err());
    }
}
