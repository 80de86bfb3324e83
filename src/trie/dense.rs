//! Bitmap-dense upper trie tier
//!
//! The top levels of the trie are laid out as 256-bit-per-node bitmaps:
//! one label bitmap and one child-indicator bitmap per node, plus a
//! single prefix-key bit per node for keys that end at that node. Node
//! numbers are global in level order, so a child's node number is the
//! rank of its edge in the concatenated child bitmap.

use crate::config::SuffixKind;
use crate::error::{Result, SurfError};
use crate::io::{DataInput, DataOutput, SliceDataInput};
use crate::succinct::{BitVector, RankVector};
use crate::trie::suffix::SuffixCompare;
use crate::trie::{KeyCompare, SuffixStore, SurfBuilder, DENSE_FANOUT, POSITION_MAX};

/// Outcome of a dense-tier point lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenseLookup {
    /// The key cannot be in the set
    Miss,
    /// The walk ended at a dense leaf; the flag is the suffix verdict
    Leaf(bool),
    /// The walk left the dense levels; continue at this sparse node
    PassToSparse(usize),
}

/// Upper trie levels in bitmap form
#[derive(Debug, Clone)]
pub struct LoudsDense {
    height: usize,
    label_bitmaps: RankVector,
    child_indicator_bitmaps: RankVector,
    prefixkey_indicator_bits: RankVector,
    suffixes: SuffixStore,
    /// last label-bitmap position of each dense level, derived
    level_cuts: Vec<usize>,
}

impl LoudsDense {
    /// Build the dense tier from a finished builder
    pub fn from_builder(builder: &SurfBuilder) -> Self {
        let height = builder.sparse_start_level();
        let label_bits: Vec<usize> = (0..height)
            .map(|l| builder.node_counts()[l] * DENSE_FANOUT)
            .collect();
        let pk_bits: Vec<usize> = (0..height).map(|l| builder.node_counts()[l]).collect();
        let suffix_len = builder.suffix_config().total_len() as usize;
        let suffix_bits: Vec<usize> = (0..builder.tree_height())
            .map(|l| builder.suffix_counts()[l] * suffix_len)
            .collect();

        let label_bitmaps = RankVector::with_default_block(BitVector::from_level_words(
            builder.bitmap_labels(),
            &label_bits,
            0,
            height,
        ));
        let child_indicator_bitmaps = RankVector::with_default_block(BitVector::from_level_words(
            builder.bitmap_child_indicator_bits(),
            &label_bits,
            0,
            height,
        ));
        let prefixkey_indicator_bits = RankVector::with_default_block(BitVector::from_level_words(
            builder.prefixkey_indicator_bits(),
            &pk_bits,
            0,
            height,
        ));
        let suffixes = SuffixStore::from_level_words(
            builder.suffix_config(),
            builder.suffixes(),
            &suffix_bits,
            0,
            height,
        );
        let level_cuts = Self::derive_level_cuts(&child_indicator_bitmaps, height);
        Self {
            height,
            label_bitmaps,
            child_indicator_bitmaps,
            prefixkey_indicator_bits,
            suffixes,
            level_cuts,
        }
    }

    /// Recover the per-level extent of the concatenated bitmaps. Level 0
    /// holds the root alone; level L+1 holds one node per set child bit
    /// among level L's nodes, so the cuts follow from the child bitmap.
    fn derive_level_cuts(child_bitmaps: &RankVector, height: usize) -> Vec<usize> {
        let mut cuts = Vec::with_capacity(height);
        let mut first = 0usize; // first node index of the current level
        let mut count = if height > 0 { 1usize } else { 0 };
        for level in 0..height {
            let end = first + count;
            cuts.push(end * DENSE_FANOUT - 1);
            if level + 1 < height {
                let start_bit = first * DENSE_FANOUT;
                let end_bit = end * DENSE_FANOUT;
                let children = child_bitmaps.rank(end_bit - 1)
                    - if start_bit == 0 {
                        0
                    } else {
                        child_bitmaps.rank(start_bit - 1)
                    };
                first = end;
                count = children;
            }
        }
        cuts
    }

    /// Number of dense levels
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total nodes across all dense levels
    pub fn node_count(&self) -> usize {
        self.label_bitmaps.num_bits() / DENSE_FANOUT
    }

    /// Total set child bits across all dense levels
    pub fn child_count(&self) -> usize {
        self.child_indicator_bitmaps.num_ones()
    }

    #[inline]
    fn child_node_num(&self, pos: usize) -> usize {
        self.child_indicator_bitmaps.rank(pos)
    }

    fn suffix_pos(&self, pos: usize, is_prefix_key: bool) -> usize {
        let node_num = pos / DENSE_FANOUT;
        let mut suffix_pos = self.label_bitmaps.rank(pos) - self.child_indicator_bitmaps.rank(pos)
            + self.prefixkey_indicator_bits.rank(node_num)
            - 1;
        if is_prefix_key
            && self.label_bitmaps.read_bit(pos)
            && !self.child_indicator_bitmaps.read_bit(pos)
        {
            suffix_pos -= 1;
        }
        suffix_pos
    }

    fn first_label_pos_in_node(&self, node_num: usize) -> usize {
        let start = node_num * DENSE_FANOUT;
        if self.label_bitmaps.read_bit(start) {
            start
        } else {
            start + self.label_bitmaps.bits().distance_to_next_set_bit(start)
        }
    }

    fn last_label_pos_in_node(&self, node_num: usize) -> usize {
        let end = ((node_num + 1) * DENSE_FANOUT).min(self.label_bitmaps.num_bits());
        let dist = self
            .label_bitmaps
            .bits()
            .distance_to_prev_set_bit(end)
            .expect("dense node has no labels");
        end - dist
    }

    #[inline]
    fn next_label_pos(&self, pos: usize) -> usize {
        pos + self.label_bitmaps.bits().distance_to_next_set_bit(pos)
    }

    /// Point lookup; see [`DenseLookup`] for the three outcomes.
    pub fn lookup(&self, key: &[u8]) -> DenseLookup {
        let mut node_num = 0usize;
        for level in 0..self.height {
            if level >= key.len() {
                // ran out of key bytes: only a prefix key can match
                if self.prefixkey_indicator_bits.read_bit(node_num) {
                    let pos = node_num * DENSE_FANOUT;
                    let verdict =
                        self.suffixes
                            .check_equality(self.suffix_pos(pos, true), key, level + 1);
                    return DenseLookup::Leaf(verdict);
                }
                return DenseLookup::Miss;
            }
            let pos = node_num * DENSE_FANOUT + key[level] as usize;
            if !self.label_bitmaps.read_bit(pos) {
                return DenseLookup::Miss;
            }
            if !self.child_indicator_bitmaps.read_bit(pos) {
                let verdict =
                    self.suffixes
                        .check_equality(self.suffix_pos(pos, false), key, level + 1);
                return DenseLookup::Leaf(verdict);
            }
            node_num = self.child_node_num(pos);
        }
        DenseLookup::PassToSparse(node_num)
    }

    /// Position `iter` at the first key `>= key` (`> key` when not
    /// inclusive) as far as the dense levels can decide. The return
    /// value is the could-be-false-positive flag for positions settled
    /// entirely in this tier.
    pub fn move_to_key_greater_than(
        &self,
        key: &[u8],
        inclusive: bool,
        iter: &mut DenseIter,
    ) -> bool {
        let mut node_num = 0usize;
        for level in 0..self.height {
            if level >= key.len() {
                if self.prefixkey_indicator_bits.read_bit(node_num) {
                    // park on the node's first real edge; the prefix-key
                    // flag hides its label from the reconstructed key
                    iter.append(self.first_label_pos_in_node(node_num));
                    iter.is_at_prefix_key = true;
                    iter.set_flags(true, true, true, true);
                    if !inclusive {
                        iter.next();
                    }
                    return true;
                }
                // every key in this subtree is greater than the probe
                iter.append(self.first_label_pos_in_node(node_num));
                iter.move_to_leftmost_key();
                return false;
            }
            let pos = node_num * DENSE_FANOUT + key[level] as usize;
            iter.append(pos);
            if !self.label_bitmaps.read_bit(pos) {
                // advance past the missing label to the next subtree
                iter.next();
                return false;
            }
            if !self.child_indicator_bitmaps.read_bit(pos) {
                return self.compare_suffix_greater_than(pos, key, level + 1, inclusive, iter);
            }
            node_num = self.child_node_num(pos);
        }
        iter.send_out_node_num = node_num;
        iter.set_flags(true, false, true, true);
        true
    }

    fn compare_suffix_greater_than(
        &self,
        pos: usize,
        key: &[u8],
        level: usize,
        _inclusive: bool,
        iter: &mut DenseIter,
    ) -> bool {
        let suffix_pos = self.suffix_pos(pos, false);
        match self.suffixes.compare(suffix_pos, key, level) {
            SuffixCompare::Less => {
                iter.next();
                false
            }
            _ => {
                iter.set_flags(true, true, true, true);
                true
            }
        }
    }

    /// Leaves strictly between two positioned iterators within the dense
    /// levels, plus the sparse bridge node for each endpoint
    /// ([`POSITION_MAX`] when the endpoint's frontier never reaches the
    /// sparse tier).
    pub fn approx_count(&self, left: &DenseIter, right: &DenseIter) -> (u64, usize, usize) {
        if self.height == 0 {
            return (0, left.send_out_node_num, right.send_out_node_num);
        }
        if !left.valid || !right.valid {
            return (0, POSITION_MAX, POSITION_MAX);
        }

        let left_orig_len = left.key_len;
        let right_orig_len = right.key_len;
        let mut left_list: Vec<usize> = left.pos_in_trie[..left.key_len].to_vec();
        let mut right_list: Vec<usize> = right.pos_in_trie[..right.key_len].to_vec();
        self.extend_pos_list(&mut left_list, true);
        self.extend_pos_list(&mut right_list, false);

        let mut count: u64 = 0;
        let depth = left_list.len().min(right_list.len());
        for i in 0..depth {
            let left_pos = left_list[i];
            if left_pos == POSITION_MAX {
                break;
            }
            let mut right_pos = right_list[i];
            if right_pos == POSITION_MAX {
                right_pos = self.level_cuts[i] + 1;
            }
            if left_pos >= right_pos {
                continue;
            }
            let edges =
                self.rank_excl_labels(right_pos) as i64 - self.rank_excl_labels(left_pos) as i64;
            let internal =
                self.rank_excl_children(right_pos) as i64 - self.rank_excl_children(left_pos) as i64;
            let mut leaves = edges - internal;
            // the left endpoint's own leaf is not "between"
            if i + 1 == left_orig_len
                && left.is_complete()
                && !left.is_at_prefix_key
                && self.label_bitmaps.read_bit(left_pos)
                && !self.child_indicator_bitmaps.read_bit(left_pos)
            {
                leaves -= 1;
            }
            // prefix keys of the nodes spanned by (left path, right path)
            let node_l = left_pos / DENSE_FANOUT;
            let node_r = right_pos / DENSE_FANOUT;
            let mut pk = self.rank_excl_prefixkeys(node_r) as i64
                - self.rank_excl_prefixkeys(node_l) as i64;
            if i < left_orig_len && self.prefixkey_indicator_bits.read_bit(node_l) {
                // the left path runs through node_l: its prefix key is <= left
                pk -= 1;
            }
            if i < right_orig_len
                && node_r < self.node_count()
                && self.prefixkey_indicator_bits.read_bit(node_r)
                && !(i + 1 == right_orig_len && right.is_at_prefix_key)
            {
                // the right path runs through node_r: its prefix key is < right
                pk += 1;
            }
            leaves += pk;
            if leaves > 0 {
                count += leaves as u64;
            }
        }

        let out_left = self.bridge_node(&left_list);
        let out_right = self.bridge_node(&right_list);
        (count, out_left, out_right)
    }

    /// Set label bits in positions `[0, pos)`
    #[inline]
    fn rank_excl_labels(&self, pos: usize) -> usize {
        if pos == 0 {
            0
        } else {
            self.label_bitmaps.rank(pos - 1)
        }
    }

    /// Set child bits in positions `[0, pos)`
    #[inline]
    fn rank_excl_children(&self, pos: usize) -> usize {
        if pos == 0 {
            0
        } else {
            self.child_indicator_bitmaps.rank(pos - 1)
        }
    }

    /// Set prefix-key bits for nodes `[0, node)`
    #[inline]
    fn rank_excl_prefixkeys(&self, node: usize) -> usize {
        if node == 0 {
            0
        } else {
            self.prefixkey_indicator_bits.rank(node - 1)
        }
    }

    /// Extend an endpoint's per-level position list down to the cutover
    /// by following the frontier between "before" and "after" subtrees.
    fn extend_pos_list(&self, list: &mut Vec<usize>, is_left: bool) {
        if list.is_empty() {
            return;
        }
        let mut pos = *list.last().unwrap();
        for level in list.len()..self.height {
            let mut node = self.child_node_num(pos);
            if !self.child_indicator_bitmaps.read_bit(pos) {
                node += 1;
            }
            let node_start = node * DENSE_FANOUT;
            if node_start > self.level_cuts[level] {
                if is_left {
                    list.push(POSITION_MAX);
                } else {
                    for _ in level..self.height {
                        list.push(POSITION_MAX);
                    }
                }
                return;
            }
            pos = self.first_label_pos_in_node(node);
            list.push(pos);
        }
    }

    /// Sparse node number the frontier continues at, or [`POSITION_MAX`]
    fn bridge_node(&self, list: &[usize]) -> usize {
        match list.last() {
            None => POSITION_MAX,
            Some(&POSITION_MAX) => POSITION_MAX,
            Some(&pos) if list.len() == self.height => {
                let mut node = self.child_node_num(pos);
                if !self.child_indicator_bitmaps.read_bit(pos) {
                    node += 1;
                }
                node
            }
            // the frontier merged or stopped above the cutover
            Some(_) => POSITION_MAX,
        }
    }

    /// Bytes used by the bitmaps, tables, and suffixes
    pub fn memory_usage(&self) -> usize {
        self.label_bitmaps.memory_usage()
            + self.child_indicator_bitmaps.memory_usage()
            + self.prefixkey_indicator_bits.memory_usage()
            + self.suffixes.memory_usage()
    }

    fn bitmaps_size(&self) -> usize {
        self.label_bitmaps.serialized_size()
            + self.child_indicator_bitmaps.serialized_size()
            + self.prefixkey_indicator_bits.bits().serialized_size()
            + self.suffixes.serialized_size()
    }

    /// Byte length of the serialized form
    pub fn serialized_size(&self) -> usize {
        12 + self.bitmaps_size()
    }

    /// Write the dense header and the four packed vectors
    pub fn serialize<W: DataOutput>(&self, out: &mut W) -> Result<()> {
        out.write_u32(self.height as u32)?;
        out.write_u32(self.bitmaps_size() as u32)?;
        out.write_u32(self.height as u32)?; // cutover level, equal to the height here
        self.label_bitmaps.serialize(out)?;
        self.child_indicator_bitmaps.serialize(out)?;
        // the prefix-key bits travel raw; their rank table is rebuilt on load
        self.prefixkey_indicator_bits.bits().serialize(out)?;
        self.suffixes.serialize(out)
    }

    /// Read back a tier written by [`serialize`](Self::serialize)
    pub fn deserialize(input: &mut SliceDataInput<'_>) -> Result<Self> {
        let height = input.read_u32()? as usize;
        let bitmaps_size = input.read_u32()? as usize;
        let sparse_start = input.read_u32()? as usize;
        if sparse_start != height {
            return Err(SurfError::corrupt_stream(format!(
                "dense header mismatch: height {} but cutover {}",
                height, sparse_start
            )));
        }
        let before = input.pos();
        let label_bitmaps = RankVector::deserialize(input)?;
        let child_indicator_bitmaps = RankVector::deserialize(input)?;
        let prefixkey_bits = BitVector::deserialize(input)?;
        let suffixes = SuffixStore::deserialize(input)?;
        if input.pos() - before != bitmaps_size {
            return Err(SurfError::corrupt_stream(format!(
                "dense tier claims {} bitmap bytes but {} were read",
                bitmaps_size,
                input.pos() - before
            )));
        }
        if label_bitmaps.num_bits() != child_indicator_bitmaps.num_bits()
            || label_bitmaps.num_bits() % DENSE_FANOUT != 0
            || label_bitmaps.num_bits() / DENSE_FANOUT != prefixkey_bits.num_bits()
        {
            return Err(SurfError::corrupt_stream(
                "dense bitmap extents are inconsistent".to_string(),
            ));
        }
        let prefixkey_indicator_bits = RankVector::with_default_block(prefixkey_bits);
        let level_cuts = Self::derive_level_cuts(&child_indicator_bitmaps, height);
        if height > 0 && level_cuts.last() != Some(&(label_bitmaps.num_bits() - 1)) {
            return Err(SurfError::corrupt_stream(
                "dense child bitmap does not span the declared levels".to_string(),
            ));
        }
        Ok(Self {
            height,
            label_bitmaps,
            child_indicator_bitmaps,
            prefixkey_indicator_bits,
            suffixes,
            level_cuts,
        })
    }
}

/// Iterator over the dense levels.
///
/// Keeps one (label, bitmap position) pair per descended level. The
/// completeness flags record whether the current position settles inside
/// the dense tier or hands over to the sparse tier via
/// [`send_out_node_num`](Self::send_out_node_num).
#[derive(Debug, Clone)]
pub struct DenseIter<'a> {
    trie: &'a LoudsDense,
    valid: bool,
    search_complete: bool,
    move_left_complete: bool,
    move_right_complete: bool,
    key: Vec<u8>,
    pos_in_trie: Vec<usize>,
    key_len: usize,
    is_at_prefix_key: bool,
    send_out_node_num: usize,
}

impl<'a> DenseIter<'a> {
    /// A cleared iterator over the given tier
    pub fn new(trie: &'a LoudsDense) -> Self {
        Self {
            trie,
            valid: false,
            search_complete: false,
            move_left_complete: false,
            move_right_complete: false,
            key: vec![0; trie.height],
            pos_in_trie: vec![0; trie.height],
            key_len: 0,
            is_at_prefix_key: false,
            send_out_node_num: 0,
        }
    }

    /// True when the iterator points at a position
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// True when the current key settles entirely inside the dense tier
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.search_complete && self.move_left_complete && self.move_right_complete
    }

    /// True when the key search did not pass out to the sparse tier
    #[inline]
    pub fn is_search_complete(&self) -> bool {
        self.search_complete
    }

    /// True when a leftmost-key descent did not pass out to the sparse tier
    #[inline]
    pub fn is_move_left_complete(&self) -> bool {
        self.move_left_complete
    }

    /// True when a rightmost-key descent did not pass out to the sparse tier
    #[inline]
    pub fn is_move_right_complete(&self) -> bool {
        self.move_right_complete
    }

    /// Sparse node number the traversal continues at
    #[inline]
    pub fn send_out_node_num(&self) -> usize {
        self.send_out_node_num
    }

    /// Reset to the cleared state
    pub fn clear(&mut self) {
        self.valid = false;
        self.key_len = 0;
        self.is_at_prefix_key = false;
        self.send_out_node_num = 0;
    }

    fn set_flags(
        &mut self,
        valid: bool,
        search_complete: bool,
        move_left_complete: bool,
        move_right_complete: bool,
    ) {
        self.valid = valid;
        self.search_complete = search_complete;
        self.move_left_complete = move_left_complete;
        self.move_right_complete = move_right_complete;
    }

    fn append(&mut self, pos: usize) {
        self.key[self.key_len] = (pos % DENSE_FANOUT) as u8;
        self.pos_in_trie[self.key_len] = pos;
        self.key_len += 1;
    }

    fn set(&mut self, level: usize, pos: usize) {
        self.key[level] = (pos % DENSE_FANOUT) as u8;
        self.pos_in_trie[level] = pos;
    }

    /// Park on the root node's smallest edge (no descent yet)
    pub fn set_to_first_label_in_root(&mut self) {
        self.key_len = 0;
        self.is_at_prefix_key = false;
        let pos = if self.trie.label_bitmaps.read_bit(0) {
            0
        } else {
            self.trie.next_label_pos(0)
        };
        self.append(pos);
    }

    /// Park on the root node's largest edge (no descent yet)
    pub fn set_to_last_label_in_root(&mut self) {
        self.key_len = 0;
        self.is_at_prefix_key = false;
        let pos = self.trie.last_label_pos_in_node(0);
        self.append(pos);
    }

    /// Descend along smallest edges until a leaf, a prefix key, or the
    /// cutover is reached
    pub fn move_to_leftmost_key(&mut self) {
        debug_assert!(self.key_len > 0);
        let mut level = self.key_len - 1;
        let mut pos = self.pos_in_trie[level];
        if !self.trie.child_indicator_bitmaps.read_bit(pos) {
            return self.set_flags(true, true, true, true);
        }
        while level < self.trie.height - 1 {
            let node_num = self.trie.child_node_num(pos);
            if self.trie.prefixkey_indicator_bits.read_bit(node_num) {
                self.append(self.trie.first_label_pos_in_node(node_num));
                self.is_at_prefix_key = true;
                return self.set_flags(true, true, true, true);
            }
            pos = self.trie.first_label_pos_in_node(node_num);
            self.append(pos);
            if !self.trie.child_indicator_bitmaps.read_bit(pos) {
                return self.set_flags(true, true, true, true);
            }
            level += 1;
        }
        self.send_out_node_num = self.trie.child_node_num(self.pos_in_trie[self.key_len - 1]);
        self.set_flags(true, true, false, true);
    }

    /// Descend along largest edges until a leaf or the cutover is reached
    pub fn move_to_rightmost_key(&mut self) {
        debug_assert!(self.key_len > 0);
        let mut level = self.key_len - 1;
        let mut pos = self.pos_in_trie[level];
        if !self.trie.child_indicator_bitmaps.read_bit(pos) {
            return self.set_flags(true, true, true, true);
        }
        while level < self.trie.height - 1 {
            let node_num = self.trie.child_node_num(pos);
            pos = self.trie.last_label_pos_in_node(node_num);
            self.append(pos);
            if !self.trie.child_indicator_bitmaps.read_bit(pos) {
                return self.set_flags(true, true, true, true);
            }
            level += 1;
        }
        self.send_out_node_num = self.trie.child_node_num(self.pos_in_trie[self.key_len - 1]);
        self.set_flags(true, true, true, false);
    }

    /// Mark this iterator as a hand-over to the sparse tier at the root;
    /// used when no levels are dense.
    pub(crate) fn set_pass_through(&mut self) {
        self.send_out_node_num = 0;
        self.set_flags(true, false, true, true);
    }

    /// Advance to the next key position; invalid past the last key
    pub fn next(&mut self) {
        if self.key_len == 0 {
            self.valid = false;
            return;
        }
        if self.is_at_prefix_key {
            // leave the prefix key for the node's first real subtree
            self.is_at_prefix_key = false;
            return self.move_to_leftmost_key();
        }
        let mut pos = self.pos_in_trie[self.key_len - 1];
        let mut next_pos = self.trie.next_label_pos(pos);
        while next_pos / DENSE_FANOUT > pos / DENSE_FANOUT {
            self.key_len -= 1;
            if self.key_len == 0 {
                self.valid = false;
                return;
            }
            pos = self.pos_in_trie[self.key_len - 1];
            next_pos = self.trie.next_label_pos(pos);
        }
        self.set(self.key_len - 1, next_pos);
        self.move_to_leftmost_key()
    }

    /// Step back to the previous key position; invalid before the first
    pub fn prev(&mut self) {
        if self.key_len == 0 {
            self.valid = false;
            return;
        }
        let from_prefix_key = self.is_at_prefix_key;
        self.is_at_prefix_key = false;
        let mut allow_prefix_stop = !from_prefix_key;
        let mut pos = self.pos_in_trie[self.key_len - 1];
        loop {
            match self.trie.label_bitmaps.bits().distance_to_prev_set_bit(pos) {
                Some(dist) if (pos - dist) / DENSE_FANOUT == pos / DENSE_FANOUT => {
                    self.set(self.key_len - 1, pos - dist);
                    return self.move_to_rightmost_key();
                }
                _ => {
                    // no earlier edge in this node: its prefix key (if
                    // any) is the predecessor, otherwise pop a level
                    let node_num = pos / DENSE_FANOUT;
                    if allow_prefix_stop && self.trie.prefixkey_indicator_bits.read_bit(node_num) {
                        self.set(self.key_len - 1, self.trie.first_label_pos_in_node(node_num));
                        self.is_at_prefix_key = true;
                        return self.set_flags(true, true, true, true);
                    }
                    self.key_len -= 1;
                    if self.key_len == 0 {
                        self.valid = false;
                        return;
                    }
                    pos = self.pos_in_trie[self.key_len - 1];
                    allow_prefix_stop = true;
                }
            }
        }
    }

    /// Key bytes accumulated in the dense levels
    pub fn key(&self) -> &[u8] {
        if !self.valid {
            return &[];
        }
        let len = self.key_len - usize::from(self.is_at_prefix_key);
        &self.key[..len]
    }

    /// Compare the current position against a probe key
    pub fn compare(&self, key: &[u8]) -> KeyCompare {
        if self.is_at_prefix_key && self.key_len - 1 < key.len() {
            return KeyCompare::Less;
        }
        let iter_key = self.key();
        let truncated = &key[..key.len().min(iter_key.len())];
        match iter_key.cmp(truncated) {
            std::cmp::Ordering::Equal => {}
            other => return KeyCompare::from_ordering(other),
        }
        if self.is_complete() {
            let suffix_pos = self
                .trie
                .suffix_pos(self.pos_in_trie[self.key_len - 1], self.is_at_prefix_key);
            return match self.trie.suffixes.compare(suffix_pos, key, self.key_len) {
                SuffixCompare::Less => KeyCompare::Less,
                SuffixCompare::Greater => KeyCompare::Greater,
                SuffixCompare::CouldBePositive => KeyCompare::CouldBePositive,
            };
        }
        KeyCompare::Equal
    }

    /// Stored real-suffix bits at the current leaf, with their bit length
    pub fn suffix(&self) -> (u64, u32) {
        if matches!(
            self.trie.suffixes.kind(),
            SuffixKind::Real | SuffixKind::Mixed
        ) {
            let pos = self
                .trie
                .suffix_pos(self.pos_in_trie[self.key_len - 1], self.is_at_prefix_key);
            (self.trie.suffixes.read_real(pos), self.trie.suffixes.real_len())
        } else {
            (0, 0)
        }
    }

}
