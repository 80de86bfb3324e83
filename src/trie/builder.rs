//! Bulk construction from a sorted key list
//!
//! One scan over the keys emits, per trie level, the edge labels, the
//! child-indicator bits, the LOUDS node-delimiter bits, and the packed
//! leaf suffixes. After the scan the top levels are repacked into
//! 256-bit-per-node bitmaps for the dense tier.

use crate::config::{SuffixConfig, SurfConfig};
use crate::error::{Result, SurfError};
use crate::succinct::MSB_MASK;
use crate::trie::suffix::SuffixStore;
use crate::trie::{DENSE_FANOUT, TERMINATOR};

#[inline]
fn set_bit(words: &mut [u64], pos: usize) {
    words[pos / 64] |= MSB_MASK >> (pos % 64);
}

#[inline]
fn read_bit(words: &[u64], pos: usize) -> bool {
    words[pos / 64] & (MSB_MASK >> (pos % 64)) != 0
}

/// Single-pass builder producing both tier encodings.
///
/// The builder is consumed by the filter constructor; it is not reusable
/// and none of its buffers survive past tier construction.
pub struct SurfBuilder {
    config: SurfConfig,

    // per-level sparse encoding, grown as keys are scanned
    labels: Vec<Vec<u8>>,
    child_indicator_bits: Vec<Vec<u64>>,
    louds_bits: Vec<Vec<u64>>,
    suffixes: Vec<Vec<u64>>,
    suffix_counts: Vec<usize>,
    node_counts: Vec<usize>,
    is_last_item_terminator: Vec<bool>,

    sparse_start_level: usize,
    num_keys: usize,

    // dense repack of levels [0, sparse_start_level)
    bitmap_labels: Vec<Vec<u64>>,
    bitmap_child_indicator_bits: Vec<Vec<u64>>,
    prefixkey_indicator_bits: Vec<Vec<u64>>,
}

impl SurfBuilder {
    /// Create a builder for the given configuration
    pub fn new(config: SurfConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            labels: Vec::new(),
            child_indicator_bits: Vec::new(),
            louds_bits: Vec::new(),
            suffixes: Vec::new(),
            suffix_counts: Vec::new(),
            node_counts: Vec::new(),
            is_last_item_terminator: Vec::new(),
            sparse_start_level: 0,
            num_keys: 0,
            bitmap_labels: Vec::new(),
            bitmap_child_indicator_bits: Vec::new(),
            prefixkey_indicator_bits: Vec::new(),
        })
    }

    /// Scan the sorted key list and emit both encodings.
    ///
    /// Keys must be non-empty, unique, and strictly ascending. `0x00`
    /// bytes are legal except where they collide with the terminator: a
    /// key may not extend a shorter stored key with a `0x00` byte.
    /// Fixed-width keys (integers in big-endian form) always satisfy
    /// this; variable-length binary keys satisfy it by appending a
    /// single `0x00` sentinel to every key.
    pub fn build<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<()> {
        self.validate_keys(keys)?;
        self.num_keys = keys.len();
        self.build_sparse(keys);
        if self.config.include_dense {
            self.determine_cutoff_level();
            self.build_dense();
        }
        log::debug!(
            "built trie over {} keys: height {}, sparse start level {}",
            keys.len(),
            self.tree_height(),
            self.sparse_start_level
        );
        Ok(())
    }

    fn validate_keys<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<()> {
        for (i, key) in keys.iter().enumerate() {
            let key = key.as_ref();
            if key.is_empty() {
                return Err(SurfError::invalid_input(format!("empty key at index {}", i)));
            }
            if i > 0 {
                let prev = keys[i - 1].as_ref();
                if prev >= key {
                    return Err(SurfError::invalid_input(format!(
                        "keys must be unique and strictly ascending (violated at index {})",
                        i
                    )));
                }
                // a shorter key extended by 0x00 would put a real zero
                // label in the same node as the shorter key's terminator
                if key.len() > prev.len()
                    && &key[..prev.len()] == prev
                    && key[prev.len()] == TERMINATOR
                {
                    return Err(SurfError::invalid_input(format!(
                        "key at index {} extends its predecessor with a 0x00 byte, \
                         which is reserved as the terminator",
                        i
                    )));
                }
            }
        }
        Ok(())
    }

    fn build_sparse<K: AsRef<[u8]>>(&mut self, keys: &[K]) {
        for i in 0..keys.len() {
            let key = keys[i].as_ref();
            let level = self.skip_common_prefix(key);
            let next = keys.get(i + 1).map(|k| k.as_ref());
            let level = self.insert_key_bytes_until_unique(key, next, level);
            self.insert_suffix(key, level);
        }
    }

    /// Walk the shared prefix with the previously inserted key, marking
    /// each shared edge as having a child.
    fn skip_common_prefix(&mut self, key: &[u8]) -> usize {
        let mut level = 0;
        while level < key.len() && self.is_char_common_prefix(key[level], level) {
            let last = self.num_items(level) - 1;
            set_bit(&mut self.child_indicator_bits[level], last);
            level += 1;
        }
        level
    }

    fn is_char_common_prefix(&self, c: u8, level: usize) -> bool {
        level < self.tree_height()
            && !self.is_last_item_terminator[level]
            && self.labels[level].last() == Some(&c)
    }

    /// Insert key bytes from `start_level` until the key is unique with
    /// respect to `next_key`; returns one past the last inserted level.
    fn insert_key_bytes_until_unique(
        &mut self,
        key: &[u8],
        next_key: Option<&[u8]>,
        start_level: usize,
    ) -> usize {
        debug_assert!(start_level < key.len());
        let mut level = start_level;
        let is_start_of_node = self.is_level_empty(level);
        // the first byte after the common prefix joins the existing node
        self.insert_key_byte(key[level], level, is_start_of_node, false);
        level += 1;

        let next = next_key.unwrap_or(&[]);
        if level > next.len() || key[..level] != next[..level] {
            return level;
        }

        // still shared with the next key: every further byte starts a new node
        while level < key.len() && level < next.len() && key[level] == next[level] {
            self.insert_key_byte(key[level], level, true, false);
            level += 1;
        }
        if level < key.len() {
            self.insert_key_byte(key[level], level, true, false);
        } else {
            self.insert_key_byte(TERMINATOR, level, true, true);
        }
        level + 1
    }

    fn insert_key_byte(&mut self, c: u8, level: usize, is_start_of_node: bool, is_term: bool) {
        while level >= self.tree_height() {
            self.add_level();
        }
        // the parent node's newest edge now has a child
        if level > 0 {
            let last = self.num_items(level - 1) - 1;
            set_bit(&mut self.child_indicator_bits[level - 1], last);
        }
        self.labels[level].push(c);
        if is_start_of_node {
            let last = self.num_items(level) - 1;
            set_bit(&mut self.louds_bits[level], last);
            self.node_counts[level] += 1;
        }
        self.is_last_item_terminator[level] = is_term;
        self.move_to_next_item_slot(level);
    }

    fn insert_suffix(&mut self, key: &[u8], level: usize) {
        if self.config.suffix.kind == crate::config::SuffixKind::None {
            return;
        }
        // the leaf's label level is level - 1, which always exists
        let suffix = SuffixStore::construct_with(
            self.config.suffix.kind,
            key,
            self.config.suffix.hash_len,
            level,
            self.config.suffix.real_len,
        );
        self.store_suffix(level, suffix);
    }

    /// Append `suffix` (right-aligned) to the packed buffer of the
    /// leaf's label level, MSB-first.
    fn store_suffix(&mut self, level: usize, suffix: u64) {
        let suffix_len = self.config.suffix.total_len() as usize;
        let idx = level - 1;
        let pos = self.suffix_counts[idx] * suffix_len;
        let words = &mut self.suffixes[idx];
        if pos == words.len() * 64 {
            words.push(0);
        }
        let word_id = pos / 64;
        let offset = pos % 64;
        let word_remaining = 64 - offset;
        if suffix_len <= word_remaining {
            words[word_id] |= suffix << (word_remaining - suffix_len);
        } else {
            let spill = suffix_len - word_remaining;
            words[word_id] |= suffix >> spill;
            words.push(0);
            words[word_id + 1] |= suffix << (64 - spill);
        }
        self.suffix_counts[idx] += 1;
    }

    fn add_level(&mut self) {
        self.labels.push(Vec::new());
        self.child_indicator_bits.push(vec![0]);
        self.louds_bits.push(vec![0]);
        self.suffixes.push(Vec::new());
        self.suffix_counts.push(0);
        self.node_counts.push(0);
        self.is_last_item_terminator.push(false);
    }

    fn move_to_next_item_slot(&mut self, level: usize) {
        if self.num_items(level) % 64 == 0 {
            self.child_indicator_bits[level].push(0);
            self.louds_bits[level].push(0);
        }
    }

    fn is_level_empty(&self, level: usize) -> bool {
        level >= self.tree_height() || self.labels[level].is_empty()
    }

    /// Pick the dense tier extent: level 0 is dense, and each deeper
    /// level stays dense while its node population has not collapsed
    /// below `1/ratio` of its parent level's.
    fn determine_cutoff_level(&mut self) {
        let height = self.tree_height();
        if height == 0 {
            self.sparse_start_level = 0;
            return;
        }
        let ratio = self.config.sparse_dense_ratio as usize;
        let mut cutoff = 1;
        while cutoff < height && self.node_counts[cutoff] * ratio >= self.node_counts[cutoff - 1] {
            cutoff += 1;
        }
        self.sparse_start_level = cutoff;
    }

    fn build_dense(&mut self) {
        for level in 0..self.sparse_start_level {
            self.init_dense_vectors(level);
            if self.num_items(level) == 0 {
                continue;
            }
            let mut node_num = 0;
            if self.is_terminator(level, 0) {
                set_bit(&mut self.prefixkey_indicator_bits[level], 0);
            } else {
                self.set_label_and_child_indicator_bitmap(level, node_num, 0);
            }
            for pos in 1..self.num_items(level) {
                if self.is_start_of_node(level, pos) {
                    node_num += 1;
                    if self.is_terminator(level, pos) {
                        set_bit(&mut self.prefixkey_indicator_bits[level], node_num);
                        continue;
                    }
                }
                self.set_label_and_child_indicator_bitmap(level, node_num, pos);
            }
        }
    }

    fn init_dense_vectors(&mut self, level: usize) {
        let nodes = self.node_counts[level];
        let bitmap_words = nodes * (DENSE_FANOUT / 64);
        self.bitmap_labels.push(vec![0u64; bitmap_words]);
        self.bitmap_child_indicator_bits.push(vec![0u64; bitmap_words]);
        self.prefixkey_indicator_bits.push(vec![0u64; (nodes + 63) / 64]);
    }

    fn set_label_and_child_indicator_bitmap(&mut self, level: usize, node_num: usize, pos: usize) {
        let label = self.labels[level][pos];
        let bit = node_num * DENSE_FANOUT + label as usize;
        set_bit(&mut self.bitmap_labels[level], bit);
        if read_bit(&self.child_indicator_bits[level], pos) {
            set_bit(&mut self.bitmap_child_indicator_bits[level], bit);
        }
    }

    fn is_start_of_node(&self, level: usize, pos: usize) -> bool {
        read_bit(&self.louds_bits[level], pos)
    }

    fn is_terminator(&self, level: usize, pos: usize) -> bool {
        self.labels[level][pos] == TERMINATOR && !read_bit(&self.child_indicator_bits[level], pos)
    }

    /// Number of trie levels emitted so far
    pub fn tree_height(&self) -> usize {
        self.labels.len()
    }

    /// First level encoded by the sparse tier
    pub fn sparse_start_level(&self) -> usize {
        self.sparse_start_level
    }

    /// Number of keys scanned by [`build`](Self::build)
    pub fn num_keys(&self) -> usize {
        self.num_keys
    }

    pub(crate) fn num_items(&self, level: usize) -> usize {
        self.labels[level].len()
    }

    pub(crate) fn suffix_config(&self) -> SuffixConfig {
        self.config.suffix
    }

    pub(crate) fn labels(&self) -> &[Vec<u8>] {
        &self.labels
    }

    pub(crate) fn child_indicator_bits(&self) -> &[Vec<u64>] {
        &self.child_indicator_bits
    }

    pub(crate) fn louds_bits(&self) -> &[Vec<u64>] {
        &self.louds_bits
    }

    pub(crate) fn suffixes(&self) -> &[Vec<u64>] {
        &self.suffixes
    }

    pub(crate) fn suffix_counts(&self) -> &[usize] {
        &self.suffix_counts
    }

    pub(crate) fn node_counts(&self) -> &[usize] {
        &self.node_counts
    }

    pub(crate) fn bitmap_labels(&self) -> &[Vec<u64>] {
        &self.bitmap_labels
    }

    pub(crate) fn bitmap_child_indicator_bits(&self) -> &[Vec<u64>] {
        &self.bitmap_child_indicator_bits
    }

    pub(crate) fn prefixkey_indicator_bits(&self) -> &[Vec<u64>] {
        &self.prefixkey_indicator_bits
    }
}
