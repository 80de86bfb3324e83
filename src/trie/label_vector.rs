//! Packed edge labels for the sparse tier
//!
//! One byte per edge, concatenated across the sparse levels. Labels
//! within a node are sorted ascending; a terminator, when present, sits
//! at the node's first position.

use crate::error::{Result, SurfError};
use crate::io::{DataInput, DataOutput};
use crate::trie::TERMINATOR;

/// Labels within a node shorter than this are scanned linearly
const BINARY_SEARCH_THRESHOLD: usize = 12;

/// Packed byte array with in-node label search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVector {
    labels: Vec<u8>,
}

impl LabelVector {
    /// Concatenate per-level label arrays over `[start_level, end_level)`
    pub fn from_level_labels(
        labels_per_level: &[Vec<u8>],
        start_level: usize,
        end_level: usize,
    ) -> Self {
        let total: usize = labels_per_level[start_level..end_level]
            .iter()
            .map(|v| v.len())
            .sum();
        let mut labels = Vec::with_capacity(total);
        for level in start_level..end_level {
            labels.extend_from_slice(&labels_per_level[level]);
        }
        Self { labels }
    }

    /// Number of labels stored
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check whether no labels are stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The label byte at the given position
    #[inline]
    pub fn read(&self, pos: usize) -> u8 {
        self.labels[pos]
    }

    /// Locate `label` within the node spanning `[pos, pos + search_len)`.
    ///
    /// Labels within a node are sorted and unique; a terminator, when
    /// present, sits at position 0 and matches a `0x00` probe byte
    /// (which can only turn into a false positive, never a miss).
    pub fn search(&self, label: u8, pos: usize, search_len: usize) -> Option<usize> {
        let node = &self.labels[pos..pos + search_len];
        if search_len < BINARY_SEARCH_THRESHOLD {
            node.iter().position(|&b| b == label).map(|i| pos + i)
        } else {
            node.binary_search(&label).ok().map(|i| pos + i)
        }
    }

    /// Smallest position in the node whose label is strictly greater
    /// than `label`.
    pub fn search_greater_than(&self, label: u8, pos: usize, search_len: usize) -> Option<usize> {
        let node = &self.labels[pos..pos + search_len];
        let idx = if search_len < BINARY_SEARCH_THRESHOLD {
            node.iter()
                .position(|&b| b > label)
                .unwrap_or(search_len)
        } else {
            node.partition_point(|&b| b <= label)
        };
        if idx == search_len {
            None
        } else {
            Some(pos + idx)
        }
    }

    /// Bytes occupied by the packed labels
    pub fn memory_usage(&self) -> usize {
        self.labels.len()
    }

    /// Byte length of the serialized form
    pub fn serialized_size(&self) -> usize {
        4 + self.labels.len()
    }

    /// Write `num_labels | label bytes`
    pub fn serialize<W: DataOutput>(&self, out: &mut W) -> Result<()> {
        out.write_u32(self.labels.len() as u32)?;
        out.write_bytes(&self.labels)
    }

    /// Read back a vector written by [`serialize`](Self::serialize)
    pub fn deserialize<R: DataInput>(input: &mut R) -> Result<Self> {
        let num_labels = input.read_u32()? as usize;
        if input.remaining() < num_labels {
            return Err(SurfError::corrupt_stream(format!(
                "label vector claims {} labels but only {} bytes remain",
                num_labels,
                input.remaining()
            )));
        }
        let labels = input.read_vec(num_labels)?;
        Ok(Self { labels })
    }
}
