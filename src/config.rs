//! Filter configuration
//!
//! Construction-time options for the filter: whether the upper trie levels
//! are bitmap-encoded, how aggressively the dense tier is grown, and which
//! suffix bits are stored at each leaf to cut the false-positive rate.

use crate::error::{Result, SurfError};

/// Kind of suffix bits stored per leaf.
///
/// Suffix bits disambiguate keys that share the trie prefix of a stored
/// key. `Hash` suffixes reduce point-query false positives; `Real`
/// suffixes additionally order the key space so range queries benefit;
/// `Mixed` stores both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuffixKind {
    /// No suffix bits are stored
    None,
    /// Low bits of a 64-bit hash of the full key
    Hash,
    /// The next bits of the key beyond the trie prefix
    Real,
    /// Hash bits concatenated with real bits
    Mixed,
}

impl SuffixKind {
    /// Wire encoding of the suffix kind
    pub fn as_u32(self) -> u32 {
        match self {
            SuffixKind::None => 0,
            SuffixKind::Hash => 1,
            SuffixKind::Real => 2,
            SuffixKind::Mixed => 3,
        }
    }

    /// Decode a wire value into a suffix kind
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(SuffixKind::None),
            1 => Ok(SuffixKind::Hash),
            2 => Ok(SuffixKind::Real),
            3 => Ok(SuffixKind::Mixed),
            other => Err(SurfError::corrupt_stream(format!(
                "unknown suffix kind {}",
                other
            ))),
        }
    }
}

/// Suffix storage parameters: the kind plus the per-leaf bit lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixConfig {
    /// Which suffix bits are stored
    pub kind: SuffixKind,
    /// Number of hash bits per leaf, in [0, 64]
    pub hash_len: u32,
    /// Number of real key bits per leaf, in [0, 64]
    pub real_len: u32,
}

impl SuffixConfig {
    /// No suffix bits
    pub fn none() -> Self {
        Self {
            kind: SuffixKind::None,
            hash_len: 0,
            real_len: 0,
        }
    }

    /// Hash suffix of `len` bits
    pub fn hash(len: u32) -> Self {
        Self {
            kind: SuffixKind::Hash,
            hash_len: len,
            real_len: 0,
        }
    }

    /// Real suffix of `len` bits
    pub fn real(len: u32) -> Self {
        Self {
            kind: SuffixKind::Real,
            hash_len: 0,
            real_len: len,
        }
    }

    /// Mixed suffix: `hash_len` hash bits followed by `real_len` key bits
    pub fn mixed(hash_len: u32, real_len: u32) -> Self {
        Self {
            kind: SuffixKind::Mixed,
            hash_len,
            real_len,
        }
    }

    /// Total suffix bits stored per leaf
    #[inline]
    pub fn total_len(&self) -> u32 {
        self.hash_len + self.real_len
    }

    /// Validate the length/kind combination
    pub fn validate(&self) -> Result<()> {
        if self.hash_len > 64 || self.real_len > 64 || self.hash_len + self.real_len > 64 {
            return Err(SurfError::configuration(format!(
                "suffix lengths must fit one 64-bit word (hash {}, real {})",
                self.hash_len, self.real_len
            )));
        }
        let ok = match self.kind {
            SuffixKind::None => self.hash_len == 0 && self.real_len == 0,
            SuffixKind::Hash => self.hash_len > 0 && self.real_len == 0,
            SuffixKind::Real => self.hash_len == 0 && self.real_len > 0,
            SuffixKind::Mixed => self.hash_len > 0 && self.real_len > 0,
        };
        if !ok {
            return Err(SurfError::configuration(format!(
                "suffix lengths (hash {}, real {}) do not match kind {:?}",
                self.hash_len, self.real_len, self.kind
            )));
        }
        Ok(())
    }
}

impl Default for SuffixConfig {
    fn default() -> Self {
        Self::none()
    }
}

/// Construction options for a [`Surf`](crate::Surf) filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfConfig {
    /// Encode the upper trie levels as 256-bit-per-node bitmaps
    pub include_dense: bool,
    /// Controls how deep the dense tier extends; one of {1, 2, 4, 8, 16}
    pub sparse_dense_ratio: u32,
    /// Per-leaf suffix storage
    pub suffix: SuffixConfig,
}

impl SurfConfig {
    /// Validate all options
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.sparse_dense_ratio, 1 | 2 | 4 | 8 | 16) {
            return Err(SurfError::configuration(format!(
                "sparse/dense ratio must be one of 1, 2, 4, 8, 16 (got {})",
                self.sparse_dense_ratio
            )));
        }
        self.suffix.validate()
    }

    /// Point-lookup oriented preset: 8 hash suffix bits per leaf
    pub fn performance_preset() -> Self {
        Self {
            suffix: SuffixConfig::hash(8),
            ..Self::default()
        }
    }

    /// Smallest footprint: no suffix bits
    pub fn space_preset() -> Self {
        Self::default()
    }

    /// Range-query oriented preset: 8 real suffix bits per leaf
    pub fn range_preset() -> Self {
        Self {
            suffix: SuffixConfig::real(8),
            ..Self::default()
        }
    }

    /// Replace the suffix configuration
    pub fn with_suffix(mut self, suffix: SuffixConfig) -> Self {
        self.suffix = suffix;
        self
    }

    /// Enable or disable the dense tier
    pub fn with_dense(mut self, include_dense: bool) -> Self {
        self.include_dense = include_dense;
        self
    }

    /// Set the sparse/dense cutover ratio
    pub fn with_sparse_dense_ratio(mut self, ratio: u32) -> Self {
        self.sparse_dense_ratio = ratio;
        self
    }
}

impl Default for SurfConfig {
    fn default() -> Self {
        Self {
            include_dense: true,
            sparse_dense_ratio: 16,
            suffix: SuffixConfig::none(),
        }
    }
}
