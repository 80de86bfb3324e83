//! # rsurf: Succinct Range Filter
//!
//! A space-efficient, approximate membership structure for ordered byte
//! keys. Unlike a Bloom filter, it stores a compressed prefix trie over
//! the key set, so it answers range questions ("does any key lie in
//! [L, R]?") as well as point lookups, with zero false negatives and a
//! false-positive rate bounded by the configured suffix bits.
//!
//! ## Key Features
//!
//! - **Two-tier LOUDS trie**: bitmap-dense upper levels for fast
//!   descent, LOUDS-sparse lower levels for small size
//! - **O(1) rank/select**: block-sampled rank and position-sampled
//!   select over packed bitvectors
//! - **Configurable suffixes**: hash, real-key, or mixed bits per leaf
//!   trade space for false-positive rate
//! - **Ordered iteration**: a tier-crossing iterator supports seeks,
//!   forward/backward walks, and approximate range counts
//! - **Stable wire format**: big-endian serialization into caller
//!   buffers, with byte-identical round trips
//!
//! ## Quick Start
//!
//! ```rust
//! use rsurf::{Surf, SurfConfig, SuffixConfig};
//!
//! let keys: Vec<&[u8]> = vec![b"bear", b"cat", b"dog", b"owl"];
//! let filter = Surf::with_config(&keys, SurfConfig::default().with_suffix(SuffixConfig::real(8)))?;
//!
//! assert!(filter.lookup(b"cat"));
//! assert!(!filter.lookup(b"cow"));
//! assert!(filter.lookup_range(b"deer", true, b"panda", true));
//!
//! let bytes = filter.serialize()?;
//! let restored = rsurf::Surf::deserialize(&bytes)?;
//! assert!(restored.lookup(b"owl"));
//! # Ok::<(), rsurf::SurfError>(())
//! ```
//!
//! Keys must be unique, sorted, and free of interior `0x00` bytes; the
//! zero byte is reserved as the terminator that marks keys ending at an
//! interior trie node. Callers with binary keys append a single `0x00`
//! sentinel to every key.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod error;
pub mod io;
pub mod succinct;
pub mod trie;

pub use config::{SuffixConfig, SuffixKind, SurfConfig};
pub use error::{Result, SurfError};
pub use succinct::{BitVector, RankVector, SelectVector};
pub use trie::{
    KeyCompare, LabelVector, LoudsDense, LoudsSparse, SuffixStore, Surf, SurfBuilder, SurfIter,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
