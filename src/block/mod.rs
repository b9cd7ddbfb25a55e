//! FastLZ block codec: one-shot compression and decompression of a single
//! contiguous buffer.
//!
//! Two encoder strengths are provided. Level 1 favors speed and encodes
//! matches with 13-bit offsets and lengths up to 264. Level 2 spends more
//! effort and adds far matches (16-bit extended offsets) and unbounded match
//! lengths. The first byte of a compressed buffer carries the level in its
//! top three bits, so [`decompress`] needs no side channel.
//!
//! The token stream within a block:
//! - `000LLLLL` + L+1 bytes: literal run (1..=32 literals).
//! - `LLLOOOOO` + off-low: short match, length `LLL + 2` (3..=8), biased
//!   offset `(OOOOO << 8) | off_low`.
//! - `111OOOOO` + length extension + off-low: long match. Level 1 uses one
//!   extension byte; level 2 chains `0xff` bytes.
//! - Level 2 only: a low offset byte of `0xff` with all offset high bits set
//!   escapes to a 16-bit far offset (big-endian, biased by 8191).

pub mod compress;
pub mod decompress;

pub use compress::{compress, compress_level};
pub use decompress::decompress;

use core::fmt;

/// Encoder strength selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Level 1: greedy, short offsets.
    Fast = 1,
    /// Level 2: far matches and unbounded lengths.
    Normal = 2,
}

/// Failure modes of the block codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
    /// The destination buffer cannot hold the result.
    OutputTooSmall,
    /// The token stream is malformed.
    InvalidData,
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::OutputTooSmall => f.write_str("output buffer too small"),
            BlockError::InvalidData => f.write_str("malformed compressed data"),
        }
    }
}

impl std::error::Error for BlockError {}

/// Longest literal run a single control byte can describe.
pub(crate) const MAX_COPY: usize = 32;

/// Maximum match length encodable at level 1.
pub(crate) const MAX_LEN: usize = 264;

/// Largest biased offset for the two-byte match forms (both levels).
pub(crate) const MAX_OFFSET: usize = 8190;

/// Bias applied to far offsets at level 2.
pub(crate) const FAR_BASE: usize = 8191;

/// Largest biased offset reachable with a level 2 far match.
pub(crate) const MAX_FAR_OFFSET: usize = FAR_BASE + u16::MAX as usize;

/// Worst-case compressed size for `len` input bytes.
///
/// An incompressible input degrades to literal runs: one control byte per 32
/// literals, plus slack for the level tag and a short tail run.
#[inline]
pub fn compress_bound(len: usize) -> usize {
    len + len / MAX_COPY + 16
}
