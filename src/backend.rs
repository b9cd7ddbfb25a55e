//! Block codec adapter: a uniform two-method surface over the back-ends the
//! stream engine can drive.
//!
//! The engine never calls a codec directly; it goes through [`BlockCodec`]
//! so the back-end can be swapped per stream with
//! [`set_compressor`](crate::ZfastStream::set_compressor). FastLZ is the
//! in-repo codec in [`crate::block`]; LZ4 rides on the `lz4_flex` block API.

use crate::block::{self, CompressionLevel};
use crate::stream::{BEST_SPEED, NO_COMPRESSION};

/// Uniform signature over a block back-end.
///
/// Both methods report failure as `None`; the engine turns that into a
/// stream error. `compress_level` writes at most
/// `src.len() + src.len() / 10 + 66` bytes for any input either back-end
/// accepts at the block sizes the engine produces.
pub trait BlockCodec: Sync {
    /// Compress `src` into `dst`, returning the compressed length.
    fn compress_level(
        &self,
        level: CompressionLevel,
        src: &[u8],
        dst: &mut [u8],
    ) -> Option<usize>;

    /// Decompress `src` into `dst`, returning the decompressed length.
    /// Callers verify the length against the framing header.
    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Option<usize>;
}

/// The FastLZ back-end ([`crate::block`]).
pub struct FastLzCodec;

impl BlockCodec for FastLzCodec {
    fn compress_level(
        &self,
        level: CompressionLevel,
        src: &[u8],
        dst: &mut [u8],
    ) -> Option<usize> {
        block::compress_level(level, src, dst).ok()
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Option<usize> {
        block::decompress(src, dst).ok()
    }
}

/// The LZ4 back-end (`lz4_flex` block format).
///
/// `lz4_flex` exposes a single compressor strength, so both levels map onto
/// it; decompression is level-independent anyway.
pub struct Lz4Codec;

impl BlockCodec for Lz4Codec {
    fn compress_level(
        &self,
        _level: CompressionLevel,
        src: &[u8],
        dst: &mut [u8],
    ) -> Option<usize> {
        lz4_flex::block::compress_into(src, dst).ok()
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Option<usize> {
        lz4_flex::block::decompress_into(src, dst).ok()
    }
}

/// Selectable back-end for a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressorKind {
    #[default]
    FastLz,
    Lz4,
}

impl CompressorKind {
    /// The codec object behind this selector.
    pub(crate) fn codec(self) -> &'static dyn BlockCodec {
        match self {
            CompressorKind::FastLz => &FastLzCodec,
            CompressorKind::Lz4 => &Lz4Codec,
        }
    }
}

/// Map a zlib-scale level onto a back-end strength: everything at or below
/// "best speed" is level 1, the rest level 2.
#[inline]
pub(crate) fn backend_level(level: i32) -> CompressionLevel {
    if (NO_COMPRESSION..=BEST_SPEED).contains(&level) {
        CompressionLevel::Fast
    } else {
        CompressionLevel::Normal
    }
}
