//! Stream-level types: status taxonomy, flush directives, allocator hooks,
//! scratch buffers, and the private per-stream state.
//!
//! Covers:
//! - [`Status`] with the stable zlib-style integer codes
//! - [`Flush`] directives for the compression side
//! - [`ProcessResult`], the per-call progress report
//! - [`CustomAlloc`] allocator hooks and the [`ScratchBuf`] they back
//! - `StreamState`, the opaque state held by the stream handle

use core::fmt;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

use crate::backend::CompressorKind;
use crate::stream::header::HEADER_SIZE;

// ─────────────────────────────────────────────────────────────────────────────
// Tuning constants
// ─────────────────────────────────────────────────────────────────────────────

/// Payloads at or below this length are stored verbatim (`Raw` blocks);
/// longer payloads go through the block codec.
pub const MIN_BLOCK_SIZE: usize = 64;

/// Block size used when none is given explicitly.
pub const DEFAULT_BLOCK_SIZE: u32 = 32_768;

/// Worst-case growth divisor for a compressed block (10 -> +10%).
pub(crate) const EXPANSION_RATIO: usize = 10;

/// Flat safety margin on top of the expansion ratio; also covers the block
/// header and a trailing sentinel.
pub(crate) const EXPANSION_SECURITY: usize = 66;

/// Capacity of each scratch buffer for a given block size: one block, its
/// worst-case expansion, and room for two headers.
#[inline]
pub(crate) fn buffer_block_size(block_size: u32) -> usize {
    let bs = block_size as usize;
    bs + bs / EXPANSION_RATIO + 2 * HEADER_SIZE
}

// ─────────────────────────────────────────────────────────────────────────────
// Compression levels (zlib scale)
// ─────────────────────────────────────────────────────────────────────────────

/// Lowest accepted compression level.
pub const NO_COMPRESSION: i32 = 0;
/// Fastest compression.
pub const BEST_SPEED: i32 = 1;
/// Highest accepted compression level.
pub const BEST_COMPRESSION: i32 = 9;

// ─────────────────────────────────────────────────────────────────────────────
// Status codes
// ─────────────────────────────────────────────────────────────────────────────

/// Per-call status of the stream engine.
///
/// `code()` exposes the stable zlib-style integers so callers porting from a
/// return-code API keep their numeric expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Progress was made; call again.
    Ok,
    /// The end-of-stream sentinel was consumed (or, compressing, the stream
    /// is finished and drained).
    StreamEnd,
    /// Reserved; never produced by this library.
    NeedDict,
    /// API misuse or a block codec failure.
    StreamError,
    /// Corrupted stream (bad magic). Recoverable through resync.
    DataError,
    /// Scratch buffer allocation failed.
    MemError,
    /// More input or more output room is required (strict mode).
    BufError,
    /// Structurally valid header with an impossible field.
    VersionError,
}

impl Status {
    /// Stable integer code, matching the zlib taxonomy.
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::StreamEnd => 1,
            Status::NeedDict => 2,
            Status::StreamError => -2,
            Status::DataError => -3,
            Status::MemError => -4,
            Status::BufError => -5,
            Status::VersionError => -6,
        }
    }

    /// `true` for every variant with a negative code.
    #[inline]
    pub fn is_error(self) -> bool {
        self.code() < 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "ok",
            Status::StreamEnd => "stream end",
            Status::NeedDict => "need dictionary",
            Status::StreamError => "stream error",
            Status::DataError => "data error",
            Status::MemError => "insufficient memory",
            Status::BufError => "buffer error",
            Status::VersionError => "incompatible version",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Flush directives
// ─────────────────────────────────────────────────────────────────────────────

/// Flush directive for [`ZfastStream::compress`](crate::ZfastStream::compress).
///
/// The decompression side ignores flush: the decoder stops at the sentinel
/// regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flush {
    /// Only complete blocks are emitted; partial input stays buffered.
    #[default]
    None,
    /// Emit whatever has accumulated as a short block. No sentinel.
    Sync,
    /// Emit remaining input, then append the end-of-stream sentinel.
    Finish,
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-call progress report
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one `compress`/`decompress` call: the status plus how far the
/// engine advanced into the caller's buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    pub status: Status,
    /// Bytes consumed from the input slice.
    pub bytes_read: usize,
    /// Bytes written to the output slice.
    pub bytes_written: usize,
}

impl ProcessResult {
    /// `true` when the call moved at least one byte in either direction.
    #[inline]
    pub fn made_progress(&self) -> bool {
        self.bytes_read > 0 || self.bytes_written > 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Allocator hooks
// ─────────────────────────────────────────────────────────────────────────────

/// Injectable allocator pair used for the stream's scratch buffers.
///
/// When `alloc_fn`/`free_fn` are `None`, the global allocator is used. The
/// `opaque` cookie is passed through to both hooks untouched.
#[derive(Clone, Copy)]
pub struct CustomAlloc {
    /// Allocation hook; must return zeroed or initialized memory of `size`
    /// bytes, or null on failure.
    pub alloc_fn: Option<fn(opaque: *mut (), size: usize) -> *mut u8>,
    /// Release hook for pointers produced by `alloc_fn`.
    pub free_fn: Option<fn(opaque: *mut (), ptr: *mut u8, size: usize)>,
    /// Cookie handed to both hooks.
    pub opaque: *mut (),
}

impl Default for CustomAlloc {
    fn default() -> Self {
        CustomAlloc {
            alloc_fn: None,
            free_fn: None,
            opaque: core::ptr::null_mut(),
        }
    }
}

// SAFETY: the hooks are plain function pointers and the cookie is only ever
// forwarded to them; the library never dereferences `opaque`.
unsafe impl Send for CustomAlloc {}
unsafe impl Sync for CustomAlloc {}

impl fmt::Debug for CustomAlloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAlloc")
            .field("alloc_fn", &self.alloc_fn.map(|_| "<fn>"))
            .field("free_fn", &self.free_fn.map(|_| "<fn>"))
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scratch buffer
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed-size byte buffer allocated through [`CustomAlloc`].
///
/// Owns its memory and releases it through the same hooks on drop.
pub(crate) struct ScratchBuf {
    ptr: NonNull<u8>,
    size: usize,
    cmem: CustomAlloc,
}

impl ScratchBuf {
    /// Allocate `size` bytes through `cmem`. Returns `None` when the
    /// allocator reports failure.
    pub(crate) fn alloc(cmem: CustomAlloc, size: usize) -> Option<Self> {
        let layout = Layout::from_size_align(size, 1).ok()?;
        let raw = match cmem.alloc_fn {
            Some(f) => f(cmem.opaque, size),
            // SAFETY: `size` is non-zero for every stream (block_size 0 is
            // rejected at init), and the layout above is valid for it.
            None => unsafe { alloc_zeroed(layout) },
        };
        NonNull::new(raw).map(|ptr| ScratchBuf { ptr, size, cmem })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` covers `size` initialized bytes for the buffer's
        // whole lifetime.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, plus exclusive access through `&mut self`.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }
}

impl Drop for ScratchBuf {
    fn drop(&mut self) {
        match self.cmem.free_fn {
            Some(f) => f(self.cmem.opaque, self.ptr.as_ptr(), self.size),
            None => {
                // SAFETY: allocated with the identical layout in `alloc`.
                if let Ok(layout) = Layout::from_size_align(self.size, 1) {
                    unsafe { dealloc(self.ptr.as_ptr(), layout) };
                }
            }
        }
    }
}

// SAFETY: ScratchBuf uniquely owns its allocation; nothing aliases it.
unsafe impl Send for ScratchBuf {}

// ─────────────────────────────────────────────────────────────────────────────
// Private stream state
// ─────────────────────────────────────────────────────────────────────────────

/// Direction of a stream, fixed at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// Compressing with the given (clamped) zlib-scale level.
    Compress { level: i32 },
    Decompress,
}

/// The opaque state behind a stream handle. Created by the init functions,
/// released by `end` (or drop).
pub(crate) struct StreamState {
    pub role: Role,
    /// Active block codec back-end.
    pub kind: CompressorKind,
    /// Configured target uncompressed block length.
    pub block_size: u32,
    /// Payload staging when caller input cannot hold a whole block.
    pub in_scratch: ScratchBuf,
    /// Output staging when caller output cannot hold a whole block.
    pub out_scratch: ScratchBuf,
    /// Accumulator for a header that straddles a caller boundary.
    pub hdr_accum: [u8; HEADER_SIZE],
    /// Bytes of `hdr_accum` filled so far; HEADER_SIZE only transiently.
    pub hdr_offs: usize,
    /// Raw block-type byte of the block in progress.
    pub block_type: u8,
    /// On-wire payload length of the block in progress (0 = between blocks).
    pub str_size: usize,
    /// Uncompressed length of the block in progress; while the out scratch
    /// holds data, the amount buffered there.
    pub dec_size: usize,
    /// Payload bytes accumulated in `in_scratch`.
    pub in_scratch_offs: usize,
    /// Bytes of `out_scratch` already delivered; equal to `dec_size` when
    /// nothing is pending.
    pub out_scratch_offs: usize,
    /// Compressing: the sentinel has been emitted. Decompressing: the
    /// sentinel has been consumed.
    pub eof: bool,
    /// Set on the first process call; locks the compressor choice.
    pub started: bool,
}

impl StreamState {
    /// Return to the pre-stream state. Buffers are retained.
    pub(crate) fn clear(&mut self) {
        self.hdr_offs = 0;
        self.block_type = 0;
        self.str_size = 0;
        self.dec_size = 0;
        self.in_scratch_offs = 0;
        self.out_scratch_offs = 0;
        self.eof = false;
        self.started = false;
    }
}
