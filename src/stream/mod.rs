//! Streaming block-framed compression and decompression with a pull/push
//! calling convention.
//!
//! The caller owns the I/O buffers. Each [`ZfastStream::compress`] /
//! [`ZfastStream::decompress`] call consumes what it can from the input
//! slice, writes what fits into the output slice, and reports how far it
//! got; anything that does not fit is staged in stream-owned scratch
//! buffers. Strict variants refuse internal buffering and instead ask the
//! caller for a larger window.
//!
//! ```
//! use fastlz::{Flush, Status, ZfastStream};
//!
//! let mut enc = ZfastStream::compress_init(2).unwrap();
//! let mut packed = vec![0u8; 4096];
//! let r = enc.compress(b"hello world", &mut packed, Flush::Finish);
//! assert_eq!(r.status, Status::Ok);
//!
//! let mut dec = ZfastStream::decompress_init().unwrap();
//! let mut plain = vec![0u8; 4096];
//! let r = dec.decompress(&packed[..r.bytes_written], &mut plain);
//! assert_eq!(&plain[..r.bytes_written], b"hello world");
//! ```

pub(crate) mod header;
pub(crate) mod process;
pub(crate) mod sync;
pub(crate) mod types;

pub use header::HEADER_SIZE;
pub use types::{
    CustomAlloc, Flush, ProcessResult, Status, BEST_COMPRESSION, BEST_SPEED,
    DEFAULT_BLOCK_SIZE, MIN_BLOCK_SIZE, NO_COMPRESSION,
};

use crate::backend::CompressorKind;
use header::read_block_header;
use process::{step, StepResult};
use types::{buffer_block_size, Role, ScratchBuf, StreamState};

// ─────────────────────────────────────────────────────────────────────────────
// Stream probes (header-only, no stream handle required)
// ─────────────────────────────────────────────────────────────────────────────

/// Compressed/original lengths read from a block header, for list-style
/// stream walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub compressed_size: u32,
    pub original_size: u32,
}

/// Fixed number of bytes needed to identify a stream or walk a block.
#[inline]
pub fn get_header_size() -> usize {
    HEADER_SIZE
}

/// The advisory block size of the stream beginning at `input`, or 0 when
/// `input` is too short or carries no valid header.
pub fn get_stream_block_size(input: &[u8]) -> u32 {
    if input.len() < HEADER_SIZE {
        return 0;
    }
    read_block_header(&input[..HEADER_SIZE]).map_or(0, |h| h.block_size)
}

/// The length fields of the block header beginning at `input`, or `None`
/// when `input` is too short or carries no valid header.
pub fn get_stream_info(input: &[u8]) -> Option<StreamInfo> {
    if input.len() < HEADER_SIZE {
        return None;
    }
    read_block_header(&input[..HEADER_SIZE]).map(|h| StreamInfo {
        compressed_size: h.compressed_size,
        original_size: h.original_size,
    })
}

/// Whether `input` begins a compressed stream: `Ok` when it does,
/// `DataError` when it does not, `BufError` when more bytes are needed to
/// tell.
pub fn is_compressed_stream(input: &[u8]) -> Status {
    if input.len() < HEADER_SIZE {
        return Status::BufError;
    }
    if get_stream_block_size(input) != 0 {
        Status::Ok
    } else {
        Status::DataError
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// The stream handle
// ─────────────────────────────────────────────────────────────────────────────

/// A compression or decompression stream.
///
/// Running totals are public so drivers can report offsets; everything else
/// lives behind the opaque state created by the init constructors and
/// released by [`end`](ZfastStream::end) or drop.
pub struct ZfastStream {
    /// Total bytes consumed since init (or since the caller zeroed it).
    pub total_in: u64,
    /// Total bytes produced since init (or since the caller zeroed it).
    pub total_out: u64,
    msg: Option<&'static str>,
    state: Option<Box<StreamState>>,
}

impl ZfastStream {
    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Initialize a compressing stream with the default block size.
    ///
    /// `level` is on the usual 0..=9 scale; anything outside it is clamped
    /// to [`BEST_COMPRESSION`]. Levels at or below [`BEST_SPEED`] select
    /// the back-end's fast strength, higher levels its normal strength.
    pub fn compress_init(level: i32) -> Result<Self, Status> {
        Self::compress_init2(level, DEFAULT_BLOCK_SIZE)
    }

    /// Initialize a compressing stream with an explicit block size.
    pub fn compress_init2(level: i32, block_size: u32) -> Result<Self, Status> {
        Self::compress_init_with_alloc(level, block_size, CustomAlloc::default())
    }

    /// Initialize a compressing stream with explicit allocator hooks.
    pub fn compress_init_with_alloc(
        level: i32,
        block_size: u32,
        cmem: CustomAlloc,
    ) -> Result<Self, Status> {
        let level = if (NO_COMPRESSION..=BEST_COMPRESSION).contains(&level) {
            level
        } else {
            BEST_COMPRESSION
        };
        Self::init(Role::Compress { level }, block_size, cmem)
    }

    /// Initialize a decompressing stream with the default block size.
    pub fn decompress_init() -> Result<Self, Status> {
        Self::decompress_init2(DEFAULT_BLOCK_SIZE)
    }

    /// Initialize a decompressing stream with an explicit block size.
    ///
    /// Incoming frames advertising a larger block size than `block_size`
    /// are rejected with `VersionError`.
    pub fn decompress_init2(block_size: u32) -> Result<Self, Status> {
        Self::decompress_init_with_alloc(block_size, CustomAlloc::default())
    }

    /// Initialize a decompressing stream with explicit allocator hooks.
    pub fn decompress_init_with_alloc(
        block_size: u32,
        cmem: CustomAlloc,
    ) -> Result<Self, Status> {
        Self::init(Role::Decompress, block_size, cmem)
    }

    fn init(role: Role, block_size: u32, cmem: CustomAlloc) -> Result<Self, Status> {
        if block_size == 0 {
            // A zero advisory field would make emitted frames invisible to
            // the resync scanner.
            return Err(Status::StreamError);
        }
        let cap = buffer_block_size(block_size);
        let in_scratch = ScratchBuf::alloc(cmem, cap).ok_or(Status::MemError)?;
        let out_scratch = ScratchBuf::alloc(cmem, cap).ok_or(Status::MemError)?;
        Ok(ZfastStream {
            total_in: 0,
            total_out: 0,
            msg: None,
            state: Some(Box::new(StreamState {
                role,
                kind: CompressorKind::default(),
                block_size,
                in_scratch,
                out_scratch,
                hdr_accum: [0; HEADER_SIZE],
                hdr_offs: 0,
                block_type: 0,
                str_size: 0,
                dec_size: 0,
                in_scratch_offs: 0,
                out_scratch_offs: 0,
                eof: false,
                started: false,
            })),
        })
    }

    /// Return to the pre-stream state: no block in progress, no sentinel
    /// seen or emitted. Scratch buffers and totals are retained.
    pub fn reset(&mut self) -> Status {
        self.msg = None;
        match self.state.as_deref_mut() {
            Some(state) => {
                state.clear();
                Status::Ok
            }
            None => Status::StreamError,
        }
    }

    /// Release the scratch buffers through the allocator hooks. Further
    /// processing calls report `StreamError`.
    pub fn end(&mut self) -> Status {
        self.state = None;
        Status::Ok
    }

    /// Swap the block codec back-end. Valid only before the first
    /// processing call; the default is FastLZ.
    pub fn set_compressor(&mut self, kind: CompressorKind) -> Status {
        match self.state.as_deref_mut() {
            Some(state) if !state.started => {
                state.kind = kind;
                Status::Ok
            }
            Some(_) => {
                self.msg = Some(process::MSG_COMPRESSOR_LOCKED);
                Status::StreamError
            }
            None => {
                self.msg = Some(process::MSG_NOT_INITIALIZED);
                Status::StreamError
            }
        }
    }

    // ── Introspection ───────────────────────────────────────────────────────

    /// Diagnostic text for the last failure, if any.
    pub fn msg(&self) -> Option<&'static str> {
        self.msg
    }

    /// The configured block size, or 0 after `end`.
    pub fn get_block_size(&self) -> u32 {
        self.state.as_deref().map_or(0, |s| s.block_size)
    }

    /// Internal allocation footprint of a compressing stream: the private
    /// state plus both scratch buffers. `None` after `end`.
    pub fn compress_memory(&self) -> Option<usize> {
        self.state.as_deref().map(|s| {
            core::mem::size_of::<StreamState>() + s.in_scratch.len() + s.out_scratch.len()
        })
    }

    /// Internal allocation footprint of a decompressing stream.
    pub fn decompress_memory(&self) -> Option<usize> {
        self.compress_memory()
    }

    // ── Processing ──────────────────────────────────────────────────────────

    /// Compress, buffering internally whatever does not fit the caller's
    /// slices. Call until the buffers stop moving or a terminal status
    /// comes back.
    pub fn compress(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> ProcessResult {
        self.compress_strict(input, output, flush, true)
    }

    /// Compress with explicit buffering control.
    ///
    /// With `may_buffer == false` the engine never copies into scratch: a
    /// call that cannot complete a whole block against `input`/`output`
    /// returns `BufError` with nothing consumed, and the caller should
    /// retry with at least a buffer-block worth of data and room.
    pub fn compress_strict(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: Flush,
        may_buffer: bool,
    ) -> ProcessResult {
        if let Some(state) = self.state.as_deref() {
            if matches!(state.role, Role::Decompress) {
                self.msg = Some(process::MSG_COMPRESS_ON_DECOMPRESS);
                return ProcessResult {
                    status: Status::StreamError,
                    bytes_read: 0,
                    bytes_written: 0,
                };
            }
        }
        self.run(input, output, flush, may_buffer)
    }

    /// Decompress, buffering internally whatever does not fit the caller's
    /// slices. Stops with `StreamEnd` at the sentinel.
    pub fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> ProcessResult {
        self.decompress_strict(input, output, true)
    }

    /// Decompress with explicit buffering control (see
    /// [`compress_strict`](Self::compress_strict)).
    pub fn decompress_strict(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        may_buffer: bool,
    ) -> ProcessResult {
        if let Some(state) = self.state.as_deref() {
            if matches!(state.role, Role::Compress { .. }) {
                self.msg = Some(process::MSG_DECOMPRESS_ON_COMPRESS);
                return ProcessResult {
                    status: Status::StreamError,
                    bytes_read: 0,
                    bytes_written: 0,
                };
            }
        }
        self.run(input, output, Flush::None, may_buffer)
    }

    /// Skip forward to the next valid block header after a `DataError`.
    ///
    /// On `Ok`, `bytes_read` junk bytes were discarded and the next
    /// [`decompress`](Self::decompress) call should start at the header.
    /// `BufError` asks for at least a header's worth of input; `DataError`
    /// means no plausible header was found in `input`.
    pub fn decompress_sync(&mut self, input: &[u8]) -> ProcessResult {
        let step = match self.state.as_deref_mut() {
            Some(state) => {
                if matches!(state.role, Role::Compress { .. }) {
                    StepResult::fail(Status::StreamError, process::MSG_DECOMPRESS_ON_COMPRESS)
                } else {
                    sync::sync_to_header(state, input)
                }
            }
            None => StepResult::fail(Status::StreamError, process::MSG_NOT_INITIALIZED),
        };
        self.finish_step(step)
    }

    fn run(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: Flush,
        may_buffer: bool,
    ) -> ProcessResult {
        let step = match self.state.as_deref_mut() {
            Some(state) => step(state, input, output, flush, may_buffer),
            None => StepResult::fail(Status::StreamError, process::MSG_NOT_INITIALIZED),
        };
        self.finish_step(step)
    }

    fn finish_step(&mut self, step: StepResult) -> ProcessResult {
        if let Some(m) = step.msg {
            self.msg = Some(m);
        }
        self.total_in += step.read as u64;
        self.total_out += step.written as u64;
        ProcessResult {
            status: step.status,
            bytes_read: step.read,
            bytes_written: step.written,
        }
    }
}

impl core::fmt::Debug for ZfastStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ZfastStream")
            .field("total_in", &self.total_in)
            .field("total_out", &self.total_out)
            .field("msg", &self.msg)
            .field("block_size", &self.get_block_size())
            .finish()
    }
}
