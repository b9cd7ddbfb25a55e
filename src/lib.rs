//! Streaming block-framed compression over fast LZ back-ends.
//!
//! The core is [`ZfastStream`], a zlib-style pull/push engine that frames
//! FastLZ (or LZ4) blocks with fixed headers, buffers what the caller's
//! slices cannot hold, and recovers from corruption through
//! [`ZfastStream::decompress_sync`]. The block codec itself lives in
//! [`block`]; [`backend`] adapts the codecs behind a two-method trait so a
//! stream can swap between them.

pub mod backend;
pub mod block;
pub mod cli;
pub mod stream;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level convenience re-exports for the most common API entry points.
// ─────────────────────────────────────────────────────────────────────────────

/// The stream handle: init, process, reset, end.
pub use stream::ZfastStream;

/// Per-call status taxonomy with stable zlib-style integer codes.
pub use stream::Status;

/// Flush directives for the compression side.
pub use stream::Flush;

/// Per-call progress report (status plus bytes moved).
pub use stream::ProcessResult;

/// Allocator hooks for the stream's scratch buffers.
pub use stream::CustomAlloc;

/// Back-end selector for [`ZfastStream::set_compressor`].
pub use backend::CompressorKind;

/// Stream probes for walking a stream header by header.
pub use stream::{
    get_header_size, get_stream_block_size, get_stream_info, is_compressed_stream, StreamInfo,
};

/// Tuning constants.
pub use stream::{
    BEST_COMPRESSION, BEST_SPEED, DEFAULT_BLOCK_SIZE, HEADER_SIZE, MIN_BLOCK_SIZE,
    NO_COMPRESSION,
};

// ─────────────────────────────────────────────────────────────────────────────
// Version API
// ─────────────────────────────────────────────────────────────────────────────

pub const FASTLZ_VERSION_MAJOR: i32 = 0;
pub const FASTLZ_VERSION_MINOR: i32 = 1;
pub const FASTLZ_VERSION_RELEASE: i32 = 0;
pub const FASTLZ_VERSION_STRING: &str = "0.1.0";

/// Returns the library version string (e.g. `"0.1.0"`).
pub fn version_string() -> &'static str {
    FASTLZ_VERSION_STRING
}
