//! The per-call state machine driving one compression or decompression step.
//!
//! One invocation of [`step`] advances at most one block. The caller loops
//! until the buffers stop moving or a terminal status comes back. Inside a
//! call the order is fixed:
//!
//! 1. drain undelivered output scratch,
//! 2. acquire the next header (parsed when decompressing, synthesized when
//!    compressing), tolerating headers that straddle the caller boundary,
//! 3. validate the header fields,
//! 4. locate the payload, zero-copy from caller memory when it is fully
//!    present, through the input scratch otherwise,
//! 5. run the block codec straight into caller memory when it fits, into
//!    the output scratch otherwise.
//!
//! In strict mode (`may_buffer == false`) the engine refuses to start a
//! block it cannot complete against the caller's buffers and reports
//! `BufError` without consuming the header.

use crate::backend::{backend_level, BlockCodec};
use crate::block::CompressionLevel;
use crate::stream::header::{
    read_block_header, write_block_header, BLOCK_TYPE_COMPRESSED, BLOCK_TYPE_RAW, HEADER_SIZE,
};
use crate::stream::types::{
    buffer_block_size, Flush, Role, Status, StreamState, EXPANSION_RATIO, EXPANSION_SECURITY,
    MIN_BLOCK_SIZE,
};

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostics
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) const MSG_NEED_INPUT: &str = "Need more data on input";
pub(crate) const MSG_NEED_OUTPUT: &str = "Need more room on output";
pub(crate) const MSG_BAD_MAGIC: &str = "Corrupted compressed stream (bad magic)";
pub(crate) const MSG_BAD_TYPE: &str = "Corrupted compressed stream (illegal block type)";
pub(crate) const MSG_BLOCK_TOO_LARGE: &str = "Block size too large";
pub(crate) const MSG_BAD_DEC_SIZE: &str =
    "Corrupted compressed stream (illegal decompressed size)";
pub(crate) const MSG_BAD_STR_SIZE: &str = "Corrupted compressed stream (illegal stream size)";
pub(crate) const MSG_DECOMPRESS_FAILED: &str = "Unable to decompress block stream";
pub(crate) const MSG_COMPRESS_FAILED: &str = "Unable to compress block stream";
pub(crate) const MSG_NO_FLUSH_POINT: &str = "No flush point found";
pub(crate) const MSG_FINISHED: &str = "Stream already finished";
pub(crate) const MSG_NOT_INITIALIZED: &str = "Stream is not initialized";
pub(crate) const MSG_COMPRESS_ON_DECOMPRESS: &str =
    "Compressing function used with a decompressing stream";
pub(crate) const MSG_DECOMPRESS_ON_COMPRESS: &str =
    "Decompressing function used with a compressing stream";
pub(crate) const MSG_COMPRESSOR_LOCKED: &str =
    "Compressor can only be changed before the stream starts";

// ─────────────────────────────────────────────────────────────────────────────
// Step outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Raw outcome of one engine step, before the stream handle folds it into
/// its totals and `msg` field.
pub(crate) struct StepResult {
    pub status: Status,
    pub read: usize,
    pub written: usize,
    pub msg: Option<&'static str>,
}

impl StepResult {
    pub(crate) fn progress(status: Status, read: usize, written: usize) -> Self {
        StepResult {
            status,
            read,
            written,
            msg: None,
        }
    }

    pub(crate) fn fail(status: Status, msg: &'static str) -> Self {
        StepResult {
            status,
            read: 0,
            written: 0,
            msg: Some(msg),
        }
    }

    /// Failure after `read` input bytes were already consumed (a header that
    /// turned out bad, a resync scan that ran dry).
    pub(crate) fn fail_after(status: Status, msg: &'static str, read: usize) -> Self {
        StepResult {
            status,
            read,
            written: 0,
            msg: Some(msg),
        }
    }
}

/// Where the complete payload of the current block lives.
enum PayloadSource {
    /// `input[start .. start + str_size]`, untouched caller memory.
    Direct { start: usize },
    /// Accumulated in the input scratch.
    Buffered,
}

// ─────────────────────────────────────────────────────────────────────────────
// The engine
// ─────────────────────────────────────────────────────────────────────────────

/// Advance the stream by at most one block.
pub(crate) fn step(
    state: &mut StreamState,
    input: &[u8],
    output: &mut [u8],
    flush: Flush,
    may_buffer: bool,
) -> StepResult {
    state.started = true;

    let mut inp = 0usize;
    let mut outp = 0usize;

    // Undelivered bytes in the output scratch go out before anything else,
    // which keeps output ordered across blocks.
    if state.out_scratch_offs < state.dec_size {
        let size = (state.dec_size - state.out_scratch_offs).min(output.len());
        if size > 0 {
            output[..size].copy_from_slice(
                &state.out_scratch.as_slice()
                    [state.out_scratch_offs..state.out_scratch_offs + size],
            );
            state.out_scratch_offs += size;
            outp = size;
        }
        return StepResult::progress(Status::Ok, inp, outp);
    }

    let mut source: Option<PayloadSource> = None;

    if state.str_size == 0 {
        // Between blocks: read the next header or shape the next block.
        let advisory;
        match state.role {
            Role::Decompress => {
                if state.eof {
                    // The sentinel was consumed; nothing may follow it.
                    return StepResult::progress(Status::StreamEnd, inp, outp);
                }

                // The header may straddle the caller boundary.
                if state.hdr_offs != 0 || input.len() < HEADER_SIZE {
                    if state.hdr_offs == 0 && !may_buffer {
                        return StepResult::fail(Status::BufError, MSG_NEED_INPUT);
                    }
                    while inp < input.len() && state.hdr_offs < HEADER_SIZE {
                        state.hdr_accum[state.hdr_offs] = input[inp];
                        state.hdr_offs += 1;
                        inp += 1;
                    }
                }

                let header = if state.hdr_offs == 0 && input.len() >= HEADER_SIZE {
                    // Whole header sits in caller memory.
                    let header = read_block_header(&input[..HEADER_SIZE]);
                    if !may_buffer {
                        // Refuse to start a block the caller cannot complete;
                        // the header stays unconsumed.
                        if let Some(h) = header {
                            if input.len() < h.compressed_size as usize {
                                return StepResult::fail(Status::BufError, MSG_NEED_INPUT);
                            }
                            if output.len() < h.original_size as usize {
                                return StepResult::fail(Status::BufError, MSG_NEED_OUTPUT);
                            }
                        }
                    }
                    inp += HEADER_SIZE;
                    header
                } else if state.hdr_offs == HEADER_SIZE {
                    state.hdr_offs = 0;
                    read_block_header(&state.hdr_accum)
                } else {
                    // Header still incomplete; everything available was taken.
                    return StepResult::progress(Status::Ok, inp, outp);
                };

                let Some(h) = header else {
                    return StepResult::fail_after(Status::DataError, MSG_BAD_MAGIC, inp);
                };
                state.block_type = h.block_type;
                state.str_size = h.compressed_size as usize;
                state.dec_size = h.original_size as usize;
                advisory = h.block_size;
            }
            Role::Compress { .. } => {
                if state.eof {
                    if input.is_empty() {
                        return StepResult::progress(Status::StreamEnd, inp, outp);
                    }
                    return StepResult::fail(Status::StreamError, MSG_FINISHED);
                }

                let mut str_size = state.block_size as usize;
                if str_size > input.len() {
                    if flush != Flush::None {
                        // Flushing: take whatever the caller presented.
                        str_size = input.len();
                    } else if !may_buffer {
                        return StepResult::fail(Status::BufError, MSG_NEED_INPUT);
                    }
                }
                state.block_type = BLOCK_TYPE_COMPRESSED;
                state.str_size = str_size;
                state.dec_size = 0; // produced size not known yet
                advisory = 0;
            }
        }

        // Validate before the payload is touched.
        let cap = buffer_block_size(state.block_size);
        if state.block_type != BLOCK_TYPE_RAW && state.block_type != BLOCK_TYPE_COMPRESSED {
            reset_block(state);
            return StepResult::fail_after(Status::VersionError, MSG_BAD_TYPE, inp);
        }
        if advisory > state.block_size {
            reset_block(state);
            return StepResult::fail_after(Status::VersionError, MSG_BLOCK_TOO_LARGE, inp);
        }
        if state.dec_size > cap {
            reset_block(state);
            return StepResult::fail_after(Status::VersionError, MSG_BAD_DEC_SIZE, inp);
        }
        if state.str_size > cap {
            reset_block(state);
            return StepResult::fail_after(Status::VersionError, MSG_BAD_STR_SIZE, inp);
        }

        // Nothing staged for this block yet.
        state.out_scratch_offs = state.dec_size;

        // Both length fields zero is the end-of-stream sentinel.
        if matches!(state.role, Role::Decompress)
            && state.str_size == 0
            && state.dec_size == 0
        {
            state.eof = true;
            return StepResult::progress(Status::StreamEnd, inp, outp);
        }

        // Payload source: zero-copy when fully present in caller memory,
        // otherwise start accumulating in the input scratch.
        if input.len() - inp >= state.str_size {
            source = Some(PayloadSource::Direct { start: inp });
            inp += state.str_size;
        } else {
            state.in_scratch_offs = 0;
        }
    }

    // Accumulate payload bytes for an in-progress block.
    if source.is_none() {
        if state.in_scratch_offs < state.str_size {
            let size = (state.str_size - state.in_scratch_offs).min(input.len() - inp);
            if size > 0 {
                state.in_scratch.as_mut_slice()
                    [state.in_scratch_offs..state.in_scratch_offs + size]
                    .copy_from_slice(&input[inp..inp + size]);
                state.in_scratch_offs += size;
                inp += size;
            }
        }
        if state.in_scratch_offs == state.str_size {
            source = Some(PayloadSource::Buffered);
        } else if flush != Flush::None {
            // Forced flush: what accumulated becomes a short block.
            state.str_size = state.in_scratch_offs;
            source = Some(PayloadSource::Buffered);
        }
    }

    let Some(source) = source else {
        return StepResult::progress(Status::Ok, inp, outp);
    };

    // Finish may only take effect once every caller byte is in a block;
    // otherwise the sentinel would land mid-stream.
    let mut flush_now = flush;
    if flush_now == Flush::Finish && inp < input.len() {
        flush_now = Flush::None;
    }

    let in_size = state.str_size;
    state.str_size = 0;

    match state.role {
        Role::Decompress => {
            let out_size = state.dec_size;
            let direct_out = output.len() - outp >= out_size;
            let done: Option<usize> = {
                let StreamState {
                    in_scratch,
                    out_scratch,
                    kind,
                    block_type,
                    ..
                } = state;
                let src: &[u8] = match source {
                    PayloadSource::Direct { start } => &input[start..start + in_size],
                    PayloadSource::Buffered => &in_scratch.as_slice()[..in_size],
                };
                let dst: &mut [u8] = if direct_out {
                    &mut output[outp..outp + out_size]
                } else {
                    &mut out_scratch.as_mut_slice()[..out_size]
                };
                if *block_type == BLOCK_TYPE_RAW {
                    // Raw payload bytes are verbatim; both length fields
                    // must agree.
                    if in_size == out_size {
                        dst.copy_from_slice(src);
                        Some(out_size)
                    } else {
                        None
                    }
                } else {
                    kind.codec().decompress(src, dst)
                }
            };
            if done != Some(out_size) {
                return StepResult::fail_after(Status::StreamError, MSG_DECOMPRESS_FAILED, inp);
            }
            if direct_out {
                outp += out_size;
                state.out_scratch_offs = out_size; // nothing pending
            } else {
                state.out_scratch_offs = 0; // drained by later calls
            }
        }
        Role::Compress { level } => {
            let estimate = in_size + in_size / EXPANSION_RATIO + EXPANSION_SECURITY;
            let finish = flush_now == Flush::Finish;
            let direct_out = output.len() - outp >= estimate;
            let done: Option<usize> = {
                let StreamState {
                    in_scratch,
                    out_scratch,
                    kind,
                    block_size,
                    ..
                } = state;
                let src: &[u8] = match source {
                    PayloadSource::Direct { start } => &input[start..start + in_size],
                    PayloadSource::Buffered => &in_scratch.as_slice()[..in_size],
                };
                let dst: &mut [u8] = if direct_out {
                    &mut output[outp..]
                } else {
                    out_scratch.as_mut_slice()
                };
                emit_block(
                    kind.codec(),
                    backend_level(level),
                    src,
                    dst,
                    *block_size,
                    finish,
                )
            };
            let Some(done) = done else {
                return StepResult::fail_after(Status::StreamError, MSG_COMPRESS_FAILED, inp);
            };
            if finish {
                state.eof = true;
            }
            if direct_out {
                outp += done;
                state.out_scratch_offs = 0;
            } else {
                // Produced bytes wait in the output scratch.
                state.dec_size = done;
                state.out_scratch_offs = 0;
            }
        }
    }

    StepResult::progress(Status::Ok, inp, outp)
}

/// Forget the current block after a validation failure, so the stream stays
/// in a defined, non-progressing state.
fn reset_block(state: &mut StreamState) {
    state.str_size = 0;
    state.dec_size = 0;
    state.out_scratch_offs = 0;
}

/// Serialize one block (header plus payload) into `dst`, appending the
/// end-of-stream sentinel when `finish` is set.
///
/// Payloads at or below [`MIN_BLOCK_SIZE`] are stored raw; longer ones go
/// through the codec. An empty `src` writes no data block, so finishing an
/// already-drained stream produces exactly the sentinel. Returns `None`
/// when `dst` cannot hold the result.
fn emit_block(
    codec: &dyn BlockCodec,
    level: CompressionLevel,
    src: &[u8],
    dst: &mut [u8],
    block_size: u32,
    finish: bool,
) -> Option<usize> {
    let mut done = 0usize;
    if !src.is_empty() {
        let payload = if src.len() > MIN_BLOCK_SIZE {
            let n = codec.compress_level(level, src, dst.get_mut(HEADER_SIZE..)?)?;
            write_block_header(dst, BLOCK_TYPE_COMPRESSED, block_size, n as u32, src.len() as u32);
            n
        } else {
            dst.get_mut(HEADER_SIZE..HEADER_SIZE + src.len())?
                .copy_from_slice(src);
            write_block_header(
                dst,
                BLOCK_TYPE_RAW,
                block_size,
                src.len() as u32,
                src.len() as u32,
            );
            src.len()
        };
        done = HEADER_SIZE + payload;
    }
    if finish {
        let tail = dst.get_mut(done..done + HEADER_SIZE)?;
        write_block_header(tail, BLOCK_TYPE_COMPRESSED, block_size, 0, 0);
        done += HEADER_SIZE;
    }
    Some(done)
}
