//! Resync scanner: locate the next valid block header after corruption.
//!
//! Called after a `DataError`; every byte skipped is lost, along with the
//! uncompressed data it carried.

use crate::stream::header::{read_block_header, HEADER_SIZE, STREAM_MAGIC};
use crate::stream::process::{StepResult, MSG_NEED_INPUT, MSG_NO_FLUSH_POINT};
use crate::stream::types::{Status, StreamState};

/// Scan `input` byte by byte for the next plausible header.
///
/// On `Ok`, `read` is the number of junk bytes skipped; the header itself
/// is left for the next decompress call. A candidate must carry the magic
/// and a non-zero advisory block size to count.
pub(crate) fn sync_to_header(state: &mut StreamState, input: &[u8]) -> StepResult {
    // Undelivered output means the stream is not actually stuck.
    if state.out_scratch_offs < state.dec_size {
        return StepResult::progress(Status::Ok, 0, 0);
    }

    // A half-accumulated header is abandoned.
    state.hdr_offs = 0;

    if input.len() < HEADER_SIZE {
        return StepResult::fail(Status::BufError, MSG_NEED_INPUT);
    }

    let mut pos = 0usize;
    while input.len() - pos >= HEADER_SIZE {
        if input[pos..pos + STREAM_MAGIC.len()] == STREAM_MAGIC {
            if let Some(h) = read_block_header(&input[pos..pos + HEADER_SIZE]) {
                if h.block_size != 0 {
                    return StepResult::progress(Status::Ok, pos, 0);
                }
            }
        }
        pos += 1;
    }

    // Fewer than HEADER_SIZE bytes remain unexamined; they may open the
    // next header, so they stay with the caller.
    StepResult::fail_after(Status::DataError, MSG_NO_FLUSH_POINT, pos)
}
