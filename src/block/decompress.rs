//! FastLZ block decoder.
//!
//! The level is read from the top three bits of the first control byte, so
//! the decoder accepts output from either encoder level transparently. Every
//! read and write is bounds-checked; malformed token streams surface as
//! [`BlockError::InvalidData`] rather than panics.

use super::{BlockError, FAR_BASE};

type Result<T> = core::result::Result<T, BlockError>;

#[inline]
fn next_byte(input: &[u8], ip: &mut usize) -> Result<u8> {
    let b = *input.get(*ip).ok_or(BlockError::InvalidData)?;
    *ip += 1;
    Ok(b)
}

/// Copy a `len`-byte match ending at `*op` with biased offset `off`.
///
/// Overlapping matches (offset smaller than length) are legal and encode
/// runs; those copy forward byte by byte.
#[inline]
fn copy_match(output: &mut [u8], op: &mut usize, off: usize, len: usize) -> Result<()> {
    if off >= *op {
        return Err(BlockError::InvalidData);
    }
    if *op + len > output.len() {
        return Err(BlockError::OutputTooSmall);
    }
    let ref_pos = *op - off - 1;
    if len <= off + 1 {
        let (head, tail) = output.split_at_mut(*op);
        tail[..len].copy_from_slice(&head[ref_pos..ref_pos + len]);
    } else {
        let mut src = ref_pos;
        let mut dst = *op;
        let end = dst + len;
        while dst < end {
            output[dst] = output[src];
            dst += 1;
            src += 1;
        }
    }
    *op += len;
    Ok(())
}

#[inline]
fn copy_literals(
    input: &[u8],
    output: &mut [u8],
    ip: &mut usize,
    op: &mut usize,
    run: usize,
) -> Result<()> {
    if *ip + run > input.len() {
        return Err(BlockError::InvalidData);
    }
    if *op + run > output.len() {
        return Err(BlockError::OutputTooSmall);
    }
    output[*op..*op + run].copy_from_slice(&input[*ip..*ip + run]);
    *ip += run;
    *op += run;
    Ok(())
}

fn decompress_level1(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut ip = 1usize;
    let mut op = 0usize;
    let mut ctrl = (input[0] & 31) as usize;

    loop {
        if ctrl >= 32 {
            let mut len = (ctrl >> 5) + 2;
            if ctrl >> 5 == 7 {
                len += next_byte(input, &mut ip)? as usize;
            }
            let low = next_byte(input, &mut ip)? as usize;
            let off = ((ctrl & 31) << 8) | low;
            copy_match(output, &mut op, off, len)?;
        } else {
            copy_literals(input, output, &mut ip, &mut op, ctrl + 1)?;
        }

        if ip < input.len() {
            ctrl = input[ip] as usize;
            ip += 1;
        } else {
            break;
        }
    }
    Ok(op)
}

fn decompress_level2(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut ip = 1usize;
    let mut op = 0usize;
    let mut ctrl = (input[0] & 31) as usize;

    loop {
        if ctrl >= 32 {
            let mut len = (ctrl >> 5) + 2;
            if ctrl >> 5 == 7 {
                loop {
                    let code = next_byte(input, &mut ip)?;
                    len += code as usize;
                    if code != 255 {
                        break;
                    }
                }
            }
            let low = next_byte(input, &mut ip)? as usize;
            let mut off = ((ctrl & 31) << 8) | low;
            if low == 255 && (ctrl & 31) == 31 {
                // Far-offset escape: 16-bit big-endian offset, biased.
                let hi = next_byte(input, &mut ip)? as usize;
                let lo = next_byte(input, &mut ip)? as usize;
                off = FAR_BASE + ((hi << 8) | lo);
            }
            copy_match(output, &mut op, off, len)?;
        } else {
            copy_literals(input, output, &mut ip, &mut op, ctrl + 1)?;
        }

        if ip < input.len() {
            ctrl = input[ip] as usize;
            ip += 1;
        } else {
            break;
        }
    }
    Ok(op)
}

/// Decompress a FastLZ block into `output`, returning the decoded length.
///
/// The encoder level is taken from the first byte. An empty input decodes to
/// zero bytes. The caller compares the returned length against the expected
/// one; a shorter result means the block was truncated or corrupted in a way
/// that still parsed.
pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<usize> {
    if input.is_empty() {
        return Ok(0);
    }
    match (input[0] >> 5) + 1 {
        1 => decompress_level1(input, output),
        2 => decompress_level2(input, output),
        _ => Err(BlockError::InvalidData),
    }
}
