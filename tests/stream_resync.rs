//! Resync scanner suites: recovery after corruption, junk skipping, and the
//! scanner's own edge cases.

use fastlz::{Flush, Status, ZfastStream};

fn compress_all(data: &[u8], level: i32, block_size: u32) -> Vec<u8> {
    let mut stream = ZfastStream::compress_init2(level, block_size).expect("compress init");
    let mut out = Vec::new();
    let mut buf = vec![0u8; 64 * 1024];
    let mut chunk = data;
    loop {
        let res = stream.compress(chunk, &mut buf, Flush::Finish);
        assert!(!res.status.is_error());
        chunk = &chunk[res.bytes_read..];
        out.extend_from_slice(&buf[..res.bytes_written]);
        if res.status == Status::StreamEnd {
            break;
        }
    }
    out
}

/// Byte offsets of each block header in `stream_bytes` (sentinel included).
fn header_offsets(stream_bytes: &[u8]) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut pos = 0usize;
    while pos < stream_bytes.len() {
        offsets.push(pos);
        let info = fastlz::get_stream_info(&stream_bytes[pos..]).expect("header");
        pos += fastlz::get_header_size() + info.compressed_size as usize;
        if info.compressed_size == 0 && info.original_size == 0 {
            break;
        }
    }
    offsets
}

#[test]
fn resync_after_corrupted_header_resumes_at_next_block() {
    // 100k of 'A' at block size 32768: three full blocks, a 1696-byte tail,
    // then the sentinel.
    let data = vec![b'A'; 100_000];
    let mut corrupted = compress_all(&data, 1, 32_768);
    let offsets = header_offsets(&corrupted);
    assert_eq!(offsets.len(), 5);

    // Smash the magic of the second block's header.
    corrupted[offsets[1]] ^= 0xff;

    let mut stream = ZfastStream::decompress_init2(32_768).expect("decompress init");
    let mut buf = vec![0u8; 64 * 1024];
    let mut out = Vec::new();
    let mut pos = 0usize;

    // Block 1 decodes, then the bad magic surfaces.
    loop {
        let res = stream.decompress(&corrupted[pos..], &mut buf);
        pos += res.bytes_read;
        out.extend_from_slice(&buf[..res.bytes_written]);
        if res.status == Status::DataError {
            break;
        }
        assert_eq!(res.status, Status::Ok);
        assert!(res.made_progress());
    }
    assert_eq!(out.len(), 32_768);
    assert_eq!(
        stream.msg(),
        Some("Corrupted compressed stream (bad magic)")
    );

    // The scanner discards the unreachable block 2 payload and lands on the
    // third header.
    let res = stream.decompress_sync(&corrupted[pos..]);
    assert_eq!(res.status, Status::Ok);
    pos += res.bytes_read;
    assert_eq!(pos, offsets[2]);

    // Decoding resumes and delivers blocks 3 and 4.
    let mut tail = Vec::new();
    loop {
        let res = stream.decompress(&corrupted[pos..], &mut buf);
        assert!(!res.status.is_error(), "{:?}", stream.msg());
        pos += res.bytes_read;
        tail.extend_from_slice(&buf[..res.bytes_written]);
        if res.status == Status::StreamEnd {
            break;
        }
    }
    assert_eq!(tail.len(), 100_000 - 2 * 32_768);
    assert!(tail.iter().all(|&b| b == b'A'));
}

#[test]
fn resync_skips_injected_junk_between_frames() {
    let first = b"first frame payload first frame payload!".repeat(4);
    let second = b"second frame payload second frame payload".repeat(4);

    // A finished stream for each part, with junk spliced in between.
    let stream_a = compress_all(&first, 2, 1_024);
    let stream_b = compress_all(&second, 2, 1_024);
    let junk = [0x55u8; 50];

    let mut spliced = Vec::new();
    // Only the data frames of stream A; its sentinel would end decoding.
    let a_offsets = header_offsets(&stream_a);
    spliced.extend_from_slice(&stream_a[..a_offsets[a_offsets.len() - 1]]);
    spliced.extend_from_slice(&junk);
    spliced.extend_from_slice(&stream_b);

    let mut stream = ZfastStream::decompress_init2(1_024).expect("decompress init");
    let mut buf = vec![0u8; 16 * 1024];
    let mut out = Vec::new();
    let mut pos = 0usize;

    loop {
        let res = stream.decompress(&spliced[pos..], &mut buf);
        pos += res.bytes_read;
        out.extend_from_slice(&buf[..res.bytes_written]);
        if res.status == Status::DataError {
            break;
        }
        assert_eq!(res.status, Status::Ok);
    }
    assert_eq!(out, first);

    let res = stream.decompress_sync(&spliced[pos..]);
    assert_eq!(res.status, Status::Ok);
    pos += res.bytes_read;

    let mut resumed = Vec::new();
    loop {
        let res = stream.decompress(&spliced[pos..], &mut buf);
        assert!(!res.status.is_error(), "{:?}", stream.msg());
        pos += res.bytes_read;
        resumed.extend_from_slice(&buf[..res.bytes_written]);
        if res.status == Status::StreamEnd {
            break;
        }
    }
    assert_eq!(resumed, second);
}

#[test]
fn resync_needs_a_header_worth_of_input() {
    let mut stream = ZfastStream::decompress_init2(1_024).expect("decompress init");
    let res = stream.decompress_sync(&[0u8; 10]);
    assert_eq!(res.status, Status::BufError);
    assert_eq!(res.bytes_read, 0);
    assert_eq!(stream.msg(), Some("Need more data on input"));
}

#[test]
fn resync_without_any_magic_reports_data_error() {
    let junk = vec![0x99u8; 4_096];
    let mut stream = ZfastStream::decompress_init2(1_024).expect("decompress init");
    let res = stream.decompress_sync(&junk);
    assert_eq!(res.status, Status::DataError);
    assert_eq!(stream.msg(), Some("No flush point found"));
    // The unexamined tail (one byte short of a header) stays with the caller.
    assert_eq!(res.bytes_read, junk.len() - (fastlz::get_header_size() - 1));
}

#[test]
fn resync_is_a_no_op_while_output_is_pending() {
    let data = b"pending output pending output pending out".repeat(8);
    let compressed = compress_all(&data, 2, 1_024);

    let mut stream = ZfastStream::decompress_init2(1_024).expect("decompress init");
    // A one-byte output window forces the decoded block into scratch.
    let mut tiny = [0u8; 1];
    let mut pos = 0usize;
    loop {
        let res = stream.decompress(&compressed[pos..], &mut tiny);
        assert!(!res.status.is_error());
        pos += res.bytes_read;
        if res.bytes_written > 0 {
            break;
        }
    }

    let res = stream.decompress_sync(&compressed[pos..]);
    assert_eq!(res.status, Status::Ok);
    assert_eq!(res.bytes_read, 0);
}
