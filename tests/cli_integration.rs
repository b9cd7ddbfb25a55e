//! Black-box tests for the `fastlzcat` binary via std::process::Command.
//!
//! Covers compress/decompress dispatch, stdin/stdout plumbing, list mode,
//! exit codes and diagnostics.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Locate the `fastlzcat` binary produced by Cargo.
fn fastlzcat_bin() -> PathBuf {
    // CARGO_BIN_EXE_fastlzcat is set by Cargo for integration tests.
    if let Ok(p) = std::env::var("CARGO_BIN_EXE_fastlzcat") {
        return PathBuf::from(p);
    }
    let mut p = std::env::current_exe().expect("test binary path");
    p.pop();
    if p.ends_with("deps") {
        p.pop();
    }
    p.push("fastlzcat");
    p
}

fn make_temp_input(len: usize) -> (TempDir, PathBuf, Vec<u8>) {
    let dir = TempDir::new().expect("tempdir");
    let input_path = dir.path().join("input.txt");
    let content: Vec<u8> = b"Pack my box with five dozen liquor jugs. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect();
    fs::write(&input_path, &content).expect("write input");
    (dir, input_path, content)
}

// ── Compress / decompress roundtrip through files ────────────────────────────

#[test]
fn cli_file_roundtrip() {
    let (dir, input, original) = make_temp_input(200_000);
    let compressed = dir.path().join("output.flz");
    let restored = dir.path().join("restored.txt");

    let status = Command::new(fastlzcat_bin())
        .args([
            "--compress",
            input.to_str().expect("utf8 path"),
            "--output",
            compressed.to_str().expect("utf8 path"),
            "--blocksize",
            "32768",
        ])
        .status()
        .expect("run fastlzcat compress");
    assert!(status.success(), "compress should exit 0");
    let packed = fs::read(&compressed).expect("read compressed");
    assert!(!packed.is_empty());
    assert!(packed.len() < original.len());

    let status = Command::new(fastlzcat_bin())
        .args([
            "--decompress",
            compressed.to_str().expect("utf8 path"),
            "--output",
            restored.to_str().expect("utf8 path"),
            "--blocksize",
            "32768",
        ])
        .status()
        .expect("run fastlzcat decompress");
    assert!(status.success(), "decompress should exit 0");
    assert_eq!(fs::read(&restored).expect("read restored"), original);
}

#[test]
fn cli_lz4_backend_roundtrip() {
    let (dir, input, original) = make_temp_input(50_000);
    let compressed = dir.path().join("output.flz");
    let restored = dir.path().join("restored.txt");

    for args in [
        vec!["--compress", "--lz4", "--fast"],
        vec!["--decompress", "--lz4"],
    ] {
        let (src, dst) = if args[0] == "--compress" {
            (&input, &compressed)
        } else {
            (&compressed, &restored)
        };
        let status = Command::new(fastlzcat_bin())
            .args(&args)
            .args([
                src.to_str().expect("utf8 path"),
                "--output",
                dst.to_str().expect("utf8 path"),
            ])
            .status()
            .expect("run fastlzcat");
        assert!(status.success());
    }
    assert_eq!(fs::read(&restored).expect("read restored"), original);
}

// ── stdin / stdout plumbing ──────────────────────────────────────────────────

#[test]
fn cli_stdin_to_stdout_pipe() {
    let original = b"stream me through a pipe, please".repeat(100);

    let mut child = Command::new(fastlzcat_bin())
        .args(["--compress", "-", "-c"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn compress");
    child
        .stdin
        .take()
        .expect("stdin handle")
        .write_all(&original)
        .expect("feed stdin");
    let compressed = child.wait_with_output().expect("wait compress");
    assert!(compressed.status.success());

    let mut child = Command::new(fastlzcat_bin())
        .args(["-d", "-", "-c"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn decompress");
    child
        .stdin
        .take()
        .expect("stdin handle")
        .write_all(&compressed.stdout)
        .expect("feed stdin");
    let restored = child.wait_with_output().expect("wait decompress");
    assert!(restored.status.success());
    assert_eq!(restored.stdout, original);
}

// ── List mode ────────────────────────────────────────────────────────────────

#[test]
fn cli_list_mode_reports_blocks_and_sentinel() {
    let (dir, input, _original) = make_temp_input(70_000);
    let compressed = dir.path().join("output.flz");

    let status = Command::new(fastlzcat_bin())
        .args([
            "--compress",
            input.to_str().expect("utf8 path"),
            "--output",
            compressed.to_str().expect("utf8 path"),
            "--blocksize",
            "32768",
        ])
        .status()
        .expect("run compress");
    assert!(status.success());

    let output = Command::new(fastlzcat_bin())
        .args(["--list", compressed.to_str().expect("utf8 path")])
        .output()
        .expect("run list");
    assert!(output.status.success());

    let text = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = text.lines().collect();
    // 70_000 bytes at block size 32768: two full blocks, one tail, sentinel.
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("compressed block at 0 ([0 .. 32768[)"));
    assert!(lines[1].contains("uncompressed=32768"));
    assert!(lines[2].contains("uncompressed=4464"));
    // The sentinel line reports both lengths as zero.
    assert!(lines[3].contains("compressed=0"));
    assert!(lines[3].contains("uncompressed=0"));
}

#[test]
fn cli_list_mode_rejects_trailing_bytes_after_sentinel() {
    let (dir, input, _original) = make_temp_input(1_000);
    let compressed = dir.path().join("output.flz");

    let status = Command::new(fastlzcat_bin())
        .args([
            "--compress",
            input.to_str().expect("utf8 path"),
            "--output",
            compressed.to_str().expect("utf8 path"),
        ])
        .status()
        .expect("run compress");
    assert!(status.success());

    let mut bytes = fs::read(&compressed).expect("read compressed");
    bytes.push(0x00);
    fs::write(&compressed, &bytes).expect("rewrite");

    let output = Command::new(fastlzcat_bin())
        .args(["--list", compressed.to_str().expect("utf8 path")])
        .output()
        .expect("run list");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("premature EOF before end of stream"),
        "stderr: {stderr}"
    );
}

// ── Error reporting ──────────────────────────────────────────────────────────

#[test]
fn cli_corrupt_stream_exits_nonzero() {
    let (dir, input, _original) = make_temp_input(10_000);
    let compressed = dir.path().join("output.flz");

    let status = Command::new(fastlzcat_bin())
        .args([
            "--compress",
            input.to_str().expect("utf8 path"),
            "--output",
            compressed.to_str().expect("utf8 path"),
        ])
        .status()
        .expect("run compress");
    assert!(status.success());

    let mut bytes = fs::read(&compressed).expect("read compressed");
    bytes[0] ^= 0xff;
    fs::write(&compressed, &bytes).expect("rewrite");

    let output = Command::new(fastlzcat_bin())
        .args(["-d", compressed.to_str().expect("utf8 path")])
        .output()
        .expect("run decompress");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stream error"), "stderr: {stderr}");
}

#[test]
fn cli_truncated_stream_is_premature_end() {
    let (dir, input, _original) = make_temp_input(10_000);
    let compressed = dir.path().join("output.flz");

    let status = Command::new(fastlzcat_bin())
        .args([
            "--compress",
            input.to_str().expect("utf8 path"),
            "--output",
            compressed.to_str().expect("utf8 path"),
        ])
        .status()
        .expect("run compress");
    assert!(status.success());

    // Drop the sentinel and part of the last payload.
    let bytes = fs::read(&compressed).expect("read compressed");
    fs::write(&compressed, &bytes[..bytes.len() - 30]).expect("rewrite");

    let output = Command::new(fastlzcat_bin())
        .args(["-d", compressed.to_str().expect("utf8 path")])
        .output()
        .expect("run decompress");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("premature end of stream"), "stderr: {stderr}");
}

#[test]
fn cli_bad_usage_exits_nonzero() {
    let output = Command::new(fastlzcat_bin())
        .args(["--frobnicate", "x"])
        .output()
        .expect("run fastlzcat");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid option"));

    // No inputs at all prints the usage text.
    let output = Command::new(fastlzcat_bin())
        .output()
        .expect("run fastlzcat");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage:"));
}
