//! File-processing driver for `fastlzcat`: opens the inputs, pumps them
//! through one [`ZfastStream`], and reports per-block details in list mode.
//!
//! The stream is allocated once and reset between input files. Output goes
//! to the file named by `--output`, to stdout for `-`, or nowhere at all
//! when no output was requested (decompressing to nowhere doubles as an
//! integrity check).

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use anyhow::{anyhow, bail, Context, Result};

use crate::cli::args::{OpMode, ParsedArgs, STDIO_MARK};
use crate::stream::{get_stream_block_size, get_stream_info, HEADER_SIZE};
use crate::{Flush, Status, ZfastStream};

// ─────────────────────────────────────────────────────────────────────────────
// Input plumbing
// ─────────────────────────────────────────────────────────────────────────────

/// An input byte source: a file (seekable) or stdin (skip by reading).
enum Source {
    File(File),
    Stdin(io::Stdin),
}

impl Source {
    fn open(name: &str) -> Result<Source> {
        if name == STDIO_MARK {
            Ok(Source::Stdin(io::stdin()))
        } else {
            let file =
                File::open(name).with_context(|| format!("can not open input file {name}"))?;
            Ok(Source::File(file))
        }
    }

    /// Advance past `n` payload bytes without decoding them.
    fn skip(&mut self, n: u64) -> Result<()> {
        match self {
            Source::File(f) => {
                f.seek(SeekFrom::Current(n as i64)).context("seek error")?;
                Ok(())
            }
            Source::Stdin(stdin) => {
                let mut remaining = n;
                let mut scratch = [0u8; 8192];
                while remaining > 0 {
                    let want = (scratch.len() as u64).min(remaining) as usize;
                    let got = stdin.read(&mut scratch[..want]).context("read error")?;
                    if got == 0 {
                        bail!("seek error");
                    }
                    remaining -= got as u64;
                }
                Ok(())
            }
        }
    }
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::File(f) => f.read(buf),
            Source::Stdin(s) => s.read(buf),
        }
    }
}

/// Fill `buf` as far as the source allows. Returns the byte count and
/// whether end-of-input was reached while filling.
fn fill_buf(source: &mut Source, buf: &mut [u8]) -> io::Result<(usize, bool)> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => return Ok((filled, true)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok((filled, false))
}

fn open_output(args: &ParsedArgs) -> Result<Option<Box<dyn Write>>> {
    if args.mode == OpMode::List {
        return Ok(None);
    }
    match args.output.as_deref() {
        None => Ok(None),
        Some(STDIO_MARK) => Ok(Some(Box::new(io::stdout()))),
        Some(name) => {
            let file =
                File::create(name).with_context(|| format!("can not open output file {name}"))?;
            Ok(Some(Box::new(io::BufWriter::new(file))))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Execute the parsed command line. Returns the process exit code.
pub fn run(args: &ParsedArgs) -> i32 {
    match dispatch(args) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("fastlzcat: {e:#}");
            1
        }
    }
}

fn dispatch(args: &ParsedArgs) -> Result<()> {
    let mut writer = open_output(args)?;

    let mut stream = match args.mode {
        OpMode::Compress => ZfastStream::compress_init2(args.level, args.block_size),
        OpMode::Decompress | OpMode::List => ZfastStream::decompress_init2(args.block_size),
    }
    .map_err(|status| anyhow!("unable to initialize the stream: {status}"))?;

    if stream.set_compressor(args.compressor) != Status::Ok {
        bail!("unable to initialize the specified compressor");
    }

    // List mode never decodes payloads, so it reads header-sized chunks.
    let in_buf_size = if args.mode == OpMode::List {
        HEADER_SIZE
    } else {
        args.in_buf_size
    };
    let mut in_buf = vec![0u8; in_buf_size];
    let mut out_buf = vec![0u8; args.out_buf_size];

    for name in &args.inputs {
        let mut source = Source::open(name)?;
        if args.mode == OpMode::List {
            list_file(&mut source)?;
        } else {
            match writer.as_mut() {
                Some(w) => pump_file(
                    &mut stream,
                    args.mode == OpMode::Compress,
                    args.flush,
                    &mut source,
                    Some(w.as_mut()),
                    &mut in_buf,
                    &mut out_buf,
                )?,
                None => pump_file(
                    &mut stream,
                    args.mode == OpMode::Compress,
                    args.flush,
                    &mut source,
                    None,
                    &mut in_buf,
                    &mut out_buf,
                )?,
            }
        }
        stream.reset();
        stream.total_in = 0;
        stream.total_out = 0;
    }

    if let Some(w) = writer.as_deref_mut() {
        w.flush().context("write error")?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Compress / decompress pump
// ─────────────────────────────────────────────────────────────────────────────

fn pump_file(
    stream: &mut ZfastStream,
    compressing: bool,
    flush_every: bool,
    source: &mut Source,
    mut writer: Option<&mut dyn Write>,
    in_buf: &mut [u8],
    out_buf: &mut [u8],
) -> Result<()> {
    let mut finished = false;

    loop {
        let (n, is_eof) = fill_buf(source, in_buf).context("read error")?;
        let mut chunk = &in_buf[..n];

        let flush = if !compressing {
            Flush::None
        } else if is_eof {
            Flush::Finish
        } else if flush_every {
            Flush::Sync
        } else {
            Flush::None
        };

        loop {
            let res = if compressing {
                stream.compress(chunk, out_buf, flush)
            } else {
                stream.decompress(chunk, out_buf)
            };
            if res.status.is_error() {
                bail!("stream error: {}", stream.msg().unwrap_or("unknown error"));
            }
            chunk = &chunk[res.bytes_read..];

            if res.bytes_written > 0 {
                if let Some(w) = writer.as_deref_mut() {
                    w.write_all(&out_buf[..res.bytes_written])
                        .context("write error")?;
                    if flush_every {
                        w.flush().context("write error")?;
                    }
                }
            }

            if res.status == Status::StreamEnd {
                // The sentinel must coincide with the end of the input.
                if !chunk.is_empty() || !is_eof {
                    bail!("premature EOF before end of stream");
                }
                finished = true;
                break;
            }
            if !res.made_progress() {
                break;
            }
        }

        if finished {
            break;
        }
        if is_eof {
            if compressing {
                // Finish is still pending; go around with an empty chunk
                // until the engine reports the end of the stream.
                continue;
            }
            bail!("premature end of stream");
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// List mode
// ─────────────────────────────────────────────────────────────────────────────

/// Walk the stream header by header, printing one line per block, without
/// decoding any payload.
fn list_file(source: &mut Source) -> Result<()> {
    let mut total_in: u64 = 0;
    let mut total_out: u64 = 0;
    let mut hdr = [0u8; HEADER_SIZE];

    loop {
        let (n, _) = fill_buf(source, &mut hdr).context("read error")?;
        if n != HEADER_SIZE {
            bail!("truncated input");
        }
        let info = get_stream_info(&hdr).ok_or_else(|| anyhow!("stream read error"))?;

        println!(
            "{} block at {} ([{} .. {}[):\tcompressed={}\tuncompressed={}\t[block_size={}]",
            if info.compressed_size != info.original_size {
                "compressed"
            } else {
                "uncompressed"
            },
            total_in,
            total_out,
            total_out + info.original_size as u64,
            info.compressed_size,
            info.original_size,
            get_stream_block_size(&hdr)
        );

        // Sentinel: both lengths zero; nothing may follow it.
        if info.compressed_size == 0 && info.original_size == 0 {
            let mut one = [0u8; 1];
            if source.read(&mut one).context("read error")? != 0 {
                bail!("premature EOF before end of stream");
            }
            break;
        }

        source.skip(info.compressed_size as u64)?;
        total_in += HEADER_SIZE as u64 + info.compressed_size as u64;
        total_out += info.original_size as u64;
    }
    Ok(())
}
