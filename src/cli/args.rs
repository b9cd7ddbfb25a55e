//! Command-line argument parsing for `fastlzcat`.
//!
//! The entry points are [`parse_args`] (reads `std::env::args()`) and
//! [`parse_args_from`] (takes an explicit slice, suitable for unit-testing).
//! Both return a [`ParsedArgs`] value capturing every option and filename
//! discovered during the parse.
//!
//! A bare `-` is an input read from stdin; `--output -` (or `-c`) writes to
//! stdout. Unrecognised options return an `Err` with a human-readable
//! message.

use anyhow::{anyhow, bail, Result};

use crate::backend::CompressorKind;

/// Marker filename for stdin/stdout.
pub const STDIO_MARK: &str = "-";

/// Resolved operation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpMode {
    /// Decompress input streams (the default; this is a "cat" for
    /// compressed streams).
    #[default]
    Decompress,
    /// Compress input files.
    Compress,
    /// Walk the stream headers and print per-block details.
    List,
}

/// Complete set of options and filenames produced by the parsing loop.
#[derive(Debug)]
pub struct ParsedArgs {
    pub mode: OpMode,
    /// Block codec back-end (`--fastlz` / `--lz4`).
    pub compressor: CompressorKind,
    /// Compression level: 1 (`--fast`) or 2 (`--normal`).
    pub level: i32,
    /// Target uncompressed block length (`--blocksize`).
    pub block_size: u32,
    /// Read chunk size (`--inbufsize`).
    pub in_buf_size: usize,
    /// Write buffer size (`--outbufsize`).
    pub out_buf_size: usize,
    /// Emit (and flush) a short block after every read chunk (`--flush`).
    pub flush: bool,
    /// Output filename, `-` for stdout, `None` to discard output.
    pub output: Option<String>,
    /// Input filenames in order; `-` means stdin.
    pub inputs: Vec<String>,
}

impl Default for ParsedArgs {
    fn default() -> Self {
        ParsedArgs {
            mode: OpMode::default(),
            compressor: CompressorKind::default(),
            level: 2,
            block_size: 262_144,
            in_buf_size: 1_048_576,
            out_buf_size: 1_048_576,
            flush: false,
            output: None,
            inputs: Vec::new(),
        }
    }
}

/// Print the usage summary to stderr.
pub fn print_usage(exe_name: &str) {
    eprintln!(
        "{exe}, FastLZ compression/decompression tool.\n\
         Usage: {exe} (filename|-) (filename ..)\t#input filename(s) or stdin\n\
         \t[--output (filename|-)]\t#output filename or stdout\n\
         \t[--compress|--decompress]\t#mode\n\
         \t[--lz4|--fastlz]\t#compression type\n\
         \t[--fast|--normal]\t#compression speed\n\
         \t[--inbufsize n]\t#input buffer size (1048576)\n\
         \t[--outbufsize n]\t#output buffer size (1048576)\n\
         \t[--blocksize n]\t#block stream size (262144)\n\
         \t[--flush]\t#flush uncompressed data regularly\n\
         \t[--list]\t#list stream blocks",
        exe = exe_name
    );
}

/// Parse `std::env::args()` (skipping argv[0]).
pub fn parse_args() -> Result<ParsedArgs> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    parse_args_from(&argv)
}

/// Parse an explicit argument list. Callable from tests without touching
/// `std::env`.
pub fn parse_args_from(argv: &[String]) -> Result<ParsedArgs> {
    let mut args = ParsedArgs::default();

    let mut arg_idx = 0usize;
    while arg_idx < argv.len() {
        let argument = argv[arg_idx].as_str();

        match argument {
            "--compress" => args.mode = OpMode::Compress,
            "--decompress" | "--uncompress" | "-d" => args.mode = OpMode::Decompress,
            "--list" | "-l" => args.mode = OpMode::List,
            "--flush" => args.flush = true,
            "--lz4" => args.compressor = CompressorKind::Lz4,
            "--fastlz" => args.compressor = CompressorKind::FastLz,
            "--fast" => args.level = 1,
            "--normal" => args.level = 2,
            "-c" | "--stdout" | "--to-stdout" => args.output = Some(STDIO_MARK.to_owned()),
            "--inbufsize" => {
                args.in_buf_size = read_size_arg(argv, &mut arg_idx)? as usize;
            }
            "--outbufsize" => {
                args.out_buf_size = read_size_arg(argv, &mut arg_idx)? as usize;
            }
            "--blocksize" => {
                args.block_size = read_size_arg(argv, &mut arg_idx)?;
            }
            "--output" => {
                let value = argv
                    .get(arg_idx + 1)
                    .ok_or_else(|| anyhow!("missing argument for --output"))?;
                args.output = Some(value.clone());
                arg_idx += 1;
            }
            "--input" => {
                let value = argv
                    .get(arg_idx + 1)
                    .ok_or_else(|| anyhow!("missing argument for --input"))?;
                args.inputs.push(value.clone());
                arg_idx += 1;
            }
            _ => {
                // `-` alone is stdin; any other dash-prefixed token is an
                // unrecognised option.
                if argument != STDIO_MARK && argument.starts_with('-') {
                    bail!("invalid option: {argument}");
                }
                args.inputs.push(argument.to_owned());
            }
        }
        arg_idx += 1;
    }

    Ok(args)
}

/// Read the numeric value following a size option; zero is as unusable as
/// garbage, so both are rejected.
fn read_size_arg(argv: &[String], arg_idx: &mut usize) -> Result<u32> {
    let option = &argv[*arg_idx];
    let value = argv
        .get(*arg_idx + 1)
        .ok_or_else(|| anyhow!("missing argument for {option}"))?;
    *arg_idx += 1;
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => bail!("invalid size"),
    }
}
