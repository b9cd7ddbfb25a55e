//! Binary entry point for the `fastlzcat` command-line tool.
//!
//! Argument parsing lives in [`fastlz::cli::args`]; the file-processing
//! loop in [`fastlz::cli::driver`]. Exit code 0 on success, 1 on any
//! failure with a diagnostic line on stderr.

use fastlz::cli::args::{parse_args, print_usage};
use fastlz::cli::driver;

fn main() {
    let exe_name = std::env::args()
        .next()
        .unwrap_or_else(|| "fastlzcat".to_owned());

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("fastlzcat: {e}");
            std::process::exit(1);
        }
    };

    if args.inputs.is_empty() {
        print_usage(&exe_name);
        std::process::exit(1);
    }

    std::process::exit(driver::run(&args));
}
