//! Command-line plumbing for the `fastlzcat` binary: argument parsing and
//! the file-processing driver.

pub mod args;
pub mod driver;
