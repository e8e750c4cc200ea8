//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. Every code has an entry in [`crate::explain`].

/// The root rule (or a required element below it) could not match the input.
pub const UNEXPECTED_INPUT: &str = "PEG0001";
/// The root rule matched, but input remained after it.
pub const TRAILING_INPUT: &str = "PEG0002";
/// The input exceeded the configured maximum size and was not parsed.
pub const INPUT_TOO_LARGE: &str = "PEG0003";
