//! CLI Exit Code Registry
//!
//! Every exit code `gridedit` can return is defined here. Scripts that drive
//! the binary match on these values.
//!
//! | Code | Meaning                                           |
//! |------|---------------------------------------------------|
//! | 0    | Success                                           |
//! | 1    | General error (unspecified)                       |
//! | 2    | Usage error (bad arguments, cell outside sheet)   |
//! | 3    | I/O error (missing file, unwritable output)       |
//! | 4    | Parse error (sheet, script or cell reference)     |
//!
//! A replay that commits nothing, or whose commits are dropped as stale, is
//! still a success: those are editor outcomes, reported in the JSON output.

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (3-4)
// =============================================================================

/// A file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// A sheet, script or cell reference did not parse.
pub const EXIT_PARSE: u8 = 4;
