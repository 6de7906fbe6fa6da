//! CLI Exit Code Registry
//!
//! Single source of truth for exit codes. Scripts rely on these, so codes
//! are append-only.
//!
//! | Code | Meaning                                   |
//! |------|-------------------------------------------|
//! | 0    | Success (including an empty suggestion list) |
//! | 1    | General error                             |
//! | 2    | CLI usage error                           |
//! | 3    | Catalog unavailable or invalid            |
//! | 4    | Tabular analysis / parse error            |
//! | 5    | Join execution error                      |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Layer catalog could not be loaded or the layer id is unknown.
pub const EXIT_CATALOG: u8 = 3;

/// Tabular input could not be read or parsed.
pub const EXIT_ANALYZE: u8 = 4;

/// Join execution failed (missing key column, unreadable layer, export).
pub const EXIT_JOIN: u8 = 5;
