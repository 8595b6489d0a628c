//! Exit codes for the sharewatch binary.
//!
//! Success covers "no mismatch", "mismatch reported", "mismatch suppressed
//! as duplicate", and "another run holds the lock". The non-zero codes map
//! the three fatal reconciliation paths plus a general bucket; usage errors
//! exit with clap's own code (2).

/// Run completed (including suppressed or lock-contended runs).
pub const SUCCESS: u8 = 0;

/// Unclassified error.
pub const GENERAL_ERROR: u8 = 1;

/// NAS unreachable within the polling budget.
pub const UNREACHABLE: u8 = 10;

/// Share enumeration failed (authentication or transport).
pub const LIST_FAILED: u8 = 11;

/// Enumeration succeeded but advertised zero shares.
pub const NO_SHARES_VISIBLE: u8 = 12;
