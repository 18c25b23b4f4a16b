//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Schema error - schemas missing, unreadable or not resolvable to values
pub const SCHEMA_ERROR: i32 = 2;

/// Module error - module identity cannot be discovered
pub const MODULE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, unreadable digests, etc.
pub const IO_ERROR: i32 = 5;
