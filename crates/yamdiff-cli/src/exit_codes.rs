//! Standard exit codes for CLI operations
//!
//! These follow Unix conventions and sysexits.h where applicable.

#![allow(dead_code)]

/// Success - the diff may still be non-empty
pub const SUCCESS: i32 = 0;

/// General error - parse failures and unspecified failures
pub const ERROR: i32 = 1;

/// Validation error - schema validation or marker uniqueness failed
pub const VALIDATION_ERROR: i32 = 2;

/// Usage error - invalid arguments or options (sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
