//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: u8 = 0;

/// Values error - a values source could not be decoded or a --set token is malformed
pub const VALUES_ERROR: u8 = 2;

/// Template error - template parsing or rendering failed
pub const TEMPLATE_ERROR: u8 = 3;

/// Chart error - chart directory missing or unknown template requested
pub const CHART_ERROR: u8 = 4;

/// IO error - file not found, URL unreachable, output closed, etc.
pub const IO_ERROR: u8 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: u8 = 64;
