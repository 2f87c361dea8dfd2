//! Standard exit codes (BSD sysexits.h compatible)

/// Command failed: clone, taxonomy diff or validation
pub const FAILURE: i32 = 1;

/// Configuration error
pub const CONFIG: i32 = 78;
