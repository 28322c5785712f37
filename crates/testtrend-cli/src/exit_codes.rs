//! Process exit codes. Part of the public contract of the `testtrend` binary.

use testtrend_core::TrendError;

pub const EXIT_SUCCESS: i32 = 0;
/// History is corrupted: a result is attached to the wrong build.
pub const EXIT_DATA_CORRUPTION: i32 = 1;
/// Bad arguments, unreadable config or history input.
pub const EXIT_CONFIG_ERROR: i32 = 2;

pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<TrendError>() {
        Some(e) if e.is_data_consistency() => EXIT_DATA_CORRUPTION,
        _ => EXIT_CONFIG_ERROR,
    }
}
