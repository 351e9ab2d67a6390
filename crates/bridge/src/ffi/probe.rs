//! Self-test entry points.
//!
//! Bindings call these to check that a failure raised natively arrives on
//! their side with the same code and message, and that success raises
//! nothing.

use das_bridge_macros::das_export;
use das_core::{DasException, DasResult, DasStatus, error_info};

use super::str_arg;

/// Fail with exactly `(code, message)`.
///
/// # Safety
///
/// `message_ptr` must be null (with `message_len == 0`) or valid for reads
/// of `message_len` bytes.
#[das_export]
pub unsafe fn das_probe_fail(
    code: i32,
    message_ptr: *const u8,
    message_len: usize,
) -> DasResult<()> {
    // SAFETY: upheld by the caller.
    let message = unsafe { str_arg(message_ptr, message_len)? };
    Err(DasException::new(DasStatus::from_raw(code), message))
}

/// Succeed, echoing `value`.
#[das_export]
pub fn das_probe_succeed(value: i32) -> DasResult<i32> {
    Ok(value)
}

/// Return `code` the code-returning way, parking a message describing it
/// when it is a failure.
#[das_export(status)]
pub fn das_probe_status(code: i32) -> DasStatus {
    let status = DasStatus::from_raw(code);
    if status.is_failed() {
        return error_info::record_failure(DasException::new(
            status,
            format!("Probe returned status {code}"),
        ));
    }
    status
}

/// Panic inside native code.
#[das_export]
pub fn das_probe_panic() -> DasResult<()> {
    panic!("probe panic requested");
}
