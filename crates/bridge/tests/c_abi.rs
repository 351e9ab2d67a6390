#![allow(clippy::unwrap_used, clippy::expect_used)]
//! The C ABI driven the way a C binding would drive it.

use std::ptr;

use das_bridge::ffi::probe::{das_probe_fail, das_probe_panic, das_probe_status, das_probe_succeed};
use das_bridge::ffi::{
    DasExceptionHandle, das_clear_last_error, das_exception_get_error_code,
    das_exception_get_message, das_exception_new, das_exception_release, das_get_last_error,
    das_get_predefined_error_message, das_status_lookup,
};
use das_core::DasStatus;
use das_test_utils::sample_messages;

/// What a C binding sees after a failing call: the handle's code and message.
fn last_error() -> Option<(i32, String)> {
    let mut handle: *mut DasExceptionHandle = ptr::null_mut();
    assert_eq!(unsafe { das_get_last_error(&mut handle) }, 0);
    if handle.is_null() {
        return None;
    }
    let code = unsafe { das_exception_get_error_code(handle) };
    let message = read_message(handle);
    unsafe { das_exception_release(handle) };
    Some((code, message))
}

fn read_message(handle: *const DasExceptionHandle) -> String {
    let mut len = 0_usize;
    assert_eq!(
        unsafe { das_exception_get_message(handle, ptr::null_mut(), 0, &mut len) },
        0
    );
    let mut buf = vec![0_u8; len];
    assert_eq!(
        unsafe { das_exception_get_message(handle, buf.as_mut_ptr(), buf.len(), &mut len) },
        0
    );
    String::from_utf8(buf).unwrap()
}

#[test]
fn test_failing_export_surfaces_exact_code_and_message() {
    for message in sample_messages() {
        let status = unsafe { das_probe_fail(-1073741847, message.as_ptr(), message.len()) };
        assert_eq!(status, -1073741847);
        assert_eq!(last_error(), Some((-1073741847, (*message).to_string())));
    }
}

#[test]
fn test_sequential_export_failures_do_not_alias() {
    let first = "Test error message";
    let second = "undefined return";

    unsafe { das_probe_fail(-1073741847, first.as_ptr(), first.len()) };
    let mut first_handle: *mut DasExceptionHandle = ptr::null_mut();
    unsafe { das_get_last_error(&mut first_handle) };

    unsafe { das_probe_fail(-1073741832, second.as_ptr(), second.len()) };
    let mut second_handle: *mut DasExceptionHandle = ptr::null_mut();
    unsafe { das_get_last_error(&mut second_handle) };

    assert_ne!(first_handle, second_handle);
    let first_code = unsafe { das_exception_get_error_code(first_handle) };
    assert_eq!(first_code, -1073741847);
    assert_eq!(read_message(first_handle), first);
    let second_code = unsafe { das_exception_get_error_code(second_handle) };
    assert_eq!(second_code, -1073741832);
    assert_eq!(read_message(second_handle), second);

    unsafe {
        das_exception_release(first_handle);
        das_exception_release(second_handle);
    }
}

#[test]
fn test_succeeding_export_writes_result_and_raises_nothing() {
    das_clear_last_error();
    let mut out = 0_i32;
    assert_eq!(unsafe { das_probe_succeed(99, &mut out) }, 0);
    assert_eq!(out, 99);
    assert_eq!(last_error(), None);
}

#[test]
fn test_succeeding_export_rejects_null_output() {
    let status = unsafe { das_probe_succeed(1, ptr::null_mut()) };
    assert_eq!(status, DasStatus::INVALID_POINTER.raw());
    let (code, message) = last_error().unwrap();
    assert_eq!(code, DasStatus::INVALID_POINTER.raw());
    assert!(message.contains("das_probe_succeed"));
}

#[test]
fn test_status_export_uses_parked_message() {
    let timeout = DasStatus::TIMEOUT.raw();
    let status = unsafe { das_probe_status(timeout) };
    assert_eq!(status, timeout);
    let parked = format!("Probe returned status {timeout}");
    assert_eq!(last_error(), Some((timeout, parked)));

    assert_eq!(unsafe { das_probe_status(3) }, 3);
    assert_eq!(last_error(), None);
}

#[test]
fn test_panicking_export_is_contained() {
    let status = unsafe { das_probe_panic() };
    assert_eq!(status, DasStatus::INTERNAL_FATAL_ERROR.raw());
    let (_, message) = last_error().unwrap();
    assert_eq!(message, "probe panic requested");
}

#[test]
fn test_invalid_utf8_is_invalid_string() {
    let bytes = [b'o', b'k', 0xc3];
    let status = unsafe { das_probe_fail(-1, bytes.as_ptr(), bytes.len()) };
    assert_eq!(status, DasStatus::INVALID_STRING.raw());
}

#[test]
fn test_handles_can_be_built_directly() {
    let message = "built by C";
    let mut handle: *mut DasExceptionHandle = ptr::null_mut();
    let status = unsafe {
        das_exception_new(
            DasStatus::CAPTURE_FAILED.raw(),
            message.as_ptr(),
            message.len(),
            &mut handle,
        )
    };
    assert_eq!(status, 0);
    assert_eq!(
        unsafe { das_exception_get_error_code(handle) },
        DasStatus::CAPTURE_FAILED.raw()
    );

    let mut small = [0_u8; 4];
    let mut len = 0_usize;
    let status =
        unsafe { das_exception_get_message(handle, small.as_mut_ptr(), small.len(), &mut len) };
    assert_eq!(status, DasStatus::INVALID_STRING_SIZE.raw());
    assert_eq!(len, message.len());

    assert_eq!(read_message(handle), message);
    unsafe { das_exception_release(handle) };

    assert_eq!(
        unsafe { das_exception_get_error_code(ptr::null()) },
        DasStatus::INVALID_POINTER.raw()
    );
    unsafe { das_exception_release(ptr::null_mut()) };
}

#[test]
fn test_status_lookup_resolves_names() {
    let name = "DAS_E_INVALID_ENUM";
    let mut code = 0_i32;
    assert_eq!(
        unsafe { das_status_lookup(name.as_ptr(), name.len(), &mut code) },
        0
    );
    assert_eq!(code, -1073741853);

    let unknown = "DAS_E_NOPE";
    let status = unsafe { das_status_lookup(unknown.as_ptr(), unknown.len(), &mut code) };
    assert_eq!(status, DasStatus::NOT_FOUND.raw());
    assert!(last_error().unwrap().1.contains("DAS_E_NOPE"));
}

#[test]
fn test_predefined_messages_are_exposed() {
    let mut buf = [0_u8; 64];
    let mut len = 0_usize;
    let status = unsafe {
        das_get_predefined_error_message(
            DasStatus::INVALID_POINTER.raw(),
            buf.as_mut_ptr(),
            buf.len(),
            &mut len,
        )
    };
    assert_eq!(status, 0);
    assert_eq!(&buf[..len], b"Invalid pointer");
}
