//! C ABI.
//!
//! C has no exceptions, so the C binding raises by returning the failing
//! status and parking the [`ForeignException`] in a per-thread pending slot,
//! retrieved with [`das_get_last_error`]. Every wrapped entry point clears
//! that slot on entry, so after a failing call it always describes that
//! call.
//!
//! # Conventions
//!
//! - Entry points return an `i32` status; `0` is success.
//! - Results go through out-pointers. A null required out-pointer yields
//!   `DAS_E_INVALID_POINTER` and the operation does not run.
//! - Strings in are `(ptr, len)` UTF-8 byte ranges, not NUL-terminated.
//!   Invalid UTF-8 yields `DAS_E_INVALID_STRING`.
//! - Strings out are copied into `(buf, cap)`; `out_len` always receives the
//!   byte length needed. A null `buf` with `cap == 0` is a length query. A
//!   buffer that is too small yields `DAS_E_INVALID_STRING_SIZE`. No NUL
//!   terminator is written.
//!
//! | Function | Convention |
//! |----------|------------|
//! | `das_exception_*` | status return |
//! | `das_get_last_error`, `das_clear_last_error` | never fail except on a null out-pointer |
//! | `das_is_ok`, `das_is_failed` | plain predicates |
//! | `das_status_lookup` | status return, `DAS_E_NOT_FOUND` for unknown names |
//! | `das_probe_status` | code-returning native op, converted at the boundary |
//! | other `das_probe_*` | raising native op |

pub mod probe;

use std::cell::RefCell;
use std::path::Path;
use std::ptr;
use std::slice;
use std::str;

use das_core::{DasException, DasResult, DasStatus, messages};

use crate::config::{self, BridgeConfig};
use crate::foreign::{ForeignException, ForeignRuntime};
use crate::naming::TargetLanguage;
use crate::translator::BoundaryTranslator;

/// The C environment: exceptions are plain [`ForeignException`] values
/// handed out as opaque handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct CRuntime;

impl ForeignRuntime for CRuntime {
    type Exception = ForeignException;

    fn language(&self) -> TargetLanguage {
        TargetLanguage::C
    }

    fn new_exception(
        &self,
        error_code: i32,
        message: std::borrow::Cow<'static, str>,
    ) -> ForeignException {
        ForeignException::new(error_code, message)
    }
}

/// Opaque exception handle seen by C (`DasExceptionHandle*`).
pub type DasExceptionHandle = ForeignException;

static TRANSLATOR: BoundaryTranslator<CRuntime> = BoundaryTranslator::new(CRuntime);

thread_local! {
    static PENDING: RefCell<Option<ForeignException>> = const { RefCell::new(None) };
}

/// Park `exception` as the current thread's pending exception and return its
/// code.
pub fn raise(exception: ForeignException) -> i32 {
    let code = exception.error_code();
    PENDING.with(|slot| *slot.borrow_mut() = Some(exception));
    code
}

/// Remove and return the current thread's pending exception.
pub fn take_pending() -> Option<ForeignException> {
    PENDING.with(|slot| slot.borrow_mut().take())
}

fn clear_pending() {
    PENDING.with(|slot| *slot.borrow_mut() = None);
}

fn raise_null_pointer(entry: &str, what: &str) -> i32 {
    let exception = DasException::new(
        DasStatus::INVALID_POINTER,
        format!("{entry}: {what} must not be null"),
    );
    raise(TRANSLATOR.translate(&exception))
}

/// Run a raising operation and write its result to `out`.
///
/// # Safety
///
/// `out` must be null or valid for a write of `T`.
pub unsafe fn export_call<T>(
    entry: &'static str,
    out: *mut T,
    op: impl FnOnce() -> DasResult<T>,
) -> i32 {
    clear_pending();
    if out.is_null() {
        return raise_null_pointer(entry, "output pointer");
    }
    match TRANSLATOR.invoke(entry, op) {
        Ok(value) => {
            // SAFETY: non-null and valid for writes per the caller's contract.
            unsafe { out.write(value) };
            DasStatus::OK.raw()
        }
        Err(exception) => raise(exception),
    }
}

/// Run a raising operation with no result.
pub fn export_call_unit(entry: &'static str, op: impl FnOnce() -> DasResult<()>) -> i32 {
    clear_pending();
    match TRANSLATOR.invoke(entry, op) {
        Ok(()) => DasStatus::OK.raw(),
        Err(exception) => raise(exception),
    }
}

/// Run a code-returning operation. Non-negative statuses are returned as is.
pub fn export_status(entry: &'static str, op: impl FnOnce() -> DasStatus) -> i32 {
    clear_pending();
    match TRANSLATOR.invoke_status(entry, op) {
        Ok(status) => status.raw(),
        Err(exception) => raise(exception),
    }
}

/// Borrow a `(ptr, len)` UTF-8 argument.
///
/// # Safety
///
/// Unless null, `ptr` must be valid for reads of `len` bytes for `'a`.
pub unsafe fn str_arg<'a>(ptr: *const u8, len: usize) -> DasResult<&'a str> {
    if ptr.is_null() {
        if len == 0 {
            return Ok("");
        }
        return Err(DasException::new(
            DasStatus::INVALID_POINTER,
            format!("null string pointer with length {len}"),
        ));
    }
    // SAFETY: upheld by the caller.
    let bytes = unsafe { slice::from_raw_parts(ptr, len) };
    str::from_utf8(bytes).map_err(|e| {
        DasException::new(
            DasStatus::INVALID_STRING,
            format!("string argument is not valid UTF-8: {e}"),
        )
    })
}

/// Copy `text` into a caller-provided buffer.
///
/// # Safety
///
/// `out_len` must be null or valid for a write. Unless null, `buf` must be
/// valid for writes of `cap` bytes.
pub unsafe fn write_str_out(
    text: &str,
    buf: *mut u8,
    cap: usize,
    out_len: *mut usize,
) -> DasResult<()> {
    if out_len.is_null() {
        return Err(DasException::new(
            DasStatus::INVALID_POINTER,
            "length output pointer must not be null",
        ));
    }
    // SAFETY: checked non-null above; validity upheld by the caller.
    unsafe { out_len.write(text.len()) };

    if buf.is_null() {
        if cap == 0 {
            return Ok(());
        }
        return Err(DasException::new(
            DasStatus::INVALID_POINTER,
            format!("null buffer with capacity {cap}"),
        ));
    }
    if text.len() > cap {
        return Err(DasException::new(
            DasStatus::INVALID_STRING_SIZE,
            format!("buffer holds {cap} bytes, {} needed", text.len()),
        ));
    }
    // SAFETY: `buf` holds at least `cap >= text.len()` writable bytes.
    unsafe { ptr::copy_nonoverlapping(text.as_ptr(), buf, text.len()) };
    Ok(())
}

/// Create an exception handle from `(code, message)`.
///
/// # Safety
///
/// `message_ptr` must be null (with `message_len == 0`) or valid for reads of
/// `message_len` bytes. `out_handle` must be null or valid for a write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn das_exception_new(
    code: i32,
    message_ptr: *const u8,
    message_len: usize,
    out_handle: *mut *mut DasExceptionHandle,
) -> i32 {
    let op = || -> DasResult<_> {
        // SAFETY: forwarded from this function's contract.
        let message = unsafe { str_arg(message_ptr, message_len)? };
        let exception = DasException::new(DasStatus::from_raw(code), message);
        Ok(Box::into_raw(Box::new(TRANSLATOR.translate(&exception))))
    };
    // SAFETY: forwarded from this function's contract.
    unsafe { export_call("das_exception_new", out_handle, op) }
}

/// The handle's error code, or `DAS_E_INVALID_POINTER` for a null handle.
///
/// # Safety
///
/// `handle` must be null or a live handle from this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn das_exception_get_error_code(handle: *const DasExceptionHandle) -> i32 {
    // SAFETY: upheld by the caller.
    match unsafe { handle.as_ref() } {
        Some(exception) => exception.error_code(),
        None => DasStatus::INVALID_POINTER.raw(),
    }
}

/// Copy the handle's message into `(buf, cap)`.
///
/// # Safety
///
/// `handle` must be null or live; `buf`/`out_len` as described in the module
/// conventions.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn das_exception_get_message(
    handle: *const DasExceptionHandle,
    buf: *mut u8,
    cap: usize,
    out_len: *mut usize,
) -> i32 {
    export_call_unit("das_exception_get_message", || {
        // SAFETY: upheld by the caller.
        let Some(exception) = (unsafe { handle.as_ref() }) else {
            return Err(DasException::new(
                DasStatus::INVALID_POINTER,
                "exception handle must not be null",
            ));
        };
        // SAFETY: upheld by the caller.
        unsafe { write_str_out(exception.message(), buf, cap, out_len) }
    })
}

/// Free a handle. Null is ignored.
///
/// # Safety
///
/// `handle` must be null or a live handle from this library, released once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn das_exception_release(handle: *mut DasExceptionHandle) {
    if !handle.is_null() {
        // SAFETY: allocated by `Box::into_raw` in this module.
        drop(unsafe { Box::from_raw(handle) });
    }
}

/// Move the pending exception into `*out_handle` (null when there is none).
/// The caller releases it with [`das_exception_release`].
///
/// # Safety
///
/// `out_handle` must be null or valid for a write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn das_get_last_error(out_handle: *mut *mut DasExceptionHandle) -> i32 {
    if out_handle.is_null() {
        return DasStatus::INVALID_POINTER.raw();
    }
    let handle = match take_pending() {
        Some(exception) => Box::into_raw(Box::new(exception)),
        None => ptr::null_mut(),
    };
    // SAFETY: checked non-null; validity upheld by the caller.
    unsafe { out_handle.write(handle) };
    DasStatus::OK.raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn das_clear_last_error() {
    clear_pending();
}

#[unsafe(no_mangle)]
pub extern "C" fn das_is_ok(code: i32) -> bool {
    DasStatus::from_raw(code).is_ok()
}

#[unsafe(no_mangle)]
pub extern "C" fn das_is_failed(code: i32) -> bool {
    DasStatus::from_raw(code).is_failed()
}

/// Resolve a symbolic status name such as `DAS_E_INVALID_POINTER`.
///
/// # Safety
///
/// `name_ptr`/`name_len` as for any string argument; `out_code` must be null
/// or valid for a write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn das_status_lookup(
    name_ptr: *const u8,
    name_len: usize,
    out_code: *mut i32,
) -> i32 {
    let op = || -> DasResult<_> {
        // SAFETY: forwarded from this function's contract.
        let name = unsafe { str_arg(name_ptr, name_len)? };
        DasStatus::lookup(name).map(DasStatus::raw).ok_or_else(|| {
            DasException::new(DasStatus::NOT_FOUND, format!("no status named '{name}'"))
        })
    };
    // SAFETY: forwarded from this function's contract.
    unsafe { export_call("das_status_lookup", out_code, op) }
}

/// Copy the predefined explanation of `code`, in the default locale.
///
/// # Safety
///
/// `buf`/`out_len` as described in the module conventions.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn das_get_predefined_error_message(
    code: i32,
    buf: *mut u8,
    cap: usize,
    out_len: *mut usize,
) -> i32 {
    export_call_unit("das_get_predefined_error_message", || {
        let text = messages::explain(DasStatus::from_raw(code));
        // SAFETY: forwarded from this function's contract.
        unsafe { write_str_out(&text, buf, cap, out_len) }
    })
}

/// # Safety
///
/// `locale_ptr`/`locale_len` as for any string argument.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn das_set_default_locale(locale_ptr: *const u8, locale_len: usize) -> i32 {
    export_call_unit("das_set_default_locale", || {
        // SAFETY: forwarded from this function's contract.
        let locale = unsafe { str_arg(locale_ptr, locale_len)? };
        if locale.trim().is_empty() {
            return Err(DasException::new(
                DasStatus::INVALID_ARGUMENT,
                "locale must not be empty",
            ));
        }
        messages::set_default_locale(locale);
        Ok(())
    })
}

/// Load configuration and apply it. An empty path uses defaults plus the
/// `DAS_*` environment; otherwise the TOML file at the path is read first.
///
/// # Safety
///
/// `path_ptr`/`path_len` as for any string argument.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn das_initialize(path_ptr: *const u8, path_len: usize) -> i32 {
    export_call_unit("das_initialize", || {
        // SAFETY: forwarded from this function's contract.
        let path = unsafe { str_arg(path_ptr, path_len)? };
        let path = (!path.is_empty()).then(|| Path::new(path));
        let config = BridgeConfig::load_with_env(path)?;
        config::init_tracing(&config.log_filter);
        config::initialize(&config)?;
        tracing::info!(locale = %config.locale, "DAS bridge initialized");
        Ok(())
    })
}
