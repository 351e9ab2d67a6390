//! Boundary translation.
//!
//! Every boundary-crossing call runs through a [`BoundaryTranslator`]. A
//! native failure is turned into the runtime's exception with the same code
//! and message; a native panic is caught and reported as
//! `DAS_E_INTERNAL_FATAL_ERROR`; nothing unwinds into the caller.

use std::any::Any;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

use das_core::{DasException, DasResult, DasStatus, error_info};

use crate::foreign::{ForeignRuntime, MARSHALLING_FAILED_MESSAGE};

const UNKNOWN_PANIC: &str = "native code panicked";

/// Translates native failures for one foreign runtime. Holds no per-call
/// state, so one translator serves every call on every thread.
#[derive(Debug, Default)]
pub struct BoundaryTranslator<R> {
    runtime: R,
}

impl<R: ForeignRuntime> BoundaryTranslator<R> {
    pub const fn new(runtime: R) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Build the caller-side exception for `exception`.
    ///
    /// The message is copied into runtime-owned storage. If that copy fails
    /// the result carries `DAS_E_MARSHALLING_FAILED` and a static message
    /// instead.
    pub fn translate(&self, exception: &DasException) -> R::Exception {
        match self.runtime.copy_message(exception.what()) {
            Ok(message) => self.runtime.new_exception(exception.code().raw(), message),
            Err(e) => {
                tracing::warn!(
                    code = exception.code().raw(),
                    language = %self.runtime.language(),
                    error = %e,
                    "exception message could not be marshalled"
                );
                self.runtime.new_exception(
                    DasStatus::MARSHALLING_FAILED.raw(),
                    Cow::Borrowed(MARSHALLING_FAILED_MESSAGE),
                )
            }
        }
    }

    /// Run a raising native operation.
    ///
    /// `Ok` passes through without constructing anything. `Err` becomes the
    /// runtime's exception. An `Err` carrying a non-failing status is a
    /// native bug and is reported as `DAS_E_UNDEFINED_RETURN_VALUE`.
    pub fn invoke<T>(
        &self,
        entry: &str,
        op: impl FnOnce() -> DasResult<T>,
    ) -> Result<T, R::Exception> {
        match panic::catch_unwind(AssertUnwindSafe(op)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(exception)) if exception.code().is_ok() => {
                let exception = DasException::new(
                    DasStatus::UNDEFINED_RETURN_VALUE,
                    format!(
                        "{entry} raised an exception with non-failing status {}",
                        exception.code().raw()
                    ),
                );
                Err(self.fail(entry, &exception))
            }
            Ok(Err(exception)) => Err(self.fail(entry, &exception)),
            Err(payload) => Err(self.fail_panic(entry, payload.as_ref())),
        }
    }

    /// Run a code-returning native operation.
    ///
    /// Non-negative statuses pass through. A failing status is raised with
    /// the message the operation parked in the error-info slot when its code
    /// matches, otherwise with the predefined explanation.
    pub fn invoke_status(
        &self,
        entry: &str,
        op: impl FnOnce() -> DasStatus,
    ) -> Result<DasStatus, R::Exception> {
        error_info::clear_error_info();
        let status = match panic::catch_unwind(AssertUnwindSafe(op)) {
            Ok(status) => status,
            Err(payload) => return Err(self.fail_panic(entry, payload.as_ref())),
        };

        if status.is_ok() {
            error_info::clear_error_info();
            return Ok(status);
        }

        let exception = match error_info::take_error_info() {
            Some(info) if info.code() == status => info,
            _ => DasException::from_status(status),
        };
        Err(self.fail(entry, &exception))
    }

    fn fail(&self, entry: &str, exception: &DasException) -> R::Exception {
        tracing::debug!(
            entry,
            code = exception.code().raw(),
            message = exception.what(),
            "native failure crossed the boundary"
        );
        self.translate(exception)
    }

    fn fail_panic(&self, entry: &str, payload: &(dyn Any + Send)) -> R::Exception {
        let text = panic_text(payload);
        tracing::error!(
            entry,
            panic = text,
            "native code panicked inside a boundary call"
        );
        let exception = DasException::new(DasStatus::INTERNAL_FATAL_ERROR, text);
        self.translate(&exception)
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text
    } else {
        UNKNOWN_PANIC
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::cell::Cell;

    use das_core::das_throw;

    use super::*;
    use crate::foreign::{ForeignException, MarshalError};
    use crate::naming::TargetLanguage;

    #[derive(Default)]
    struct CountingRuntime {
        built: Cell<usize>,
    }

    impl ForeignRuntime for CountingRuntime {
        type Exception = ForeignException;

        fn language(&self) -> TargetLanguage {
            TargetLanguage::Python
        }

        fn new_exception(&self, error_code: i32, message: Cow<'static, str>) -> ForeignException {
            self.built.set(self.built.get() + 1);
            ForeignException::new(error_code, message)
        }
    }

    struct NoMemoryRuntime;

    impl ForeignRuntime for NoMemoryRuntime {
        type Exception = ForeignException;

        fn language(&self) -> TargetLanguage {
            TargetLanguage::Java
        }

        fn copy_message(&self, message: &str) -> Result<Cow<'static, str>, MarshalError> {
            Err(MarshalError { len: message.len() })
        }

        fn new_exception(&self, error_code: i32, message: Cow<'static, str>) -> ForeignException {
            ForeignException::new(error_code, message)
        }
    }

    fn translator() -> BoundaryTranslator<CountingRuntime> {
        BoundaryTranslator::new(CountingRuntime::default())
    }

    #[test]
    fn test_success_builds_no_exception() {
        let translator = translator();
        let value = translator.invoke("ok", || Ok(7)).unwrap();
        assert_eq!(value, 7);
        assert_eq!(translator.runtime().built.get(), 0);
    }

    #[test]
    fn test_failure_keeps_code_and_message() {
        let translator = translator();
        let err = translator
            .invoke::<()>("fail", || {
                Err(DasException::new(DasStatus::INVALID_POINTER, "Test error message"))
            })
            .unwrap_err();
        assert_eq!(err.error_code(), -1073741847);
        assert_eq!(err.message(), "Test error message");
        assert_eq!(translator.runtime().built.get(), 1);
    }

    #[test]
    fn test_raised_ok_sentinel_is_undefined_return() {
        let err = translator()
            .invoke::<()>("sentinel", || Err(DasException::new(DasStatus::OK, "")))
            .unwrap_err();
        assert_eq!(err.status(), DasStatus::UNDEFINED_RETURN_VALUE);
        assert!(err.message().contains("sentinel"));
    }

    #[test]
    fn test_panic_becomes_internal_fatal_error() {
        let err = translator()
            .invoke::<()>("boom", || panic!("index {} out of bounds", 3))
            .unwrap_err();
        assert_eq!(err.status(), DasStatus::INTERNAL_FATAL_ERROR);
        assert_eq!(err.message(), "index 3 out of bounds");

        let err = translator()
            .invoke_status("boom", || std::panic::panic_any(42_u8))
            .unwrap_err();
        assert_eq!(err.status(), DasStatus::INTERNAL_FATAL_ERROR);
        assert_eq!(err.message(), UNKNOWN_PANIC);
    }

    #[test]
    fn test_allocation_failure_reports_marshalling_failed() {
        let translator = BoundaryTranslator::new(NoMemoryRuntime);
        let err = translator
            .invoke::<()>("oom", || Err(das_throw!(DasStatus::TIMEOUT, "slow")))
            .unwrap_err();
        assert_eq!(err.status(), DasStatus::MARSHALLING_FAILED);
        assert_eq!(err.message(), MARSHALLING_FAILED_MESSAGE);
    }

    #[test]
    fn test_status_call_uses_matching_error_info() {
        let err = translator()
            .invoke_status("status", || {
                error_info::record_failure(DasException::new(
                    DasStatus::FILE_NOT_FOUND,
                    "config.json is missing",
                ))
            })
            .unwrap_err();
        assert_eq!(err.status(), DasStatus::FILE_NOT_FOUND);
        assert_eq!(err.message(), "config.json is missing");
        assert!(error_info::take_error_info().is_none());
    }

    #[test]
    fn test_status_call_ignores_mismatched_error_info() {
        let err = translator()
            .invoke_status("status", || {
                error_info::set_error_info(DasException::new(DasStatus::FAIL, "unrelated"));
                DasStatus::INVALID_POINTER
            })
            .unwrap_err();
        assert_eq!(err.status(), DasStatus::INVALID_POINTER);
        assert_eq!(err.message(), "Invalid pointer");
    }

    #[test]
    fn test_status_call_passes_non_negative_through() {
        let translator = translator();
        let status = translator.invoke_status("ok", || DasStatus::from_raw(1));
        assert_eq!(status.unwrap(), DasStatus::from_raw(1));
        assert_eq!(translator.runtime().built.get(), 0);
    }

    #[test]
    fn test_stale_error_info_does_not_leak_into_later_calls() {
        error_info::set_error_info(DasException::new(DasStatus::TIMEOUT, "stale"));
        let err = translator()
            .invoke_status("fresh", || DasStatus::TIMEOUT)
            .unwrap_err();
        assert_eq!(err.message(), "Operation timeout");
    }
}
