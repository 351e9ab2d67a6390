//! Per-thread "last error" slot for code-returning native functions.
//!
//! A function that reports failure by returning a [`DasStatus`] can park the
//! full exception here first; the boundary picks it up when it converts the
//! status. Each thread has its own slot.

use std::cell::RefCell;

use crate::exception::DasException;
use crate::status::DasStatus;

thread_local! {
    static ERROR_INFO: RefCell<Option<DasException>> = const { RefCell::new(None) };
}

/// Record `exception` as the current thread's last error, replacing any
/// previous one.
pub fn set_error_info(exception: DasException) {
    ERROR_INFO.with(|slot| *slot.borrow_mut() = Some(exception));
}

/// Remove and return the current thread's last error.
pub fn take_error_info() -> Option<DasException> {
    ERROR_INFO.with(|slot| slot.borrow_mut().take())
}

pub fn clear_error_info() {
    ERROR_INFO.with(|slot| *slot.borrow_mut() = None);
}

/// Record `exception` and hand back its status, for
/// `return record_failure(...)` in code-returning functions.
pub fn record_failure(exception: DasException) -> DasStatus {
    let code = exception.code();
    set_error_info(exception);
    code
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_take_empties_the_slot() {
        clear_error_info();
        set_error_info(DasException::new(DasStatus::FAIL, "first"));
        assert_eq!(take_error_info().unwrap().what(), "first");
        assert!(take_error_info().is_none());
    }

    #[test]
    fn test_later_error_replaces_earlier() {
        set_error_info(DasException::new(DasStatus::FAIL, "first"));
        let code = record_failure(DasException::new(DasStatus::TIMEOUT, "second"));
        assert_eq!(code, DasStatus::TIMEOUT);
        let info = take_error_info().unwrap();
        assert_eq!(info.code(), DasStatus::TIMEOUT);
        assert_eq!(info.what(), "second");
    }

    #[test]
    fn test_threads_do_not_see_each_other() {
        set_error_info(DasException::new(DasStatus::FAIL, "main thread"));
        let seen = std::thread::spawn(take_error_info).join().unwrap();
        assert!(seen.is_none());
        assert_eq!(take_error_info().unwrap().what(), "main thread");
    }
}
