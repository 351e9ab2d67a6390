//! DAS test utilities.
//!
//! Fake foreign runtimes, sample payloads, and assertions shared by the
//! integration tests of the boundary crates.

use std::borrow::Cow;

use das_bridge::{ForeignException, ForeignRuntime, MarshalError, TargetLanguage};
use parking_lot::Mutex;

/// Messages every round-trip test should survive: ASCII, empty, and
/// multi-byte UTF-8.
pub fn sample_messages() -> &'static [&'static str] {
    &[
        "Test error message",
        "",
        "非法指针",
        "Ошибка: файл не найден",
        "emoji 🚫 and tab\tinside",
    ]
}

/// A runtime that records every exception it is asked to build.
#[derive(Debug)]
pub struct RecordingRuntime {
    language: TargetLanguage,
    built: Mutex<Vec<(i32, String)>>,
}

impl RecordingRuntime {
    pub fn new(language: TargetLanguage) -> Self {
        Self {
            language,
            built: Mutex::new(Vec::new()),
        }
    }

    /// `(error_code, message)` of every exception built so far.
    pub fn built(&self) -> Vec<(i32, String)> {
        self.built.lock().clone()
    }

    pub fn built_count(&self) -> usize {
        self.built.lock().len()
    }
}

impl Default for RecordingRuntime {
    fn default() -> Self {
        Self::new(TargetLanguage::Python)
    }
}

impl ForeignRuntime for RecordingRuntime {
    type Exception = ForeignException;

    fn language(&self) -> TargetLanguage {
        self.language
    }

    fn new_exception(&self, error_code: i32, message: Cow<'static, str>) -> ForeignException {
        self.built.lock().push((error_code, message.to_string()));
        ForeignException::new(error_code, message)
    }
}

/// A runtime whose message storage is always exhausted.
#[derive(Debug, Default)]
pub struct FailingAllocRuntime {
    attempts: Mutex<usize>,
}

impl FailingAllocRuntime {
    /// Number of message copies attempted.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

impl ForeignRuntime for FailingAllocRuntime {
    type Exception = ForeignException;

    fn language(&self) -> TargetLanguage {
        TargetLanguage::CSharp
    }

    fn copy_message(&self, message: &str) -> Result<Cow<'static, str>, MarshalError> {
        *self.attempts.lock() += 1;
        Err(MarshalError { len: message.len() })
    }

    fn new_exception(&self, error_code: i32, message: Cow<'static, str>) -> ForeignException {
        ForeignException::new(error_code, message)
    }
}

/// Assert that `exception` carries exactly `(code, message)`.
#[track_caller]
pub fn assert_foreign_eq(exception: &ForeignException, code: i32, message: &str) {
    assert_eq!(
        exception.error_code(),
        code,
        "ErrorCode mismatch (message was {:?})",
        exception.message()
    );
    assert_eq!(exception.message(), message, "Message mismatch");
}
