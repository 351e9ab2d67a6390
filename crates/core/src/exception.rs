//! The native exception type.
//!
//! Native code reports failure by returning `Err(DasException)`. The
//! exception owns its message, so it stays valid however long the caller
//! keeps it and is never shared with another exception.

use std::fmt;

use thiserror::Error;

use crate::messages;
use crate::status::DasStatus;

/// Result type of every fallible native operation.
pub type DasResult<T> = Result<T, DasException>;

/// Where an exception was raised. Filled in by [`das_throw!`](crate::das_throw).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub file: &'static str,
    pub line: u32,
    pub module: &'static str,
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.file, self.line, self.module)
    }
}

/// A failure raised by native code: a status plus a human-readable message.
///
/// Constructing one with [`DasStatus::OK`] is allowed. Raising such a value
/// across the boundary is reported as `DAS_E_UNDEFINED_RETURN_VALUE`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DasException {
    code: DasStatus,
    message: Box<str>,
    location: Option<SourceInfo>,
}

impl DasException {
    pub fn new(code: DasStatus, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into().into_boxed_str(),
            location: None,
        }
    }

    /// An exception whose message is the predefined explanation of `code`
    /// in the current default locale.
    pub fn from_status(code: DasStatus) -> Self {
        Self::new(code, messages::explain(code))
    }

    pub fn with_source(mut self, location: SourceInfo) -> Self {
        self.location = Some(location);
        self
    }

    pub fn code(&self) -> DasStatus {
        self.code
    }

    pub fn what(&self) -> &str {
        &self.message
    }

    pub fn source_info(&self) -> Option<&SourceInfo> {
        self.location.as_ref()
    }

    /// Full diagnostic text, including the raise site when known.
    pub fn describe(&self) -> String {
        let mut text = format!(
            "Error code = {}. Message = \"{}\".",
            self.code.raw(),
            self.message
        );
        if let Some(location) = &self.location {
            text.push_str(&format!(" Raised at {location}."));
        }
        text
    }
}

impl From<DasStatus> for DasException {
    fn from(code: DasStatus) -> Self {
        Self::from_status(code)
    }
}

/// Capture the current file, line and module as a [`SourceInfo`].
#[macro_export]
macro_rules! source_info {
    () => {
        $crate::SourceInfo {
            file: ::std::file!(),
            line: ::std::line!(),
            module: ::std::module_path!(),
        }
    };
}

/// Build a [`DasException`](crate::DasException) tagged with the raise site.
///
/// With only a status the predefined explanation is used; otherwise the
/// remaining arguments are `format!` arguments.
///
/// ```
/// use das_core::{das_throw, DasStatus};
///
/// let err = das_throw!(DasStatus::INVALID_ARGUMENT, "width {} is negative", -3);
/// assert_eq!(err.what(), "width -3 is negative");
/// assert!(err.source_info().is_some());
/// ```
#[macro_export]
macro_rules! das_throw {
    ($code:expr $(,)?) => {
        $crate::DasException::from_status($code).with_source($crate::source_info!())
    };
    ($code:expr, $($arg:tt)+) => {
        $crate::DasException::new($code, ::std::format!($($arg)+))
            .with_source($crate::source_info!())
    };
}

/// Return early with a [`das_throw!`](crate::das_throw) exception.
#[macro_export]
macro_rules! das_bail {
    ($($arg:tt)+) => {
        return ::std::result::Result::Err($crate::das_throw!($($arg)+))
    };
}

/// Bail unless `cond` holds.
#[macro_export]
macro_rules! das_ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::das_bail!($($arg)+);
        }
    };
}
