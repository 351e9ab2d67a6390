//! The caller-side view of a native failure.
//!
//! A foreign environment sees a failure as an exception object exposing an
//! error code and a message, derived from its standard exception base. In a
//! Rust host that base is `std::error::Error`, so [`ForeignException`] can be
//! caught as `Box<dyn Error>` and downcast back.
//!
//! [`ForeignRuntime`] is the seam a concrete environment plugs into: it owns
//! message storage and knows how to build its own exception objects.

use std::borrow::Cow;
use std::error::Error;

use das_core::DasStatus;
use thiserror::Error;

use crate::naming::TargetLanguage;

/// Text carried by the exception produced when the boundary itself cannot
/// marshal a failure. Static so that path never allocates.
pub const MARSHALLING_FAILED_MESSAGE: &str =
    "The native error could not be marshalled to the caller";

/// Copying a message into runtime-owned storage failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to allocate {len} bytes for an exception message")]
pub struct MarshalError {
    pub len: usize,
}

/// A native failure reconstructed on the caller's side.
///
/// Immutable once built. Its message is owned by the caller's side and
/// shares nothing with the native exception it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ForeignException {
    error_code: i32,
    message: Cow<'static, str>,
}

impl ForeignException {
    pub fn new(error_code: i32, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            error_code,
            message: message.into(),
        }
    }

    /// The exception reported when marshalling fails. Does not allocate.
    pub const fn marshalling_failed() -> Self {
        Self {
            error_code: DasStatus::MARSHALLING_FAILED.raw(),
            message: Cow::Borrowed(MARSHALLING_FAILED_MESSAGE),
        }
    }

    /// `ErrorCode` in every binding.
    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    /// `Message` in every binding.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> DasStatus {
        DasStatus::from_raw(self.error_code)
    }
}

/// A foreign environment the boundary can raise exceptions into.
pub trait ForeignRuntime {
    /// The exception type callers catch. Must be catchable through the
    /// environment's universal exception base.
    type Exception: Error + Send + Sync + 'static;

    fn language(&self) -> TargetLanguage;

    /// Copy `message` into storage the caller owns. Allocation is the only
    /// way this can fail.
    fn copy_message(&self, message: &str) -> Result<Cow<'static, str>, MarshalError> {
        let mut owned = String::new();
        owned
            .try_reserve_exact(message.len())
            .map_err(|_| MarshalError { len: message.len() })?;
        owned.push_str(message);
        Ok(Cow::Owned(owned))
    }

    /// Build an exception through the environment's `(error_code, message)`
    /// constructor.
    fn new_exception(&self, error_code: i32, message: Cow<'static, str>) -> Self::Exception;
}
