//! DAS native core.
//!
//! Everything native code needs to report failure in a way the boundary can
//! carry to a foreign caller:
//!
//! - [`DasStatus`]: the signed 32-bit status taxonomy and its registry
//! - [`DasException`]: a status plus an owned message, the error type of
//!   [`DasResult`]
//! - [`error_info`]: the per-thread last-error slot used by code-returning
//!   functions
//! - [`messages`]: predefined, localized explanations

pub mod error_info;
pub mod exception;
pub mod messages;
pub mod status;

pub use exception::{DasException, DasResult, SourceInfo};
pub use status::{DasStatus, ParseStatusError};
