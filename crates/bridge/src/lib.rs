//! DAS boundary layer.
//!
//! Carries native failures ([`das_core::DasException`]) across a language
//! boundary and rebuilds them as the caller's own exceptions:
//!
//! - [`foreign`]: the caller-side exception view and the [`ForeignRuntime`]
//!   seam a foreign environment implements
//! - [`naming`]: how each binding spells the exception and its members
//! - [`translator`]: [`BoundaryTranslator`], which wraps every
//!   boundary-crossing call
//! - [`config`]: locale, translations, and logging setup
//! - [`ffi`]: the C ABI and the self-test probes

// Lets `#[das_export]` expansions inside this crate name `::das_bridge`.
extern crate self as das_bridge;

pub mod config;
pub mod ffi;
pub mod foreign;
pub mod naming;
pub mod translator;

pub use config::BridgeConfig;
pub use foreign::{ForeignException, ForeignRuntime, MARSHALLING_FAILED_MESSAGE, MarshalError};
pub use naming::{ExceptionShape, TargetLanguage};
pub use translator::BoundaryTranslator;
