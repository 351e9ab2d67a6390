//! Per-language naming of the caller-side exception.
//!
//! Each binding exposes the same two members under its own conventions. The
//! mapping is fixed here and applied by the adapter; nothing is discovered
//! at run time.
//!
//! | Language | Type | Base | Code | Message |
//! |----------|------|------|------|---------|
//! | C        | `DasExceptionHandle*` | none (status return) | `das_exception_get_error_code` | `das_exception_get_message` |
//! | Python   | `DasException` | `RuntimeError` | `error_code` | `message` |
//! | Java     | `DasException` | `java.lang.RuntimeException` | `getErrorCode()` | `getMessage()` |
//! | C#       | `DasException` | `System.Exception` | `ErrorCode` | `Message` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Native member returning the status.
pub const NATIVE_CODE_MEMBER: &str = "get_error_code";
/// Native member returning the message.
pub const NATIVE_MESSAGE_MEMBER: &str = "what";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    C,
    Python,
    Java,
    #[serde(rename = "csharp")]
    CSharp,
}

/// How one language spells the exception and its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExceptionShape {
    pub type_name: &'static str,
    /// `None` where failures are reported through return values.
    pub base_type: Option<&'static str>,
    pub code_member: &'static str,
    pub message_member: &'static str,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 4] = [Self::C, Self::Python, Self::Java, Self::CSharp];

    pub const fn shape(self) -> ExceptionShape {
        match self {
            Self::C => ExceptionShape {
                type_name: "DasExceptionHandle",
                base_type: None,
                code_member: "das_exception_get_error_code",
                message_member: "das_exception_get_message",
            },
            Self::Python => ExceptionShape {
                type_name: "DasException",
                base_type: Some("RuntimeError"),
                code_member: "error_code",
                message_member: "message",
            },
            Self::Java => ExceptionShape {
                type_name: "DasException",
                base_type: Some("java.lang.RuntimeException"),
                code_member: "getErrorCode()",
                message_member: "getMessage()",
            },
            Self::CSharp => ExceptionShape {
                type_name: "DasException",
                base_type: Some("System.Exception"),
                code_member: "ErrorCode",
                message_member: "Message",
            },
        }
    }

    /// Name a native member takes in this language.
    pub fn foreign_member(self, native: &str) -> Option<&'static str> {
        let shape = self.shape();
        match native {
            NATIVE_CODE_MEMBER => Some(shape.code_member),
            NATIVE_MESSAGE_MEMBER => Some(shape.message_member),
            _ => None,
        }
    }

    /// Whether failures surface as exceptions rather than status returns.
    pub const fn raises(self) -> bool {
        self.shape().base_type.is_some()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Python => "python",
            Self::Java => "java",
            Self::CSharp => "csharp",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown target language '{0}' (expected c, python, java or csharp)")]
pub struct UnknownLanguage(pub String);

impl FromStr for TargetLanguage {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" => Ok(Self::C),
            "python" | "py" => Ok(Self::Python),
            "java" => Ok(Self::Java),
            "csharp" | "c#" | "cs" => Ok(Self::CSharp),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}
