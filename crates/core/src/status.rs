//! DAS status codes.
//!
//! A status is a signed 32-bit value laid out like a COM `HRESULT`:
//!
//! | Bits    | Field      |
//! |---------|------------|
//! | `31`    | severity (`1` = failure) |
//! | `28-30` | reserved   |
//! | `16-27` | facility   |
//! | `0-15`  | code       |
//!
//! `DAS_S_OK` (zero) is the only success value and every registered failure is
//! negative, so a caller that only needs to know whether a call failed tests
//! the sign. Registered values are part of the ABI seen by every binding:
//! new codes take an unused negative value, existing ones are never
//! renumbered.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exception::{DasException, DasResult};

/// Signed 32-bit outcome of a native operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct DasStatus(i32);

macro_rules! status_table {
    ($($(#[$doc:meta])* $konst:ident = $value:literal => $name:literal;)*) => {
        impl DasStatus {
            $(
                $(#[$doc])*
                pub const $konst: DasStatus = DasStatus($value);
            )*

            /// Every registered status with its symbolic name, in
            /// declaration order.
            pub const ALL: &'static [(&'static str, DasStatus)] = &[
                $(($name, DasStatus::$konst),)*
            ];
        }
    };
}

status_table! {
    /// The operation succeeded.
    OK = 0 => "DAS_S_OK";
    RESERVED = -1073741830 => "DAS_E_RESERVED";
    /// The object does not implement the requested interface.
    NO_INTERFACE = -1073741831 => "DAS_E_NO_INTERFACE";
    /// An implementation returned without setting its result.
    UNDEFINED_RETURN_VALUE = -1073741832 => "DAS_E_UNDEFINED_RETURN_VALUE";
    INVALID_STRING = -1073741833 => "DAS_E_INVALID_STRING";
    INVALID_STRING_SIZE = -1073741834 => "DAS_E_INVALID_STRING_SIZE";
    NO_IMPLEMENTATION = -1073741835 => "DAS_E_NO_IMPLEMENTATION";
    UNSUPPORTED_SYSTEM = -1073741836 => "DAS_E_UNSUPPORTED_SYSTEM";
    INVALID_JSON = -1073741837 => "DAS_E_INVALID_JSON";
    TYPE_ERROR = -1073741838 => "DAS_E_TYPE_ERROR";
    INVALID_FILE = -1073741839 => "DAS_E_INVALID_FILE";
    INVALID_URL = -1073741840 => "DAS_E_INVALID_URL";
    /// Also returned by enumerators to signal the end of a sequence.
    OUT_OF_RANGE = -1073741841 => "DAS_E_OUT_OF_RANGE";
    DUPLICATE_ELEMENT = -1073741842 => "DAS_E_DUPLICATE_ELEMENT";
    FILE_NOT_FOUND = -1073741843 => "DAS_E_FILE_NOT_FOUND";
    MAYBE_OVERFLOW = -1073741844 => "DAS_E_MAYBE_OVERFLOW";
    OUT_OF_MEMORY = -1073741845 => "DAS_E_OUT_OF_MEMORY";
    INVALID_PATH = -1073741846 => "DAS_E_INVALID_PATH";
    INVALID_POINTER = -1073741847 => "DAS_E_INVALID_POINTER";
    /// The boundary layer could not marshal a failure to the caller.
    ///
    /// Reserved for the translator; native code never raises it.
    MARSHALLING_FAILED = -1073741848 => "DAS_E_MARSHALLING_FAILED";
    /// Failure inside the embedded Python interpreter.
    PYTHON_ERROR = -1073741849 => "DAS_E_PYTHON_ERROR";
    JAVA_ERROR = -1073741850 => "DAS_E_JAVA_ERROR";
    CSHARP_ERROR = -1073741851 => "DAS_E_CSHARP_ERROR";
    INTERNAL_FATAL_ERROR = -1073741852 => "DAS_E_INTERNAL_FATAL_ERROR";
    INVALID_ENUM = -1073741853 => "DAS_E_INVALID_ENUM";
    INVALID_SIZE = -1073741854 => "DAS_E_INVALID_SIZE";
    OPENCV_ERROR = -1073741855 => "DAS_E_OPENCV_ERROR";
    ONNX_RUNTIME_ERROR = -1073741856 => "DAS_E_ONNX_RUNTIME_ERROR";
    TIMEOUT = -1073741857 => "DAS_E_TIMEOUT";
    // -1073741858 was never assigned.
    PERMISSION_DENIED = -1073741859 => "DAS_E_PERMISSION_DENIED";
    SYMBOL_NOT_FOUND = -1073741860 => "DAS_E_SYMBOL_NOT_FOUND";
    DANGLING_REFERENCE = -1073741861 => "DAS_E_DANGLING_REFERENCE";
    OBJECT_NOT_INIT = -1073741862 => "DAS_E_OBJECT_NOT_INIT";
    UNEXPECTED_THREAD_DETECTED = -1073741863 => "DAS_E_UNEXPECTED_THREAD_DETECTED";
    STRONG_REFERENCE_NOT_AVAILABLE = -1073741864 => "DAS_E_STRONG_REFERENCE_NOT_AVAILABLE";
    TASK_WORKING = -1073741865 => "DAS_E_TASK_WORKING";
    OBJECT_ALREADY_INIT = -1073741866 => "DAS_E_OBJECT_ALREADY_INIT";
    FAIL = -1073741867 => "DAS_E_FAIL";
    INVALID_ARGUMENT = -1073741868 => "DAS_E_INVALID_ARGUMENT";
    CAPTURE_FAILED = -1073741869 => "DAS_E_CAPTURE_FAILED";
    NOT_FOUND = -1073741870 => "DAS_E_NOT_FOUND";
}

const SEVERITY_SHIFT: u32 = 31;
const RESERVED_SHIFT: u32 = 28;
const RESERVED_MASK: u32 = 0x7;
const FACILITY_SHIFT: u32 = 16;
const FACILITY_MASK: u32 = 0x0FFF;
const CODE_MASK: u32 = 0xFFFF;

impl DasStatus {
    /// Wrap a raw value. Unregistered values are representable; they simply
    /// have no name.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw 32-bit value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Non-negative: the call did not fail.
    pub const fn is_ok(self) -> bool {
        self.0 >= 0
    }

    /// Negative: the call failed.
    pub const fn is_failed(self) -> bool {
        self.0 < 0
    }

    /// Exactly `DAS_S_OK`.
    pub const fn is_success(self) -> bool {
        self.0 == Self::OK.0
    }

    /// Severity bit: `1` for failures, `0` otherwise.
    pub const fn severity(self) -> u32 {
        (self.0 as u32) >> SEVERITY_SHIFT
    }

    /// The three reserved bits below the severity bit.
    pub const fn reserved(self) -> u32 {
        ((self.0 as u32) >> RESERVED_SHIFT) & RESERVED_MASK
    }

    /// Facility field (bits 16-27).
    pub const fn facility(self) -> u32 {
        ((self.0 as u32) >> FACILITY_SHIFT) & FACILITY_MASK
    }

    /// Code field (bits 0-15).
    pub const fn code(self) -> u32 {
        (self.0 as u32) & CODE_MASK
    }

    /// Symbolic name of a registered status.
    pub fn name(self) -> Option<&'static str> {
        Self::ALL
            .iter()
            .find(|(_, status)| *status == self)
            .map(|(name, _)| *name)
    }

    /// Find a registered status by its symbolic name (`"DAS_E_INVALID_POINTER"`).
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, status)| *status)
    }

    /// Turn a failing status into an error carrying its predefined
    /// explanation. Non-negative statuses pass through.
    pub fn into_result(self) -> DasResult<Self> {
        if self.is_failed() {
            Err(DasException::from_status(self))
        } else {
            Ok(self)
        }
    }

    /// Like [`into_result`](Self::into_result), discarding the success value.
    pub fn check(self) -> DasResult<()> {
        self.into_result().map(|_| ())
    }
}

impl From<i32> for DasStatus {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl From<DasStatus> for i32 {
    fn from(status: DasStatus) -> Self {
        status.0
    }
}

impl fmt::Display for DasStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "0x{:08X} ({name})", self.0 as u32),
            None => write!(f, "0x{:08X}", self.0 as u32),
        }
    }
}

impl fmt::Debug for DasStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "DasStatus({name}, {})", self.0),
            None => write!(f, "DasStatus({})", self.0),
        }
    }
}

/// A string that is neither a registered name nor a 32-bit number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not a status name, a decimal value, or a 0x-prefixed 32-bit value")]
pub struct ParseStatusError {
    input: String,
}

impl FromStr for DasStatus {
    type Err = ParseStatusError;

    /// Accepts a registered name, a decimal `i32`, or a `0x`-prefixed
    /// 32-bit pattern (`0xBFFFFFE9`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ParseStatusError {
            input: trimmed.to_string(),
        };

        if let Some(status) = Self::lookup(trimmed) {
            return Ok(status);
        }

        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            return u32::from_str_radix(hex, 16)
                .map(|bits| Self(bits as i32))
                .map_err(|_| err());
        }

        trimmed.parse::<i32>().map(Self).map_err(|_| err())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_success_is_zero_and_unique() {
        assert_eq!(DasStatus::OK.raw(), 0);
        let successes: Vec<_> = DasStatus::ALL
            .iter()
            .filter(|(_, status)| status.is_success())
            .collect();
        assert_eq!(successes.len(), 1);
        assert_eq!(successes[0].0, "DAS_S_OK");
    }

    #[test]
    fn test_every_failure_is_negative_and_distinct() {
        let mut seen = HashSet::new();
        for (name, status) in DasStatus::ALL {
            if *status == DasStatus::OK {
                continue;
            }
            assert!(status.raw() < 0, "{name} must be negative");
            assert!(status.is_failed(), "{name} must report failure");
            assert!(seen.insert(status.raw()), "{name} reuses a value");
        }
    }

    #[test]
    fn test_names_are_distinct() {
        let names: HashSet<_> = DasStatus::ALL.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.len(), DasStatus::ALL.len());
    }

    #[test]
    fn test_observed_values_are_stable() {
        assert_eq!(DasStatus::INVALID_POINTER.raw(), -1073741847);
        assert_eq!(DasStatus::NO_INTERFACE.raw(), -1073741831);
        assert_eq!(DasStatus::INVALID_ENUM.raw(), -1073741853);
        assert_eq!(DasStatus::INVALID_STRING.raw(), -1073741833);
        assert_eq!(DasStatus::INVALID_STRING_SIZE.raw(), -1073741834);
        assert_eq!(DasStatus::PYTHON_ERROR.raw(), -1073741849);
        assert_eq!(DasStatus::UNDEFINED_RETURN_VALUE.raw(), -1073741832);
    }

    #[test]
    fn test_fields_extract_by_mask() {
        // 0xBFFFFFE9
        let status = DasStatus::INVALID_POINTER;
        assert_eq!(status.severity(), 1);
        assert_eq!(status.reserved(), 0b011);
        assert_eq!(status.facility(), 0x0FFF);
        assert_eq!(status.code(), 0xFFE9);

        assert_eq!(DasStatus::OK.severity(), 0);
        assert_eq!(DasStatus::OK.facility(), 0);
        assert_eq!(DasStatus::OK.code(), 0);
    }

    #[test]
    fn test_sign_test_matches_severity_bit() {
        for (_, status) in DasStatus::ALL {
            assert_eq!(status.is_failed(), status.severity() == 1);
        }
        assert!(DasStatus::from_raw(1).is_ok());
        assert!(!DasStatus::from_raw(1).is_success());
    }

    #[test]
    fn test_lookup_and_name_agree() {
        for (name, status) in DasStatus::ALL {
            assert_eq!(DasStatus::lookup(name), Some(*status));
            assert_eq!(status.name(), Some(*name));
        }
        assert_eq!(DasStatus::lookup("DAS_E_NOT_A_CODE"), None);
        assert_eq!(DasStatus::from_raw(-1).name(), None);
    }

    #[test]
    fn test_parse_accepts_names_decimal_and_hex() {
        assert_eq!(
            "DAS_E_INVALID_POINTER".parse::<DasStatus>().unwrap(),
            DasStatus::INVALID_POINTER
        );
        assert_eq!(
            "-1073741847".parse::<DasStatus>().unwrap(),
            DasStatus::INVALID_POINTER
        );
        assert_eq!(
            "0xBFFFFFE9".parse::<DasStatus>().unwrap(),
            DasStatus::INVALID_POINTER
        );
        assert!("bogus".parse::<DasStatus>().is_err());
        assert!("0x1FFFFFFFF".parse::<DasStatus>().is_err());
    }

    #[test]
    fn test_display_includes_bits_and_name() {
        assert_eq!(
            DasStatus::INVALID_POINTER.to_string(),
            "0xBFFFFFE9 (DAS_E_INVALID_POINTER)"
        );
        assert_eq!(DasStatus::from_raw(-2).to_string(), "0xFFFFFFFE");
    }

    #[test]
    fn test_into_result_splits_on_sign() {
        assert_eq!(DasStatus::OK.into_result().unwrap(), DasStatus::OK);
        assert_eq!(
            DasStatus::from_raw(1).into_result().unwrap(),
            DasStatus::from_raw(1)
        );

        let err = DasStatus::TIMEOUT.check().unwrap_err();
        assert_eq!(err.code(), DasStatus::TIMEOUT);
        assert!(!err.what().is_empty());
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&DasStatus::INVALID_ENUM).unwrap();
        assert_eq!(json, "-1073741853");
        let back: DasStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DasStatus::INVALID_ENUM);
    }
}
