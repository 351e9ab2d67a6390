//! Predefined, localized explanations for status codes.
//!
//! The process holds one [`MessageCatalog`] seeded with the built-in `en`
//! and `zh-cn` tables. Extra resources can be merged in from JSON files of
//! the form
//!
//! ```json
//! {
//!   "type": "int",
//!   "resource": {
//!     "en":    { "-1": "Testing error message." },
//!     "zh-cn": { "-1": "测试错误消息" }
//!   }
//! }
//! ```
//!
//! Lookups try the requested locale, then [`FALLBACK_LOCALE`], then
//! [`UNKNOWN_ERROR`].

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::exception::{DasException, DasResult};
use crate::status::DasStatus;

pub const FALLBACK_LOCALE: &str = "en";
pub const UNKNOWN_ERROR: &str = "Unknown error";

const RESOURCE_KIND_INT: &str = "int";

const BUILTIN_EN: &[(DasStatus, &str)] = &[
    (DasStatus::OK, "Success"),
    (DasStatus::NO_INTERFACE, "No interface"),
    (DasStatus::UNDEFINED_RETURN_VALUE, "Undefined return value"),
    (DasStatus::INVALID_STRING, "Invalid string"),
    (DasStatus::INVALID_STRING_SIZE, "Invalid string size"),
    (DasStatus::NO_IMPLEMENTATION, "No implementation"),
    (DasStatus::UNSUPPORTED_SYSTEM, "Unsupported system"),
    (DasStatus::INVALID_JSON, "Invalid JSON"),
    (DasStatus::TYPE_ERROR, "Type error"),
    (DasStatus::INVALID_FILE, "Invalid file"),
    (DasStatus::INVALID_URL, "Invalid URL"),
    (DasStatus::OUT_OF_RANGE, "Out of range"),
    (DasStatus::DUPLICATE_ELEMENT, "Duplicate element"),
    (DasStatus::FILE_NOT_FOUND, "File not found"),
    (DasStatus::MAYBE_OVERFLOW, "Value may overflow"),
    (DasStatus::OUT_OF_MEMORY, "Out of memory"),
    (DasStatus::INVALID_PATH, "Invalid path"),
    (DasStatus::INVALID_POINTER, "Invalid pointer"),
    (
        DasStatus::MARSHALLING_FAILED,
        "Failed to marshal the error to the caller",
    ),
    (DasStatus::PYTHON_ERROR, "Python error"),
    (DasStatus::JAVA_ERROR, "Java error"),
    (DasStatus::CSHARP_ERROR, "C# error"),
    (DasStatus::INTERNAL_FATAL_ERROR, "Internal fatal error"),
    (DasStatus::INVALID_ENUM, "Invalid enum value"),
    (DasStatus::INVALID_SIZE, "Invalid size"),
    (DasStatus::OPENCV_ERROR, "OpenCV error"),
    (DasStatus::ONNX_RUNTIME_ERROR, "ONNX runtime error"),
    (DasStatus::TIMEOUT, "Operation timeout"),
    (DasStatus::PERMISSION_DENIED, "Permission denied"),
    (DasStatus::SYMBOL_NOT_FOUND, "Symbol not found"),
    (DasStatus::DANGLING_REFERENCE, "Dangling reference"),
    (DasStatus::OBJECT_NOT_INIT, "Object not initialized"),
    (
        DasStatus::UNEXPECTED_THREAD_DETECTED,
        "Called from an unexpected thread",
    ),
    (
        DasStatus::STRONG_REFERENCE_NOT_AVAILABLE,
        "Strong reference not available",
    ),
    (DasStatus::TASK_WORKING, "Task is still running"),
    (DasStatus::OBJECT_ALREADY_INIT, "Object already initialized"),
    (DasStatus::FAIL, "Operation failed"),
    (DasStatus::INVALID_ARGUMENT, "Invalid argument"),
    (DasStatus::CAPTURE_FAILED, "Capture failed"),
    (DasStatus::NOT_FOUND, "Not found"),
];

const BUILTIN_ZH_CN: &[(DasStatus, &str)] = &[
    (DasStatus::OK, "成功"),
    (DasStatus::NO_INTERFACE, "接口未找到"),
    (DasStatus::UNDEFINED_RETURN_VALUE, "接口没有处理返回值"),
    (DasStatus::INVALID_STRING, "非法字符串"),
    (DasStatus::INVALID_STRING_SIZE, "非法字符串长度"),
    (DasStatus::NO_IMPLEMENTATION, "未实现"),
    (DasStatus::UNSUPPORTED_SYSTEM, "不支持的操作系统"),
    (DasStatus::INVALID_JSON, "非法的JSON数据"),
    (DasStatus::INVALID_POINTER, "非法指针"),
    (DasStatus::INVALID_ARGUMENT, "非法参数"),
    (DasStatus::OUT_OF_RANGE, "超出范围"),
    (DasStatus::OUT_OF_MEMORY, "内存不足"),
    (DasStatus::FILE_NOT_FOUND, "文件未找到"),
    (DasStatus::TIMEOUT, "操作超时"),
    (DasStatus::FAIL, "操作失败"),
    (DasStatus::NOT_FOUND, "未找到"),
];

/// Explanations keyed by locale, then status.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    locales: HashMap<String, HashMap<DasStatus, String>>,
}

#[derive(Debug, Deserialize)]
struct ResourceFile {
    #[serde(rename = "type")]
    kind: String,
    resource: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    /// The tables shipped with the library.
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for (code, text) in BUILTIN_EN {
            catalog.insert(FALLBACK_LOCALE, *code, *text);
        }
        for (code, text) in BUILTIN_ZH_CN {
            catalog.insert("zh-cn", *code, *text);
        }
        catalog
    }

    /// Parse a JSON resource file. Keys of each locale map are decimal
    /// status values.
    pub fn from_json(text: &str) -> DasResult<Self> {
        let file: ResourceFile = serde_json::from_str(text).map_err(|e| {
            DasException::new(
                DasStatus::INVALID_JSON,
                format!("Failed to parse message resource: {e}"),
            )
        })?;

        if file.kind != RESOURCE_KIND_INT {
            return Err(DasException::new(
                DasStatus::INVALID_JSON,
                format!(
                    "Unsupported message resource type '{}', expected '{RESOURCE_KIND_INT}'",
                    file.kind
                ),
            ));
        }

        let mut catalog = Self::default();
        for (locale, entries) in file.resource {
            for (key, text) in entries {
                let raw: i32 = key.trim().parse().map_err(|_| {
                    DasException::new(
                        DasStatus::INVALID_JSON,
                        format!("Message key '{key}' in locale '{locale}' is not an integer"),
                    )
                })?;
                catalog.insert(&locale, DasStatus::from_raw(raw), text);
            }
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, locale: &str, code: DasStatus, text: impl Into<String>) {
        self.locales
            .entry(normalize_locale(locale))
            .or_default()
            .insert(code, text.into());
    }

    /// Merge `other` into `self`; entries in `other` win.
    pub fn merge(&mut self, other: MessageCatalog) {
        for (locale, entries) in other.locales {
            self.locales.entry(locale).or_default().extend(entries);
        }
    }

    /// Text for `code` in exactly `locale`.
    pub fn get(&self, locale: &str, code: DasStatus) -> Option<&str> {
        self.locales
            .get(&normalize_locale(locale))
            .and_then(|entries| entries.get(&code))
            .map(String::as_str)
    }

    /// Text for `code` in `locale`, falling back to English and then to
    /// [`UNKNOWN_ERROR`].
    pub fn explain(&self, locale: &str, code: DasStatus) -> &str {
        self.get(locale, code)
            .or_else(|| self.get(FALLBACK_LOCALE, code))
            .unwrap_or(UNKNOWN_ERROR)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.locales.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.locales.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_ascii_lowercase()
}

static CATALOG: LazyLock<RwLock<MessageCatalog>> =
    LazyLock::new(|| RwLock::new(MessageCatalog::builtin()));

static DEFAULT_LOCALE: LazyLock<RwLock<String>> =
    LazyLock::new(|| RwLock::new(FALLBACK_LOCALE.to_string()));

/// Set the locale used by [`explain`] and [`DasException::from_status`].
pub fn set_default_locale(locale: &str) {
    let locale = normalize_locale(locale);
    tracing::debug!(locale = %locale, "default message locale changed");
    *DEFAULT_LOCALE.write() = locale;
}

pub fn default_locale() -> String {
    DEFAULT_LOCALE.read().clone()
}

/// Explanation of `code` in the default locale.
pub fn explain(code: DasStatus) -> String {
    let locale = default_locale();
    explain_in(&locale, code)
}

pub fn explain_in(locale: &str, code: DasStatus) -> String {
    let catalog = CATALOG.read();
    let text = catalog.explain(locale, code);
    if text == UNKNOWN_ERROR {
        tracing::debug!(code = code.raw(), locale, "no explanation for status");
    }
    text.to_string()
}

/// Merge `extra` into the process-wide catalog.
pub fn install_catalog(extra: MessageCatalog) {
    let added = extra.len();
    CATALOG.write().merge(extra);
    tracing::info!(entries = added, "message catalog extended");
}
