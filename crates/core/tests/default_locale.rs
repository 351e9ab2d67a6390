#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Default-locale switching. Kept in its own test binary because the locale
//! is process-wide.

use das_core::messages::{self, MessageCatalog};
use das_core::{DasException, DasStatus};

#[test]
fn test_default_locale_drives_from_status() {
    assert_eq!(messages::default_locale(), "en");
    assert_eq!(
        DasException::from_status(DasStatus::INVALID_STRING).what(),
        "Invalid string"
    );

    messages::set_default_locale("zh_CN");
    assert_eq!(messages::default_locale(), "zh-cn");
    assert_eq!(
        DasException::from_status(DasStatus::INVALID_STRING).what(),
        "非法字符串"
    );
    // Missing translation falls back to English.
    assert_eq!(
        messages::explain(DasStatus::CAPTURE_FAILED),
        "Capture failed"
    );

    let extra = MessageCatalog::from_json(
        r#"{"type":"int","resource":{"en":{"-1":"Testing error message."},"zh-cn":{"-1":"测试错误消息"}}}"#,
    )
    .unwrap();
    messages::install_catalog(extra);
    assert_eq!(messages::explain(DasStatus::from_raw(-1)), "测试错误消息");

    messages::set_default_locale("en");
    assert_eq!(
        messages::explain(DasStatus::from_raw(-1)),
        "Testing error message."
    );
}
