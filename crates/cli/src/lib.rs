//! Commands behind the `das` tool.
//!
//! Each command renders its output as a `String` so the binary only parses
//! arguments and prints.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::ptr;

use anyhow::{Context, Result, bail};
use das_bridge::TargetLanguage;
use das_bridge::ffi::probe::das_probe_fail;
use das_bridge::ffi::{
    DasExceptionHandle, das_exception_get_error_code, das_exception_get_message,
    das_exception_release, das_get_last_error,
};
use das_core::{DasStatus, messages};
use serde::Serialize;

/// Output format of `das codes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodesFormat {
    Text,
    Json,
    Toml,
}

#[derive(Debug, Serialize)]
struct CodeEntry {
    name: &'static str,
    value: i32,
    hex: String,
}

#[derive(Debug, Serialize)]
struct CodesDocument {
    codes: Vec<CodeEntry>,
}

fn code_entries() -> Vec<CodeEntry> {
    DasStatus::ALL
        .iter()
        .map(|&(name, status)| CodeEntry {
            name,
            value: status.raw(),
            hex: format!("0x{:08X}", status.raw() as u32),
        })
        .collect()
}

/// The status registry in the requested format.
pub fn codes_report(format: CodesFormat) -> Result<String> {
    match format {
        CodesFormat::Text => {
            let mut out = String::new();
            for entry in code_entries() {
                writeln!(out, "{:<40} {:>12}  {}", entry.name, entry.value, entry.hex)?;
            }
            Ok(out)
        }
        CodesFormat::Json => {
            let entries = code_entries();
            serde_json::to_string_pretty(&entries).context("failed to render codes as JSON")
        }
        CodesFormat::Toml => toml::to_string(&CodesDocument {
            codes: code_entries(),
        })
        .context("failed to render codes as TOML"),
    }
}

/// Name, fields, and explanation of one status.
pub fn explain_report(status: DasStatus, locale: Option<&str>) -> Result<String> {
    let locale = locale.map_or_else(messages::default_locale, str::to_string);
    let mut out = String::new();
    let name = status.name().unwrap_or("(unregistered)");
    let kind = if status.is_failed() {
        "failure"
    } else {
        "success"
    };
    writeln!(out, "name:     {name}")?;
    let raw = status.raw();
    writeln!(out, "value:    {raw} (0x{:08X})", raw as u32)?;
    writeln!(out, "severity: {} ({kind})", status.severity())?;
    writeln!(out, "reserved: {:#x}", status.reserved())?;
    writeln!(out, "facility: {:#05x}", status.facility())?;
    writeln!(out, "code:     {:#06x}", status.code())?;
    writeln!(out, "message:  {}", messages::explain_in(&locale, status))?;
    Ok(out)
}

/// Every invariant `entries` breaks, as human-readable lines.
pub fn check_registry(entries: &[(&str, DasStatus)]) -> Vec<String> {
    let mut problems = Vec::new();
    let mut values = HashSet::new();
    let mut names = HashSet::new();
    let mut successes = 0;

    for (name, status) in entries {
        if !names.insert(*name) {
            problems.push(format!("{name}: name registered twice"));
        }
        if !values.insert(status.raw()) {
            problems.push(format!("{name}: value {} already used", status.raw()));
        }
        if status.is_success() {
            successes += 1;
        } else if !status.is_failed() {
            problems.push(format!(
                "{name}: value {} is neither success nor a failure",
                status.raw()
            ));
        }
    }

    if successes != 1 {
        problems.push(format!("expected exactly one success value, found {successes}"));
    }
    problems
}

/// Raise `(code, message)` through the C probe and report what the caller
/// receives, named the way `language` names it.
pub fn probe_report(code: DasStatus, message: &str, language: TargetLanguage) -> Result<String> {
    // SAFETY: `message` is a live UTF-8 slice for the duration of the call.
    let status = unsafe { das_probe_fail(code.raw(), message.as_ptr(), message.len()) };
    tracing::debug!(status, "probe returned");

    let mut handle: *mut DasExceptionHandle = ptr::null_mut();
    // SAFETY: `handle` is a valid out-pointer.
    let taken = unsafe { das_get_last_error(&mut handle) };
    if taken != DasStatus::OK.raw() || handle.is_null() {
        bail!("probe returned {status} but left no pending exception");
    }

    let result = read_handle(handle);
    // SAFETY: `handle` came from `das_get_last_error` and is released once.
    unsafe { das_exception_release(handle) };
    let (error_code, received) = result?;

    let shape = language.shape();
    let mut out = String::new();
    writeln!(out, "status:  {status}")?;
    writeln!(out, "type:    {}", shape.type_name)?;
    if let Some(base) = shape.base_type {
        writeln!(out, "base:    {base}")?;
    }
    writeln!(out, "{} = {error_code}", shape.code_member)?;
    writeln!(out, "{} = {received:?}", shape.message_member)?;
    Ok(out)
}

fn read_handle(handle: *const DasExceptionHandle) -> Result<(i32, String)> {
    // SAFETY: `handle` is live for the duration of this function.
    let error_code = unsafe { das_exception_get_error_code(handle) };

    let mut len = 0_usize;
    // SAFETY: null buffer with zero capacity is a length query.
    let status = unsafe { das_exception_get_message(handle, ptr::null_mut(), 0, &mut len) };
    if status != DasStatus::OK.raw() {
        let status = DasStatus::from_raw(status);
        bail!("message length query failed with {status}");
    }

    let mut buf = vec![0_u8; len];
    // SAFETY: `buf` holds `buf.len()` writable bytes.
    let status =
        unsafe { das_exception_get_message(handle, buf.as_mut_ptr(), buf.len(), &mut len) };
    if status != DasStatus::OK.raw() {
        let status = DasStatus::from_raw(status);
        bail!("message copy failed with {status}");
    }
    buf.truncate(len);
    let message = String::from_utf8(buf).context("probe message is not UTF-8")?;
    Ok((error_code, message))
}
