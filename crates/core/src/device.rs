//! Best-effort device descriptor parsing.
//!
//! Derives a coarse `{browser, os, device_class}` triple from a User-Agent
//! string. The result is stored on session rows for display in the device
//! list; it is never used for security decisions, so a misclassification is
//! harmless. Anything we cannot classify becomes the literal `"Unknown"`.

use serde::Serialize;

/// Placeholder for any descriptor field we cannot determine.
pub const UNKNOWN: &str = "Unknown";

/// Coarse device descriptors attached to a session at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub browser: String,
    pub os: String,
    pub device_class: String,
}

impl DeviceInfo {
    /// All fields set to `"Unknown"`.
    pub fn unknown() -> Self {
        Self {
            browser: UNKNOWN.into(),
            os: UNKNOWN.into(),
            device_class: UNKNOWN.into(),
        }
    }
}

/// Parse a User-Agent header value into coarse device descriptors.
///
/// `None` (header absent) yields all-`"Unknown"`.
pub fn parse_user_agent(user_agent: Option<&str>) -> DeviceInfo {
    let Some(ua) = user_agent else {
        return DeviceInfo::unknown();
    };

    DeviceInfo {
        browser: detect_browser(ua).into(),
        os: detect_os(ua).into(),
        device_class: detect_device_class(ua).into(),
    }
}

/// Token order matters: Chrome UAs contain "Safari", Edge UAs contain
/// "Chrome", so the more specific tokens are checked first.
fn detect_browser(ua: &str) -> &'static str {
    if ua.contains("Edg/") || ua.contains("Edge/") {
        "Edge"
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        "Opera"
    } else if ua.contains("Firefox/") {
        "Firefox"
    } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
        "Chrome"
    } else if ua.contains("Safari/") {
        "Safari"
    } else {
        UNKNOWN
    }
}

/// "Android" is checked before "Linux" because Android UAs contain both.
fn detect_os(ua: &str) -> &'static str {
    if ua.contains("Windows NT") {
        "Windows"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iOS") {
        "iOS"
    } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
        "macOS"
    } else if ua.contains("Linux") {
        "Linux"
    } else {
        UNKNOWN
    }
}

fn detect_device_class(ua: &str) -> &'static str {
    if ua.contains("iPad") || ua.contains("Tablet") {
        "tablet"
    } else if ua.contains("Mobi") || ua.contains("iPhone") || ua.contains("Android") {
        "mobile"
    } else if ua.contains("Windows NT")
        || ua.contains("Macintosh")
        || ua.contains("X11")
        || ua.contains("Linux")
    {
        "desktop"
    } else {
        UNKNOWN
    }
}
