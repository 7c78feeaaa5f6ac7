//! Device-type heuristic
//!
//! Coarse classification of the host, sent once with `presence:connect`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Markers that identify a tablet
const TABLET_MARKERS: &[&str] = &["ipad", "tablet", "playbook", "silk", "kindle"];

/// Markers that identify a phone-class device
const MOBILE_MARKERS: &[&str] = &[
    "mobi",
    "iphone",
    "ipod",
    "android",
    "blackberry",
    "iemobile",
    "opera mini",
    "webos",
];

/// Host device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl DeviceType {
    /// Classify a user-agent string
    ///
    /// Android without a `mobi` token is a tablet; tablet markers win over
    /// mobile markers; anything unrecognised is a desktop.
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();

        let android_tablet = ua.contains("android") && !ua.contains("mobi");
        if android_tablet || TABLET_MARKERS.iter().any(|m| ua.contains(m)) {
            return Self::Tablet;
        }

        if MOBILE_MARKERS.iter().any(|m| ua.contains(m)) {
            return Self::Mobile;
        }

        Self::Desktop
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
