//! Debug-gated diagnostic trace for one login invocation.
//!
//! The debug flag is evaluated once, when [`Diagnostics`] is built. When it is
//! off every method is a no-op and nothing reaches the tracing subscriber.

use core::fmt::Display;

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use publish_scopes_auth::LoginUser;

/// Loosely-typed debug switch as supplied by a host's secret store.
///
/// Off: absent, null, `false`, zero, the empty string and the strings
/// `"false"`, `"0"`, `"off"`, `"no"` (any case). Everything else is on.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DebugFlag(bool);

impl DebugFlag {
    pub const OFF: DebugFlag = DebugFlag(false);
    pub const ON: DebugFlag = DebugFlag(true);

    pub fn is_enabled(&self) -> bool {
        self.0
    }

    pub fn from_json(value: &JsonValue) -> Self {
        let enabled = match value {
            JsonValue::Null => false,
            JsonValue::Bool(b) => *b,
            JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            JsonValue::String(s) => Self::parse_loose(s).0,
            JsonValue::Array(_) | JsonValue::Object(_) => true,
        };
        Self(enabled)
    }

    pub fn parse_loose(raw: &str) -> Self {
        let raw = raw.trim();
        let off = raw.is_empty()
            || ["false", "0", "off", "no"]
                .iter()
                .any(|v| raw.eq_ignore_ascii_case(v));
        Self(!off)
    }
}

impl From<bool> for DebugFlag {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for DebugFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

/// Stage-level trace lines tagged with the user being logged in.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics<'a> {
    enabled: bool,
    user: &'a LoginUser,
}

impl<'a> Diagnostics<'a> {
    pub fn new(flag: DebugFlag, user: &'a LoginUser) -> Self {
        Self {
            enabled: flag.is_enabled(),
            user,
        }
    }

    pub fn trace(&self, message: impl Display) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            user_id = %self.user.user_id,
            display_name = %self.user.display_name,
            "publish-scopes: {message} for {} ({})",
            self.user.user_id,
            self.user.display_name,
        );
    }

    pub fn failure(&self, error: &dyn Display) {
        if !self.enabled {
            return;
        }
        tracing::error!(
            user_id = %self.user.user_id,
            display_name = %self.user.display_name,
            "publish-scopes: failed for {} ({}): {error}",
            self.user.user_id,
            self.user.display_name,
        );
    }
}
