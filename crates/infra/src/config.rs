//! Service configuration from the process environment.

use std::borrow::Cow;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use publish_scopes_auth::PERMISSIONS_CLAIM;

use crate::diagnostics::DebugFlag;
use crate::directory::DirectoryCredentials;

pub const BIND_VAR: &str = "PUBLISH_SCOPES_BIND";
pub const HOOK_SECRET_VAR: &str = "PUBLISH_SCOPES_HOOK_SECRET";
pub const DOMAIN_VAR: &str = "PUBLISH_SCOPES_DOMAIN";
pub const CLIENT_ID_VAR: &str = "PUBLISH_SCOPES_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "PUBLISH_SCOPES_CLIENT_SECRET";
pub const DEBUG_VAR: &str = "PUBLISH_SCOPES_DEBUG";
pub const TIMEOUT_VAR: &str = "PUBLISH_SCOPES_TIMEOUT_MS";
pub const CLAIM_VAR: &str = "PUBLISH_SCOPES_CLAIM";

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(20_000);
const DEV_HOOK_SECRET: &str = "dev-hook-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not set")]
    Missing { var: &'static str },

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Everything the hosting service needs to answer post-login calls.
#[derive(Clone)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    hook_secret: String,
    pub credentials: DirectoryCredentials,
    pub debug: DebugFlag,
    pub timeout: Duration,
    pub claim_name: Cow<'static, str>,
}

impl core::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bind", &self.bind)
            .field("hook_secret", &"<redacted>")
            .field("credentials", &self.credentials)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .field("claim_name", &self.claim_name)
            .finish()
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Parse from an arbitrary variable source.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_raw = get(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: BIND_VAR,
                reason: e.to_string(),
            })?;

        let hook_secret = get(HOOK_SECRET_VAR).unwrap_or_else(|| {
            tracing::warn!("{HOOK_SECRET_VAR} not set; using insecure dev default");
            DEV_HOOK_SECRET.to_string()
        });

        let domain = get(DOMAIN_VAR).ok_or(ConfigError::Missing { var: DOMAIN_VAR })?;
        let client_id = get(CLIENT_ID_VAR).ok_or(ConfigError::Missing { var: CLIENT_ID_VAR })?;
        let client_secret = get(CLIENT_SECRET_VAR).ok_or(ConfigError::Missing {
            var: CLIENT_SECRET_VAR,
        })?;

        let debug = get(DEBUG_VAR)
            .map(|raw| DebugFlag::parse_loose(&raw))
            .unwrap_or_default();

        let timeout = match get(TIMEOUT_VAR) {
            None => DEFAULT_TIMEOUT,
            Some(raw) => {
                let ms = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    var: TIMEOUT_VAR,
                    reason: e.to_string(),
                })?;
                if ms == 0 {
                    return Err(ConfigError::Invalid {
                        var: TIMEOUT_VAR,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_millis(ms)
            }
        };

        let claim_name = get(CLAIM_VAR)
            .map(|c| Cow::Owned(c.trim().to_string()))
            .unwrap_or(Cow::Borrowed(PERMISSIONS_CLAIM));

        Ok(Self {
            bind,
            hook_secret,
            credentials: DirectoryCredentials::new(domain.trim(), client_id.trim(), client_secret),
            debug,
            timeout,
            claim_name,
        })
    }

    pub fn hook_secret(&self) -> &str {
        &self.hook_secret
    }
}
