//! Transaction protocols and the ID-token gate.
//!
//! Only a closed set of grant/flow types culminate in an identity token.
//! Matching is exact membership over that set: no prefix, substring or
//! case-insensitive matching, and no trimming of the incoming value.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Login transaction protocol that results in an issued ID token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    OidcBasicProfile,
    OidcImplicitProfile,
    OidcHybridProfile,
    #[serde(rename = "oauth2-resource-owner-jwt-bearer")]
    Oauth2ResourceOwnerJwtBearer,
    #[serde(rename = "oauth2-password")]
    Oauth2Password,
    #[serde(rename = "oauth2-refresh-token")]
    Oauth2RefreshToken,
}

impl Protocol {
    /// Every protocol accepted by the gate.
    pub const ALL: [Protocol; 6] = [
        Protocol::OidcBasicProfile,
        Protocol::OidcImplicitProfile,
        Protocol::Oauth2ResourceOwnerJwtBearer,
        Protocol::Oauth2Password,
        Protocol::Oauth2RefreshToken,
        Protocol::OidcHybridProfile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::OidcBasicProfile => "oidc-basic-profile",
            Protocol::OidcImplicitProfile => "oidc-implicit-profile",
            Protocol::OidcHybridProfile => "oidc-hybrid-profile",
            Protocol::Oauth2ResourceOwnerJwtBearer => "oauth2-resource-owner-jwt-bearer",
            Protocol::Oauth2Password => "oauth2-password",
            Protocol::Oauth2RefreshToken => "oauth2-refresh-token",
        }
    }
}

impl core::fmt::Display for Protocol {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::unknown_protocol(s))
    }
}

/// Protocol Gate: decide whether this transaction issues an ID token.
///
/// Absent or unrecognised values are a normal, silent "no" (not an error).
pub fn issues_id_token(protocol: Option<&str>) -> Option<Protocol> {
    protocol.and_then(|p| p.parse().ok())
}
