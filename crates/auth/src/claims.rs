use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::Permission;

/// Name of the ID-token claim carrying the resolved permissions.
pub const PERMISSIONS_CLAIM: &str = "x-permissions";

/// The token sink refused a claim write.
///
/// The message is whatever the sink reported; it is operator-facing and must
/// never be copied into token content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("{0}")]
    Rejected(String),
}

impl ClaimError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Outgoing identity token (transport-agnostic).
///
/// Token issuance is owned by the host; this crate only needs to add a
/// custom claim to the token being built.
pub trait IdToken {
    fn set_custom_claim(&mut self, name: &str, value: JsonValue) -> Result<(), ClaimError>;
}

impl<T> IdToken for &mut T
where
    T: IdToken + ?Sized,
{
    fn set_custom_claim(&mut self, name: &str, value: JsonValue) -> Result<(), ClaimError> {
        (**self).set_custom_claim(name, value)
    }
}

/// Claim value for a permission list: a JSON array of strings.
pub fn permissions_claim_value(permissions: &[Permission]) -> JsonValue {
    JsonValue::Array(
        permissions
            .iter()
            .map(|p| JsonValue::String(p.as_str().to_string()))
            .collect(),
    )
}

/// In-memory token that records claim writes in order.
///
/// Hosts that apply token mutations remotely (e.g. by returning a command
/// list) collect the writes here and translate them afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedClaims {
    claims: Vec<(String, JsonValue)>,
}

impl RecordedClaims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.claims.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn into_inner(self) -> Vec<(String, JsonValue)> {
        self.claims
    }
}

impl IdToken for RecordedClaims {
    fn set_custom_claim(&mut self, name: &str, value: JsonValue) -> Result<(), ClaimError> {
        self.claims.push((name.to_string(), value));
        Ok(())
    }
}
