use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use publish_scopes_auth::RecordedClaims;
use publish_scopes_core::{CoreError, UserId};
use publish_scopes_infra::directory::DirectoryCredentials;
use publish_scopes_infra::{DebugFlag, LoginContext};

// -------------------------
// Request DTOs
// -------------------------

/// Post-login event as posted by the identity provider.
///
/// Only the fields the pipeline reads are modelled; everything else in the
/// event is ignored. Any of the optional sections may be absent or null.
#[derive(Debug, Deserialize)]
pub struct PostLoginEvent {
    #[serde(default)]
    pub transaction: Option<TransactionDto>,
    pub user: UserDto,
    #[serde(default)]
    pub authorization: Option<AuthorizationDto>,
    #[serde(default)]
    pub client: Option<ClientDto>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionDto {
    #[serde(default)]
    pub protocol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthorizationDto {
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientDto {
    #[serde(default)]
    pub metadata: Option<ClientMetadataDto>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientMetadataDto {
    /// Comma-separated role catalog of the application.
    #[serde(default)]
    pub roles: Option<String>,
}

impl PostLoginEvent {
    pub fn into_context(
        self,
        credentials: DirectoryCredentials,
        debug: DebugFlag,
    ) -> Result<LoginContext, CoreError> {
        let user_id: UserId = self.user.user_id.parse()?;

        let mut ctx = LoginContext::new(user_id, credentials).with_debug(debug);
        ctx.protocol = self.transaction.and_then(|t| t.protocol);
        ctx.username = self.user.username;
        ctx.email = self.user.email;
        ctx.user_roles = self.authorization.and_then(|a| a.roles);
        ctx.app_role_catalog = self.client.and_then(|c| c.metadata).and_then(|m| m.roles);
        Ok(ctx)
    }
}

// -------------------------
// Response DTOs
// -------------------------

/// Token mutations for the identity provider to apply, in order.
#[derive(Debug, Default, Serialize)]
pub struct PostLoginResponse {
    pub commands: Vec<ApiCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimTarget {
    IdToken,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiCommand {
    SetCustomClaim {
        target: ClaimTarget,
        name: String,
        value: JsonValue,
    },
}

impl From<RecordedClaims> for PostLoginResponse {
    fn from(claims: RecordedClaims) -> Self {
        let commands = claims
            .into_inner()
            .into_iter()
            .map(|(name, value)| ApiCommand::SetCustomClaim {
                target: ClaimTarget::IdToken,
                name,
                value,
            })
            .collect();

        Self { commands }
    }
}
