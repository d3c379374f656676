use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use publish_scopes_auth::Permission;
use publish_scopes_core::RoleId;

/// A tenant-wide role as listed by the directory.
///
/// Only `name` is interpreted (for matching against candidate roles); `id`
/// is handed back to the directory when fetching the role's permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRole {
    pub name: String,
    pub id: RoleId,
}

impl DirectoryRole {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: RoleId::new(id),
        }
    }
}

/// One permission attached to a directory role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub permission_name: Permission,
}

impl PermissionRecord {
    pub fn new(permission_name: impl Into<Permission>) -> Self {
        Self {
            permission_name: permission_name.into(),
        }
    }
}

/// Credentials used to act as a management-API client of the directory.
#[derive(Clone, PartialEq, Eq)]
pub struct DirectoryCredentials {
    pub domain: String,
    pub client_id: String,
    client_secret: String,
}

impl DirectoryCredentials {
    pub fn new(
        domain: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Reject blank credential parts before any network traffic.
    pub fn validate(&self) -> Result<(), DirectoryError> {
        for (field, value) in [
            ("domain", &self.domain),
            ("client id", &self.client_id),
            ("client secret", &self.client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(DirectoryError::Configuration(format!(
                    "directory {field} is not configured"
                )));
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for DirectoryCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirectoryCredentials")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Directory operation error.
///
/// These are **infrastructure errors** (configuration, auth, transport). The
/// pipeline classifies them by the stage they occur in, not by variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("invalid directory configuration: {0}")]
    Configuration(String),

    #[error("directory authentication failed: {0}")]
    Authentication(String),

    #[error("directory transport error: {0}")]
    Transport(String),

    #[error("directory returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("directory response could not be decoded: {0}")]
    Decode(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the identity directory used by the login pipeline.
///
/// ## Semantics
///
/// - `list_roles` returns the **complete** tenant role list, in the
///   directory's order (implementations page internally if needed).
/// - `list_role_permissions` returns one role's permissions in the
///   directory's order.
/// - Implementations do not retry; a failed call is reported as-is.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<DirectoryRole>, DirectoryError>;

    async fn list_role_permissions(
        &self,
        role_id: &RoleId,
    ) -> Result<Vec<PermissionRecord>, DirectoryError>;
}

/// Builds an authenticated [`Directory`] for one invocation.
///
/// This is the substitution seam for tests: the pipeline never constructs a
/// directory client itself.
#[async_trait]
pub trait DirectoryFactory: Send + Sync {
    async fn connect(
        &self,
        credentials: &DirectoryCredentials,
    ) -> Result<Box<dyn Directory>, DirectoryError>;
}

#[async_trait]
impl<F> DirectoryFactory for Arc<F>
where
    F: DirectoryFactory + ?Sized,
{
    async fn connect(
        &self,
        credentials: &DirectoryCredentials,
    ) -> Result<Box<dyn Directory>, DirectoryError> {
        (**self).connect(credentials).await
    }
}
