use publish_scopes_auth::LoginUser;
use publish_scopes_core::UserId;

use crate::diagnostics::DebugFlag;
use crate::directory::DirectoryCredentials;

/// Immutable input for one login invocation.
///
/// Every role source is kept raw (possibly absent); normalization happens
/// inside the pipeline so absent and blank inputs are handled in one place.
#[derive(Debug, Clone)]
pub struct LoginContext {
    /// Transaction protocol identifier, if the host supplied one.
    pub protocol: Option<String>,
    pub user_id: UserId,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Roles assigned to the user in the directory.
    pub user_roles: Option<Vec<String>>,
    /// The application's comma-separated role catalog (from its metadata).
    pub app_role_catalog: Option<String>,
    pub credentials: DirectoryCredentials,
    pub debug: DebugFlag,
}

impl LoginContext {
    pub fn new(user_id: UserId, credentials: DirectoryCredentials) -> Self {
        Self {
            protocol: None,
            user_id,
            username: None,
            email: None,
            user_roles: None,
            app_role_catalog: None,
            credentials,
            debug: DebugFlag::OFF,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_user_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_app_role_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.app_role_catalog = Some(catalog.into());
        self
    }

    pub fn with_debug(mut self, debug: impl Into<DebugFlag>) -> Self {
        self.debug = debug.into();
        self
    }

    /// The user as shown in diagnostics (username wins over email).
    pub fn login_user(&self) -> LoginUser {
        LoginUser::new(
            self.user_id.clone(),
            self.username.as_deref(),
            self.email.as_deref(),
        )
    }
}
