use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use publish_scopes_core::RoleId;

use super::r#trait::{
    Directory, DirectoryCredentials, DirectoryError, DirectoryFactory, DirectoryRole,
    PermissionRecord,
};

/// Calls observed by an [`InMemoryDirectory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    /// Credentials passed to every `connect` attempt (including failed ones).
    pub connects: Vec<DirectoryCredentials>,
    pub list_roles: usize,
    /// Role ids in the order their permissions were requested.
    pub permission_fetches: Vec<RoleId>,
}

#[derive(Debug, Default)]
struct State {
    roles: Vec<DirectoryRole>,
    permissions: HashMap<RoleId, Vec<PermissionRecord>>,
    fail_connect: Option<String>,
    fail_list_roles: Option<String>,
    fail_permissions: HashMap<RoleId, String>,
    calls: CallLog,
}

/// Scripted in-memory directory.
///
/// Acts as both the factory and the connected directory; clones share state,
/// so a test can keep a handle and inspect [`CallLog`] afterwards.
///
/// Intended for tests/dev. Roles without scripted permissions have none.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<Mutex<State>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tenant role with its permissions (listed in insertion order).
    pub fn with_role(self, name: &str, id: &str, permissions: &[&str]) -> Self {
        self.update(|s| {
            let role = DirectoryRole::new(name, id);
            s.permissions.insert(
                role.id.clone(),
                permissions
                    .iter()
                    .map(|p| PermissionRecord::new(p.to_string()))
                    .collect(),
            );
            s.roles.push(role);
        });
        self
    }

    /// Make every `connect` fail with an authentication error.
    pub fn failing_connect(self, message: &str) -> Self {
        self.update(|s| s.fail_connect = Some(message.to_string()));
        self
    }

    /// Make `list_roles` fail.
    pub fn failing_list_roles(self, message: &str) -> Self {
        self.update(|s| s.fail_list_roles = Some(message.to_string()));
        self
    }

    /// Make the permission fetch for one role fail.
    pub fn failing_permissions(self, role_id: &str, message: &str) -> Self {
        self.update(|s| {
            s.fail_permissions
                .insert(RoleId::new(role_id), message.to_string());
        });
        self
    }

    /// Snapshot of the calls made so far.
    pub fn calls(&self) -> CallLog {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    fn update(&self, f: impl FnOnce(&mut State)) {
        // Builders run before any concurrent use; a poisoned lock leaves the
        // script unchanged.
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut State) -> Result<T, DirectoryError>,
    ) -> Result<T, DirectoryError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;
        f(&mut state)
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn list_roles(&self) -> Result<Vec<DirectoryRole>, DirectoryError> {
        self.with_state(|s| {
            s.calls.list_roles += 1;
            if let Some(msg) = &s.fail_list_roles {
                return Err(DirectoryError::Unavailable(msg.clone()));
            }
            Ok(s.roles.clone())
        })
    }

    async fn list_role_permissions(
        &self,
        role_id: &RoleId,
    ) -> Result<Vec<PermissionRecord>, DirectoryError> {
        self.with_state(|s| {
            s.calls.permission_fetches.push(role_id.clone());
            if let Some(msg) = s.fail_permissions.get(role_id) {
                return Err(DirectoryError::Unavailable(msg.clone()));
            }
            Ok(s.permissions.get(role_id).cloned().unwrap_or_default())
        })
    }
}

#[async_trait]
impl DirectoryFactory for InMemoryDirectory {
    async fn connect(
        &self,
        credentials: &DirectoryCredentials,
    ) -> Result<Box<dyn Directory>, DirectoryError> {
        self.with_state(|s| {
            s.calls.connects.push(credentials.clone());
            match &s.fail_connect {
                Some(msg) => Err(DirectoryError::Authentication(msg.clone())),
                None => Ok(()),
            }
        })?;

        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> DirectoryCredentials {
        DirectoryCredentials::new("pid.pyrates.live", "abc", "xyz")
    }

    #[tokio::test]
    async fn lists_roles_in_insertion_order() {
        let dir = InMemoryDirectory::new()
            .with_role("roleB", "R2", &[])
            .with_role("roleA", "R1", &["read:apiA"]);

        let conn = dir.connect(&creds()).await.unwrap();
        let roles = conn.list_roles().await.unwrap();

        assert_eq!(
            roles,
            vec![DirectoryRole::new("roleB", "R2"), DirectoryRole::new("roleA", "R1")]
        );
        assert_eq!(dir.calls().list_roles, 1);
        assert_eq!(dir.calls().connects, vec![creds()]);
    }

    #[tokio::test]
    async fn unknown_role_has_no_permissions() {
        let dir = InMemoryDirectory::new();
        let perms = dir.list_role_permissions(&RoleId::new("R9")).await.unwrap();
        assert!(perms.is_empty());
        assert_eq!(dir.calls().permission_fetches, vec![RoleId::new("R9")]);
    }

    #[tokio::test]
    async fn scripted_failures_surface_their_message() {
        let dir = InMemoryDirectory::new()
            .with_role("roleA", "R1", &["read:apiA"])
            .failing_permissions("R1", "boom");

        let err = dir.list_role_permissions(&RoleId::new("R1")).await.unwrap_err();
        assert!(err.to_string().contains("boom"));

        let err = match dir.clone().failing_connect("bad client").connect(&creds()).await {
            Err(e) => e,
            Ok(_) => panic!("expected connect to fail"),
        };
        assert_eq!(err, DirectoryError::Authentication("bad client".to_string()));
    }
}
