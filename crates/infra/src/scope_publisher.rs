//! Login-time permission resolution pipeline.
//!
//! `ScopePublisher` computes the permissions (scopes) a user may exercise
//! against one back-end API from the application they are logging in to, and
//! publishes them on the ID token as a single claim.
//!
//! ## Flow
//!
//! ```text
//! LoginContext
//!   ↓
//! 1. Protocol gate (not an ID-token flow → Skipped, no side effects)
//!   ↓
//! 2. Normalize user roles + application role catalog
//!   ↓
//! 3. Intersect (empty → skip 4–5, no directory traffic)
//!   ↓
//! 4. Connect to directory, list tenant roles, keep candidate names
//!   ↓
//! 5. Fetch each matched role's permissions, one role at a time
//!   ↓
//! 6. Write the claim (always, once the gate has passed)
//! ```
//!
//! ## Error Semantics
//!
//! Fail closed: a failure in stages 4–6 is traced (when debug is on) and
//! returned unchanged. No claim is written for a failed directory stage and
//! partial aggregation is discarded.

use std::borrow::Cow;

use thiserror::Error;

use publish_scopes_auth::{
    CandidateRoles, ClaimError, IdToken, NormalizedRoles, PERMISSIONS_CLAIM, Permission,
    candidate_roles, permission_names, permissions_claim_value,
};
use publish_scopes_core::issues_id_token;

use crate::context::LoginContext;
use crate::diagnostics::Diagnostics;
use crate::directory::{
    Directory, DirectoryCredentials, DirectoryError, DirectoryFactory, DirectoryRole,
};

/// Unrecoverable failure for one invocation.
///
/// Each variant is transparent: the message is exactly the underlying one.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The directory client could not be built or authenticated.
    #[error(transparent)]
    DirectoryConstruction(DirectoryError),

    /// Listing roles or a role's permissions failed.
    #[error(transparent)]
    DirectoryQuery(DirectoryError),

    /// The token sink rejected the claim.
    #[error(transparent)]
    ClaimPublish(ClaimError),
}

impl PublishError {
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::DirectoryConstruction(_) => "directory_construction",
            PublishError::DirectoryQuery(_) => "directory_query",
            PublishError::ClaimPublish(_) => "claim_publish",
        }
    }
}

/// What an invocation did to the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The transaction does not issue an ID token; the token was not touched.
    Skipped,
    /// The claim was written with these permissions (possibly none).
    Published(Vec<Permission>),
}

/// Per-login permission resolver and claim publisher.
///
/// Holds no per-invocation state; one instance can serve every login.
#[derive(Debug)]
pub struct ScopePublisher<F> {
    directory: F,
    claim_name: Cow<'static, str>,
}

impl<F> ScopePublisher<F> {
    pub fn new(directory: F) -> Self {
        Self {
            directory,
            claim_name: Cow::Borrowed(PERMISSIONS_CLAIM),
        }
    }

    /// Publish under a different claim (one publisher per back-end API).
    pub fn with_claim_name(mut self, claim_name: impl Into<Cow<'static, str>>) -> Self {
        self.claim_name = claim_name.into();
        self
    }
}

impl<F> ScopePublisher<F>
where
    F: DirectoryFactory,
{
    /// Run the pipeline for one login and write the claim onto `token`.
    pub async fn publish<T>(
        &self,
        ctx: &LoginContext,
        token: &mut T,
    ) -> Result<PublishOutcome, PublishError>
    where
        T: IdToken + ?Sized,
    {
        let user = ctx.login_user();
        let diag = Diagnostics::new(ctx.debug, &user);

        diag.trace("invoked");

        let Some(protocol) = issues_id_token(ctx.protocol.as_deref()) else {
            return Ok(PublishOutcome::Skipped);
        };

        diag.trace(format_args!("will issue ID token ({protocol})"));

        let user_roles = NormalizedRoles::from_assigned(ctx.user_roles.as_deref());
        let app_roles = NormalizedRoles::from_catalog(ctx.app_role_catalog.as_deref());
        let candidates = candidate_roles(&user_roles, &app_roles);

        let permissions = if candidates.is_empty() {
            diag.trace("no authorization roles for this application");
            Vec::new()
        } else {
            diag.trace(format_args!(
                "authorization roles found: {:?}",
                candidates.names()
            ));
            self.resolve(&candidates, &ctx.credentials, &diag)
                .await
                .inspect_err(|e| diag.failure(e))?
        };

        diag.trace(format_args!(
            "calculated permissions: {:?}",
            permission_names(&permissions)
        ));
        diag.trace(format_args!("setting custom claim {}", self.claim_name));

        token
            .set_custom_claim(&self.claim_name, permissions_claim_value(&permissions))
            .map_err(PublishError::ClaimPublish)
            .inspect_err(|e| diag.failure(e))?;

        Ok(PublishOutcome::Published(permissions))
    }

    async fn resolve(
        &self,
        candidates: &CandidateRoles,
        credentials: &DirectoryCredentials,
        diag: &Diagnostics<'_>,
    ) -> Result<Vec<Permission>, PublishError> {
        diag.trace("connecting to management API");

        let directory = self
            .directory
            .connect(credentials)
            .await
            .map_err(PublishError::DirectoryConstruction)?;

        let matched = resolve_roles(directory.as_ref(), candidates).await?;
        if matched.is_empty() {
            diag.trace("no tenant roles match the authorization roles");
            return Ok(Vec::new());
        }

        aggregate_permissions(directory.as_ref(), &matched).await
    }
}

/// Directory Resolver: tenant roles whose name is a candidate, in directory order.
pub async fn resolve_roles(
    directory: &dyn Directory,
    candidates: &CandidateRoles,
) -> Result<Vec<DirectoryRole>, PublishError> {
    let all = directory
        .list_roles()
        .await
        .map_err(PublishError::DirectoryQuery)?;

    Ok(all
        .into_iter()
        .filter(|role| candidates.contains(&role.name))
        .collect())
}

/// Permission Aggregator: concatenate each role's permissions, sequentially.
///
/// One role is fully fetched before the next request starts. The first
/// failure aborts the loop and the partial list is dropped.
pub async fn aggregate_permissions(
    directory: &dyn Directory,
    roles: &[DirectoryRole],
) -> Result<Vec<Permission>, PublishError> {
    let mut permissions = Vec::new();

    for role in roles {
        let records = directory
            .list_role_permissions(&role.id)
            .await
            .map_err(PublishError::DirectoryQuery)?;

        permissions.extend(records.into_iter().map(|r| r.permission_name));
    }

    Ok(permissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use publish_scopes_auth::RecordedClaims;
    use publish_scopes_core::{RoleId, UserId};
    use serde_json::json;
    use tracing_test::traced_test;

    use crate::diagnostics::DebugFlag;
    use crate::directory::InMemoryDirectory;

    const EMAIL: &str = "calicojack@pyrates.live";
    const USER_ID: &str = "auth0|5f7c8ec7c33c6c004bbafe82";

    fn tenant() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_role("roleA", "R1", &["read:apiA", "write:apiA", "update:apiA", "delete:apiA"])
            .with_role("roleB", "R2", &["read:apiB", "write:apiB"])
            .with_role("roleC", "R3", &[])
            .with_role("roleD", "R4", &["read:apiD"])
            .with_role("roleE", "R5", &["read:apiE"])
    }

    fn credentials() -> DirectoryCredentials {
        DirectoryCredentials::new("pid.pyrates.live", "abc", "xyz")
    }

    fn login() -> LoginContext {
        LoginContext::new(UserId::new(USER_ID), credentials())
            .with_protocol("oidc-basic-profile")
            .with_email(EMAIL)
            .with_user_roles(["roleA", "roleB", "roleC"])
            .with_app_role_catalog("roleA, roleB, roleC")
            .with_debug(DebugFlag::ON)
    }

    async fn run(
        dir: &InMemoryDirectory,
        ctx: &LoginContext,
    ) -> (Result<PublishOutcome, PublishError>, RecordedClaims) {
        let publisher = ScopePublisher::new(dir.clone());
        let mut token = RecordedClaims::new();
        let result = publisher.publish(ctx, &mut token).await;
        (result, token)
    }

    struct SealedToken;

    impl IdToken for SealedToken {
        fn set_custom_claim(&mut self, _name: &str, _value: serde_json::Value) -> Result<(), ClaimError> {
            Err(ClaimError::rejected("This message should be logged"))
        }
    }

    // ── Protocol gate ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn non_id_token_protocols_skip_everything() {
        for protocol in [None, Some(""), Some(" "), Some("oauth2-client-credentials")] {
            let dir = tenant();
            let mut ctx = login();
            ctx.protocol = protocol.map(str::to_string);

            let (result, token) = run(&dir, &ctx).await;

            assert_eq!(result.unwrap(), PublishOutcome::Skipped);
            assert!(token.is_empty(), "{protocol:?}");
            assert!(dir.calls().connects.is_empty(), "{protocol:?}");
        }
    }

    #[tokio::test]
    async fn every_id_token_protocol_publishes() {
        for protocol in publish_scopes_core::Protocol::ALL {
            let dir = tenant();
            let ctx = login().with_protocol(protocol.as_str());
            let (result, token) = run(&dir, &ctx).await;
            assert!(matches!(result.unwrap(), PublishOutcome::Published(_)));
            assert_eq!(token.len(), 1);
        }
    }

    // ── Role normalization / intersection short-circuits ───────────────────

    #[tokio::test]
    async fn missing_or_blank_user_roles_skip_directory_but_publish_empty_claim() {
        let cases: [Option<Vec<String>>; 3] = [
            None,
            Some(vec![]),
            Some(vec!["".to_string(), " ".to_string()]),
        ];
        for roles in cases {
            let dir = tenant();
            let mut ctx = login();
            ctx.user_roles = roles.clone();

            let (result, token) = run(&dir, &ctx).await;

            assert_eq!(result.unwrap(), PublishOutcome::Published(vec![]));
            assert_eq!(token.get(PERMISSIONS_CLAIM), Some(&json!([])), "{roles:?}");
            assert!(dir.calls().connects.is_empty(), "{roles:?}");
        }
    }

    #[tokio::test]
    async fn missing_or_blank_catalog_skips_directory_but_publishes_empty_claim() {
        for catalog in [None, Some(" "), Some(" , "), Some("")] {
            let dir = tenant();
            let mut ctx = login();
            ctx.app_role_catalog = catalog.map(str::to_string);

            let (result, token) = run(&dir, &ctx).await;

            assert_eq!(result.unwrap(), PublishOutcome::Published(vec![]));
            assert_eq!(token.get(PERMISSIONS_CLAIM), Some(&json!([])), "{catalog:?}");
            assert!(dir.calls().connects.is_empty(), "{catalog:?}");
        }
    }

    #[tokio::test]
    async fn disjoint_roles_publish_empty_claim_without_directory_calls() {
        let dir = tenant();
        let ctx = login()
            .with_user_roles(["roleA"])
            .with_app_role_catalog("roleB");

        let (result, token) = run(&dir, &ctx).await;

        assert_eq!(result.unwrap(), PublishOutcome::Published(vec![]));
        assert_eq!(token.get(PERMISSIONS_CLAIM), Some(&json!([])));
        let calls = dir.calls();
        assert!(calls.connects.is_empty());
        assert!(calls.permission_fetches.is_empty());
    }

    // ── Directory resolution ───────────────────────────────────────────────

    #[tokio::test]
    async fn passes_credentials_to_directory_factory() {
        let dir = tenant();
        let (result, _) = run(&dir, &login()).await;
        result.unwrap();

        let calls = dir.calls();
        assert_eq!(calls.connects, vec![credentials()]);
        assert_eq!(calls.list_roles, 1);
    }

    #[tokio::test]
    async fn no_tenant_roles_means_no_permission_fetches() {
        let dir = InMemoryDirectory::new();
        let (result, token) = run(&dir, &login()).await;

        assert_eq!(result.unwrap(), PublishOutcome::Published(vec![]));
        assert_eq!(token.get(PERMISSIONS_CLAIM), Some(&json!([])));
        assert!(dir.calls().permission_fetches.is_empty());
    }

    #[tokio::test]
    async fn unmatched_tenant_roles_mean_no_permission_fetches() {
        let dir = InMemoryDirectory::new()
            .with_role("roleD", "R4", &["read:apiD"])
            .with_role("roleE", "R5", &["read:apiE"]);

        let (result, token) = run(&dir, &login()).await;

        assert_eq!(result.unwrap(), PublishOutcome::Published(vec![]));
        assert_eq!(token.get(PERMISSIONS_CLAIM), Some(&json!([])));
        assert_eq!(dir.calls().list_roles, 1);
        assert!(dir.calls().permission_fetches.is_empty());
    }

    #[tokio::test]
    async fn single_role_permissions_are_published() {
        let dir = InMemoryDirectory::new().with_role("roleA", "R1", &["read:apiA", "write:apiA"]);
        let ctx = login().with_user_roles(["roleA"]).with_app_role_catalog("roleA");

        let (result, token) = run(&dir, &ctx).await;
        result.unwrap();

        assert_eq!(dir.calls().permission_fetches, vec![RoleId::new("R1")]);
        assert_eq!(token.get(PERMISSIONS_CLAIM), Some(&json!(["read:apiA", "write:apiA"])));
    }

    #[tokio::test]
    async fn multiple_roles_concatenate_in_directory_order_without_dedup() {
        let dir = InMemoryDirectory::new()
            .with_role("roleA", "R1", &["read:apiA", "write:apiA"])
            .with_role("roleB", "R2", &["read:apiB", "read:apiA"]);
        let ctx = login()
            .with_user_roles(["roleB", "roleA"])
            .with_app_role_catalog("roleB, roleA");

        let (result, token) = run(&dir, &ctx).await;

        assert_eq!(
            result.unwrap(),
            PublishOutcome::Published(vec![
                Permission::new("read:apiA"),
                Permission::new("write:apiA"),
                Permission::new("read:apiB"),
                Permission::new("read:apiA"),
            ])
        );
        assert_eq!(
            dir.calls().permission_fetches,
            vec![RoleId::new("R1"), RoleId::new("R2")]
        );
        assert_eq!(
            token.get(PERMISSIONS_CLAIM),
            Some(&json!(["read:apiA", "write:apiA", "read:apiB", "read:apiA"]))
        );
    }

    #[tokio::test]
    async fn roles_with_no_permissions_contribute_nothing() {
        let dir = tenant();
        let ctx = login().with_user_roles(["roleC"]).with_app_role_catalog("roleC");

        let (result, token) = run(&dir, &ctx).await;

        assert_eq!(result.unwrap(), PublishOutcome::Published(vec![]));
        assert_eq!(dir.calls().permission_fetches, vec![RoleId::new("R3")]);
        assert_eq!(token.get(PERMISSIONS_CLAIM), Some(&json!([])));
    }

    #[tokio::test]
    async fn custom_claim_name_is_used() {
        let dir = tenant();
        let publisher = ScopePublisher::new(dir.clone()).with_claim_name("x-permissions-apiB");
        let ctx = login().with_user_roles(["roleB"]).with_app_role_catalog("roleB");
        let mut token = RecordedClaims::new();

        publisher.publish(&ctx, &mut token).await.unwrap();

        assert_eq!(token.get(PERMISSIONS_CLAIM), None);
        assert_eq!(
            token.get("x-permissions-apiB"),
            Some(&json!(["read:apiB", "write:apiB"]))
        );
    }

    // ── Error escalation ───────────────────────────────────────────────────

    #[tokio::test]
    async fn connect_failure_is_construction_error_and_writes_no_claim() {
        let dir = tenant().failing_connect("This message should be logged");
        let (result, token) = run(&dir, &login()).await;

        let err = result.unwrap_err();
        assert!(matches!(err, PublishError::DirectoryConstruction(_)));
        assert_eq!(err.kind(), "directory_construction");
        assert!(err.to_string().contains("This message should be logged"));
        assert!(token.is_empty());
    }

    #[tokio::test]
    async fn list_roles_failure_propagates_unchanged() {
        let dir = tenant().failing_list_roles("This message should be logged");
        let (result, token) = run(&dir, &login()).await;

        let err = result.unwrap_err();
        assert!(matches!(err, PublishError::DirectoryQuery(_)));
        assert_eq!(
            err.to_string(),
            DirectoryError::Unavailable("This message should be logged".to_string()).to_string()
        );
        assert!(token.is_empty());
    }

    #[tokio::test]
    async fn permission_fetch_failure_aborts_remaining_roles() {
        let dir = tenant().failing_permissions("R1", "boom");
        let (result, token) = run(&dir, &login()).await;

        assert!(matches!(result.unwrap_err(), PublishError::DirectoryQuery(_)));
        assert_eq!(dir.calls().permission_fetches, vec![RoleId::new("R1")]);
        assert!(token.is_empty());
    }

    #[tokio::test]
    async fn later_permission_failure_discards_already_aggregated_permissions() {
        let dir = tenant().failing_permissions("R2", "roleB permissions unavailable");
        let (result, token) = run(&dir, &login()).await;

        let err = result.unwrap_err();
        assert!(matches!(err, PublishError::DirectoryQuery(_)));
        assert_eq!(
            err.to_string(),
            DirectoryError::Unavailable("roleB permissions unavailable".to_string()).to_string()
        );
        assert_eq!(
            dir.calls().permission_fetches,
            vec![RoleId::new("R1"), RoleId::new("R2")]
        );
        assert!(token.is_empty());
        assert_eq!(token.get(PERMISSIONS_CLAIM), None);
    }

    #[tokio::test]
    async fn claim_write_failure_propagates() {
        let publisher = ScopePublisher::new(tenant());
        let mut token = SealedToken;

        let err = publisher.publish(&login(), &mut token).await.unwrap_err();

        assert!(matches!(err, PublishError::ClaimPublish(_)));
        assert_eq!(err.to_string(), "This message should be logged");
    }

    // ── Diagnostics policy ─────────────────────────────────────────────────

    #[tokio::test]
    #[traced_test]
    async fn debug_traces_include_user_id_and_email_when_username_absent() {
        let (result, _) = run(&tenant(), &login()).await;
        result.unwrap();

        assert!(logs_contain(USER_ID));
        assert!(logs_contain(EMAIL));
        assert!(logs_contain("setting custom claim x-permissions"));
    }

    #[tokio::test]
    #[traced_test]
    async fn debug_traces_use_blank_username_fallback() {
        let ctx = login().with_username("     ");
        let (result, _) = run(&tenant(), &ctx).await;
        result.unwrap();

        assert!(logs_contain(EMAIL));
    }

    #[tokio::test]
    #[traced_test]
    async fn debug_traces_prefer_username_over_email() {
        let ctx = login().with_username("blackbeard@pyrates.live");
        let (result, _) = run(&tenant(), &ctx).await;
        result.unwrap();

        assert!(logs_contain("blackbeard@pyrates.live"));
        assert!(!logs_contain(EMAIL));
    }

    #[tokio::test]
    #[traced_test]
    async fn disabled_debug_emits_nothing() {
        for flag in [json!(null), json!(false), json!(0)] {
            let ctx = login().with_debug(DebugFlag::from_json(&flag));
            let (result, _) = run(&tenant(), &ctx).await;
            result.unwrap();
        }

        assert!(!logs_contain("publish-scopes"));
        assert!(!logs_contain(USER_ID));
    }

    #[tokio::test]
    #[traced_test]
    async fn failures_are_traced_when_debug_is_on() {
        let dir = tenant().failing_connect("This message should be logged");
        let (result, _) = run(&dir, &login()).await;

        assert!(result.is_err());
        assert!(logs_contain("This message should be logged"));
    }

    #[tokio::test]
    #[traced_test]
    async fn failures_are_not_traced_when_debug_is_off() {
        let dir = tenant().failing_connect("This message should be logged");
        let ctx = login().with_debug(false);
        let (result, _) = run(&dir, &ctx).await;

        assert!(result.unwrap_err().to_string().contains("This message should be logged"));
        assert!(!logs_contain("This message should be logged"));
    }

    #[tokio::test]
    #[traced_test]
    async fn claim_failures_are_not_traced_when_debug_is_off() {
        let publisher = ScopePublisher::new(tenant());
        let ctx = login().with_debug(false);
        let mut token = SealedToken;

        assert!(publisher.publish(&ctx, &mut token).await.is_err());
        assert!(!logs_contain("This message should be logged"));
    }
}
