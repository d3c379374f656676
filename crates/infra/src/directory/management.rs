//! HTTP client for an Auth0-style management API.
//!
//! Construction authenticates with the OAuth2 client-credentials grant; the
//! resulting bearer token is used for every read in the same invocation and
//! then dropped (nothing is cached across invocations).
//!
//! Endpoints used:
//!
//! ```text
//! POST {base}/oauth/token
//! GET  {base}/api/v2/roles?page=N&per_page=M&include_totals=true
//! GET  {base}/api/v2/roles/{id}/permissions?page=N&per_page=M&include_totals=true
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use publish_scopes_core::RoleId;

use super::r#trait::{
    Directory, DirectoryCredentials, DirectoryError, DirectoryFactory, DirectoryRole,
    PermissionRecord,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct RolesPage {
    roles: Vec<DirectoryRole>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PermissionsPage {
    permissions: Vec<PermissionRecord>,
    #[serde(default)]
    total: Option<u64>,
}

/// Builds authenticated [`ManagementClient`]s.
#[derive(Debug, Clone)]
pub struct ManagementClientFactory {
    http: reqwest::Client,
    page_size: u32,
}

impl ManagementClientFactory {
    pub fn new() -> Result<Self, DirectoryError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Bound every individual HTTP request (not the whole invocation).
    pub fn with_timeout(timeout: Duration) -> Result<Self, DirectoryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Configuration(format!("http client: {e}")))?;

        Ok(Self {
            http,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn fetch_token(
        &self,
        base: &Url,
        credentials: &DirectoryCredentials,
    ) -> Result<String, DirectoryError> {
        let url = endpoint(base, &["oauth", "token"])?;
        let request = TokenRequest {
            grant_type: "client_credentials",
            client_id: &credentials.client_id,
            client_secret: credentials.client_secret(),
            audience: format!("{}/api/v2/", base.as_str().trim_end_matches('/')),
        };

        let resp = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DirectoryError::Authentication(format!(
                "token request rejected ({status}): {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| DirectoryError::Authentication(format!("malformed token response: {e}")))?;

        if token.access_token.trim().is_empty() {
            return Err(DirectoryError::Authentication(
                "token response carried an empty access token".to_string(),
            ));
        }

        Ok(token.access_token)
    }
}

#[async_trait]
impl DirectoryFactory for ManagementClientFactory {
    async fn connect(
        &self,
        credentials: &DirectoryCredentials,
    ) -> Result<Box<dyn Directory>, DirectoryError> {
        credentials.validate()?;
        let base = base_url(&credentials.domain)?;
        let access_token = self.fetch_token(&base, credentials).await?;

        Ok(Box::new(ManagementClient {
            http: self.http.clone(),
            base,
            access_token,
            page_size: self.page_size,
        }))
    }
}

/// Authenticated management-API client for one invocation.
pub struct ManagementClient {
    http: reqwest::Client,
    base: Url,
    access_token: String,
    page_size: u32,
}

impl core::fmt::Debug for ManagementClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManagementClient")
            .field("base", &self.base.as_str())
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl ManagementClient {
    async fn get_json<T: DeserializeOwned>(&self, url: Url, page: u32) -> Result<T, DirectoryError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("page", page.to_string()),
                ("per_page", self.page_size.to_string()),
                ("include_totals", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))
    }

    /// Follow `page` until `total` items are collected or a short page arrives.
    async fn get_all<P, T>(
        &self,
        url: Url,
        split: impl Fn(P) -> (Vec<T>, Option<u64>),
    ) -> Result<Vec<T>, DirectoryError>
    where
        P: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 0u32;

        loop {
            let (batch, total) = split(self.get_json(url.clone(), page).await?);
            let batch_len = batch.len();
            items.extend(batch);

            let done = match total {
                Some(total) => items.len() as u64 >= total,
                None => batch_len < self.page_size as usize,
            };
            if done || batch_len == 0 {
                return Ok(items);
            }
            page += 1;
        }
    }
}

#[async_trait]
impl Directory for ManagementClient {
    async fn list_roles(&self) -> Result<Vec<DirectoryRole>, DirectoryError> {
        let url = endpoint(&self.base, &["api", "v2", "roles"])?;
        self.get_all(url, |p: RolesPage| (p.roles, p.total)).await
    }

    async fn list_role_permissions(
        &self,
        role_id: &RoleId,
    ) -> Result<Vec<PermissionRecord>, DirectoryError> {
        let url = endpoint(
            &self.base,
            &["api", "v2", "roles", role_id.as_str(), "permissions"],
        )?;
        self.get_all(url, |p: PermissionsPage| (p.permissions, p.total))
            .await
    }
}

/// `https://{domain}` unless the domain already names a scheme.
pub fn base_url(domain: &str) -> Result<Url, DirectoryError> {
    let trimmed = domain.trim();
    let (scheme, rest) = match trimmed.split_once("://") {
        Some((scheme @ ("http" | "https"), rest)) => (scheme, rest),
        _ => ("https", trimmed),
    };

    let host = rest.trim_end_matches('/');
    if host.is_empty() {
        return Err(DirectoryError::Configuration(format!(
            "invalid directory domain '{domain}': missing host"
        )));
    }

    let url = Url::parse(&format!("{scheme}://{host}")).map_err(|e| {
        DirectoryError::Configuration(format!("invalid directory domain '{domain}': {e}"))
    })?;

    if url.host_str().is_none_or(str::is_empty) {
        return Err(DirectoryError::Configuration(format!(
            "invalid directory domain '{domain}': missing host"
        )));
    }

    Ok(url)
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, DirectoryError> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            DirectoryError::Configuration(format!("'{base}' cannot be used as a base URL"))
        })?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}
