use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Role name as known to the directory and to application metadata.
///
/// Roles are opaque, case-sensitive strings at this layer; mapping roles to
/// permissions is the directory's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered sequence of trimmed, non-empty role names from one source.
///
/// Relative order of the source is preserved. Entries are not deduplicated
/// and not case-folded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRoles(Vec<Role>);

impl NormalizedRoles {
    /// Sequence-or-empty normalization shared by both role sources.
    ///
    /// An absent source yields an empty set; blank entries are dropped.
    pub fn normalize<I, S>(source: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = source
            .into_iter()
            .flatten()
            .filter_map(|raw| {
                let trimmed = raw.as_ref().trim();
                (!trimmed.is_empty()).then(|| Role::new(trimmed.to_string()))
            })
            .collect();

        Self(roles)
    }

    /// Roles assigned to the user (a list, possibly absent).
    pub fn from_assigned<S: AsRef<str>>(roles: Option<&[S]>) -> Self {
        Self::normalize(roles)
    }

    /// The application's role catalog (one comma-separated string, possibly absent).
    pub fn from_catalog(catalog: Option<&str>) -> Self {
        Self::normalize(catalog.map(|c| c.split(',')))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Role] {
        &self.0
    }
}

/// Application roles the user is also assigned, in application-catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRoles(Vec<Role>);

impl CandidateRoles {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|r| r.as_str() == name)
    }

    pub fn as_slice(&self) -> &[Role] {
        &self.0
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(Role::as_str).collect()
    }
}

/// Role Intersector: every application role that the user also holds.
///
/// Preserves the application catalog's order; duplicates in `app` appear once
/// per occurrence. Either side empty means no candidates.
pub fn candidate_roles(user: &NormalizedRoles, app: &NormalizedRoles) -> CandidateRoles {
    if user.is_empty() || app.is_empty() {
        return CandidateRoles::default();
    }

    let assigned: HashSet<&str> = user.iter().map(Role::as_str).collect();

    CandidateRoles(
        app.iter()
            .filter(|role| assigned.contains(role.as_str()))
            .cloned()
            .collect(),
    )
}
