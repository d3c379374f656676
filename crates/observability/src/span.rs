//! Correlation for one post-login invocation.

use uuid::Uuid;

/// Time-ordered id attached to every event of one invocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct InvocationId(Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// Span wrapping one invocation of the login pipeline.
pub fn invocation_span(id: InvocationId, user_id: &str) -> tracing::Span {
    tracing::info_span!("post_login", invocation_id = %id, user_id = %user_id)
}
