use publish_scopes_core::UserId;

/// The user a login transaction is for, as shown in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginUser {
    pub user_id: UserId,
    pub display_name: String,
}

impl LoginUser {
    pub fn new(user_id: UserId, username: Option<&str>, email: Option<&str>) -> Self {
        Self {
            user_id,
            display_name: display_name(username, email),
        }
    }
}

/// Username when it is non-blank after trimming, otherwise the email.
///
/// Neither present yields an empty string.
pub fn display_name(username: Option<&str>, email: Option<&str>) -> String {
    match username.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => email.unwrap_or_default().to_string(),
    }
}
