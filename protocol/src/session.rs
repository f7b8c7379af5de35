use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// The authenticated caller on whose behalf reminders are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            roles,
            expires_at: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.token.trim().is_empty() && self.expires_at.is_none_or(|at| at > Utc::now())
    }

    /// Case-insensitive substring match of `marker` against every role name.
    pub fn has_role_containing(&self, marker: &str) -> bool {
        let marker = marker.to_lowercase();
        self.roles
            .iter()
            .any(|role| role.to_lowercase().contains(&marker))
    }

    /// A session grants a domain only when it is valid and carries the role marker.
    pub fn grants(&self, role_marker: &str) -> bool {
        self.is_valid() && self.has_role_containing(role_marker)
    }
}
