//! User identity forwarded to the learning backend.
//!
//! The auth provider in front of the surrounding application establishes who
//! the user is; this client only forwards that identity as headers the
//! backend validates on every request.

/// Identity attached to every backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
        }
    }

    /// Header pairs the backend expects. The email header is always sent,
    /// empty when unknown.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("x-user-id".to_string(), self.user_id.clone()),
            (
                "x-user-email".to_string(),
                self.email.clone().unwrap_or_default(),
            ),
        ]
    }
}
