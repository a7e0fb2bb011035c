use std::fmt;

use serde::Serialize;

/// Credentials for the log in endpoint
///
/// The backend accepts either an email address or a username.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
}

impl LoginCredentials {
    /// Picks the email or username field the same way the backend does
    pub fn new(identifier: &str, password: impl Into<String>) -> Self {
        let identifier = identifier.trim();
        let (email, username) = match identifier.contains('@') {
            true => (Some(identifier.to_lowercase()), None),
            false => (None, Some(identifier.to_owned())),
        };

        Self {
            email,
            username,
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}
