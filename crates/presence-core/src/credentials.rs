//! Session credentials supplied by the authentication layer

use std::fmt;

/// Credentials used to open (and re-open) the presence channel
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token
    pub token: String,
    /// Local user id
    pub user_id: String,
    /// Local profile id
    pub profile_id: String,
}

impl Credentials {
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        profile_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            profile_id: profile_id.into(),
        }
    }
}

// Keeps the token out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("profile_id", &self.profile_id)
            .finish()
    }
}
