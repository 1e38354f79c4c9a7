use serde::{Deserialize, Serialize};

pub const DEFAULT_IDENTITY_NAME: &str = "github-actions[bot]";
pub const DEFAULT_IDENTITY_EMAIL: &str = "github-actions[bot]@users.noreply.github.com";

/// Committer identity written to `user.name` / `user.email`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_NAME, DEFAULT_IDENTITY_EMAIL)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}
