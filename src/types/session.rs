use serde::{Deserialize, Serialize};

use crate::types::user::User;

/// An authenticated platform session produced by the OAuth code exchange.
///
/// Held by the backend client handle; never persisted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

/// OAuth providers the sign-in flow can hand off to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    GitHub,
}

impl OAuthProvider {
    /// Provider slug as the platform's authorize endpoint expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::GitHub => "github",
        }
    }

    /// Parses a provider slug from loose input (RPC params).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "google" => Some(OAuthProvider::Google),
            "github" => Some(OAuthProvider::GitHub),
            _ => None,
        }
    }
}
