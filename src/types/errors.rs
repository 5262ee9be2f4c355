use std::fmt;

// === AuthError ===

/// Errors related to the managed authentication flow.
#[derive(Debug)]
pub enum AuthError {
    /// Building the provider sign-in handoff failed.
    SignInFailed(String),
    /// The authorization code was rejected (expired, already used, unknown).
    ExchangeFailed(String),
    /// Clearing the platform session failed.
    SignOutFailed(String),
    /// The platform could not be reached.
    Transport(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::SignInFailed(msg) => write!(f, "Sign-in failed: {}", msg),
            AuthError::ExchangeFailed(msg) => write!(f, "Code exchange failed: {}", msg),
            AuthError::SignOutFailed(msg) => write!(f, "Sign-out failed: {}", msg),
            AuthError::Transport(msg) => write!(f, "Auth transport error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

// === BackendError ===

/// Errors related to the managed row storage and realtime feed.
#[derive(Debug)]
pub enum BackendError {
    /// The platform could not be reached.
    Transport(String),
    /// The platform refused the operation (access policy, bad request).
    Rejected(String),
    /// The platform answered with a payload this client cannot decode.
    Decode(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Transport(msg) => write!(f, "Backend transport error: {}", msg),
            BackendError::Rejected(msg) => write!(f, "Backend rejected operation: {}", msg),
            BackendError::Decode(msg) => write!(f, "Backend payload decode error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
