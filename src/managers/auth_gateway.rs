//! Auth gateway: sign-in handoff, OAuth callback completion, sign-out.
//!
//! Wraps the platform's managed auth behind the three operations the shell
//! needs. The gateway never throws at the view layer: a transport failure
//! can only ever fail open to the sign-in view.

use tracing::{debug, warn};

use crate::backend::api::SharedBackend;
use crate::types::errors::AuthError;
use crate::types::session::OAuthProvider;
use crate::types::user::User;

/// Path the provider redirects back to after consent.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Static route rendered when the callback cannot complete.
pub const AUTH_ERROR_PATH: &str = "/auth/auth-code-error";

/// Everything the callback route sees from the incoming redirect request.
#[derive(Debug, Clone, Default)]
pub struct CallbackRequest {
    pub code: Option<String>,
    /// Path to land on after a successful exchange. Defaults to `/`.
    pub next: Option<String>,
    /// Origin of the request as this app received it.
    pub origin: String,
    /// `X-Forwarded-Host` value, when a reverse proxy fronts the app.
    pub forwarded_host: Option<String>,
}

pub struct AuthGateway {
    backend: SharedBackend,
}

impl AuthGateway {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Provider redirect URL for the sign-in button. The caller performs
    /// the navigation; nothing else is observable here.
    pub fn begin_sign_in(&self, provider: OAuthProvider, origin: &str) -> Result<String, AuthError> {
        let redirect_to = format!("{}{}", origin.trim_end_matches('/'), CALLBACK_PATH);
        self.backend.sign_in_url(provider, &redirect_to)
    }

    /// Completes the OAuth callback. Always yields an absolute redirect
    /// target: the requested path on success, the auth-error view otherwise.
    ///
    /// Behind a reverse proxy the public host arrives in `forwarded_host`
    /// and must win over the request origin, or the browser is sent to an
    /// address it cannot reach.
    pub fn complete_sign_in(&self, req: &CallbackRequest) -> String {
        let origin = req.origin.trim_end_matches('/');
        let next = sanitize_next(req.next.as_deref());

        if let Some(code) = req.code.as_deref().filter(|c| !c.is_empty()) {
            match self.backend.exchange_code(code) {
                Ok(session) => {
                    debug!(user = %session.user.id, "code exchange succeeded");
                    return match req.forwarded_host.as_deref().filter(|h| !h.is_empty()) {
                        Some(host) => format!("https://{}{}", host, next),
                        None => format!("{}{}", origin, next),
                    };
                }
                Err(e) => warn!(error = %e, "code exchange failed"),
            }
        }
        format!("{}{}", origin, AUTH_ERROR_PATH)
    }

    /// Clears the platform session. Failures are logged; the shell
    /// re-renders into the sign-in view either way.
    pub fn sign_out(&self) {
        if let Err(e) = self.backend.sign_out() {
            warn!(error = %e, "sign-out call failed");
        }
    }

    /// The signed-in user, or `None`. Transport failures are logged and
    /// treated as signed out.
    pub fn current_user(&self) -> Option<User> {
        match self.backend.current_user() {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "current_user failed, treating as signed out");
                None
            }
        }
    }
}

/// `next` must stay a local path; anything else falls back to `/`.
fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
        _ => "/",
    }
}
