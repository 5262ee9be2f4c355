//! Presentation shell: pure view logic over `{user, list}`.
//!
//! The shell owns nothing durable. Its only state is UI-transient — the
//! add-shortcut modal and its input buffers — and everything persisted
//! flows through the list store.

use serde::Serialize;

use crate::types::bookmark::Bookmark;
use crate::types::user::User;

/// What the front-end should render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    SignIn,
    Board {
        user: User,
        bookmarks: Vec<Bookmark>,
        modal: Option<DraftInputs>,
    },
}

/// Transient input state for the add-shortcut modal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DraftInputs {
    pub title: String,
    pub url: String,
}

/// Static content for the auth-error route.
#[derive(Debug, Clone, Serialize)]
pub struct AuthErrorView {
    pub title: &'static str,
    pub causes: [&'static str; 3],
    pub return_path: &'static str,
}

/// The view behind
/// [`AUTH_ERROR_PATH`](crate::managers::auth_gateway::AUTH_ERROR_PATH).
pub fn auth_error_view() -> AuthErrorView {
    AuthErrorView {
        title: "Authentication Error",
        causes: [
            "The authentication link expired.",
            "The redirect URL configured for the provider does not match.",
            "The backend credentials are incorrect.",
        ],
        return_path: "/",
    }
}

/// Favicon URL for a shortcut tile, via a public favicon service.
pub fn favicon_url(url: &str) -> String {
    format!("https://www.google.com/s2/favicons?sz=64&domain_url={}", url)
}

/// UI-transient state plus the render function.
#[derive(Debug, Default)]
pub struct PresentationShell {
    modal: Option<DraftInputs>,
}

impl PresentationShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the add-shortcut modal with empty inputs.
    pub fn open_modal(&mut self) {
        self.modal = Some(DraftInputs::default());
    }

    /// Closes the modal, discarding the input buffers.
    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn modal(&self) -> Option<&DraftInputs> {
        self.modal.as_ref()
    }

    pub fn set_title(&mut self, value: &str) {
        if let Some(modal) = self.modal.as_mut() {
            modal.title = value.to_string();
        }
    }

    pub fn set_url(&mut self, value: &str) {
        if let Some(modal) = self.modal.as_mut() {
            modal.url = value.to_string();
        }
    }

    /// Submit: closes the modal and hands the buffered fields to the
    /// mutation path. `None` when the modal was not open.
    pub fn take_draft(&mut self) -> Option<DraftInputs> {
        self.modal.take()
    }

    /// Sign-in view when nobody is signed in, the shortcut board
    /// otherwise.
    pub fn render(&self, user: Option<&User>, bookmarks: &[Bookmark]) -> View {
        match user {
            None => View::SignIn,
            Some(user) => View::Board {
                user: user.clone(),
                bookmarks: bookmarks.to_vec(),
                modal: self.modal.clone(),
            },
        }
    }
}
