//! Interface of the hosted platform as this crate consumes it.

use std::sync::Arc;

use crate::backend::realtime::Subscription;
use crate::types::bookmark::{Bookmark, BookmarkDraft};
use crate::types::errors::{AuthError, BackendError};
use crate::types::session::{OAuthProvider, Session};
use crate::types::user::User;

/// Operations the managed service exposes to this client.
///
/// The handle is injected into the auth gateway, mutation endpoints, and
/// list store at construction, so tests substitute
/// [`LocalBackend`](crate::backend::local::LocalBackend) without touching
/// any global state.
pub trait BackendApi: Send + Sync {
    /// Provider redirect URL for the sign-in handoff. The caller performs
    /// the navigation; nothing about the outcome is observable here.
    fn sign_in_url(&self, provider: OAuthProvider, redirect_to: &str) -> Result<String, AuthError>;

    /// Exchanges an authorization code for a session. A successful exchange
    /// installs the session on this handle.
    fn exchange_code(&self, code: &str) -> Result<Session, AuthError>;

    /// Clears the session held by this handle.
    fn sign_out(&self) -> Result<(), AuthError>;

    /// The signed-in user, if any.
    fn current_user(&self) -> Result<Option<User>, AuthError>;

    /// Inserts a bookmark row. The storage layer assigns `id`, `created_at`
    /// and `seq`; the returned row is the stored one.
    fn insert_bookmark(&self, draft: &BookmarkDraft, owner: &User) -> Result<Bookmark, BackendError>;

    /// Deletes a bookmark row. Deleting an absent id is not an error;
    /// ownership enforcement is the storage layer's access policy.
    fn delete_bookmark(&self, id: &str) -> Result<(), BackendError>;

    /// Full ordered set for one owner, newest first.
    fn list_bookmarks(&self, owner_id: &str) -> Result<Vec<Bookmark>, BackendError>;

    /// Opens a change feed filtered server-side to one owner's rows.
    fn subscribe(&self, owner_id: &str) -> Result<Subscription, BackendError>;
}

pub type SharedBackend = Arc<dyn BackendApi>;
