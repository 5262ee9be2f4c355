//! Mutation endpoints: validated create/remove forwarded to the platform.
//!
//! Two entry styles mirror the two submission surfaces: the typed methods
//! return outcomes and backend errors to the caller (controlled inputs,
//! which surface failures to the user), while the `handle_*_form` variants
//! take loose form payloads, abort silently on missing fields, and only log
//! backend failures.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::backend::api::SharedBackend;
use crate::managers::list_store::BookmarkListStore;
use crate::types::bookmark::{Bookmark, BookmarkDraft, DraftRejection};
use crate::types::errors::BackendError;

/// Result of a create attempt that reached no backend on rejection paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Bookmark),
    /// Draft validation failed; no storage call was made.
    Rejected(DraftRejection),
    /// Nobody is signed in; no storage call was made.
    NotSignedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The id was missing or empty; no storage call was made.
    Rejected,
}

#[derive(Clone)]
pub struct BookmarkMutations {
    backend: SharedBackend,
    store: Arc<BookmarkListStore>,
}

impl BookmarkMutations {
    pub fn new(backend: SharedBackend, store: Arc<BookmarkListStore>) -> Self {
        Self { backend, store }
    }

    /// Inserts a bookmark for the signed-in user. `owner_id` always comes
    /// from the session, never from caller input. Identical URLs are
    /// allowed; nothing deduplicates by URL.
    pub fn create_bookmark(&self, title: &str, url: &str) -> Result<CreateOutcome, BackendError> {
        let draft = match BookmarkDraft::parse(title, url) {
            Ok(draft) => draft,
            Err(rejection) => {
                debug!(reason = rejection.as_str(), "create rejected before any storage call");
                return Ok(CreateOutcome::Rejected(rejection));
            }
        };
        let user = match self.backend.current_user() {
            Ok(Some(user)) => user,
            Ok(None) => return Ok(CreateOutcome::NotSignedIn),
            Err(e) => {
                warn!(error = %e, "current_user failed, create treated as signed out");
                return Ok(CreateOutcome::NotSignedIn);
            }
        };
        let created = self.backend.insert_bookmark(&draft, &user)?;
        // The realtime echo of this row collapses against this apply.
        self.store.apply_local_insert(created.clone());
        Ok(CreateOutcome::Created(created))
    }

    /// Deletes by id, unconditionally for any non-empty id. Ownership is
    /// the storage layer's access policy to enforce.
    pub fn remove_bookmark(&self, id: &str) -> Result<RemoveOutcome, BackendError> {
        if id.trim().is_empty() {
            return Ok(RemoveOutcome::Rejected);
        }
        self.backend.delete_bookmark(id)?;
        self.store.apply_local_remove(id);
        Ok(RemoveOutcome::Removed)
    }

    /// Form-payload create: named fields from a loose JSON object. Missing
    /// or empty fields abort silently; backend failures are logged, never
    /// surfaced. After an attempted write the store is refetched.
    pub fn handle_create_form(&self, form: &Value) {
        let Some(title) = non_empty_field(form, "title") else {
            return;
        };
        let Some(url) = non_empty_field(form, "url") else {
            return;
        };
        match self.create_bookmark(title, url) {
            Ok(CreateOutcome::Created(_)) => {
                self.store.refresh();
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "bookmark insert failed");
                self.store.refresh();
            }
        }
    }

    /// Form-payload delete. Missing id aborts silently; failures are
    /// logged only.
    pub fn handle_delete_form(&self, form: &Value) {
        let Some(id) = non_empty_field(form, "id") else {
            return;
        };
        if let Err(e) = self.remove_bookmark(id) {
            error!(error = %e, "bookmark delete failed");
        }
        self.store.refresh();
    }
}

fn non_empty_field<'a>(form: &'a Value, field: &str) -> Option<&'a str> {
    form.get(field)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
}
