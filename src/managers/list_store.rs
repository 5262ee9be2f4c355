//! Bookmark list store.
//!
//! Holds the canonical client-side list for one session and keeps it
//! consistent across its three input sources: initial/refetch loads,
//! realtime change events, and local optimistic mutations. The invariant:
//! the list always equals the net effect of all successful operations in
//! ordering-key order, with duplicate inserts of the same id collapsed to
//! one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::backend::api::SharedBackend;
use crate::backend::realtime::{CancelToken, ChangeEvent};
use crate::types::bookmark::Bookmark;

/// A running realtime feed: the cancel handle plus the reconciliation
/// thread draining it.
struct LiveFeed {
    cancel: CancelToken,
    pump: JoinHandle<()>,
}

/// Per-session, owner-scoped list of bookmarks.
///
/// All updates are atomic whole-value replacement or single-item
/// insert/remove under one mutex; no partial state is ever observable.
pub struct BookmarkListStore {
    backend: SharedBackend,
    owner_id: String,
    list: Mutex<Vec<Bookmark>>,
    live: Mutex<Option<LiveFeed>>,
}

impl BookmarkListStore {
    pub fn new(backend: SharedBackend, owner_id: impl Into<String>) -> Self {
        Self {
            backend,
            owner_id: owner_id.into(),
            list: Mutex::new(Vec::new()),
            live: Mutex::new(None),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn list_guard(&self) -> MutexGuard<'_, Vec<Bookmark>> {
        match self.list.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fetches the full ordered set and installs it wholesale. On failure
    /// the last known list stays in place and `false` is returned.
    pub fn refresh(&self) -> bool {
        match self.backend.list_bookmarks(&self.owner_id) {
            Ok(mut rows) => {
                // Newest first, ties by insertion order.
                rows.sort_by(|a, b| b.ordering_key().cmp(&a.ordering_key()));
                *self.list_guard() = rows;
                true
            }
            Err(e) => {
                warn!(error = %e, "bookmark fetch failed, keeping last known list");
                false
            }
        }
    }

    /// Applies one realtime event. Returns whether the list changed.
    pub fn apply_event(&self, event: &ChangeEvent) -> bool {
        match event {
            ChangeEvent::Inserted(bookmark) => self.insert_row(bookmark.clone()),
            ChangeEvent::Deleted(id) => self.remove_row(id),
        }
    }

    /// Optimistic apply after a local create. Same transformation as a
    /// realtime insert, so the echo of this row over the channel collapses
    /// into a no-op.
    pub fn apply_local_insert(&self, bookmark: Bookmark) -> bool {
        self.insert_row(bookmark)
    }

    /// Optimistic apply after a local remove.
    pub fn apply_local_remove(&self, id: &str) -> bool {
        self.remove_row(id)
    }

    fn insert_row(&self, bookmark: Bookmark) -> bool {
        let mut list = self.list_guard();
        if list.iter().any(|b| b.id == bookmark.id) {
            debug!(id = %bookmark.id, "duplicate insert collapsed");
            return false;
        }
        // Ordered insert: out-of-order delivery still lands each row at its
        // ordering-key position.
        let at = list
            .iter()
            .position(|b| b.ordering_key() < bookmark.ordering_key())
            .unwrap_or(list.len());
        list.insert(at, bookmark);
        true
    }

    fn remove_row(&self, id: &str) -> bool {
        let mut list = self.list_guard();
        let before = list.len();
        list.retain(|b| b.id != id);
        // Absent id is a silent no-op.
        list.len() != before
    }

    pub fn snapshot(&self) -> Vec<Bookmark> {
        self.list_guard().clone()
    }

    pub fn len(&self) -> usize {
        self.list_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list_guard().is_empty()
    }

    /// Whether a realtime feed is currently armed.
    pub fn is_live(&self) -> bool {
        match self.live.lock() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }

    /// Arms the realtime feed for this owner, tearing down any prior feed
    /// first so re-arming never duplicates subscriptions. Subscribe failure
    /// degrades to a static list and returns `false`.
    pub fn connect(this: &Arc<Self>) -> bool {
        this.disconnect();
        match this.backend.subscribe(&this.owner_id) {
            Ok(subscription) => {
                let cancel = subscription.cancel_token();
                let store = Arc::downgrade(this);
                let pump = thread::spawn(move || {
                    for event in subscription {
                        let Some(store) = store.upgrade() else { break };
                        store.apply_event(&event);
                    }
                });
                let mut live = match this.live.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                *live = Some(LiveFeed { cancel, pump });
                true
            }
            Err(e) => {
                warn!(error = %e, "realtime subscribe failed, list stays static");
                false
            }
        }
    }

    /// Releases the realtime feed and joins the reconciliation thread.
    /// Safe to call when no feed is armed.
    pub fn disconnect(&self) {
        let feed = {
            let mut live = match self.live.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            live.take()
        };
        if let Some(feed) = feed {
            feed.cancel.cancel();
            if feed.pump.join().is_err() {
                warn!("reconciliation thread panicked during teardown");
            }
        }
    }
}

impl Drop for BookmarkListStore {
    /// The feed never outlives the store.
    fn drop(&mut self) {
        self.disconnect();
    }
}
