//! In-process stand-in for the hosted platform.
//!
//! Mirrors the managed service over an in-memory SQLite database:
//! storage-assigned ids and insertion order, newest-first ordering, and an
//! owner-filtered change fan-out. Tests and the demo binary inject this
//! where the production build injects
//! [`HttpBackend`](crate::backend::http::HttpBackend). Fault toggles let
//! tests drive the degraded paths without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::backend::api::BackendApi;
use crate::backend::realtime::{CancelToken, ChangeEvent, Subscription};
use crate::types::bookmark::{Bookmark, BookmarkDraft};
use crate::types::errors::{AuthError, BackendError};
use crate::types::session::{OAuthProvider, Session};
use crate::types::user::User;

struct Subscriber {
    owner_id: String,
    tx: Sender<ChangeEvent>,
    cancel: CancelToken,
}

/// In-process platform stand-in.
pub struct LocalBackend {
    conn: Mutex<Connection>,
    session: Mutex<Option<Session>>,
    issued_codes: Mutex<HashMap<String, User>>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_seq: AtomicI64,
    insert_calls: AtomicU64,
    list_calls: AtomicU64,
    fail_auth: AtomicBool,
    fail_listing: AtomicBool,
    fail_mutations: AtomicBool,
    fail_subscribe: AtomicBool,
}

impl LocalBackend {
    /// Opens the stand-in over an in-memory database.
    pub fn new() -> Result<Self, BackendError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Opens the stand-in over a database file.
    pub fn open(path: &str) -> Result<Self, BackendError> {
        let conn = Connection::open(path).map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, BackendError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS bookmarks (
                 id TEXT PRIMARY KEY,
                 title TEXT NOT NULL,
                 url TEXT NOT NULL,
                 owner_id TEXT NOT NULL,
                 created_at INTEGER NOT NULL,
                 seq INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_bookmarks_owner ON bookmarks(owner_id);",
        )
        .map_err(|e| BackendError::Transport(e.to_string()))?;

        let next_seq: i64 = conn
            .query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM bookmarks", [], |row| row.get(0))
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            session: Mutex::new(None),
            issued_codes: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
            next_seq: AtomicI64::new(next_seq),
            insert_calls: AtomicU64::new(0),
            list_calls: AtomicU64::new(0),
            fail_auth: AtomicBool::new(false),
            fail_listing: AtomicBool::new(false),
            fail_mutations: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
        })
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            owner_id: row.get(3)?,
            created_at: row.get(4)?,
            seq: row.get(5)?,
        })
    }

    /// Fans an event out to live subscribers whose owner filter matches.
    /// Cancelled and disconnected subscribers are pruned on the way.
    fn publish(&self, owner_id: &str, event: &ChangeEvent) {
        let mut subs = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subs.retain(|sub| {
            if sub.cancel.is_cancelled() {
                return false;
            }
            if sub.owner_id != owner_id {
                return true;
            }
            sub.tx.send(event.clone()).is_ok()
        });
    }

    // --- fixture and observability helpers (used by tests and the demo) ---

    /// Issues a one-time authorization code for `user`, as the provider
    /// redirect would.
    pub fn issue_code(&self, user: &User) -> String {
        let code = Uuid::new_v4().to_string();
        if let Ok(mut codes) = self.issued_codes.lock() {
            codes.insert(code.clone(), user.clone());
        }
        code
    }

    /// Installs a session directly, skipping the redirect dance.
    pub fn force_sign_in(&self, user: &User) {
        if let Ok(mut session) = self.session.lock() {
            *session = Some(Session {
                access_token: Uuid::new_v4().to_string(),
                user: user.clone(),
            });
        }
    }

    /// Inserts a pre-existing row with a chosen timestamp, without emitting
    /// a change event. For seeding scenarios.
    pub fn seed_bookmark(
        &self,
        owner: &User,
        title: &str,
        url: &str,
        created_at: i64,
    ) -> Result<Bookmark, BackendError> {
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            url: url.to_string(),
            created_at,
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            owner_id: owner.id.clone(),
        };
        let conn = self
            .conn
            .lock()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        conn.execute(
            "INSERT INTO bookmarks (id, title, url, owner_id, created_at, seq) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![bookmark.id, bookmark.title, bookmark.url, bookmark.owner_id, bookmark.created_at, bookmark.seq],
        )
        .map_err(|e| BackendError::Rejected(e.to_string()))?;
        Ok(bookmark)
    }

    /// How many insert calls reached the storage layer.
    pub fn insert_calls(&self) -> u64 {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// How many list calls reached the storage layer.
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Live (non-cancelled) subscriber count.
    pub fn subscriber_count(&self) -> usize {
        let mut subs = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subs.retain(|sub| !sub.cancel.is_cancelled());
        subs.len()
    }

    pub fn set_auth_fails(&self, fail: bool) {
        self.fail_auth.store(fail, Ordering::SeqCst);
    }

    pub fn set_listing_fails(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn set_mutations_fail(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    pub fn set_subscribe_fails(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }
}

impl BackendApi for LocalBackend {
    fn sign_in_url(&self, provider: OAuthProvider, redirect_to: &str) -> Result<String, AuthError> {
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(AuthError::Transport("auth unavailable".to_string()));
        }
        Ok(format!(
            "local://oauth/{}?redirect_to={}",
            provider.as_str(),
            redirect_to
        ))
    }

    fn exchange_code(&self, code: &str) -> Result<Session, AuthError> {
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(AuthError::Transport("auth unavailable".to_string()));
        }
        let user = self
            .issued_codes
            .lock()
            .map_err(|e| AuthError::Transport(e.to_string()))?
            .remove(code)
            .ok_or_else(|| AuthError::ExchangeFailed(format!("unknown or expired code: {}", code)))?;
        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            user,
        };
        *self
            .session
            .lock()
            .map_err(|e| AuthError::Transport(e.to_string()))? = Some(session.clone());
        Ok(session)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(AuthError::SignOutFailed("auth unavailable".to_string()));
        }
        *self
            .session
            .lock()
            .map_err(|e| AuthError::Transport(e.to_string()))? = None;
        Ok(())
    }

    fn current_user(&self) -> Result<Option<User>, AuthError> {
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(AuthError::Transport("auth unavailable".to_string()));
        }
        let session = self
            .session
            .lock()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        Ok(session.as_ref().map(|s| s.user.clone()))
    }

    fn insert_bookmark(&self, draft: &BookmarkDraft, owner: &User) -> Result<Bookmark, BackendError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("storage unavailable".to_string()));
        }
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            title: draft.title().to_string(),
            url: draft.url().to_string(),
            created_at: Self::now_millis(),
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            owner_id: owner.id.clone(),
        };
        {
            let conn = self
                .conn
                .lock()
                .map_err(|e| BackendError::Transport(e.to_string()))?;
            conn.execute(
                "INSERT INTO bookmarks (id, title, url, owner_id, created_at, seq) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![bookmark.id, bookmark.title, bookmark.url, bookmark.owner_id, bookmark.created_at, bookmark.seq],
            )
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        }
        self.publish(&bookmark.owner_id, &ChangeEvent::Inserted(bookmark.clone()));
        Ok(bookmark)
    }

    fn delete_bookmark(&self, id: &str) -> Result<(), BackendError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("storage unavailable".to_string()));
        }
        let owner_id: Option<String> = {
            let conn = self
                .conn
                .lock()
                .map_err(|e| BackendError::Transport(e.to_string()))?;
            let owner = conn
                .query_row(
                    "SELECT owner_id FROM bookmarks WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(BackendError::Rejected(other.to_string())),
                })?;
            if owner.is_some() {
                conn.execute("DELETE FROM bookmarks WHERE id = ?1", params![id])
                    .map_err(|e| BackendError::Rejected(e.to_string()))?;
            }
            owner
        };
        // Deleting an absent id is a no-op, and emits no change event.
        if let Some(owner_id) = owner_id {
            self.publish(&owner_id, &ChangeEvent::Deleted(id.to_string()));
        }
        Ok(())
    }

    fn list_bookmarks(&self, owner_id: &str) -> Result<Vec<Bookmark>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("storage unavailable".to_string()));
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, url, owner_id, created_at, seq \
                 FROM bookmarks WHERE owner_id = ?1 ORDER BY created_at DESC, seq DESC",
            )
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        let rows = stmt
            .query_map(params![owner_id], Self::row_to_bookmark)
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| BackendError::Decode(e.to_string()))?);
        }
        Ok(results)
    }

    fn subscribe(&self, owner_id: &str) -> Result<Subscription, BackendError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("realtime unavailable".to_string()));
        }
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        self.subscribers
            .lock()
            .map_err(|e| BackendError::Transport(e.to_string()))?
            .push(Subscriber {
                owner_id: owner_id.to_string(),
                tx,
                cancel: cancel.clone(),
            });
        Ok(Subscription::new(rx, cancel))
    }
}
