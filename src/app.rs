//! App core.
//!
//! Composition root holding the backend handle, the auth gateway, the
//! presentation shell, and the per-session state (list store + mutation
//! endpoints). Session open/close is the only lifecycle: opening seeds the
//! list and arms the realtime feed, closing releases it.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::api::SharedBackend;
use crate::managers::auth_gateway::AuthGateway;
use crate::managers::list_store::BookmarkListStore;
use crate::managers::mutations::BookmarkMutations;
use crate::types::user::User;
use crate::ui::shell::{PresentationShell, View};

#[cfg(feature = "network")]
use crate::backend::http::HttpBackend;
#[cfg(feature = "network")]
use crate::config::BackendConfig;
#[cfg(feature = "network")]
use crate::types::errors::BackendError;

/// Everything scoped to one signed-in user.
struct SessionState {
    user: User,
    store: Arc<BookmarkListStore>,
    mutations: BookmarkMutations,
}

/// Central application struct wiring the managers together.
pub struct App {
    backend: SharedBackend,
    pub auth: AuthGateway,
    shell: Mutex<PresentationShell>,
    session: Mutex<Option<SessionState>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl App {
    /// Production wiring against the configured hosted platform.
    #[cfg(feature = "network")]
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self::with_backend(Arc::new(HttpBackend::new(config)?)))
    }

    /// Wires the app over any backend handle. Tests and the demo pass the
    /// in-process stand-in here.
    pub fn with_backend(backend: SharedBackend) -> Self {
        let auth = AuthGateway::new(backend.clone());
        Self {
            backend,
            auth,
            shell: Mutex::new(PresentationShell::new()),
            session: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Establishes per-session state for the signed-in user: seeds the
    /// list, arms the realtime feed. No-op when the same user's session is
    /// already open; closes any stale session when nobody is signed in.
    pub fn open_session(&self) -> bool {
        let Some(user) = self.auth.current_user() else {
            self.close_session();
            return false;
        };
        let mut slot = locked(&self.session);
        if let Some(existing) = slot.as_ref() {
            if existing.user.id == user.id {
                return true;
            }
            existing.store.disconnect();
        }
        let store = Arc::new(BookmarkListStore::new(self.backend.clone(), user.id.clone()));
        store.refresh();
        BookmarkListStore::connect(&store);
        let mutations = BookmarkMutations::new(self.backend.clone(), store.clone());
        *slot = Some(SessionState {
            user,
            store,
            mutations,
        });
        true
    }

    /// Tears down the session, releasing the realtime feed.
    pub fn close_session(&self) {
        let old = locked(&self.session).take();
        if let Some(session) = old {
            session.store.disconnect();
        }
    }

    /// Signs out and re-renders into the sign-in view.
    pub fn sign_out(&self) {
        self.auth.sign_out();
        self.close_session();
        locked(&self.shell).close_modal();
    }

    pub fn session_user(&self) -> Option<User> {
        locked(&self.session).as_ref().map(|s| s.user.clone())
    }

    pub fn session_store(&self) -> Option<Arc<BookmarkListStore>> {
        locked(&self.session).as_ref().map(|s| s.store.clone())
    }

    pub fn session_mutations(&self) -> Option<BookmarkMutations> {
        locked(&self.session).as_ref().map(|s| s.mutations.clone())
    }

    /// Page entry: gate on the platform's idea of the signed-in user, then
    /// render. An unauthenticated visit renders the sign-in view and never
    /// touches bookmark storage.
    pub fn current_view(&self) -> View {
        if locked(&self.session).is_none() && self.auth.current_user().is_some() {
            self.open_session();
        }
        let session = locked(&self.session);
        let shell = locked(&self.shell);
        match session.as_ref() {
            Some(state) => shell.render(Some(&state.user), &state.store.snapshot()),
            None => shell.render(None, &[]),
        }
    }

    // --- modal surface, forwarded to the shell ---

    pub fn open_modal(&self) {
        locked(&self.shell).open_modal();
    }

    pub fn close_modal(&self) {
        locked(&self.shell).close_modal();
    }

    pub fn set_modal_title(&self, value: &str) {
        locked(&self.shell).set_title(value);
    }

    pub fn set_modal_url(&self, value: &str) {
        locked(&self.shell).set_url(value);
    }

    /// Closes the modal and returns its buffered inputs for submission.
    pub fn take_modal_draft(&self) -> Option<crate::ui::shell::DraftInputs> {
        locked(&self.shell).take_draft()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.close_session();
    }
}
