//! Process-wide authority on whether the user is signed in
//!
//! Construct one [`SessionController`] at startup and pass it (as an `Arc`)
//! to every component that needs the session. It is the only writer of the
//! in-memory session and of the [`SessionStore`] mirror.
//!
//! Every state transition is delivered to observers synchronously and in
//! order. Observers run while the controller's write lock is held, so they
//! must not call [`SessionController::apply`] or
//! [`SessionController::clear_session`] themselves.

use crate::session::AuthSession;
use crate::store::SessionStore;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Signed-in state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(AuthSession),
}

impl SessionState {
    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Handle returned by [`SessionController::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Arc<dyn Fn(&SessionState) + Send + Sync>;

pub struct SessionController {
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
    // Serializes transitions so observers see them in order
    transition: Mutex<()>,
    observers: Mutex<Vec<(ObserverId, Observer)>>,
    next_observer_id: AtomicU64,
}

impl SessionController {
    /// Create a controller, restoring any valid session from `store`.
    ///
    /// An expired record is deleted. A record that cannot be read is logged
    /// and treated as absent.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let initial = match store.get() {
            Ok(Some(session)) if session.is_expired() => {
                debug!("stored session expired; discarding");
                if let Err(e) = store.delete() {
                    warn!("Failed to delete expired session: {}", e);
                }
                SessionState::Unauthenticated
            }
            Ok(Some(session)) => {
                debug!(user_id = ?session.user_id, "restored stored session");
                SessionState::Authenticated(session)
            }
            Ok(None) => SessionState::Unauthenticated,
            Err(e) => {
                warn!("Failed to read stored session: {}", e);
                SessionState::Unauthenticated
            }
        };

        Self {
            store,
            state: RwLock::new(initial),
            transition: Mutex::new(()),
            observers: Mutex::new(Vec::new()),
            next_observer_id: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// The current session, if signed in
    pub fn session(&self) -> Option<AuthSession> {
        self.state.read().session().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    /// Access token to attach to API calls, if signed in and unexpired
    pub fn bearer_token(&self) -> Option<String> {
        let state = self.state.read();
        state
            .session()
            .filter(|session| !session.is_expired())
            .map(|session| session.access_token.clone())
    }

    /// Make `session` the current session.
    ///
    /// A session that is already expired is rejected: the controller moves to
    /// `Unauthenticated` and the store is cleared. Returns whether the
    /// session was accepted.
    pub fn apply(&self, session: AuthSession) -> bool {
        if session.is_expired() {
            debug!("rejecting expired session");
            self.transition_to(SessionState::Unauthenticated);
            return false;
        }
        self.transition_to(SessionState::Authenticated(session));
        true
    }

    /// Sign out unconditionally
    pub fn clear_session(&self) {
        self.transition_to(SessionState::Unauthenticated);
    }

    /// Register an observer called on every transition
    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push((id, Arc::new(observer)));
        id
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    fn transition_to(&self, next: SessionState) {
        let _guard = self.transition.lock();

        let persisted = match next.session() {
            Some(session) => self.store.put(session),
            None => self.store.delete(),
        };
        if let Err(e) = persisted {
            warn!("Failed to persist session state: {}", e);
        }

        *self.state.write() = next.clone();

        let observers: Vec<Observer> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(&next);
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}
