use std::sync::{Arc, Mutex, MutexGuard};

use clinic_core::Timestamp;

use crate::session::{MemorySessionPersistence, Session, SessionPersistence, UserIdentity};

/// The one shared session of a running client.
///
/// Clones share state, so a token written by the refresh path is visible to
/// every request issued afterwards. Persistence is best effort: failures are
/// logged and the in-memory session stays authoritative.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    state: Mutex<SessionState>,
    persistence: Box<dyn SessionPersistence>,
    /// Revision last handed to `persistence`; serializes writes so an older
    /// snapshot never overwrites a newer one.
    persisted: Mutex<u64>,
}

#[derive(Default)]
struct SessionState {
    session: Session,
    revision: u64,
}

impl SessionStore {
    pub fn load(persistence: impl SessionPersistence + 'static) -> Self {
        let session = match persistence.load() {
            Ok(Some(session)) => {
                log::debug!(
                    "restored persisted session (authenticated: {})",
                    session.is_authenticated()
                );
                session
            }
            Ok(None) => Session::default(),
            Err(err) => {
                log::warn!(
                    "failed to restore persisted session, starting logged out: {}",
                    err.display_chain()
                );
                Session::default()
            }
        };

        Self {
            inner: Arc::new(SessionStoreInner {
                state: Mutex::new(SessionState {
                    session,
                    revision: 0,
                }),
                persistence: Box::new(persistence),
                persisted: Mutex::new(0),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::load(MemorySessionPersistence::default())
    }

    pub fn get(&self) -> Session {
        self.state().session.clone()
    }

    /// Bumped on every effective mutation.
    pub fn revision(&self) -> u64 {
        self.state().revision
    }

    pub fn access_token(&self) -> Option<String> {
        self.state().session.access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state().session.refresh_token.clone()
    }

    pub fn set(
        &self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user: Option<UserIdentity>,
    ) {
        let mut state = self.state();
        state.session = Session {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            user,
            updated_at: Some(Timestamp::now()),
        };
        self.commit(state);
    }

    /// Stores a refreshed access token, keeping the current refresh token
    /// unless the backend rotated it.
    pub fn update_tokens(&self, access_token: impl Into<String>, refresh_token: Option<String>) {
        let mut state = self.state();
        state.session.access_token = Some(access_token.into());
        if let Some(refresh_token) = refresh_token {
            state.session.refresh_token = Some(refresh_token);
        }
        state.session.updated_at = Some(Timestamp::now());
        self.commit(state);
    }

    pub fn set_user(&self, user: UserIdentity) {
        let mut state = self.state();
        if state.session.user.as_ref() == Some(&user) {
            return;
        }
        state.session.user = Some(user);
        self.commit(state);
    }

    /// Returns `false` when the session was already empty; nothing is
    /// persisted in that case.
    pub fn clear(&self) -> bool {
        let mut state = self.state();
        if state.session.is_empty() {
            return false;
        }

        state.session = Session::default();
        state.revision += 1;
        let revision = state.revision;
        drop(state);

        log::debug!("session cleared (revision {revision})");
        self.persist(revision, None);
        true
    }

    fn commit(&self, mut state: MutexGuard<'_, SessionState>) {
        state.revision += 1;
        let revision = state.revision;
        let snapshot = state.session.clone();
        drop(state);

        log::debug!("session updated (revision {revision})");
        self.persist(revision, Some(&snapshot));
    }

    /// Runs outside the session lock; `None` clears the stored copy.
    fn persist(&self, revision: u64, session: Option<&Session>) {
        let mut persisted = lock(&self.inner.persisted);
        if *persisted > revision {
            log::trace!("skipping persistence of superseded revision {revision}");
            return;
        }
        *persisted = revision;

        let result = match session {
            Some(session) => self.inner.persistence.save(session),
            None => self.inner.persistence.clear(),
        };
        if let Err(err) = result {
            log::warn!("failed to persist session: {}", err.display_chain());
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.inner.state)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, OnceLock,
        atomic::{AtomicUsize, Ordering},
    };

    use super::SessionStore;
    use crate::{
        GatewayError, GatewayResult,
        session::{MemorySessionPersistence, Session, SessionPersistence},
    };

    struct BrokenPersistence;

    impl SessionPersistence for BrokenPersistence {
        fn load(&self) -> GatewayResult<Option<Session>> {
            Err(GatewayError::message("keychain locked"))
        }

        fn save(&self, _session: &Session) -> GatewayResult<()> {
            Err(GatewayError::message("keychain locked"))
        }

        fn clear(&self) -> GatewayResult<()> {
            Err(GatewayError::message("keychain locked"))
        }
    }

    #[derive(Clone, Default)]
    struct CountingPersistence {
        clears: Arc<AtomicUsize>,
    }

    impl SessionPersistence for CountingPersistence {
        fn load(&self) -> GatewayResult<Option<Session>> {
            Ok(None)
        }

        fn save(&self, _session: &Session) -> GatewayResult<()> {
            Ok(())
        }

        fn clear(&self) -> GatewayResult<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn unreadable_persistence_degrades_to_logged_out() {
        let store = SessionStore::load(BrokenPersistence);
        assert!(!store.get().is_authenticated());

        store.set("access", "refresh", None);
        assert_eq!(store.get().access_token.as_deref(), Some("access"));
    }

    #[test]
    fn restores_persisted_session() {
        let store = SessionStore::load(MemorySessionPersistence::with_session(Session {
            access_token: Some("persisted".to_owned()),
            refresh_token: Some("refresh".to_owned()),
            ..Session::default()
        }));

        assert_eq!(store.access_token().as_deref(), Some("persisted"));
    }

    #[test]
    fn clones_observe_each_others_writes() {
        let store = SessionStore::in_memory();
        let other = store.clone();

        store.set("a1", "r1", None);
        assert_eq!(other.access_token().as_deref(), Some("a1"));
        assert_eq!(other.revision(), 1);

        other.update_tokens("a2", None);
        assert_eq!(store.get().access_token.as_deref(), Some("a2"));
        assert_eq!(store.get().refresh_token.as_deref(), Some("r1"));
        assert_eq!(store.revision(), 2);
    }

    /// Records whether the session lock was free while a write ran.
    #[derive(Clone, Default)]
    struct LockCheckingPersistence {
        store: Arc<OnceLock<SessionStore>>,
        blocked_writes: Arc<AtomicUsize>,
        writes: Arc<AtomicUsize>,
    }

    impl LockCheckingPersistence {
        fn record(&self) {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if let Some(store) = self.store.get()
                && store.inner.state.try_lock().is_err()
            {
                self.blocked_writes.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl SessionPersistence for LockCheckingPersistence {
        fn load(&self) -> GatewayResult<Option<Session>> {
            Ok(None)
        }

        fn save(&self, _session: &Session) -> GatewayResult<()> {
            self.record();
            Ok(())
        }

        fn clear(&self) -> GatewayResult<()> {
            self.record();
            Ok(())
        }
    }

    #[test]
    fn persistence_runs_outside_the_session_lock() {
        let persistence = LockCheckingPersistence::default();
        let store = SessionStore::load(persistence.clone());
        assert!(persistence.store.set(store.clone()).is_ok());

        store.set("a", "r", None);
        store.update_tokens("b", None);
        store.clear();

        assert_eq!(persistence.writes.load(Ordering::SeqCst), 3);
        assert_eq!(persistence.blocked_writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clear_is_a_no_op_once_empty() {
        let persistence = CountingPersistence::default();
        let clears = Arc::clone(&persistence.clears);
        let store = SessionStore::load(persistence);
        store.set("a", "r", None);

        assert!(store.clear());
        assert!(!store.clear());
        assert_eq!(clears.load(Ordering::SeqCst), 1);
        assert_eq!(store.revision(), 2);
    }
}
