use quiz_core::model::{Session, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("bank not found: {name}")]
    BankNotFound { name: String },

    #[error("session not found")]
    SessionNotFound,

    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

/// Shared, individually locked session state.
///
/// Holding the mutex serializes every read and write against one session while
/// leaving other sessions untouched.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Builds a session once a vacant id has been chosen.
pub type SessionBuilder<'a> = Box<dyn FnOnce(SessionId) -> Session + Send + 'a>;

/// Store contract for live quiz sessions.
pub trait SessionStore: Send + Sync {
    /// Draw ids from `next_id` until one is not in use, then insert `build(id)`.
    ///
    /// Id selection and insertion happen atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if the store lock is poisoned.
    fn insert_vacant(
        &self,
        next_id: &mut dyn FnMut() -> SessionId,
        build: SessionBuilder<'_>,
    ) -> Result<SessionId, StorageError>;

    /// Fetch the handle for a live session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::SessionNotFound` if the id is unknown.
    fn get(&self, id: SessionId) -> Result<SessionHandle, StorageError>;

    /// Remove a session, returning its handle.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::SessionNotFound` if the id is unknown.
    fn remove(&self, id: SessionId) -> Result<SessionHandle, StorageError>;

    /// Remove every session matching `predicate`, returning the removed ids.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if any lock is poisoned.
    fn remove_where(
        &self,
        predicate: &dyn Fn(&Session) -> bool,
    ) -> Result<Vec<SessionId>, StorageError>;

    /// Number of live sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if the store lock is poisoned.
    fn len(&self) -> Result<usize, StorageError>;
}

/// Process-local session store backed by a `HashMap` of per-session mutexes.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert_vacant(
        &self,
        next_id: &mut dyn FnMut() -> SessionId,
        build: SessionBuilder<'_>,
    ) -> Result<SessionId, StorageError> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        let mut id = next_id();
        while guard.contains_key(&id) {
            id = next_id();
        }
        guard.insert(id, Arc::new(Mutex::new(build(id))));
        Ok(id)
    }

    fn get(&self, id: SessionId) -> Result<SessionHandle, StorageError> {
        let guard = self
            .sessions
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::SessionNotFound)
    }

    fn remove(&self, id: SessionId) -> Result<SessionHandle, StorageError> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        guard.remove(&id).ok_or(StorageError::SessionNotFound)
    }

    fn remove_where(
        &self,
        predicate: &dyn Fn(&Session) -> bool,
    ) -> Result<Vec<SessionId>, StorageError> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;

        let mut doomed = Vec::new();
        for (id, handle) in guard.iter() {
            let session = handle
                .lock()
                .map_err(|e| StorageError::Poisoned(e.to_string()))?;
            if predicate(&session) {
                doomed.push(*id);
            }
        }
        for id in &doomed {
            guard.remove(id);
        }
        Ok(doomed)
    }

    fn len(&self) -> Result<usize, StorageError> {
        let guard = self
            .sessions
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(guard.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuizMode};
    use quiz_core::time::fixed_now;

    fn build_session(id: SessionId, questions: usize) -> Session {
        let questions = (0..questions)
            .map(|i| Question::from_pairs(format!("Q{i}"), [("A", "yes"), ("B", "no")], "A").unwrap())
            .collect();
        Session::new(id, "geo", questions, QuizMode::Test, fixed_now())
    }

    fn counter_ids() -> impl FnMut() -> SessionId {
        let mut n = 0_u8;
        move || {
            n += 1;
            SessionId::from_random_bytes([n; 16])
        }
    }

    #[test]
    fn insert_then_get_and_remove() {
        let store = InMemorySessionStore::new();
        let mut next = counter_ids();
        let id = store
            .insert_vacant(&mut next, Box::new(|id| build_session(id, 2)))
            .unwrap();

        let handle = store.get(id).unwrap();
        assert_eq!(handle.lock().unwrap().total(), 2);
        assert_eq!(store.len().unwrap(), 1);

        store.remove(id).unwrap();
        assert!(matches!(store.get(id), Err(StorageError::SessionNotFound)));
        assert!(matches!(store.remove(id), Err(StorageError::SessionNotFound)));
    }

    #[test]
    fn insert_skips_ids_already_in_use() {
        let store = InMemorySessionStore::new();
        let taken = SessionId::from_random_bytes([1; 16]);
        let mut always_taken = || taken;
        store
            .insert_vacant(&mut always_taken, Box::new(|id| build_session(id, 1)))
            .unwrap();

        let mut ids = vec![taken, taken, SessionId::from_random_bytes([2; 16])].into_iter();
        let mut next = || ids.next().unwrap_or(taken);
        let second = store
            .insert_vacant(&mut next, Box::new(|id| build_session(id, 1)))
            .unwrap();

        assert_eq!(second, SessionId::from_random_bytes([2; 16]));
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn remove_where_only_drops_matches() {
        let store = InMemorySessionStore::new();
        let mut next = counter_ids();
        let empty = store
            .insert_vacant(&mut next, Box::new(|id| build_session(id, 0)))
            .unwrap();
        let full = store
            .insert_vacant(&mut next, Box::new(|id| build_session(id, 3)))
            .unwrap();

        let removed = store.remove_where(&|s: &Session| s.is_finished()).unwrap();

        assert_eq!(removed, vec![empty]);
        assert!(store.get(full).is_ok());
        assert!(store.get(empty).is_err());
    }
}
