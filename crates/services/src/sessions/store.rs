use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use quiz_core::SessionState;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Identifies one user's quiz attempt in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keeps serialized session snapshots per key, the way a web session backend would.
///
/// `update` holds the store lock for the whole load, mutate and save sequence,
/// so two submissions for one session never interleave.
#[derive(Clone, Default)]
pub struct SessionStore {
    snapshots: Arc<Mutex<HashMap<SessionKey, String>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever session `key` had.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the state cannot be serialized or the lock is poisoned.
    pub fn put(&self, key: &SessionKey, state: &SessionState) -> Result<(), StoreError> {
        let snapshot = serde_json::to_string(state)?;
        let mut guard = self.snapshots.lock().map_err(|_| StoreError::Poisoned)?;
        guard.insert(key.clone(), snapshot);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StoreError::Snapshot` if the stored snapshot does not describe a valid session.
    pub fn get(&self, key: &SessionKey) -> Result<Option<SessionState>, StoreError> {
        let guard = self.snapshots.lock().map_err(|_| StoreError::Poisoned)?;
        guard
            .get(key)
            .map(|snapshot| serde_json::from_str(snapshot))
            .transpose()
            .map_err(StoreError::from)
    }

    /// Drop the session for `key`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Poisoned` if the lock is poisoned.
    pub fn remove(&self, key: &SessionKey) -> Result<bool, StoreError> {
        let mut guard = self.snapshots.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.remove(key).is_some())
    }

    /// Load, mutate and save the session for `key` under one lock.
    ///
    /// Returns `Ok(None)` when no session exists. The snapshot is written back
    /// only if `f` returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` for unreadable snapshots or a poisoned lock.
    pub fn update<T, E>(
        &self,
        key: &SessionKey,
        f: impl FnOnce(&mut SessionState) -> Result<T, E>,
    ) -> Result<Option<Result<T, E>>, StoreError> {
        let mut guard = self.snapshots.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(snapshot) = guard.get_mut(key) else {
            return Ok(None);
        };

        let mut state: SessionState = serde_json::from_str(snapshot)?;
        let outcome = f(&mut state);
        if outcome.is_ok() {
            *snapshot = serde_json::to_string(&state)?;
        }
        Ok(Some(outcome))
    }

    #[cfg(test)]
    pub(crate) fn put_raw(&self, key: &SessionKey, snapshot: &str) {
        if let Ok(mut guard) = self.snapshots.lock() {
            guard.insert(key.clone(), snapshot.to_owned());
        }
    }
}
