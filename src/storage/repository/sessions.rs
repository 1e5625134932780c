// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session repository over the flat-file store.

use chrono::Utc;

use crate::models::Session;

use super::super::{Collection, JsonStore, StorageResult};

/// Repository for opaque server-side sessions.
pub struct SessionRepository<'a> {
    store: &'a JsonStore,
}

impl<'a> SessionRepository<'a> {
    pub fn new(store: &'a JsonStore) -> Self {
        Self { store }
    }

    pub async fn insert(&self, session: &Session) -> StorageResult<()> {
        let guard = self.store.collection(Collection::Sessions).await;
        let mut sessions: Vec<Session> = guard.read()?;
        sessions.push(session.clone());
        guard.write(&sessions)?;
        Ok(())
    }

    /// Resolve a token to a live session. Expired sessions are deleted on
    /// sight and reported as absent.
    pub async fn get_valid(&self, token: &str) -> StorageResult<Option<Session>> {
        let guard = self.store.collection(Collection::Sessions).await;
        let mut sessions: Vec<Session> = guard.read()?;

        let Some(session) = sessions.iter().find(|s| s.token == token).cloned() else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            sessions.retain(|s| s.token != token);
            guard.write(&sessions)?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Remove a session. Returns whether one existed.
    pub async fn delete(&self, token: &str) -> StorageResult<bool> {
        let guard = self.store.collection(Collection::Sessions).await;
        let mut sessions: Vec<Session> = guard.read()?;

        let before = sessions.len();
        sessions.retain(|s| s.token != token);
        if sessions.len() == before {
            return Ok(false);
        }

        guard.write(&sessions)?;
        Ok(true)
    }
}
