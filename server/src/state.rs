//! Shared server state: one isolated simulation session per client

use antenna_field::{RenderConfig, Session};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

pub struct AppState {
    pub sessions: SessionStore,
    pub render: RenderConfig,
    pub max_upload_bytes: usize,
}

struct Entry {
    session: Session,
    seq: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

/// Sessions keyed by a random id. Each request touches only its own entry;
/// the lock just guards the map.
pub struct SessionStore {
    inner: RwLock<Inner>,
    max_sessions: usize,
}

fn new_session_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Store a session and return its id, evicting the oldest when full
    pub async fn insert(&self, session: Session) -> String {
        let mut inner = self.inner.write().await;

        while inner.entries.len() >= self.max_sessions {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    inner.entries.remove(&id);
                    info!("Evicted session {}", id);
                }
                None => break,
            }
        }

        let mut id = new_session_id();
        while inner.entries.contains_key(&id) {
            id = new_session_id();
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(id.clone(), Entry { session, seq });
        info!("Created session {} ({} active)", id, inner.entries.len());
        id
    }

    /// Run `f` on a session; None if the id is unknown
    pub async fn read<R>(&self, id: &str, f: impl FnOnce(&Session) -> R) -> Option<R> {
        let inner = self.inner.read().await;
        inner.entries.get(id).map(|e| f(&e.session))
    }

    pub async fn write<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut inner = self.inner.write().await;
        inner.entries.get_mut(id).map(|e| f(&mut e.session))
    }

    /// Copy of a session, for work done outside the lock
    pub async fn snapshot(&self, id: &str) -> Option<Session> {
        self.read(id, Session::clone).await
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.inner.write().await.entries.remove(id).is_some();
        if removed {
            info!("Removed session {}", id);
        }
        removed
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antenna_field::ParameterUpdate;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = SessionStore::new(4);
        let id = store.insert(Session::new()).await;
        assert_eq!(id.len(), 32);
        assert_eq!(store.read(&id, |s| s.current_time()).await, Some(0.0));
        assert!(store.read("missing", |s| s.current_time()).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_state() {
        let store = SessionStore::new(4);
        let a = store.insert(Session::new()).await;
        let b = store.insert(Session::new()).await;

        store
            .write(&a, |s| {
                s.update_parameters(&ParameterUpdate {
                    frequency: Some(3.0),
                    ..Default::default()
                })
                .map(|_| ())
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(store.read(&a, |s| s.parameters().frequency).await, Some(3.0));
        assert_eq!(store.read(&b, |s| s.parameters().frequency).await, Some(1.0));
    }

    #[tokio::test]
    async fn test_oldest_session_evicted() {
        let store = SessionStore::new(2);
        let first = store.insert(Session::new()).await;
        let second = store.insert(Session::new()).await;
        let third = store.insert(Session::new()).await;

        assert_eq!(store.len().await, 2);
        assert!(store.snapshot(&first).await.is_none());
        assert!(store.snapshot(&second).await.is_some());
        assert!(store.snapshot(&third).await.is_some());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new(2);
        let id = store.insert(Session::new()).await;
        assert!(store.remove(&id).await);
        assert!(!store.remove(&id).await);
        assert_eq!(store.len().await, 0);
    }
}
