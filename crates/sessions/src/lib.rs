//! # Doppel Sessions
//!
//! In-memory session store. Sessions live for the process lifetime; a
//! restart forgets all conversations, which is acceptable for a personal
//! agent fronting one owner.
//!
//! Each session sits behind its own `Mutex`, so concurrent requests for the
//! same session serialize while different sessions proceed in parallel. The
//! outer map lock is held only long enough to clone the `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use doppel_core::{Session, SessionId};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Stores every active session, keyed by session ID.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a session handle.
    ///
    /// `None` or an unknown ID creates a fresh session; an unknown ID is
    /// adopted as the new session's ID rather than rejected, so clients can
    /// mint their own identifiers.
    pub async fn get_or_create(&self, id: Option<&str>) -> (SessionId, SessionHandle) {
        if let Some(id) = id {
            let sessions = self.inner.read().await;
            if let Some(handle) = sessions.get(id) {
                return (SessionId::from(id), Arc::clone(handle));
            }
        }

        let session_id = match id {
            Some(id) => SessionId::from(id),
            None => SessionId::new(),
        };

        let mut sessions = self.inner.write().await;
        // Double-check under the write lock: another request may have
        // created it between our read and write.
        if let Some(handle) = sessions.get(&session_id.0) {
            return (session_id, Arc::clone(handle));
        }

        debug!(session_id = %session_id, "Creating session");
        let handle: SessionHandle = Arc::new(Mutex::new(Session::with_id(session_id.clone())));
        sessions.insert(session_id.0.clone(), Arc::clone(&handle));
        (session_id, handle)
    }

    /// Append messages to a session, creating it if needed. Order is
    /// preserved.
    pub async fn append(
        &self,
        id: &str,
        messages: impl IntoIterator<Item = doppel_core::Message>,
    ) -> SessionId {
        let (session_id, handle) = self.get_or_create(Some(id)).await;
        let mut session = handle.lock().await;
        for message in messages {
            session.push(message);
        }
        session_id
    }

    /// Look up an existing session without creating one.
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.inner.read().await.get(id).cloned()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_core::Message;

    #[tokio::test]
    async fn creates_fresh_session_without_id() {
        let store = SessionStore::new();
        let (id, handle) = store.get_or_create(None).await;

        assert!(!id.0.is_empty());
        assert!(handle.lock().await.messages.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn returns_same_session_for_same_id() {
        let store = SessionStore::new();
        let (id, handle) = store.get_or_create(None).await;
        handle.lock().await.push(Message::user("hello"));

        let (id2, handle2) = store.get_or_create(Some(&id.0)).await;
        assert_eq!(id, id2);
        assert_eq!(handle2.lock().await.messages.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_id_is_adopted() {
        let store = SessionStore::new();
        let (id, _) = store.get_or_create(Some("client-minted-id")).await;

        assert_eq!(id.0, "client-minted-id");
        assert!(store.get("client-minted-id").await.is_some());
    }

    #[tokio::test]
    async fn append_then_get_preserves_order() {
        let store = SessionStore::new();
        store
            .append(
                "s1",
                vec![
                    Message::user("first"),
                    Message::assistant("second"),
                    Message::user("third"),
                ],
            )
            .await;

        let (_, handle) = store.get_or_create(Some("s1")).await;
        let session = handle.lock().await;
        let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new();
        let (_, a) = store.get_or_create(Some("a")).await;
        let (_, b) = store.get_or_create(Some("b")).await;

        a.lock().await.push(Message::user("for a"));
        assert!(b.lock().await.messages.is_empty());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn concurrent_create_yields_one_session() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.get_or_create(Some("shared")).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.len().await, 1);
    }
}
