//! In-Memory Session Manager Implementation

use dashmap::DashMap;
use std::sync::Arc;

use crate::application::discovery::DiscoverySession;
use crate::application::ports::{SessionError, SessionManagerPort};
use crate::domain::discovery::SessionIdentity;

/// 内存会话管理器
pub struct InMemorySessionManager {
    sessions: DashMap<String, Arc<DiscoverySession>>,
}

impl InMemorySessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for InMemorySessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManagerPort for InMemorySessionManager {
    fn open(&self, id: &str, identity: SessionIdentity) -> Arc<DiscoverySession> {
        let session = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::info!(session_id = %id, user_id = ?identity.user_id, "Session created");
                Arc::new(DiscoverySession::new(id, identity))
            })
            .clone();
        // entry guard 已释放，不在分片锁内触碰会话状态
        session.set_identity(identity);
        session.touch();
        session
    }

    fn get(&self, id: &str) -> Result<Arc<DiscoverySession>, SessionError> {
        self.sessions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn close(&self, id: &str) -> Result<(), SessionError> {
        let (_, session) = self
            .sessions
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        let was_running = session.close();
        tracing::info!(session_id = %id, was_running, "Session closed");
        Ok(())
    }

    fn touch(&self, id: &str) {
        if let Some(session) = self.sessions.get(id) {
            session.touch();
        }
    }

    fn list_all(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let manager = InMemorySessionManager::new();

        let session = manager.open("sid-1", SessionIdentity::default());
        assert_eq!(session.id(), "sid-1");
        assert!(manager.get("sid-1").is_ok());
        assert_eq!(manager.list_all(), vec!["sid-1".to_string()]);

        assert!(manager.close("sid-1").is_ok());
        assert!(matches!(
            manager.get("sid-1"),
            Err(SessionError::NotFound(_))
        ));
        assert!(manager.close("sid-1").is_err());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_reopen_keeps_session_and_updates_identity() {
        let manager = InMemorySessionManager::new();
        let first = manager.open("sid-1", SessionIdentity::default());
        let identity = SessionIdentity {
            user_id: Some(7),
            is_admin: true,
        };
        let second = manager.open("sid-1", identity);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.identity(), identity);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_close_cancels_live_run() {
        let manager = InMemorySessionManager::new();
        let session = manager.open("sid-1", SessionIdentity::default());
        let run = session
            .begin_run(session.prepare_start(), vec!["Muse".to_string()])
            .unwrap();

        manager.close("sid-1").unwrap();

        assert!(run.is_cancelled());
        assert!(!session.with_state(|s| s.is_running()));
    }

    #[test]
    fn test_close_while_resolving_blocks_pending_start() {
        let manager = InMemorySessionManager::new();
        let session = manager.open("sid-1", SessionIdentity::default());
        let intent = session.prepare_start();

        manager.close("sid-1").unwrap();

        assert!(session.is_closed());
        assert!(session.begin_run(intent, vec!["Muse".to_string()]).is_none());
    }
}
