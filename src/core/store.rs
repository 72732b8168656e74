//! Session storage.
//!
//! The store is the only shared mutable resource in the pipeline, and
//! each session is written exactly once at the end of its run (plus an
//! optional partial write on cancellation or error), so a coarse lock
//! is all the memory store needs. Sessions are stored as JSON, one
//! record per session, and retained until explicitly cleared.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::CollaborationSession;

/// Session store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session {0} not found")]
    NotFound(Uuid),

    #[error("session store I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("session record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Keyed storage for completed collaboration sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, session: CollaborationSession) -> Result<(), StoreError>;

    async fn get(&self, session_id: Uuid) -> Result<CollaborationSession, StoreError>;

    async fn clear(&self, session_id: Uuid) -> Result<(), StoreError>;

    async fn list_active(&self) -> Result<Vec<Uuid>, StoreError>;
}

/// In-memory store. No expiry: sessions live until cleared or the
/// process exits.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, CollaborationSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session: CollaborationSession) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.session_id, session);
        Ok(())
    }

    async fn get(&self, session_id: Uuid) -> Result<CollaborationSession, StoreError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(StoreError::NotFound(session_id))
    }

    async fn clear(&self, session_id: Uuid) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .remove(&session_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(session_id))
    }

    async fn list_active(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut ids: Vec<Uuid> = self.sessions.read().await.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

/// File-backed store: one `<session_id>.json` per session under the
/// base directory. Used by the CLI so past runs survive the process.
pub struct FileSessionStore {
    base_dir: PathBuf,
}

impl FileSessionStore {
    /// Create or open a store rooted at `base_dir`.
    pub async fn open(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    fn session_path(&self, session_id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{}.json", session_id))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn put(&self, session: CollaborationSession) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&session)?;
        fs::write(self.session_path(session.session_id), json).await?;
        Ok(())
    }

    async fn get(&self, session_id: Uuid) -> Result<CollaborationSession, StoreError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Err(StoreError::NotFound(session_id));
        }

        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn clear(&self, session_id: Uuid) -> Result<(), StoreError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Err(StoreError::NotFound(session_id));
        }
        fs::remove_file(path).await?;
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(stem) = name.strip_suffix(".json") {
                    if let Ok(id) = Uuid::parse_str(stem) {
                        ids.push(id);
                    }
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}
