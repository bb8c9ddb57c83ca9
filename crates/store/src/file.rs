//! JSON-file conversation store

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use report_agent_core::{ConversationStore, Turn};

use crate::StoreError;

type HistoryMap = BTreeMap<String, Vec<Turn>>;

/// Per-user turn histories in a single JSON document.
///
/// An internal mutex keeps each load/save cycle consistent against other
/// store calls in this process. Serializing the wider read-modify-write
/// (get, append, insert) across a request is the composer's job via
/// `UserLocks`.
pub struct FileStore {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store, creating the parent directory and an empty document
    /// when missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        if !tokio::fs::try_exists(&path).await? {
            tokio::fs::write(&path, b"{}").await?;
        }
        Ok(Self {
            path,
            io_lock: Mutex::new(()),
        })
    }

    async fn load(&self) -> Result<HistoryMap, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        if raw.trim().is_empty() {
            return Ok(HistoryMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, map: &HistoryMap) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for FileStore {
    async fn get(&self, user_id: &str) -> Vec<Turn> {
        let _guard = self.io_lock.lock().await;
        match self.load().await {
            Ok(map) => map.get(user_id).cloned().unwrap_or_default(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "conversation load failed");
                Vec::new()
            }
        }
    }

    async fn insert(&self, user_id: &str, turns: Vec<Turn>) -> bool {
        let _guard = self.io_lock.lock().await;
        let result = async {
            let mut map = self.load().await?;
            map.insert(user_id.to_string(), turns);
            self.save(&map).await
        }
        .await;
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "conversation insert failed");
                false
            }
        }
    }

    async fn delete(&self, user_id: &str) -> bool {
        let _guard = self.io_lock.lock().await;
        let result = async {
            let mut map = self.load().await?;
            let removed = map.remove(user_id).is_some();
            if removed {
                self.save(&map).await?;
            }
            Ok::<bool, StoreError>(removed)
        }
        .await;
        match result {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "conversation delete failed");
                false
            }
        }
    }

    async fn evict(&self, max_age: Duration) -> usize {
        let _guard = self.io_lock.lock().await;
        let result = async {
            let mut map = self.load().await?;
            let cutoff = Utc::now() - max_age;
            let before = map.len();
            map.retain(|_, turns| {
                turns
                    .last()
                    .map(|turn| turn.timestamp >= cutoff)
                    .unwrap_or(false)
            });
            let evicted = before - map.len();
            if evicted > 0 {
                self.save(&map).await?;
            }
            Ok::<usize, StoreError>(evicted)
        }
        .await;
        match result {
            Ok(evicted) => evicted,
            Err(e) => {
                tracing::warn!(error = %e, "conversation eviction failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_agent_core::{OutstandingParams, ReportId, ReportParams};

    fn turn(hours_ago: i64) -> Turn {
        Turn {
            report: Some(ReportId::Outstanding),
            params: Some(ReportParams::Outstanding(OutstandingParams {
                product: "All".to_string(),
                user: "N/A".to_string(),
            })),
            response: "ok".to_string(),
            is_new_session: false,
            is_action: false,
            timestamp: Utc::now() - Duration::hours(hours_ago),
        }
    }

    #[tokio::test]
    async fn round_trips_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("conversations.json"))
            .await
            .unwrap();

        assert!(store.get("leon").await.is_empty());
        assert!(store.insert("leon", vec![turn(0)]).await);
        let history = store.get("leon").await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].report, Some(ReportId::Outstanding));
    }

    #[tokio::test]
    async fn delete_removes_only_target_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("conversations.json"))
            .await
            .unwrap();

        store.insert("a", vec![turn(0)]).await;
        store.insert("b", vec![turn(0)]).await;
        assert!(store.delete("a").await);
        assert!(!store.delete("a").await);
        assert!(store.get("a").await.is_empty());
        assert_eq!(store.get("b").await.len(), 1);
    }

    #[tokio::test]
    async fn evicts_stale_users() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("conversations.json"))
            .await
            .unwrap();

        store.insert("stale", vec![turn(48)]).await;
        store.insert("fresh", vec![turn(1)]).await;

        let evicted = store.evict(Duration::hours(24)).await;
        assert_eq!(evicted, 1);
        assert!(store.get("stale").await.is_empty());
        assert_eq!(store.get("fresh").await.len(), 1);
    }

    #[tokio::test]
    async fn survives_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversations.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        let store = FileStore::open(&path).await.unwrap();

        // Reads degrade to empty, writes report failure without panicking
        assert!(store.get("x").await.is_empty());
        assert!(!store.insert("x", vec![turn(0)]).await);
    }
}
