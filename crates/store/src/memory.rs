//! In-memory conversation store

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;

use report_agent_core::{ConversationStore, Turn};

/// Dashmap-backed store for tests and ephemeral deployments
#[derive(Default)]
pub struct MemoryStore {
    histories: DashMap<String, Vec<Turn>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Vec<Turn> {
        self.histories
            .get(user_id)
            .map(|turns| turns.clone())
            .unwrap_or_default()
    }

    async fn insert(&self, user_id: &str, turns: Vec<Turn>) -> bool {
        self.histories.insert(user_id.to_string(), turns);
        true
    }

    async fn delete(&self, user_id: &str) -> bool {
        self.histories.remove(user_id).is_some()
    }

    async fn evict(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let before = self.histories.len();
        self.histories.retain(|_, turns| {
            turns
                .last()
                .map(|turn| turn.timestamp >= cutoff)
                .unwrap_or(false)
        });
        before - self.histories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(hours_ago: i64) -> Turn {
        Turn {
            report: None,
            params: None,
            response: String::new(),
            is_new_session: false,
            is_action: false,
            timestamp: Utc::now() - Duration::hours(hours_ago),
        }
    }

    #[tokio::test]
    async fn insert_replaces_whole_history() {
        let store = MemoryStore::new();
        store.insert("u", vec![turn(0), turn(0)]).await;
        store.insert("u", vec![turn(0)]).await;
        assert_eq!(store.get("u").await.len(), 1);
    }

    #[tokio::test]
    async fn eviction_by_last_turn_age() {
        let store = MemoryStore::new();
        store.insert("old", vec![turn(10)]).await;
        store.insert("new", vec![turn(10), turn(0)]).await;
        assert_eq!(store.evict(Duration::hours(5)).await, 1);
        assert!(store.get("old").await.is_empty());
        assert_eq!(store.get("new").await.len(), 2);
    }
}
