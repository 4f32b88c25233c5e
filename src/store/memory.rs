use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ThoughtStore;
use crate::error::ApiError;
use crate::models::{NewThought, Thought};

/// In-process store, kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    thoughts: RwLock<Vec<Thought>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.thoughts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.thoughts.read().await.is_empty()
    }
}

#[async_trait]
impl ThoughtStore for MemoryStore {
    async fn list_recent(&self, limit: usize) -> Result<Vec<Thought>, ApiError> {
        let thoughts = self.thoughts.read().await;

        // Reverse first so the stable sort keeps later inserts ahead on equal timestamps
        let mut recent: Vec<Thought> = thoughts.iter().rev().cloned().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);

        Ok(recent)
    }

    async fn insert(&self, thought: NewThought) -> Result<Thought, ApiError> {
        let thought = thought.into_thought(Uuid::new_v4(), Utc::now());
        self.thoughts.write().await.push(thought.clone());
        Ok(thought)
    }

    async fn increment_hearts(&self, id: Uuid) -> Result<Option<Thought>, ApiError> {
        let mut thoughts = self.thoughts.write().await;

        Ok(thoughts.iter_mut().find(|t| t.id == id).map(|thought| {
            thought.hearts += 1;
            thought.clone()
        }))
    }

    async fn ping(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateThoughtRequest;
    use std::sync::Arc;
    use tokio_test::assert_ok;

    fn new_thought(message: &str) -> NewThought {
        CreateThoughtRequest::new(message).validate().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_time() {
        let store = MemoryStore::new();
        let before = Utc::now();

        let thought = assert_ok!(store.insert(new_thought("hello world")).await);

        assert_eq!(thought.message, "hello world");
        assert_eq!(thought.hearts, 0);
        assert!(thought.created_at >= before);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_limited() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store.insert(new_thought(&format!("thought {}", i))).await.unwrap();
        }

        let listed = store.list_recent(20).await.unwrap();

        assert_eq!(listed.len(), 20);
        assert_eq!(listed[0].message, "thought 24");
        assert_eq!(listed[19].message, "thought 5");
        assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let store = MemoryStore::new();
        assert!(store.list_recent(20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_increment_hearts() {
        let store = MemoryStore::new();
        let thought = store.insert(new_thought("hello world")).await.unwrap();

        let liked = store.increment_hearts(thought.id).await.unwrap().unwrap();
        assert_eq!(liked.hearts, 1);

        let liked = store.increment_hearts(thought.id).await.unwrap().unwrap();
        assert_eq!(liked.hearts, 2);
        assert_eq!(liked.created_at, thought.created_at);
    }

    #[tokio::test]
    async fn test_increment_unknown_id_changes_nothing() {
        let store = MemoryStore::new();
        store.insert(new_thought("hello world")).await.unwrap();

        let result = store.increment_hearts(Uuid::new_v4()).await.unwrap();

        assert!(result.is_none());
        assert_eq!(store.len().await, 1);
        assert_eq!(store.list_recent(20).await.unwrap()[0].hearts, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let thought = store.insert(new_thought("hello world")).await.unwrap();

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.increment_hearts(thought.id).await })
            })
            .collect();
        for task in tasks {
            assert_ok!(task.await.unwrap());
        }

        let listed = store.list_recent(1).await.unwrap();
        assert_eq!(listed[0].hearts, 100);
    }
}
