//! Per-conversation sequencing of exchanges.
//!
//! Two exchanges on the same conversation must not interleave their
//! appends. Each conversation gets its own async mutex, created on demand
//! and dropped again once nobody holds or waits on it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct ConversationLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other exchange holds `conversation`, then hold it until
    /// the returned guard is dropped.
    pub async fn acquire(&self, conversation: i64) -> ConversationGuard {
        let lock = self.locks.entry(conversation).or_default().clone();
        let guard = lock.lock_owned().await;
        ConversationGuard {
            guard: Some(guard),
            conversation,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of conversations with a live lock entry.
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

pub struct ConversationGuard {
    guard: Option<OwnedMutexGuard<()>>,
    conversation: i64,
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl Drop for ConversationGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Entry clones happen under the shard lock, so a count of one means
        // only the map still references this mutex.
        self.locks
            .remove_if(&self.conversation, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_conversation_is_serialized() {
        let locks = ConversationLocks::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let first = locks.acquire(7).await;

        let waiter = {
            let locks = locks.clone();
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                let _guard = locks.acquire(7).await;
                order.lock().unwrap().push("second");
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        order.lock().unwrap().push("first");
        drop(first);
        waiter.await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_different_conversations_do_not_block() {
        let locks = ConversationLocks::new();
        let _a = locks.acquire(1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_entries_are_released() {
        let locks = ConversationLocks::new();
        {
            let _guard = locks.acquire(3).await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }
}
