//! Per-root operation queue.
//!
//! Serializes this session's own operations on one root so two of its edits
//! never read the same snapshot. Writers in other sessions are not covered.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct RootLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl RootLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `root_id`. Released on drop.
    ///
    /// Entries nobody holds or waits on are pruned here, so the map only
    /// tracks roots with operations in flight.
    pub async fn lock(&self, root_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(root_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_root_waits() {
        let locks = RootLocks::new();
        let guard = locks.lock("a").await;

        let blocked = tokio::time::timeout(Duration::from_millis(20), locks.lock("a")).await;
        assert!(blocked.is_err());

        drop(guard);
        let reacquired = tokio::time::timeout(Duration::from_millis(20), locks.lock("a")).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn different_roots_are_independent() {
        let locks = RootLocks::new();
        let _a = locks.lock("a").await;
        let b = tokio::time::timeout(Duration::from_millis(20), locks.lock("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_roots_are_pruned() {
        let locks = RootLocks::new();
        drop(locks.lock("a").await);
        let held = locks.lock("b").await;
        drop(locks.lock("c").await);

        let _d = locks.lock("d").await;
        let mut tracked: Vec<String> = locks.locks.lock().unwrap().keys().cloned().collect();
        tracked.sort();
        assert_eq!(tracked, vec!["b", "d"]);

        drop(held);
        drop(locks.lock("e").await);
        assert!(!locks.locks.lock().unwrap().contains_key("b"));
    }
}
