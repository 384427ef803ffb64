//! Per-path write locks.

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::collections::HashMap;
use std::sync::Arc;

/// A table of mutexes keyed by path.
///
/// Writers and deleters of the same path serialize on one mutex; different
/// paths never contend beyond the short critical section on the table
/// itself. Entries are dropped as soon as nobody holds or waits on them, so
/// the table only grows with the number of paths currently being written.
#[derive(Debug, Default)]
pub struct PathLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PathLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the lock for `key` is held.
    pub fn lock(&self, key: &str) -> PathGuard<'_> {
        let entry = {
            let mut table = self.table.lock();
            Arc::clone(table.entry(key.to_string()).or_default())
        };
        let guard = entry.lock_arc();
        PathGuard {
            locks: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of paths that currently have a holder or waiter.
    #[must_use]
    pub fn active(&self) -> usize {
        self.table.lock().len()
    }
}

/// Holds the lock for one path until dropped.
#[must_use = "the path is unlocked as soon as the guard is dropped"]
pub struct PathGuard<'a> {
    locks: &'a PathLocks,
    key: String,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        // Release first so a waiter can proceed, then collect the entry if
        // nobody else references it. Clones are only taken under the table
        // lock, so the count is stable while we hold it.
        drop(self.guard.take());
        let mut table = self.locks.table.lock();
        if let Some(entry) = table.get(&self.key) {
            if Arc::strong_count(entry) == 1 {
                table.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn entries_are_collected() {
        let locks = PathLocks::new();
        {
            let _a = locks.lock("a");
            let _b = locks.lock("b");
            assert_eq!(locks.active(), 2);
        }
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn same_path_is_exclusive() {
        let locks = Arc::new(PathLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    for _ in 0..20 {
                        let _guard = locks.lock("shared");
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(50));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn different_paths_do_not_block() {
        let locks = PathLocks::new();
        let _a = locks.lock("a");
        // Would deadlock if keys shared a mutex.
        let _b = locks.lock("b");
    }
}
