//! Per-session mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use planetarium_core::ShowSessionId;
use tokio::sync::OwnedMutexGuard;

#[derive(Debug)]
struct Slot {
    mutex: Arc<tokio::sync::Mutex<()>>,
    /// Holders plus waiters.
    users: usize,
}

type Table = Arc<Mutex<HashMap<ShowSessionId, Slot>>>;

/// Async mutexes keyed by show session.
///
/// A slot exists only while somebody holds or waits for it. Every caller
/// registers before waiting and deregisters on drop, including a waiter
/// cancelled mid-wait, so the map does not grow with the number of sessions
/// ever booked.
#[derive(Debug, Default)]
pub struct SessionLocks {
    slots: Table,
}

impl SessionLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other guard for `session` is alive.
    pub async fn lock(&self, session: ShowSessionId) -> SessionGuard {
        let (mutex, registration) = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.entry(session).or_insert_with(|| Slot {
                mutex: Arc::default(),
                users: 0,
            });
            slot.users += 1;
            (
                Arc::clone(&slot.mutex),
                Registration {
                    session,
                    slots: Arc::clone(&self.slots),
                },
            )
        };

        // Dropping this future before the lock is granted drops `registration`.
        let guard = mutex.lock_owned().await;

        SessionGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of sessions currently locked or awaited.
    #[must_use]
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// One caller's claim on a slot.
#[derive(Debug)]
struct Registration {
    session: ShowSessionId,
    slots: Table,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(&self.session) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                slots.remove(&self.session);
            }
        }
    }
}

/// Held while a booking for one session is in progress.
///
/// Fields drop in order: the mutex is released before the slot is
/// deregistered.
#[derive(Debug)]
pub struct SessionGuard {
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_slot_removed_after_release() {
        let locks = SessionLocks::new();
        {
            let _guard = locks.lock(ShowSessionId::new(1)).await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_different_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _a = locks.lock(ShowSessionId::new(1)).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(ShowSessionId::new(2)))
            .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_same_session_blocks() {
        let locks = SessionLocks::new();
        let _a = locks.lock(ShowSessionId::new(1)).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(ShowSessionId::new(1)))
            .await;
        assert!(b.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_guards_serialize_critical_section() {
        let locks = Arc::new(SessionLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(ShowSessionId::new(7)).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_leaves_no_slot() {
        let locks = Arc::new(SessionLocks::new());
        let holder = locks.lock(ShowSessionId::new(3)).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(ShowSessionId::new(3)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(locks.active(), 1);

        drop(holder);
        waiter.abort();
        let _ = waiter.await;

        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_timed_out_waiter_leaves_no_slot() {
        let locks = SessionLocks::new();
        let holder = locks.lock(ShowSessionId::new(4)).await;

        let waited =
            tokio::time::timeout(Duration::from_millis(20), locks.lock(ShowSessionId::new(4)))
                .await;
        assert!(waited.is_err());

        drop(holder);
        assert_eq!(locks.active(), 0);
    }
}
