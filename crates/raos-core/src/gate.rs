use crate::error::{RaosError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Process-wide bound on concurrent stage executions.
///
/// Waiters are admitted strictly in arrival order. A permit is held by a
/// [`GatePermit`] and returned when that value is dropped, so early returns,
/// errors, panics and task cancellation all release it.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    waiting: Arc<AtomicUsize>,
}

#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

struct WaitingGuard<'a>(&'a AtomicUsize);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            waiting: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot. Resolves immediately when one is available.
    pub async fn acquire(&self) -> Result<GatePermit> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let _waiting = WaitingGuard(&self.waiting);
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| RaosError::GateClosed)?;
        Ok(GatePermit { _permit: permit })
    }

    /// Run `fut` while holding a slot.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        let _permit = self.acquire().await?;
        Ok(fut.await)
    }

    /// Refuse all current and future waiters. Held permits stay valid.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.capacity
            .saturating_sub(self.semaphore.available_permits())
    }

    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn admits_at_most_capacity_in_arrival_order() {
        let gate = ConcurrencyGate::new(5);
        let admitted = Arc::new(Mutex::new(Vec::new()));
        let mut releases = Vec::new();

        for i in 0..8 {
            let (tx, rx) = oneshot::channel::<()>();
            releases.push(Some(tx));
            let gate = gate.clone();
            let admitted = Arc::clone(&admitted);
            tokio::spawn(async move {
                let _permit = gate.acquire().await.unwrap();
                admitted.lock().unwrap().push(i);
                let _ = rx.await;
            });
            settle().await;
        }

        assert_eq!(gate.in_flight(), 5);
        assert_eq!(gate.waiting(), 3);
        assert_eq!(*admitted.lock().unwrap(), vec![0, 1, 2, 3, 4]);

        // Releasing any holder admits the oldest waiter.
        releases[3].take().unwrap().send(()).unwrap();
        settle().await;
        assert_eq!(*admitted.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);

        releases[0].take().unwrap().send(()).unwrap();
        releases[1].take().unwrap().send(()).unwrap();
        settle().await;
        assert_eq!(*admitted.lock().unwrap(), vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(gate.waiting(), 0);
        assert_eq!(gate.in_flight(), 5);

        for tx in releases.into_iter().flatten() {
            let _ = tx.send(());
        }
        settle().await;
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn permit_released_when_work_fails() {
        let gate = ConcurrencyGate::new(1);
        let out: Result<std::result::Result<(), &str>> =
            gate.run(async { Err("boom") }).await;
        assert_eq!(out.unwrap(), Err("boom"));
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn permit_released_when_task_panics() {
        let gate = ConcurrencyGate::new(1);
        let g = gate.clone();
        let handle = tokio::spawn(async move {
            let _permit = g.acquire().await.unwrap();
            panic!("stage blew up");
        });
        assert!(handle.await.is_err());
        assert_eq!(gate.in_flight(), 0);
        let _again = gate.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_waiter_leaves_queue() {
        let gate = ConcurrencyGate::new(1);
        let held = gate.acquire().await.unwrap();

        let g = gate.clone();
        let waiter = tokio::spawn(async move { g.acquire().await.map(|_| ()) });
        settle().await;
        assert_eq!(gate.waiting(), 1);

        waiter.abort();
        let _ = waiter.await;
        assert_eq!(gate.waiting(), 0);
        drop(held);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn closed_gate_refuses_waiters() {
        let gate = ConcurrencyGate::new(2);
        gate.close();
        assert!(matches!(
            gate.acquire().await.unwrap_err(),
            RaosError::GateClosed
        ));
        assert_eq!(gate.waiting(), 0);
    }
}
