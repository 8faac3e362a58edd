//! Page-level concurrency limiter.
//!
//! Page rasterization is memory-heavy: every in-flight page holds a full
//! resolution raster. The limiter caps concurrency *per document* at a
//! fixed ceiling independent of the outer worker count, so peak memory per
//! in-flight document stays bounded no matter how many workers run.

use crate::error::{ConvertError, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Hard ceiling on concurrently rendered pages within one document:
/// the detected hardware parallelism, clamped to the range 2..=8.
pub fn page_slot_limit() -> usize {
    num_cpus::get().clamp(2, 8)
}

/// Admission-control gate for page tasks, instantiated fresh for each
/// document conversion.
///
/// A page task acquires a slot before rendering and holds the returned
/// permit for its whole lifetime; the permit's `Drop` releases the slot
/// on every exit path, whether the task succeeded, failed, or panicked.
#[derive(Debug, Clone)]
pub struct PageGate {
    semaphore: Arc<Semaphore>,
}

impl PageGate {
    /// Create a gate with an explicit slot count.
    pub fn new(slots: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(slots.max(1))),
        }
    }

    /// Create a gate sized by [`page_slot_limit`].
    pub fn for_document() -> Self {
        Self::new(page_slot_limit())
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ConvertError::EngineDisconnected)
    }

    /// Currently free slots. Used by tests and diagnostics.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_slot_limit_stays_in_range() {
        let limit = page_slot_limit();
        assert!((2..=8).contains(&limit));
    }

    #[test]
    fn test_gate_clamps_zero_slots_to_one() {
        let gate = PageGate::new(0);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gate_bounds_concurrency() {
        const SLOTS: usize = 3;
        const TASKS: usize = 32;

        let gate = PageGate::new(SLOTS);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(TASKS);
        for _ in 0..TASKS {
            let gate = gate.clone();
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await.unwrap();
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(
            peak.load(Ordering::SeqCst) <= SLOTS,
            "observed {} concurrent tasks with {} slots",
            peak.load(Ordering::SeqCst),
            SLOTS
        );
    }

    #[tokio::test]
    async fn test_permit_released_on_failure_path() {
        let gate = PageGate::new(2);

        let task_gate = gate.clone();
        let result: std::result::Result<(), String> = tokio::spawn(async move {
            let _permit = task_gate.acquire().await.unwrap();
            Err("render fault".to_string())
        })
        .await
        .unwrap();

        assert!(result.is_err());
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_permit_released_on_panic() {
        let gate = PageGate::new(1);

        let task_gate = gate.clone();
        let joined = tokio::spawn(async move {
            let _permit = task_gate.acquire().await.unwrap();
            panic!("page task died");
        })
        .await;

        assert!(joined.is_err());
        assert_eq!(gate.available(), 1);
    }
}
