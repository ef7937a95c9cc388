//! Bounded fan-out / fan-in over a cohort.
//!
//! Every item runs in its own future and returns its own result; results
//! are merged only after all futures complete. Nothing is shared between
//! workers except the semaphore.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

/// Run `task` over `items` with at most `limit` in flight.
///
/// Results come back in input order.
pub async fn run_bounded<I, T, F, Fut>(items: Vec<I>, limit: usize, task: F) -> Vec<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T>,
{
    let sem = Arc::new(Semaphore::new(limit.max(1)));
    let futures: Vec<_> = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let sem = sem.clone();
            let fut = task(item);
            async move {
                // The semaphore is never closed; a failed acquire just runs unbounded.
                let _permit = sem.acquire().await.ok();
                (idx, fut.await)
            }
        })
        .collect();

    let mut results = join_all(futures).await;
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, result)| result).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_bounded_respects_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_bounded((0..10).collect(), 3, |n: u32| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                n * 2
            }
        })
        .await;

        assert_eq!(results, (0..10).map(|n| n * 2).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_run_bounded_empty() {
        let results: Vec<u32> = run_bounded(Vec::<u32>::new(), 2, |n| async move { n }).await;
        assert!(results.is_empty());
    }
}
