//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries,
//! independent of access patterns.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, CacheValue, Clock};
use crate::error::Result;

// == Sweep Target ==
/// Anything the cleanup task can sweep.
pub trait Sweep: Send + 'static {
    /// Removes expired entries, returning how many were dropped.
    fn sweep(&mut self) -> Result<usize>;
}

impl<V: CacheValue, C: Clock> Sweep for CacheStore<V, C> {
    fn sweep(&mut self) -> Result<usize> {
        Ok(self.cleanup_expired())
    }
}

// == Cleanup Handle ==
/// Owner of a running cleanup task.
#[derive(Debug)]
pub struct CleanupHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl CleanupHandle {
    /// Stops the task and waits for it to exit.
    ///
    /// Once this returns no further sweep will run.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("TTL cleanup task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns a background task that sweeps `target` every `period`.
///
/// The first sweep happens one full period after spawning. The task takes
/// the same lock as foreground operations; a failed sweep is logged and
/// retried on the next tick.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Mutex::new(CacheStore::<String>::new(1000)));
/// let cleanup = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup.shutdown().await;
/// ```
pub fn spawn_cleanup_task<S: Sweep>(target: Arc<Mutex<S>>, period: Duration) -> CleanupHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!("Starting TTL cleanup task with period of {:?}", period);

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = {
                        let mut guard = target.lock().await;
                        guard.sweep()
                    };

                    match outcome {
                        Ok(removed) if removed > 0 => {
                            info!("TTL cleanup: removed {} expired entries", removed);
                        }
                        Ok(_) => debug!("TTL cleanup: no expired entries found"),
                        Err(e) => warn!("TTL cleanup failed, retrying next tick: {}", e),
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("TTL cleanup task shutting down");
                    break;
                }
            }
        }
    });

    CleanupHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::CacheError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PERIOD: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let clock = ManualClock::new(0);
        let cache = Arc::new(Mutex::new(CacheStore::with_clock(100, clock.clone())));

        cache
            .lock()
            .await
            .set("expire_soon".to_string(), "value".to_string(), Some(1_000))
            .unwrap();
        clock.advance(1_001);

        let handle = spawn_cleanup_task(cache.clone(), PERIOD);
        tokio::time::sleep(PERIOD * 5).await;

        // Removed by the sweep, not by a lookup
        assert_eq!(cache.lock().await.len(), 0, "Expired entry should have been cleaned up");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = Arc::new(Mutex::new(CacheStore::new(100)));

        cache
            .lock()
            .await
            .set("long_lived".to_string(), "value".to_string(), Some(3_600_000))
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), PERIOD);
        tokio::time::sleep(PERIOD * 5).await;

        let value = cache.lock().await.get("long_lived").unwrap();
        assert_eq!(value, Some("value".to_string()));

        handle.shutdown().await;
    }

    struct FlakySweep {
        calls: Arc<AtomicUsize>,
    }

    impl Sweep for FlakySweep {
        fn sweep(&mut self) -> Result<usize> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(CacheError::Internal("first sweep fails".to_string()))
            } else {
                Ok(0)
            }
        }
    }

    #[tokio::test]
    async fn test_cleanup_task_survives_failed_sweep() {
        let calls = Arc::new(AtomicUsize::new(0));
        let target = Arc::new(Mutex::new(FlakySweep {
            calls: calls.clone(),
        }));

        let handle = spawn_cleanup_task(target, PERIOD);
        tokio::time::sleep(PERIOD * 6).await;

        assert!(calls.load(Ordering::SeqCst) >= 2, "schedule should continue after an error");
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_no_sweep_after_shutdown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let target = Arc::new(Mutex::new(FlakySweep {
            calls: calls.clone(),
        }));

        let handle = spawn_cleanup_task(target, PERIOD);
        tokio::time::sleep(PERIOD * 3).await;
        handle.shutdown().await;

        let after_shutdown = calls.load(Ordering::SeqCst);
        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_shutdown);
    }

    #[tokio::test]
    async fn test_shutdown_before_first_tick() {
        let cache = Arc::new(Mutex::new(CacheStore::<String>::new(10)));
        let handle = spawn_cleanup_task(cache, Duration::from_secs(3600));

        assert!(!handle.is_finished());
        handle.shutdown().await;
    }
}
