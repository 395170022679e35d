//! Cross-context bridge from async request tasks to the authority thread.
//!
//! [`AuthorityHandle::run_on_authority_thread`] is the only sanctioned way
//! for code outside the authority thread to read simulation state:
//!
//! ```text
//! request task                          authority thread
//! ------------                          ----------------
//! wrap closure + oneshot sender  --->   [jobs: bounded(N)]
//! try_send (never blocks)                 recv / drain
//! await reply under timeout               run closure on &W
//!        <-------------------------------  reply_tx.send(result)
//! ```
//!
//! Ownership of the closure moves in and ownership of the finished result
//! moves out. Nothing is shared, and the authority thread never waits on
//! the caller: a caller that timed out or disconnected simply drops its
//! receiver and the result is discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};
use tokio::sync::oneshot;
use tracing::trace;

/// A unit of work executed on the authority thread.
pub(crate) type Job<W> = Box<dyn FnOnce(&W) + Send + 'static>;

/// Failure to obtain a result from the authority thread.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The job queue is at capacity.
    #[error("authority job queue is full")]
    QueueFull,

    /// The authority thread is no longer accepting work.
    #[error("authority thread has shut down")]
    Shutdown,

    /// The job did not complete within the wait budget.
    #[error("authority work did not complete within {0:?}")]
    Timeout(Duration),

    /// The job was dropped before producing a result (it panicked, or the
    /// thread stopped with the job still queued).
    #[error("authority work was abandoned before completing")]
    Abandoned,
}

impl BridgeError {
    /// Whether the error is a wait-budget timeout.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Cloneable submission endpoint for an authority thread owning a `W`.
pub struct AuthorityHandle<W> {
    jobs: Sender<Job<W>>,
    tick: Arc<AtomicU64>,
    timeout: Duration,
}

impl<W> Clone for AuthorityHandle<W> {
    fn clone(&self) -> Self {
        Self {
            jobs: self.jobs.clone(),
            tick: Arc::clone(&self.tick),
            timeout: self.timeout,
        }
    }
}

impl<W> core::fmt::Debug for AuthorityHandle<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthorityHandle")
            .field("queued", &self.jobs.len())
            .field("tick", &self.current_tick())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<W> AuthorityHandle<W> {
    pub(crate) const fn new(jobs: Sender<Job<W>>, tick: Arc<AtomicU64>, timeout: Duration) -> Self {
        Self {
            jobs,
            tick,
            timeout,
        }
    }

    /// A handle to the same thread with a different wait budget.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// The wait budget applied to every submission.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The last tick the authority thread completed (0 before the first).
    pub fn current_tick(&self) -> u64 {
        self.tick.load(Ordering::Acquire)
    }
}

impl<W: 'static> AuthorityHandle<W> {
    /// Run `work` exactly once on the authority thread and return its result.
    ///
    /// Submission never blocks: a full queue fails immediately. The caller
    /// then suspends on a completion channel for at most the handle's
    /// timeout. If the caller stops waiting before the job starts, the job
    /// is skipped; once started it always runs to completion and its
    /// result is discarded.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::QueueFull`] if the queue is at capacity.
    /// - [`BridgeError::Shutdown`] if the authority thread has stopped.
    /// - [`BridgeError::Timeout`] if no result arrived in time.
    /// - [`BridgeError::Abandoned`] if the job was dropped unfinished.
    pub async fn run_on_authority_thread<T, F>(&self, work: F) -> Result<T, BridgeError>
    where
        F: FnOnce(&W) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let job: Job<W> = Box::new(move |world: &W| {
            if reply_tx.is_closed() {
                trace!("Caller gone before authority job started, skipping");
                return;
            }
            // A closed receiver here means the caller timed out mid-job.
            let _ = reply_tx.send(work(world));
        });

        self.jobs.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => BridgeError::QueueFull,
            TrySendError::Disconnected(_) => BridgeError::Shutdown,
        })?;

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(BridgeError::Abandoned),
            Err(_) => Err(BridgeError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use std::time::Instant;

    use super::*;
    use crate::authority::{AUTHORITY_THREAD_NAME, AuthorityConfig, AuthorityThread, Simulation};

    /// Simulation whose ticks take a configurable amount of wall time.
    struct Busy {
        tick_cost: Duration,
        value: u64,
    }

    impl Simulation for Busy {
        fn tick(&mut self, _tick: u64) {
            std::thread::sleep(self.tick_cost);
            self.value = self.value.saturating_add(1);
        }
    }

    fn spawn(tick_cost: Duration, timeout: Duration, capacity: usize) -> AuthorityThread<Busy> {
        let config = AuthorityConfig {
            tick_interval: Duration::from_millis(10),
            queue_capacity: capacity,
            collection_timeout: timeout,
        };
        AuthorityThread::spawn(
            Busy {
                tick_cost,
                value: 0,
            },
            &config,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn work_runs_on_the_authority_thread() {
        let thread = spawn(Duration::ZERO, Duration::from_secs(1), 8);
        let handle = thread.handle();

        let name = handle
            .run_on_authority_thread(|_: &Busy| std::thread::current().name().map(str::to_owned))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some(AUTHORITY_THREAD_NAME));

        thread.shutdown().unwrap();
    }

    #[tokio::test]
    async fn work_sees_live_state() {
        let thread = spawn(Duration::ZERO, Duration::from_secs(1), 8);
        let handle = thread.handle();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let value = handle.run_on_authority_thread(|w: &Busy| w.value).await.unwrap();
        assert!(value >= 1);

        thread.shutdown().unwrap();
    }

    #[tokio::test]
    async fn slow_tick_times_out_within_budget() {
        let budget = Duration::from_millis(30);
        let thread = spawn(Duration::from_millis(300), budget, 8);
        let handle = thread.handle();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = Instant::now();
        let err = handle.run_on_authority_thread(|w: &Busy| w.value).await.unwrap_err();
        let waited = started.elapsed();

        assert_eq!(err, BridgeError::Timeout(budget));
        assert!(err.is_timeout());
        assert!(waited >= budget);
        assert!(waited < Duration::from_millis(250));

        thread.shutdown().unwrap();
    }

    #[tokio::test]
    async fn timed_out_work_does_not_poison_later_calls() {
        let thread = spawn(Duration::from_millis(100), Duration::from_millis(10), 8);
        let handle = thread.handle();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(handle.run_on_authority_thread(|w: &Busy| w.value).await.is_err());

        let patient = handle.with_timeout(Duration::from_secs(2));
        assert!(patient.run_on_authority_thread(|w: &Busy| w.value).await.is_ok());

        thread.shutdown().unwrap();
    }

    #[tokio::test]
    async fn full_queue_is_refused_immediately() {
        let thread = spawn(Duration::from_millis(200), Duration::from_secs(1), 1);
        let handle = thread.handle();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The thread is mid-tick, so this filler occupies the only slot.
        handle.jobs.try_send(Box::new(|_: &Busy| {})).unwrap();

        let started = Instant::now();
        let err = handle.run_on_authority_thread(|w: &Busy| w.value).await.unwrap_err();
        assert_eq!(err, BridgeError::QueueFull);
        assert!(started.elapsed() < Duration::from_millis(50));

        thread.shutdown().unwrap();
    }

    #[tokio::test]
    async fn panicking_work_is_contained() {
        let thread = spawn(Duration::ZERO, Duration::from_secs(1), 8);
        let handle = thread.handle();

        let err = handle
            .run_on_authority_thread(|_: &Busy| -> u64 { panic!("collector bug") })
            .await
            .unwrap_err();
        assert_eq!(err, BridgeError::Abandoned);

        assert!(handle.run_on_authority_thread(|w: &Busy| w.value).await.is_ok());
        thread.shutdown().unwrap();
    }

    #[tokio::test]
    async fn stopped_thread_reports_shutdown() {
        let thread = spawn(Duration::ZERO, Duration::from_secs(1), 8);
        let handle = thread.handle();
        thread.shutdown().unwrap();

        let err = handle.run_on_authority_thread(|w: &Busy| w.value).await.unwrap_err();
        assert_eq!(err, BridgeError::Shutdown);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn continuous_polling_does_not_starve_ticks() {
        let thread = spawn(Duration::ZERO, Duration::from_secs(5), 64);
        let handle = thread.handle();
        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let pollers: Vec<_> = (0..16)
            .map(|_| {
                let handle = handle.clone();
                let stop = Arc::clone(&stop);
                tokio::spawn(async move {
                    while !stop.load(Ordering::Relaxed) {
                        let reply = handle
                            .run_on_authority_thread(|_: &Busy| {
                                std::thread::sleep(Duration::from_millis(1));
                            })
                            .await;
                        assert!(reply.is_ok());
                    }
                })
            })
            .collect();

        // Let the pollers saturate the queue before measuring.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let tick_before = handle.current_tick();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let ticks = handle.current_tick().saturating_sub(tick_before);

        stop.store(true, Ordering::Relaxed);
        for poller in pollers {
            poller.await.unwrap();
        }

        // A 10 ms interval allows ~100; each deadline runs at most the 16
        // queued jobs first, which still leaves dozens.
        assert!(ticks >= 20, "only {ticks} ticks during 1s of polling");

        thread.shutdown().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_all_complete_while_ticking_continues() {
        let thread = spawn(Duration::from_millis(1), Duration::from_secs(2), 64);
        let handle = thread.handle();
        let tick_before = handle.current_tick();

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let handle = handle.clone();
                tokio::spawn(async move {
                    handle
                        .run_on_authority_thread(move |w: &Busy| w.value.saturating_add(i))
                        .await
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.current_tick() > tick_before);

        thread.shutdown().unwrap();
    }
}
