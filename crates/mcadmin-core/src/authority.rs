//! The authoritative simulation thread.
//!
//! The authority thread owns the simulation value exclusively (moved in
//! via `thread::spawn`) and is the only thread that ever touches it. It
//! alternates between two duties:
//!
//! 1. **Ticking**: at every tick deadline it runs the jobs queued at that
//!    moment (never more) and then advances the simulation by one tick.
//! 2. **Serving jobs**: between deadlines it blocks on the job queue with
//!    `recv_timeout`, running each job as soon as it arrives.
//!
//! Jobs are bounded, synchronous, in-memory closures submitted through an
//! [`AuthorityHandle`]. A job never runs concurrently with a tick, so it
//! observes a consistent state. No locks are held anywhere on this path.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, error, info, trace};

use crate::bridge::{AuthorityHandle, Job};
use crate::config::DataApiConfig;

/// Name given to the authority OS thread.
pub const AUTHORITY_THREAD_NAME: &str = "authority";

/// A simulation that can be driven by the authority thread.
pub trait Simulation: Send + 'static {
    /// Advance the simulation by one tick. `tick` starts at 1.
    fn tick(&mut self, tick: u64);
}

/// Timing and capacity settings for the authority thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityConfig {
    /// Real time between tick deadlines.
    pub tick_interval: Duration,
    /// Maximum number of queued jobs before submissions are refused.
    pub queue_capacity: usize,
    /// How long a caller waits for its job to complete.
    pub collection_timeout: Duration,
}

impl AuthorityConfig {
    /// Derive authority settings from the loaded configuration.
    pub const fn from_config(config: &DataApiConfig) -> Self {
        Self {
            tick_interval: config.simulation.tick_interval(),
            queue_capacity: config.simulation.task_queue_capacity,
            collection_timeout: config.collection_timeout(),
        }
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self::from_config(&DataApiConfig::default())
    }
}

/// Errors raised while starting or stopping the authority thread.
#[derive(Debug, thiserror::Error)]
pub enum AuthorityError {
    /// The OS refused to create the thread.
    #[error("failed to spawn authority thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The thread panicked outside of a job and its simulation is lost.
    #[error("authority thread panicked")]
    Panicked,
}

/// Owner of the running authority thread.
///
/// Dropping this value signals the thread to stop; call
/// [`shutdown`](Self::shutdown) to also join it and recover the simulation.
pub struct AuthorityThread<W> {
    handle: AuthorityHandle<W>,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<W>>,
}

impl<W: Simulation> AuthorityThread<W> {
    /// Move `world` onto a new authority thread and start ticking.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::Spawn`] if the thread cannot be created.
    pub fn spawn(world: W, config: &AuthorityConfig) -> Result<Self, AuthorityError> {
        let (jobs_tx, jobs_rx) = crossbeam_channel::bounded(config.queue_capacity);
        let shutdown = Arc::new(AtomicBool::new(false));
        let tick = Arc::new(AtomicU64::new(0));

        let tick_loop = TickLoop {
            world,
            jobs: jobs_rx,
            shutdown: Arc::clone(&shutdown),
            tick: Arc::clone(&tick),
            interval: config.tick_interval,
        };

        let join = thread::Builder::new()
            .name(AUTHORITY_THREAD_NAME.to_owned())
            .spawn(move || tick_loop.run())
            .map_err(AuthorityError::Spawn)?;

        info!(
            tick_interval_ms = config.tick_interval.as_millis(),
            queue_capacity = config.queue_capacity,
            "Authority thread started"
        );

        Ok(Self {
            handle: AuthorityHandle::new(jobs_tx, tick, config.collection_timeout),
            shutdown,
            join: Some(join),
        })
    }
}

impl<W> AuthorityThread<W> {
    /// A handle for submitting work to this thread.
    pub fn handle(&self) -> AuthorityHandle<W> {
        self.handle.clone()
    }

    /// Stop the tick loop, join the thread and return the simulation.
    ///
    /// Jobs still queued are dropped; their callers observe an error.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::Panicked`] if the thread died.
    pub fn shutdown(mut self) -> Result<W, AuthorityError> {
        self.shutdown.store(true, Ordering::Release);
        let join = self.join.take().ok_or(AuthorityError::Panicked)?;
        let world = join.join().map_err(|_panic| AuthorityError::Panicked)?;
        info!("Authority thread stopped");
        Ok(world)
    }
}

impl<W> Drop for AuthorityThread<W> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

/// State owned by the authority thread's main loop.
struct TickLoop<W> {
    world: W,
    jobs: Receiver<Job<W>>,
    shutdown: Arc<AtomicBool>,
    tick: Arc<AtomicU64>,
    interval: Duration,
}

impl<W: Simulation> TickLoop<W> {
    /// Main loop. Runs until the shutdown flag is set or every handle is
    /// gone, then hands the simulation back to the joiner.
    fn run(mut self) -> W {
        let mut next_tick = Instant::now();

        while !self.shutdown.load(Ordering::Acquire) {
            let now = Instant::now();

            if now >= next_tick {
                // Only jobs already queued at the deadline run here, so
                // callers that resubmit immediately cannot hold off the tick.
                self.drain_queued();

                let tick = self.tick.load(Ordering::Relaxed).saturating_add(1);
                self.world.tick(tick);
                self.tick.store(tick, Ordering::Release);

                next_tick = now.checked_add(self.interval).unwrap_or(now);
                continue;
            }

            match self.jobs.recv_timeout(next_tick.saturating_duration_since(now)) {
                Ok(job) => self.execute(job),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("All authority handles dropped");
                    break;
                }
            }
        }

        debug!(
            ticks = self.tick.load(Ordering::Relaxed),
            "Authority tick loop exited"
        );
        self.world
    }

    fn drain_queued(&self) {
        for _ in 0..self.jobs.len() {
            match self.jobs.try_recv() {
                Ok(job) => self.execute(job),
                Err(_) => break,
            }
        }
    }

    /// Run one job to completion. A panicking job is contained here so it
    /// cannot take the simulation down with it.
    fn execute(&self, job: Job<W>) {
        let started = Instant::now();
        let world = &self.world;
        if catch_unwind(AssertUnwindSafe(|| job(world))).is_err() {
            error!("Authority job panicked, result discarded");
        }
        trace!(
            elapsed_us = started.elapsed().as_micros(),
            "Authority job finished"
        );
    }
}
