//! Periodic announcement scheduler.
//!
//! Fires once immediately, then once per interval until stopped. Deadlines
//! are laid out from the start time, so slow ticks don't push later ones.
//! Stopping never interrupts a tick that is already running.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Scheduler {
    task: Option<JoinHandle<()>>,
    token: Option<CancellationToken>,
    count: Arc<AtomicU32>,
    next_run: Arc<Mutex<Option<DateTime<Local>>>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            task: None,
            token: None,
            count: Arc::new(AtomicU32::new(0)),
            next_run: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Ticks fired since the last start, including the immediate one.
    pub fn tick_count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn next_run(&self) -> Option<DateTime<Local>> {
        *self.next_run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `on_tick` now, then every `period`. Stops any previous run first.
    pub async fn start<F, Fut>(&mut self, period: Duration, on_tick: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        self.stop().await;
        self.count.store(0, Ordering::Relaxed);

        let token = CancellationToken::new();
        self.token = Some(token.clone());
        info!("Scheduling announcements every {:.2}h", period.as_secs_f64() / 3600.0);

        self.count.fetch_add(1, Ordering::Relaxed);
        on_tick().await;

        let first = Instant::now() + period;
        set_next_run(&self.next_run, period);

        let count = self.count.clone();
        let next_run = self.next_run.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let n = count.fetch_add(1, Ordering::Relaxed) + 1;
                debug!("Scheduled tick #{n}");
                on_tick().await;
                set_next_run(&next_run, period);
            }
            debug!("Scheduler loop exited");
        });

        self.task = Some(handle);
    }

    /// Cancel future ticks and wait for a running one to finish.
    /// Returns how many ticks fired.
    pub async fn stop(&mut self) -> u32 {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        if let Some(handle) = self.task.take() {
            if let Err(e) = handle.await {
                warn!("Scheduler task ended abnormally: {e}");
            }
            info!("Announcements stopped");
        }
        *self.next_run.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.count.load(Ordering::Relaxed)
    }
}

fn set_next_run(slot: &Mutex<Option<DateTime<Local>>>, period: Duration) {
    let next = chrono::Duration::from_std(period)
        .ok()
        .and_then(|d| Local::now().checked_add_signed(d));
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = next;
}
