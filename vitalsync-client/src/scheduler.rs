//! Generation-scoped fixed-interval scheduling.
//!
//! A schedule fires its tick immediately, then on a fixed period measured
//! from invocation time, not from tick completion. Each tick runs as its own
//! task, so a slow fetch never delays the period and overlapping fetches are
//! possible; commit-time generation comparison is what keeps overlap
//! harmless.
//!
//! `stop` is cooperative: it aborts the tickers for a generation, which
//! halts future ticks only. Tick tasks already in flight run to completion
//! and die at the generation guard.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::session::Generation;

/// Runs immediate-then-fixed-interval schedules, keyed by session
/// generation.
#[derive(Debug, Default)]
pub struct PollScheduler {
    tickers: Mutex<Vec<(Generation, JoinHandle<()>)>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a schedule: fire `tick` now, then every `period`.
    pub async fn start<F, Fut>(&self, generation: Generation, period: Duration, tick: F)
    where
        F: Fn(Generation) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        log::debug!(
            "[Scheduler] Starting schedule for generation {} every {:?}",
            generation,
            period
        );
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately.
                interval.tick().await;
                tokio::spawn(tick(generation));
            }
        });
        self.tickers.lock().await.push((generation, ticker));
    }

    /// Cancel pending timers for `generation`. In-flight ticks keep running.
    pub async fn stop(&self, generation: Generation) {
        let mut tickers = self.tickers.lock().await;
        tickers.retain(|(scheduled, handle)| {
            if *scheduled == generation {
                handle.abort();
                false
            } else {
                true
            }
        });
        log::debug!("[Scheduler] Stopped schedules for generation {}", generation);
    }

    /// Cancel every pending timer regardless of generation.
    pub async fn stop_all(&self) {
        let mut tickers = self.tickers.lock().await;
        for (_, handle) in tickers.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        // Mutex is uncontended here; abort whatever is still scheduled.
        if let Ok(mut tickers) = self.tickers.try_lock() {
            for (_, handle) in tickers.drain(..) {
                handle.abort();
            }
        }
    }
}
