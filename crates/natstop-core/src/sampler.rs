//! Sampling loop: tick, fetch both reports, derive rates, publish.
//!
//! ## Lifecycle
//!
//! The first tick fires immediately, later ones every `poll_interval`
//! (late ticks are skipped, not bursted). The loop ends in exactly one of
//! three ways:
//! - the cancellation token is triggered: `Ok(())`, nothing more is published
//! - the receiver is dropped: `Ok(())`
//! - a fetch fails: `Err(MonitorError::Fetch)`; there is no internal retry
//!
//! [`monitor_stats`] rejects an unusable target with `MonitorError::Config`
//! before the first tick.
//!
//! Cancellation is observed while waiting for the tick, while requests are
//! in flight and while waiting for channel capacity.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::MonitorClient;
use crate::config::TargetConfig;
use crate::error::{ClientError, MonitorError};
use crate::model::{Connz, Varz};
use crate::rates::{RateSet, RateState, Sample};
use crate::source::StatsSource;

/// One published sampling result. Immutable once built.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub varz: Arc<Varz>,
    pub connz: Arc<Connz>,
    pub rates: RateSet,
    /// Wall-clock sampling time, strictly increasing within one loop.
    pub sampled_at: DateTime<Utc>,
    /// 1-based tick number within the loop that produced it.
    pub tick: u64,
}

/// Drives a [`StatsSource`] on a fixed cadence.
pub struct Sampler<S> {
    source: S,
    interval: Duration,
    rates: RateState,
    last_sampled_at: Option<DateTime<Utc>>,
    ticks: u64,
}

impl<S: StatsSource> Sampler<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self {
            source,
            interval,
            rates: RateState::default(),
            last_sampled_at: None,
            ticks: 0,
        }
    }

    /// Fetches both reports and builds the next snapshot without publishing.
    pub async fn sample_once(&mut self) -> Result<Snapshot, ClientError> {
        let (varz, connz) = tokio::try_join!(self.source.varz(), self.source.connz())?;
        let taken_at = Instant::now();

        let varz = Arc::new(varz);
        let connz = Arc::new(connz);
        let rates = self.rates.update(Sample {
            varz: Arc::clone(&varz),
            connz: Arc::clone(&connz),
            taken_at,
        });

        let mut sampled_at = Utc::now();
        if let Some(last) = self.last_sampled_at
            && sampled_at <= last
        {
            // Wall clock stepped back or did not advance.
            sampled_at = last + TimeDelta::microseconds(1);
        }
        self.last_sampled_at = Some(sampled_at);
        self.ticks += 1;

        Ok(Snapshot {
            varz,
            connz,
            rates,
            sampled_at,
            tick: self.ticks,
        })
    }

    /// Runs until `shutdown` fires, the receiver goes away, or a fetch fails.
    pub async fn run(
        mut self,
        tx: mpsc::Sender<Snapshot>,
        shutdown: CancellationToken,
    ) -> Result<(), MonitorError> {
        if self.interval.is_zero() {
            return Err(MonitorError::config("poll interval must be positive"));
        }

        let mut tick = tokio::time::interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tick.tick() => {}
            }

            let next_tick = self.ticks + 1;
            let t0 = Instant::now();
            let snapshot = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                result = self.sample_once() => match result {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        error!(error = %e, tick = next_tick, "fetch failed, stopping sampler");
                        return Err(e.into());
                    }
                },
            };

            let elapsed = t0.elapsed();
            if snapshot.tick == 1 {
                info!(
                    duration_ms = elapsed.as_millis() as u64,
                    connections = snapshot.varz.connections,
                    "first snapshot collected"
                );
            } else {
                debug!(
                    duration_ms = elapsed.as_millis() as u64,
                    tick = snapshot.tick,
                    "tick completed"
                );
            }
            if elapsed > self.interval / 2 {
                warn!(
                    duration_ms = elapsed.as_millis() as u64,
                    interval_ms = self.interval.as_millis() as u64,
                    "tick exceeded 50% of interval"
                );
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                sent = tx.send(snapshot) => {
                    if sent.is_err() {
                        debug!("snapshot receiver dropped, stopping sampler");
                        return Ok(());
                    }
                }
            }
        }

        info!(ticks = self.ticks, "sampler shut down");
        Ok(())
    }

    /// Starts [`run`](Self::run) on the tokio runtime.
    pub fn spawn(self, tx: mpsc::Sender<Snapshot>) -> SamplerHandle {
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(self.run(tx, shutdown.clone()));
        SamplerHandle { shutdown, task }
    }
}

/// Handle to a spawned sampling loop.
#[derive(Debug)]
pub struct SamplerHandle {
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), MonitorError>>,
}

impl SamplerHandle {
    /// Requests termination. Safe to call any number of times.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Waits for the loop to end and returns its result.
    pub async fn join(self) -> Result<(), MonitorError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(MonitorError::Task {
                message: e.to_string(),
            }),
        }
    }
}

/// Samples the target described by `config` until `shutdown` fires or a
/// fetch fails. Each call builds its own HTTP client.
pub async fn monitor_stats(
    config: &TargetConfig,
    tx: mpsc::Sender<Snapshot>,
    shutdown: CancellationToken,
) -> Result<(), MonitorError> {
    let client = MonitorClient::new(config).map_err(|e| MonitorError::config(e.to_string()))?;
    debug!(
        url = client.base_url(),
        interval_ms = config.poll_interval.as_millis() as u64,
        "starting sampler"
    );
    Sampler::new(client, config.poll_interval)
        .run(tx, shutdown)
        .await
}
