//! Stats manager event loop
//!
//! The manager owns every counter and ranking. A single task mutates them,
//! fed by one bounded queue per observed dimension:
//!
//! observe_* (any task)
//! bounded queues (try_send, never blocks)
//! ManagerLoop (select! over queues, flush timer, alert events, stop)
//! StatsSnapshot / AlertEvent
//! StatsSink
//!
//! Because only the loop touches the counters, no locks guard them. A flush
//! renders the snapshot and resets the window inside one loop iteration, so no
//! observation can land between the two.

use crate::metrics::alert::{AlertEvent, AlertMonitor, AlertParams};
use crate::metrics::error::MetricsError;
use crate::metrics::lifecycle::{Lifecycle, LifecycleState, LoopTask};
use crate::metrics::rate::RateCounter;
use crate::metrics::sink::StatsSink;
use crate::metrics::snapshot::StatsSnapshot;
use crate::metrics::topk::RankedTopK;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct ManagerParams {
    /// Alert evaluation cadence, also the alert's averaging window.
    pub alert_period: Duration,
    /// Stats window and display cadence.
    pub stats_period: Duration,
    /// Breadth of each top-K ranking.
    pub k: usize,
    /// Requests per second that trigger the high-traffic alert.
    pub threshold: f64,
    /// Capacity of each input queue.
    pub queue_capacity: usize,
    pub sink: Arc<dyn StatsSink>,
}

/// Status codes outside `[200, 400)` count as errors.
pub fn is_error_status(code: u16) -> bool {
    !(200..400).contains(&code)
}

struct Inputs {
    requests: mpsc::Sender<f64>,
    errors: mpsc::Sender<f64>,
    sections: mpsc::Sender<String>,
    users: mpsc::Sender<String>,
    status_codes: mpsc::Sender<String>,
}

pub struct StatsManager {
    lifecycle: Lifecycle,
    inputs: Inputs,
    alert: Arc<AlertMonitor>,
    stop_tx: watch::Sender<bool>,
    task: LoopTask<ManagerLoop>,
    dropped: Arc<AtomicU64>,
}

struct ManagerLoop {
    stats_period: Duration,
    sink: Arc<dyn StatsSink>,
    dropped: Arc<AtomicU64>,

    // Rates
    req_sec: RateCounter,
    req_sec_rx: mpsc::Receiver<f64>,
    err_sec: RateCounter,
    err_sec_rx: mpsc::Receiver<f64>,

    // Rankings
    sections: RankedTopK,
    sections_rx: mpsc::Receiver<String>,
    users: RankedTopK,
    users_rx: mpsc::Receiver<String>,
    status_codes: RankedTopK,
    status_codes_rx: mpsc::Receiver<String>,

    // Alerting
    alert: Arc<AlertMonitor>,
    alert_rx: broadcast::Receiver<AlertEvent>,

    stop_rx: watch::Receiver<bool>,
}

impl StatsManager {
    pub fn new(params: ManagerParams) -> Result<Self, MetricsError> {
        if params.stats_period.is_zero() {
            return Err(MetricsError::InvalidStatPeriod {
                period: params.stats_period,
            });
        }
        if params.queue_capacity == 0 {
            return Err(MetricsError::InvalidQueueCapacity {
                capacity: params.queue_capacity,
            });
        }

        let alert = Arc::new(AlertMonitor::new(AlertParams {
            window: params.alert_period,
            period: params.alert_period,
            threshold: params.threshold,
            queue_capacity: params.queue_capacity,
        })?);

        let cap = params.queue_capacity;
        let (requests, req_sec_rx) = mpsc::channel(cap);
        let (errors, err_sec_rx) = mpsc::channel(cap);
        let (sections, sections_rx) = mpsc::channel(cap);
        let (users, users_rx) = mpsc::channel(cap);
        let (status_codes, status_codes_rx) = mpsc::channel(cap);
        let (stop_tx, stop_rx) = watch::channel(false);
        let dropped = Arc::new(AtomicU64::new(0));

        let manager_loop = ManagerLoop {
            stats_period: params.stats_period,
            sink: params.sink,
            dropped: dropped.clone(),
            req_sec: RateCounter::new(params.stats_period)?,
            req_sec_rx,
            err_sec: RateCounter::new(params.stats_period)?,
            err_sec_rx,
            sections: RankedTopK::new(params.k)?,
            sections_rx,
            users: RankedTopK::new(params.k)?,
            users_rx,
            status_codes: RankedTopK::new(params.k)?,
            status_codes_rx,
            alert: alert.clone(),
            // Subscribe before anything can publish.
            alert_rx: alert.subscribe(),
            stop_rx,
        };

        Ok(Self {
            lifecycle: Lifecycle::new(),
            inputs: Inputs {
                requests,
                errors,
                sections,
                users,
                status_codes,
            },
            alert,
            stop_tx,
            task: LoopTask::new(manager_loop),
            dropped,
        })
    }

    /// Starts the event loop and the alert monitor. Must be called from within
    /// a Tokio runtime. Only the first call has an effect.
    pub fn start(&self) {
        if !self.lifecycle.try_start() {
            return;
        }
        self.task.spawn(ManagerLoop::run);
        self.alert.start();
        info!("stats manager started");
    }

    /// Signals the event loop and the alert monitor to exit. Idempotent; a
    /// no-op when the manager was never started.
    pub fn stop(&self) {
        if !self.lifecycle.try_stop() {
            return;
        }
        self.stop_tx.send_replace(true);
        self.alert.stop();
    }

    /// Resolves once both background loops have exited.
    pub async fn wait(&self) {
        self.task.join("stats").await;
        self.alert.wait().await;
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertEvent> {
        self.alert.subscribe()
    }

    pub fn observe_request(&self) {
        self.send(&self.inputs.requests, 1.0, "requests");
    }

    pub fn observe_section(&self, section: &str) {
        self.send(&self.inputs.sections, section.to_string(), "sections");
    }

    pub fn observe_user(&self, user: &str) {
        self.send(&self.inputs.users, user.to_string(), "users");
    }

    /// Ranks the status code and, when it is an error, counts it towards the
    /// error rate.
    pub fn observe_status_code(&self, code: u16) {
        if is_error_status(code) {
            self.send(&self.inputs.errors, 1.0, "errors");
        }
        self.send(&self.inputs.status_codes, code.to_string(), "status_codes");
    }

    fn send<T>(&self, tx: &mpsc::Sender<T>, value: T, input: &'static str) {
        if !self.lifecycle.is_running() {
            return;
        }
        match tx.try_send(value) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(input, "input queue full, observation dropped");
            }
            // Loop already exited; nothing left to count into.
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

impl ManagerLoop {
    async fn run(mut self) {
        let mut ticker = time::interval_at(Instant::now() + self.stats_period, self.stats_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut alerts_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.flush(),

                Some(value) = self.req_sec_rx.recv() => {
                    if let Err(e) = self.req_sec.incr_by(value) {
                        error!(error = %e, "cannot increment request rate");
                    }
                    self.alert.incr_by(value);
                }
                Some(value) = self.err_sec_rx.recv() => {
                    if let Err(e) = self.err_sec.incr_by(value) {
                        error!(error = %e, "cannot increment error rate");
                    }
                }

                Some(key) = self.sections_rx.recv() => {
                    if !self.sections.incr_by(&key, 1) {
                        error!(key = %key, "cannot increment section");
                    }
                }
                Some(key) = self.users_rx.recv() => {
                    if !self.users.incr_by(&key, 1) {
                        error!(key = %key, "cannot increment user");
                    }
                }
                Some(key) = self.status_codes_rx.recv() => {
                    if !self.status_codes.incr_by(&key, 1) {
                        error!(key = %key, "cannot increment status code");
                    }
                }

                received = self.alert_rx.recv(), if alerts_open => match received {
                    Ok(event) => self.sink.on_alert(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "alert queue overflowed, oldest alerts dropped");
                    }
                    Err(RecvError::Closed) => alerts_open = false,
                },

                _ = self.stop_rx.changed() => {
                    info!("exiting stats manager event loop");
                    return;
                }
            }
        }
    }

    fn flush(&mut self) {
        let snapshot = StatsSnapshot {
            window: self.stats_period,
            req_per_sec: self.req_sec.avg_per_sec(),
            err_per_sec: self.err_sec.avg_per_sec(),
            top_sections: self.sections.top_k(),
            top_status_codes: self.status_codes.top_k(),
            top_users: self.users.top_k(),
            dropped: self.dropped.swap(0, Ordering::Relaxed),
            taken_at: Utc::now(),
        };

        debug!(
            req_per_sec = snapshot.req_per_sec,
            err_per_sec = snapshot.err_per_sec,
            sections = self.sections.count(),
            users = self.users.count(),
            "stats window flushed"
        );

        self.sink.on_stats(&snapshot);
        self.reset_all();
    }

    fn reset_all(&mut self) {
        self.req_sec.reset();
        self.err_sec.reset();
        self.sections.reset();
        self.users.reset();
        self.status_codes.reset();
    }
}
