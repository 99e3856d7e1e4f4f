use crate::metrics::alert::event::AlertEvent;
use crate::metrics::alert::state::ThresholdAlert;
use crate::metrics::constants::ALERT_QUEUE_CAPACITY;
use crate::metrics::error::MetricsError;
use crate::metrics::lifecycle::{Lifecycle, LifecycleState, LoopTask};
use crate::metrics::rate::RateCounter;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct AlertParams {
    /// Averaging window of the watched rate.
    pub window: Duration,
    /// Evaluation cadence. The rate is reset after every evaluation.
    pub period: Duration,
    /// Requests per second at or above which the alert fires.
    pub threshold: f64,
    /// Capacity of the increment queue feeding the alert loop.
    pub queue_capacity: usize,
}

/// Watches a request rate and publishes [`AlertEvent`]s on threshold crossings.
///
/// The rate counter and the hysteresis state live inside a dedicated task.
/// Callers only talk to it through queues:
/// - increments go in through a bounded queue with a non-blocking send
/// - alert events come out through a bounded broadcast queue that drops the
///   oldest event when a subscriber falls behind, so the evaluator never blocks
pub struct AlertMonitor {
    lifecycle: Lifecycle,
    incr_tx: mpsc::Sender<f64>,
    events_tx: broadcast::Sender<AlertEvent>,
    stop_tx: watch::Sender<bool>,
    task: LoopTask<AlertLoop>,
    dropped: AtomicU64,
}

struct AlertLoop {
    counter: RateCounter,
    alert: ThresholdAlert,
    period: Duration,
    incr_rx: mpsc::Receiver<f64>,
    stop_rx: watch::Receiver<bool>,
    events_tx: broadcast::Sender<AlertEvent>,
}

impl AlertMonitor {
    pub fn new(params: AlertParams) -> Result<Self, MetricsError> {
        if params.period.is_zero() {
            return Err(MetricsError::InvalidAlertPeriod {
                period: params.period,
            });
        }
        if params.window.is_zero() {
            return Err(MetricsError::InvalidStatPeriod {
                period: params.window,
            });
        }
        if params.threshold.is_nan() || params.threshold < 0.0 {
            return Err(MetricsError::InvalidThreshold {
                threshold: params.threshold,
            });
        }
        if params.queue_capacity == 0 {
            return Err(MetricsError::InvalidQueueCapacity {
                capacity: params.queue_capacity,
            });
        }

        let counter = RateCounter::new(params.window)?;
        let (incr_tx, incr_rx) = mpsc::channel(params.queue_capacity);
        let (events_tx, _) = broadcast::channel(ALERT_QUEUE_CAPACITY);
        let (stop_tx, stop_rx) = watch::channel(false);

        let alert_loop = AlertLoop {
            counter,
            alert: ThresholdAlert::new(params.threshold),
            period: params.period,
            incr_rx,
            stop_rx,
            events_tx: events_tx.clone(),
        };

        Ok(Self {
            lifecycle: Lifecycle::new(),
            incr_tx,
            events_tx,
            stop_tx,
            task: LoopTask::new(alert_loop),
            dropped: AtomicU64::new(0),
        })
    }

    /// New receiver for alert events. Only events published after this call
    /// are delivered to it.
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.events_tx.subscribe()
    }

    /// Starts the evaluation loop. Must be called from within a Tokio runtime.
    /// Calling it again is a no-op.
    pub fn start(&self) {
        if !self.lifecycle.try_start() {
            return;
        }
        self.task.spawn(AlertLoop::run);
    }

    /// Stops the evaluation loop. Idempotent, and a no-op before `start`.
    pub fn stop(&self) {
        if !self.lifecycle.try_stop() {
            return;
        }
        self.stop_tx.send_replace(true);
    }

    /// Resolves once the evaluation loop has exited.
    pub async fn wait(&self) {
        self.task.join("alert").await;
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Forwards an increment to the evaluation loop.
    ///
    /// Never blocks: ignored when the monitor is not running, dropped (and
    /// counted) when the queue is full.
    pub fn incr_by(&self, value: f64) {
        if !self.lifecycle.is_running() {
            return;
        }
        match self.incr_tx.try_send(value) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(dropped, "alert queue full, increment dropped");
            }
            // Loop already gone.
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Increments dropped because the queue was full, since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AlertLoop {
    async fn run(mut self) {
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_threshold();
                    self.counter.reset();
                }
                Some(value) = self.incr_rx.recv() => {
                    if let Err(e) = self.counter.incr_by(value) {
                        warn!(error = %e, "rejected alert increment");
                    }
                }
                _ = self.stop_rx.changed() => {
                    info!("alert event loop exit");
                    return;
                }
            }
        }
    }

    fn check_threshold(&mut self) {
        let avg = self.counter.avg_per_sec();

        let Some(event) = self.alert.evaluate(avg, Utc::now()) else {
            return;
        };

        info!(
            kind = event.kind.tag(),
            value = event.value,
            threshold = self.alert.threshold(),
            "alert state changed"
        );

        if self.events_tx.send(event).is_err() {
            debug!("alert event published with no subscribers");
        }
    }
}
