//! Throttled probe scheduler
//!
//! Runs `concurrency` worker loops over one shared [`Enumerator`]. Each loop
//! pulls a candidate, probes it, classifies the answer, hands the record to
//! the sink and then waits on the throttle before pulling again. The run
//! ends when every loop has seen the enumerator exhausted, or when a
//! shutdown is requested.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::timeout;

use crate::error::{Result, SniperError};
use crate::keyspace::Enumerator;
use crate::oracle::{classify, ExistenceOracle};
use crate::sink::ResultSink;
use crate::throttle::Throttle;
use crate::types::{ProbeOutcome, ProbeRecord, ProgressSnapshot};

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of concurrent worker loops
    pub concurrency: usize,
    /// Upper bound on a single oracle call
    pub probe_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            probe_timeout: Duration::from_secs(10),
        }
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// The keyspace was exhausted and every worker has finished
    AllWorkersExhausted,
    /// A shutdown was requested before the keyspace was exhausted
    Cancelled,
}

/// What a finished run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub state: RunState,
    pub issued: u64,
    pub total: u64,
    pub taken: u64,
    pub free: u64,
    pub indeterminate: u64,
    pub sink_failures: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Number of candidates that received an outcome
    pub fn completed(&self) -> u64 {
        self.taken + self.free + self.indeterminate
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == RunState::AllWorkersExhausted
    }
}

/// Counters shared by all workers
#[derive(Debug, Default)]
pub struct ProbeStats {
    issued: AtomicU64,
    taken: AtomicU64,
    free: AtomicU64,
    indeterminate: AtomicU64,
    sink_failures: AtomicU64,
}

impl ProbeStats {
    fn record_issued(&self) {
        self.issued.fetch_add(1, Ordering::Relaxed);
    }

    fn record_outcome(&self, outcome: &ProbeOutcome) {
        let counter = match outcome {
            ProbeOutcome::Taken(_) => &self.taken,
            ProbeOutcome::Free(_) => &self.free,
            ProbeOutcome::Indeterminate(_) => &self.indeterminate,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    pub fn taken(&self) -> u64 {
        self.taken.load(Ordering::Relaxed)
    }

    pub fn free(&self) -> u64 {
        self.free.load(Ordering::Relaxed)
    }

    pub fn indeterminate(&self) -> u64 {
        self.indeterminate.load(Ordering::Relaxed)
    }

    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.taken() + self.free() + self.indeterminate()
    }
}

/// Requests a running scheduler to stop pulling new candidates
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Called with every delivered record and the progress at that moment
pub type RecordObserver = Arc<dyn Fn(&ProbeRecord, &ProgressSnapshot) + Send + Sync>;

/// Drives a bounded number of concurrent probes over a keyspace
pub struct ProbeScheduler {
    enumerator: Mutex<Enumerator>,
    total: u64,
    oracle: Arc<dyn ExistenceOracle>,
    sink: Arc<dyn ResultSink>,
    throttle: Arc<dyn Throttle>,
    config: SchedulerConfig,
    stats: ProbeStats,
    shutdown: Arc<watch::Sender<bool>>,
    observer: Option<RecordObserver>,
}

impl ProbeScheduler {
    /// Create a scheduler; rejects a zero concurrency or zero timeout
    pub fn new(
        enumerator: Enumerator,
        oracle: Arc<dyn ExistenceOracle>,
        sink: Arc<dyn ResultSink>,
        throttle: Arc<dyn Throttle>,
        config: SchedulerConfig,
    ) -> Result<Self> {
        if config.concurrency == 0 {
            return Err(SniperError::config("Concurrency must be at least 1"));
        }
        if config.probe_timeout.is_zero() {
            return Err(SniperError::config("Probe timeout must be greater than zero"));
        }

        let total = enumerator.total();
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            enumerator: Mutex::new(enumerator),
            total,
            oracle,
            sink,
            throttle,
            config,
            stats: ProbeStats::default(),
            shutdown: Arc::new(shutdown),
            observer: None,
        })
    }

    /// Attach a callback invoked after each record reaches the sink
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&ProbeRecord, &ProgressSnapshot) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown),
        }
    }

    pub fn stats(&self) -> &ProbeStats {
        &self.stats
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Run every worker loop to completion
    pub async fn run(&self) -> RunSummary {
        let started = Instant::now();

        tracing::info!(
            total = self.total,
            concurrency = self.config.concurrency,
            oracle = %self.oracle.name(),
            throttle = %self.throttle.describe(),
            "Starting keyspace scan"
        );

        let workers = (0..self.config.concurrency).map(|id| self.worker_loop(id, started));
        join_all(workers).await;

        let exhausted = self.enumerator.lock().is_exhausted();
        let state = if exhausted {
            RunState::AllWorkersExhausted
        } else {
            RunState::Cancelled
        };

        let summary = RunSummary {
            state,
            issued: self.stats.issued(),
            total: self.total,
            taken: self.stats.taken(),
            free: self.stats.free(),
            indeterminate: self.stats.indeterminate(),
            sink_failures: self.stats.sink_failures(),
            elapsed: started.elapsed(),
        };

        tracing::info!(
            state = ?summary.state,
            issued = summary.issued,
            taken = summary.taken,
            free = summary.free,
            indeterminate = summary.indeterminate,
            sink_failures = summary.sink_failures,
            elapsed_ms = %summary.elapsed.as_millis(),
            "Keyspace scan finished"
        );

        summary
    }

    async fn worker_loop(&self, worker: usize, started: Instant) {
        let mut shutdown = self.shutdown.subscribe();

        loop {
            if *shutdown.borrow() {
                tracing::debug!(worker, "Worker stopping on shutdown");
                break;
            }

            let Some(candidate) = self.next_candidate() else {
                tracing::debug!(worker, "Worker found keyspace exhausted");
                break;
            };

            self.probe_and_deliver(worker, candidate, started).await;

            tokio::select! {
                _ = self.throttle.pace() => {}
                _ = shutdown.changed() => {}
            }
        }
    }

    /// Serialized entry point to the enumerator
    fn next_candidate(&self) -> Option<String> {
        let candidate = self.enumerator.lock().next()?;
        self.stats.record_issued();
        Some(candidate)
    }

    async fn probe_and_deliver(&self, worker: usize, candidate: String, started: Instant) {
        let probe_start = Instant::now();
        let timeout_ms = self.config.probe_timeout.as_millis() as u64;

        let response = match timeout(self.config.probe_timeout, self.oracle.probe(&candidate)).await {
            Ok(response) => response,
            Err(_) => Err(SniperError::timeout("probe", timeout_ms)),
        };
        let outcome = classify(&response);
        let duration = probe_start.elapsed();

        self.stats.record_outcome(&outcome);
        log_outcome(worker, &candidate, &outcome, duration);

        let record = ProbeRecord::new(candidate, &outcome, duration);
        if let Err(e) = self.sink.append(&record).await {
            self.stats.record_sink_failure();
            tracing::warn!(
                worker,
                candidate = %record.candidate,
                classification = %record.classification,
                error = %e,
                "Failed to persist probe record"
            );
        }

        if let Some(observer) = &self.observer {
            observer(&record, &self.progress(started));
        }
    }

    /// Progress relative to `started`
    pub fn progress(&self, started: Instant) -> ProgressSnapshot {
        let elapsed = started.elapsed();
        let completed = self.stats.completed();

        let probes_per_second = if elapsed.as_secs_f64() > 0.0 {
            completed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let estimated_remaining =
            estimate_remaining(self.total.saturating_sub(completed), probes_per_second);

        ProgressSnapshot {
            issued: self.stats.issued(),
            completed,
            total: self.total,
            taken: self.stats.taken(),
            free: self.stats.free(),
            indeterminate: self.stats.indeterminate(),
            sink_failures: self.stats.sink_failures(),
            elapsed,
            probes_per_second,
            estimated_remaining,
        }
    }
}

/// Time left at the current rate; `None` when there is no rate yet or the
/// estimate does not fit in a `Duration`
fn estimate_remaining(remaining: u64, probes_per_second: f64) -> Option<Duration> {
    if probes_per_second <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(remaining as f64 / probes_per_second).ok()
}

fn log_outcome(worker: usize, candidate: &str, outcome: &ProbeOutcome, duration: Duration) {
    let duration_ms = duration.as_millis() as u64;
    match outcome {
        ProbeOutcome::Taken(status) => {
            tracing::info!(worker, candidate = %candidate, status, duration_ms, "Handle is taken");
        }
        ProbeOutcome::Free(status) => {
            tracing::info!(worker, candidate = %candidate, status, duration_ms, "Handle is free");
        }
        ProbeOutcome::Indeterminate(reason) => {
            tracing::warn!(worker, candidate = %candidate, reason = %reason, duration_ms, "Probe indeterminate");
        }
    }
}
