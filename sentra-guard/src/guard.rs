//! The cyclic guard runner.
//!
//! One cycle runs every check in order. Each check runs in its own task
//! with a timeout, so a hang or panic in one check only makes that check
//! inconclusive. Triggered checks become [`ThreatEvent`]s that are handed
//! to the sink in the background; a fatal event ends the session before
//! the next check starts, and the loop stops after that cycle.

use crate::check::{Check, CheckOutcome};
use crate::error::GuardError;
use crate::policy::SeverityPolicy;
use crate::sink::{SessionTerminator, ThreatSink};
use sentra_types::{Clock, SystemClock, ThreatEvent, ThreatKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for the guard loop.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Time between the start of two cycles.
    pub interval: Duration,
    /// Budget for a single check.
    pub check_timeout: Duration,
    /// Warn-level repeats that escalate to fatal.
    pub escalation_threshold: usize,
    /// Window the repeats are counted in.
    pub escalation_window: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            check_timeout: Duration::from_secs(2),
            escalation_threshold: 3,
            escalation_window: Duration::from_secs(60),
        }
    }
}

/// What one cycle observed.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Events emitted, in check order.
    pub events: Vec<ThreatEvent>,
    /// Checks that could not decide, with the reason.
    pub inconclusive: Vec<(ThreatKind, GuardError)>,
    /// Number of checks that ran to a verdict.
    pub completed: usize,
    /// Set when a fatal event ended the session in this cycle.
    pub fatal: Option<GuardError>,
    /// Set when cancellation stopped the cycle early.
    pub cancelled: bool,
}

impl CycleReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.events.is_empty()
    }
}

/// Runs the check battery on a fixed cadence.
pub struct Guard {
    checks: Vec<Arc<dyn Check>>,
    sink: Arc<dyn ThreatSink>,
    terminator: Arc<dyn SessionTerminator>,
    policy: Mutex<SeverityPolicy>,
    clock: Arc<dyn Clock>,
    config: GuardConfig,
    reports: Mutex<JoinSet<()>>,
}

impl Guard {
    pub fn new(
        config: GuardConfig,
        sink: Arc<dyn ThreatSink>,
        terminator: Arc<dyn SessionTerminator>,
    ) -> Self {
        Self {
            checks: Vec::new(),
            sink,
            terminator,
            policy: Mutex::new(SeverityPolicy::new(
                config.escalation_threshold,
                config.escalation_window,
            )),
            clock: Arc::new(SystemClock),
            config,
            reports: Mutex::new(JoinSet::new()),
        }
    }

    /// Appends a check to the battery.
    #[must_use]
    pub fn with_check(mut self, check: Arc<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    /// Appends several checks, keeping their order.
    #[must_use]
    pub fn with_checks(mut self, checks: impl IntoIterator<Item = Arc<dyn Check>>) -> Self {
        self.checks.extend(checks);
        self
    }

    /// Replaces the clock used to timestamp events.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Kinds of the configured checks, in run order.
    pub fn check_kinds(&self) -> Vec<ThreatKind> {
        self.checks.iter().map(|c| c.kind()).collect()
    }

    /// Runs every check once.
    ///
    /// Cancellation is observed between checks; a check already running is
    /// allowed to finish.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();
        for check in &self.checks {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let kind = check.kind();
            let outcome = match self.run_isolated(check).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    debug!(check = check.name(), error = %e, "check inconclusive");
                    report.inconclusive.push((kind, e));
                    continue;
                }
            };
            report.completed += 1;
            if !outcome.triggered {
                continue;
            }

            let severity = self
                .policy
                .lock()
                .await
                .classify(kind, tokio::time::Instant::now());
            let event = ThreatEvent::new(kind, outcome.details, self.clock.now(), severity);
            debug!(kind = %kind, severity = ?severity, "check triggered");
            self.dispatch(event.clone()).await;

            if event.is_fatal() {
                if self.terminator.terminate_for_tamper().await {
                    warn!("session ended by the guard");
                }
                if report.fatal.is_none() {
                    report.fatal = Some(GuardError::for_fatal(&event));
                }
            }
            report.events.push(event);
        }
        report
    }

    /// Runs cycles every [`GuardConfig::interval`] until cancelled or until a
    /// cycle ends the session, then waits for reports still in flight.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.run_cycle(&cancel).await;
                    debug!(
                        events = report.events.len(),
                        inconclusive = report.inconclusive.len(),
                        "guard cycle finished"
                    );
                    if let Some(fatal) = report.fatal {
                        warn!(error = %fatal, "guard stopping after a fatal finding");
                        break;
                    }
                }
            }
        }
        self.flush_reports().await;
        debug!("guard stopped");
    }

    /// Waits until every report dispatched so far has been delivered or
    /// failed. Reports dispatched meanwhile are not waited for.
    pub async fn flush_reports(&self) {
        let mut reports = std::mem::take(&mut *self.reports.lock().await);
        while let Some(joined) = reports.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "threat report task failed");
            }
        }
    }

    async fn run_isolated(&self, check: &Arc<dyn Check>) -> Result<CheckOutcome, GuardError> {
        let running = Arc::clone(check);
        let mut task = tokio::spawn(async move { running.run().await });
        match tokio::time::timeout(self.config.check_timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(GuardError::Probe(format!(
                "{} check aborted: {join_error}",
                check.name()
            ))),
            Err(_) => {
                task.abort();
                Err(GuardError::CheckTimeout(check.name().to_string()))
            }
        }
    }

    async fn dispatch(&self, event: ThreatEvent) {
        let sink = Arc::clone(&self.sink);
        let mut reports = self.reports.lock().await;
        // Reap finished deliveries so the set does not grow without bound.
        while reports.try_join_next().is_some() {}
        reports.spawn(async move {
            if let Err(e) = sink.report(&event).await {
                warn!(error = %e, "threat report not delivered");
            }
        });
    }
}
