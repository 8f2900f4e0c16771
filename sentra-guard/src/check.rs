//! The individual checks run by the guard.
//!
//! Each check answers one question about the process and returns a
//! [`CheckOutcome`]. An `Err` means the check could not decide; the guard
//! treats it as inconclusive and emits no event.

use crate::error::GuardResult;
use crate::probe::SystemProbe;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentra_types::{Clock, SystemClock, ThreatKind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Result of one check: whether it fired and what it saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub triggered: bool,
    pub details: String,
}

impl CheckOutcome {
    /// Nothing suspicious.
    #[must_use]
    pub fn clear() -> Self {
        Self {
            triggered: false,
            details: String::new(),
        }
    }

    /// The check fired.
    pub fn triggered(details: impl Into<String>) -> Self {
        Self {
            triggered: true,
            details: details.into(),
        }
    }
}

/// One independent anti-tamper check.
#[async_trait]
pub trait Check: Send + Sync {
    /// Short name used in logs and timeout errors.
    fn name(&self) -> &'static str;

    /// The threat kind reported when this check fires.
    fn kind(&self) -> ThreatKind;

    /// Runs the check once.
    async fn run(&self) -> GuardResult<CheckOutcome>;
}

// ── Timing ───────────────────────────────────────────────────────

/// Rounds of the reference workload. Enough that any working monotonic
/// clock advances across it.
const REFERENCE_ROUNDS: u64 = 10_000;

fn reference_workload() {
    let mut acc = 0u64;
    for i in 0..REFERENCE_ROUNDS {
        acc = std::hint::black_box(acc.wrapping_add(i));
    }
    std::hint::black_box(acc);
}

/// Times a trivial operation against a fixed reference workload.
///
/// Fires when the monotonic clock runs backward, when the reference
/// workload measures as taking no time at all (a frozen or hooked time
/// source), or when the probe is implausibly slow, as under
/// single-stepping.
pub struct TimingCheck {
    max_elapsed: Duration,
    probe: Arc<dyn Fn() + Send + Sync>,
    reference: Arc<dyn Fn() + Send + Sync>,
    now: Arc<dyn Fn() -> Instant + Send + Sync>,
}

impl TimingCheck {
    pub fn new(max_elapsed: Duration) -> Self {
        Self {
            max_elapsed,
            probe: Arc::new(|| {
                std::hint::black_box(0u64);
            }),
            reference: Arc::new(reference_workload),
            now: Arc::new(Instant::now),
        }
    }

    /// Replaces the timed operation.
    #[must_use]
    pub fn with_probe(mut self, probe: impl Fn() + Send + Sync + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    /// Replaces the monotonic time source.
    #[must_use]
    pub fn with_time_source(mut self, now: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        self.now = Arc::new(now);
        self
    }

    fn measure(&self, op: &(dyn Fn() + Send + Sync)) -> Option<Duration> {
        let start = (self.now)();
        op();
        let end = (self.now)();
        end.checked_duration_since(start)
    }
}

#[async_trait]
impl Check for TimingCheck {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn kind(&self) -> ThreatKind {
        ThreatKind::Timing
    }

    async fn run(&self) -> GuardResult<CheckOutcome> {
        let Some(reference) = self.measure(self.reference.as_ref()) else {
            return Ok(CheckOutcome::triggered("monotonic clock went backward"));
        };
        if reference.is_zero() {
            return Ok(CheckOutcome::triggered(
                "monotonic clock did not advance across the reference workload",
            ));
        }

        Ok(match self.measure(self.probe.as_ref()) {
            None => CheckOutcome::triggered("monotonic clock went backward"),
            Some(elapsed) if elapsed > self.max_elapsed => CheckOutcome::triggered(format!(
                "probe took {}us (limit {}us)",
                elapsed.as_micros(),
                self.max_elapsed.as_micros()
            )),
            Some(_) => CheckOutcome::clear(),
        })
    }
}

// ── System clock ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct ClockSample {
    wall: DateTime<Utc>,
    mono: tokio::time::Instant,
}

/// Compares wall-clock advance against monotonic advance between runs and
/// fires on a backward wall jump or drift beyond the tolerance.
pub struct SystemClockCheck {
    clock: Arc<dyn Clock>,
    tolerance: Duration,
    last: Mutex<Option<ClockSample>>,
}

impl SystemClockCheck {
    pub fn new(tolerance: Duration) -> Self {
        Self::with_clock(Arc::new(SystemClock), tolerance)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, tolerance: Duration) -> Self {
        Self {
            clock,
            tolerance,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Check for SystemClockCheck {
    fn name(&self) -> &'static str {
        "system_clock"
    }

    fn kind(&self) -> ThreatKind {
        ThreatKind::SystemClockManipulation
    }

    async fn run(&self) -> GuardResult<CheckOutcome> {
        let sample = ClockSample {
            wall: self.clock.now(),
            mono: tokio::time::Instant::now(),
        };
        let Some(prev) = self.last.lock().await.replace(sample) else {
            return Ok(CheckOutcome::clear());
        };

        let wall_ms = (sample.wall - prev.wall).num_milliseconds();
        let mono_ms = i64::try_from(sample.mono.duration_since(prev.mono).as_millis())
            .unwrap_or(i64::MAX);
        if wall_ms < 0 {
            return Ok(CheckOutcome::triggered(format!(
                "wall clock moved backward by {}ms",
                -wall_ms
            )));
        }
        let drift_ms = (wall_ms - mono_ms).abs();
        let tolerance_ms = i64::try_from(self.tolerance.as_millis()).unwrap_or(i64::MAX);
        if drift_ms > tolerance_ms {
            return Ok(CheckOutcome::triggered(format!(
                "wall clock drifted {drift_ms}ms from monotonic time"
            )));
        }
        Ok(CheckOutcome::clear())
    }
}

// ── Deny-lists ───────────────────────────────────────────────────

/// Case-insensitive fragment match of `names` against `denylist`.
fn denied<'a>(names: &'a [String], denylist: &[String]) -> Vec<&'a str> {
    let fragments: Vec<String> = denylist
        .iter()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect();
    names
        .iter()
        .filter(|name| {
            let name = name.to_lowercase();
            fragments.iter().any(|f| name.contains(f.as_str()))
        })
        .map(String::as_str)
        .collect()
}

/// Fires when a loaded module matches the module deny-list.
pub struct InjectedCodeCheck {
    probe: Arc<dyn SystemProbe>,
    denylist: Vec<String>,
}

impl InjectedCodeCheck {
    pub fn new(probe: Arc<dyn SystemProbe>, denylist: Vec<String>) -> Self {
        Self { probe, denylist }
    }
}

#[async_trait]
impl Check for InjectedCodeCheck {
    fn name(&self) -> &'static str {
        "injected_code"
    }

    fn kind(&self) -> ThreatKind {
        ThreatKind::InjectedCode
    }

    async fn run(&self) -> GuardResult<CheckOutcome> {
        let modules = self.probe.list_modules().await?;
        let hits = denied(&modules, &self.denylist);
        if hits.is_empty() {
            return Ok(CheckOutcome::clear());
        }
        Ok(CheckOutcome::triggered(format!(
            "unexpected modules loaded: {}",
            hits.join(", ")
        )))
    }
}

/// Fires when a running process matches the process deny-list.
pub struct SuspiciousProcessCheck {
    probe: Arc<dyn SystemProbe>,
    denylist: Vec<String>,
}

impl SuspiciousProcessCheck {
    pub fn new(probe: Arc<dyn SystemProbe>, denylist: Vec<String>) -> Self {
        Self { probe, denylist }
    }
}

#[async_trait]
impl Check for SuspiciousProcessCheck {
    fn name(&self) -> &'static str {
        "suspicious_process"
    }

    fn kind(&self) -> ThreatKind {
        ThreatKind::SuspiciousProcess
    }

    async fn run(&self) -> GuardResult<CheckOutcome> {
        let processes = self.probe.list_processes().await?;
        let hits = denied(&processes, &self.denylist);
        if hits.is_empty() {
            return Ok(CheckOutcome::clear());
        }
        Ok(CheckOutcome::triggered(format!(
            "suspicious processes running: {}",
            hits.join(", ")
        )))
    }
}

// ── Integrity ────────────────────────────────────────────────────

/// Compares the digest of the running binary with a known-good value.
///
/// Without a configured value, the first digest observed becomes the
/// baseline and later runs are compared against it.
pub struct IntegrityCheck {
    probe: Arc<dyn SystemProbe>,
    expected: Mutex<Option<String>>,
}

impl IntegrityCheck {
    pub fn new(probe: Arc<dyn SystemProbe>, expected: Option<String>) -> Self {
        Self {
            probe,
            expected: Mutex::new(expected.map(|d| d.trim().to_ascii_lowercase())),
        }
    }
}

#[async_trait]
impl Check for IntegrityCheck {
    fn name(&self) -> &'static str {
        "integrity"
    }

    fn kind(&self) -> ThreatKind {
        ThreatKind::IntegrityMismatch
    }

    async fn run(&self) -> GuardResult<CheckOutcome> {
        let actual = self.probe.hash_self().await?.to_ascii_lowercase();
        let mut expected = self.expected.lock().await;
        match expected.as_deref() {
            None => {
                *expected = Some(actual);
                Ok(CheckOutcome::clear())
            }
            Some(known) if known == actual => Ok(CheckOutcome::clear()),
            Some(known) => Ok(CheckOutcome::triggered(format!(
                "binary digest {actual} does not match {known}"
            ))),
        }
    }
}

// ── Virtualization ───────────────────────────────────────────────

/// Fires when the probe reports virtualization or sandbox indicators.
pub struct VmCheck {
    probe: Arc<dyn SystemProbe>,
}

impl VmCheck {
    pub fn new(probe: Arc<dyn SystemProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl Check for VmCheck {
    fn name(&self) -> &'static str {
        "virtual_machine"
    }

    fn kind(&self) -> ThreatKind {
        ThreatKind::VirtualMachine
    }

    async fn run(&self) -> GuardResult<CheckOutcome> {
        let signals = self.probe.vm_signals().await?;
        if signals.is_empty() {
            return Ok(CheckOutcome::clear());
        }
        Ok(CheckOutcome::triggered(signals.join("; ")))
    }
}

// ── Battery ──────────────────────────────────────────────────────

/// Settings for the standard battery of checks.
#[derive(Debug, Clone)]
pub struct BatteryConfig {
    pub timing_probe_max: Duration,
    pub clock_drift_tolerance: Duration,
    pub module_denylist: Vec<String>,
    pub process_denylist: Vec<String>,
    pub expected_digest: Option<String>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            timing_probe_max: Duration::from_millis(50),
            clock_drift_tolerance: Duration::from_secs(2),
            module_denylist: Vec::new(),
            process_denylist: Vec::new(),
            expected_digest: None,
        }
    }
}

/// The full battery, in the order the guard runs it.
pub fn standard_battery(
    probe: Arc<dyn SystemProbe>,
    clock: Arc<dyn Clock>,
    config: &BatteryConfig,
) -> Vec<Arc<dyn Check>> {
    vec![
        Arc::new(TimingCheck::new(config.timing_probe_max)),
        Arc::new(SystemClockCheck::with_clock(
            clock,
            config.clock_drift_tolerance,
        )),
        Arc::new(InjectedCodeCheck::new(
            probe.clone(),
            config.module_denylist.clone(),
        )),
        Arc::new(SuspiciousProcessCheck::new(
            probe.clone(),
            config.process_denylist.clone(),
        )),
        Arc::new(IntegrityCheck::new(
            probe.clone(),
            config.expected_digest.clone(),
        )),
        Arc::new(VmCheck::new(probe)),
    ]
}
