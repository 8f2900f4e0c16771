//! Test doubles for guard tests.

#![allow(dead_code)]

use async_trait::async_trait;
use sentra_guard::{
    Check, CheckOutcome, GuardError, GuardResult, SessionTerminator, SystemProbe, ThreatSink,
};
use sentra_types::{ThreatEvent, ThreatKind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A probe whose answers are set by the test.
#[derive(Default)]
pub struct FakeProbe {
    pub modules: Mutex<Vec<String>>,
    pub processes: Mutex<Vec<String>>,
    pub digest: Mutex<String>,
    pub vm: Mutex<Vec<String>>,
    pub failing: AtomicBool,
}

impl FakeProbe {
    pub fn clean() -> Arc<Self> {
        let probe = Self::default();
        *probe.modules.lock().unwrap() = vec!["libc.so.6".into(), "sentra".into()];
        *probe.processes.lock().unwrap() = vec!["systemd".into(), "sentra".into()];
        *probe.digest.lock().unwrap() = "aa".repeat(32);
        Arc::new(probe)
    }

    pub fn set_digest(&self, digest: &str) {
        *self.digest.lock().unwrap() = digest.to_string();
    }

    pub fn add_module(&self, name: &str) {
        self.modules.lock().unwrap().push(name.to_string());
    }

    pub fn add_process(&self, name: &str) {
        self.processes.lock().unwrap().push(name.to_string());
    }

    pub fn set_vm(&self, signals: &[&str]) {
        *self.vm.lock().unwrap() = signals.iter().map(|s| s.to_string()).collect();
    }

    fn check_failing(&self) -> GuardResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GuardError::Probe("probe offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SystemProbe for FakeProbe {
    async fn list_modules(&self) -> GuardResult<Vec<String>> {
        self.check_failing()?;
        Ok(self.modules.lock().unwrap().clone())
    }

    async fn list_processes(&self) -> GuardResult<Vec<String>> {
        self.check_failing()?;
        Ok(self.processes.lock().unwrap().clone())
    }

    async fn hash_self(&self) -> GuardResult<String> {
        self.check_failing()?;
        Ok(self.digest.lock().unwrap().clone())
    }

    async fn vm_signals(&self) -> GuardResult<Vec<String>> {
        self.check_failing()?;
        Ok(self.vm.lock().unwrap().clone())
    }
}

/// Records every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ThreatEvent>>,
    pub fail: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        Arc::new(sink)
    }

    pub fn events(&self) -> Vec<ThreatEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThreatSink for RecordingSink {
    async fn report(&self, event: &ThreatEvent) -> GuardResult<()> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(GuardError::Report("sink unreachable".into()));
        }
        Ok(())
    }
}

/// Counts tamper terminations.
#[derive(Default)]
pub struct CountingTerminator {
    calls: AtomicUsize,
}

impl CountingTerminator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionTerminator for CountingTerminator {
    async fn terminate_for_tamper(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst) == 0
    }
}

/// A check with a fixed outcome that counts its runs.
pub struct FixedCheck {
    pub kind: ThreatKind,
    pub outcome: CheckOutcome,
    pub runs: AtomicUsize,
}

impl FixedCheck {
    pub fn firing(kind: ThreatKind, details: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            outcome: CheckOutcome::triggered(details),
            runs: AtomicUsize::new(0),
        })
    }

    pub fn quiet(kind: ThreatKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            outcome: CheckOutcome::clear(),
            runs: AtomicUsize::new(0),
        })
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Check for FixedCheck {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn kind(&self) -> ThreatKind {
        self.kind
    }

    async fn run(&self) -> GuardResult<CheckOutcome> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcome.clone())
    }
}

/// A check that never finishes on its own.
pub struct HangingCheck;

#[async_trait]
impl Check for HangingCheck {
    fn name(&self) -> &'static str {
        "hanging"
    }

    fn kind(&self) -> ThreatKind {
        ThreatKind::VirtualMachine
    }

    async fn run(&self) -> GuardResult<CheckOutcome> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(CheckOutcome::triggered("too late"))
    }
}

/// A check that panics.
pub struct PanickingCheck;

#[async_trait]
impl Check for PanickingCheck {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn kind(&self) -> ThreatKind {
        ThreatKind::Timing
    }

    async fn run(&self) -> GuardResult<CheckOutcome> {
        panic!("probe blew up");
    }
}
