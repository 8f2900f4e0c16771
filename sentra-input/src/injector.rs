//! Gated, paced movement injection.
//!
//! The gate (trigger held, session authenticated, not cancelled) is checked
//! at every slot of the plan, including slots that carry no movement, so a
//! release or termination stops the command within one slot interval.
//! Cancellation also cuts the current wait short. Steps are emitted
//! strictly in order from a single task.

use crate::error::{InjectionError, InjectionResult};
use crate::plan::{StepConfig, StepPlan};
use sentra_types::{KeyCode, MovementCommand, SessionId, SessionStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The low-level movement driver.
pub trait MovementEmitter: Send + Sync {
    /// True when the driver can accept movements.
    fn is_ready(&self) -> bool;

    /// Moves the cursor by a relative amount.
    fn emit(&self, dx: i32, dy: i32) -> InjectionResult<()>;
}

/// Reads whether a key or mouse button is currently held.
pub trait KeyStateProbe: Send + Sync {
    fn is_down(&self, code: KeyCode) -> bool;
}

/// Why a command stopped before its last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    KeyReleased,
    NotAuthenticated,
    Cancelled,
}

/// What one [`Injector::inject`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionReport {
    /// Non-empty steps in the plan.
    pub planned: usize,
    /// Steps actually sent to the driver.
    pub emitted: usize,
    /// Sum of the emitted deltas.
    pub moved: (i64, i64),
    /// Set when the gate closed before the plan finished.
    pub aborted: Option<AbortReason>,
}

impl InjectionReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Latch that reports a missing driver once per session.
#[derive(Debug, Default)]
struct UnavailableLog {
    session: Option<SessionId>,
    reports: usize,
}

/// Turns movement commands into paced driver calls.
pub struct Injector {
    emitter: Arc<dyn MovementEmitter>,
    keys: Arc<dyn KeyStateProbe>,
    session: watch::Receiver<SessionStatus>,
    trigger: AtomicU16,
    config: StepConfig,
    unavailable: Mutex<UnavailableLog>,
}

impl Injector {
    pub fn new(
        emitter: Arc<dyn MovementEmitter>,
        keys: Arc<dyn KeyStateProbe>,
        session: watch::Receiver<SessionStatus>,
        trigger: KeyCode,
    ) -> Self {
        Self {
            emitter,
            keys,
            session,
            trigger: AtomicU16::new(trigger.0),
            config: StepConfig::default(),
            unavailable: Mutex::new(UnavailableLog::default()),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: StepConfig) -> Self {
        self.config = config;
        self
    }

    /// The key that must be held for movement to proceed.
    pub fn trigger(&self) -> KeyCode {
        KeyCode(self.trigger.load(Ordering::Relaxed))
    }

    /// Rebinds the trigger key. Takes effect at the next gate check.
    pub fn set_trigger(&self, code: KeyCode) {
        self.trigger.store(code.0, Ordering::Relaxed);
    }

    /// True while the trigger is held.
    pub fn trigger_held(&self) -> bool {
        self.keys.is_down(self.trigger())
    }

    /// True while the session is authenticated.
    pub fn session_active(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    /// Evaluates the gate; `None` means movement may proceed.
    pub fn gate(&self, cancel: &CancellationToken) -> Option<AbortReason> {
        if cancel.is_cancelled() {
            Some(AbortReason::Cancelled)
        } else if !self.session_active() {
            Some(AbortReason::NotAuthenticated)
        } else if !self.trigger_held() {
            Some(AbortReason::KeyReleased)
        } else {
            None
        }
    }

    /// Executes one command.
    ///
    /// A closed gate is not an error: the report says where the command
    /// stopped. Deltas already emitted are never undone.
    ///
    /// # Errors
    ///
    /// [`InjectionError::InvalidCommand`] for a bad duration and
    /// [`InjectionError::DriverUnavailable`] when the driver is not ready.
    pub async fn inject(
        &self,
        command: MovementCommand,
        cancel: &CancellationToken,
    ) -> InjectionResult<InjectionReport> {
        command
            .validate()
            .map_err(|e| InjectionError::InvalidCommand(e.to_string()))?;

        let plan = StepPlan::new(&command, &self.config);
        let mut report = InjectionReport {
            planned: plan.steps().len(),
            emitted: 0,
            moved: (0, 0),
            aborted: None,
        };

        if let Some(reason) = self.gate(cancel) {
            report.aborted = Some(reason);
            return Ok(report);
        }
        if !self.emitter.is_ready() {
            self.log_unavailable().await;
            return Err(InjectionError::DriverUnavailable);
        }

        // The gate is checked at every slot, moving or not.
        let start = tokio::time::Instant::now();
        let mut pending = plan.steps().iter().peekable();
        for slot in 1..=plan.slots() {
            let offset = plan.interval() * slot as u32;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep_until(start + offset) => {}
            }
            if let Some(reason) = self.gate(cancel) {
                if pending.peek().is_none() {
                    // All movement emitted; the remaining slots only pace.
                    break;
                }
                debug!(
                    emitted = report.emitted,
                    planned = report.planned,
                    ?reason,
                    "movement aborted"
                );
                report.aborted = Some(reason);
                return Ok(report);
            }
            while let Some(step) = pending.next_if(|s| s.at <= offset) {
                if let Err(e) = self.emitter.emit(step.dx, step.dy) {
                    if e == InjectionError::DriverUnavailable {
                        self.log_unavailable().await;
                    }
                    return Err(e);
                }
                report.emitted += 1;
                report.moved.0 += i64::from(step.dx);
                report.moved.1 += i64::from(step.dy);
            }
        }
        Ok(report)
    }

    /// How many times a missing driver has been reported. Repeats within
    /// one session are not counted.
    pub async fn unavailable_reports(&self) -> usize {
        self.unavailable.lock().await.reports
    }

    /// Reports a missing driver unless it was already reported for the
    /// current session.
    async fn log_unavailable(&self) {
        let session = self.session.borrow().session;
        let mut log = self.unavailable.lock().await;
        if log.session == Some(session) {
            return;
        }
        warn!(session = %session, "movement driver unavailable");
        log.session = Some(session);
        log.reports += 1;
    }
}
