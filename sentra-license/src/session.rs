//! The license session state machine.
//!
//! [`LicenseSession`] is pure: it takes the current time as an argument and
//! performs no I/O. Serialization of concurrent callers is the job of
//! [`SessionManager`](crate::SessionManager).

use crate::device::DeviceId;
use crate::error::{LicenseError, LicenseResult};
use crate::key::LicenseKey;
use chrono::{DateTime, Utc};
use sentra_types::{SessionId, SessionState, SessionStatus};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a session was terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The user logged out.
    Logout,
    /// A newer login replaced this session.
    Superseded,
    /// The anti-tamper guard reported a fatal finding.
    Tamper,
}

/// One session instance.
#[derive(Debug, Clone)]
pub struct LicenseSession {
    id: SessionId,
    key: Option<LicenseKey>,
    device_id: Option<DeviceId>,
    state: SessionState,
    activated_at: Option<DateTime<Utc>>,
    duration_secs: u64,
    /// Largest elapsed time observed, so a clock moved backward cannot
    /// hand out more time.
    elapsed_high_water_ms: i64,
    termination: Option<TerminationReason>,
}

impl LicenseSession {
    /// A fresh, unauthenticated instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            key: None,
            device_id: None,
            state: SessionState::Unauthenticated,
            activated_at: None,
            duration_secs: 0,
            elapsed_high_water_ms: 0,
            termination: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session: self.id,
            state: self.state,
        }
    }

    /// The key this session was started with; `None` for trials.
    #[must_use]
    pub fn key(&self) -> Option<&LicenseKey> {
        self.key.as_ref()
    }

    #[must_use]
    pub fn device_id(&self) -> Option<&DeviceId> {
        self.device_id.as_ref()
    }

    /// When the session became authenticated.
    #[must_use]
    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated_at
    }

    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    #[must_use]
    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// `Unauthenticated -> Authenticating`.
    ///
    /// # Errors
    ///
    /// Fails if the instance is not unauthenticated.
    pub fn start_authenticating(
        &mut self,
        key: Option<LicenseKey>,
        device_id: DeviceId,
    ) -> LicenseResult<()> {
        self.ensure(SessionState::Unauthenticated)?;
        self.key = key;
        self.device_id = Some(device_id);
        self.state = SessionState::Authenticating;
        Ok(())
    }

    /// `Authenticating -> Authenticated`, starting the clock at `now`.
    pub fn accept(&mut self, now: DateTime<Utc>, duration_secs: u64) -> LicenseResult<()> {
        self.ensure(SessionState::Authenticating)?;
        self.activated_at = Some(now);
        self.duration_secs = duration_secs;
        self.elapsed_high_water_ms = 0;
        self.state = SessionState::Authenticated;
        Ok(())
    }

    /// `Authenticating -> Unauthenticated`.
    pub fn reject(&mut self) -> LicenseResult<()> {
        self.ensure(SessionState::Authenticating)?;
        self.key = None;
        self.state = SessionState::Unauthenticated;
        Ok(())
    }

    /// Time left at `now`: `max(0, duration - elapsed)`, zero outside
    /// `Authenticated`. Never increases between calls.
    pub fn remaining(&mut self, now: DateTime<Utc>) -> Duration {
        if self.state != SessionState::Authenticated {
            return Duration::ZERO;
        }
        let Some(activated_at) = self.activated_at else {
            return Duration::ZERO;
        };

        let elapsed_ms = (now - activated_at).num_milliseconds().max(0);
        self.elapsed_high_water_ms = self.elapsed_high_water_ms.max(elapsed_ms);

        let total_ms = i64::try_from(self.duration_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        let left_ms = (total_ms - self.elapsed_high_water_ms).max(0);
        Duration::from_millis(left_ms as u64)
    }

    /// `Authenticated -> Expired` once no time remains. Idempotent.
    ///
    /// Returns true if this call performed the transition.
    pub fn check_expiry(&mut self, now: DateTime<Utc>) -> bool {
        if self.state == SessionState::Authenticated && self.remaining(now).is_zero() {
            self.state = SessionState::Expired;
            return true;
        }
        false
    }

    /// Ends the session.
    ///
    /// An authenticated (or still authenticating) session moves to
    /// `Terminated`. Terminal and unauthenticated instances are left alone.
    /// Returns true if this call performed the transition.
    pub fn terminate(&mut self, reason: TerminationReason) -> bool {
        match self.state {
            SessionState::Authenticated | SessionState::Authenticating => {
                self.state = SessionState::Terminated;
                self.termination = Some(reason);
                self.key = None;
                true
            }
            _ => false,
        }
    }

    /// Abandons an in-flight login: `Authenticating -> Unauthenticated`.
    pub fn abandon(&mut self) -> bool {
        self.reject().is_ok()
    }

    fn ensure(&self, expected: SessionState) -> LicenseResult<()> {
        if self.state == expected {
            return Ok(());
        }
        Err(match self.state {
            SessionState::Expired => LicenseError::SessionExpired,
            SessionState::Terminated => LicenseError::SessionTerminated,
            _ => LicenseError::LoginCancelled,
        })
    }
}

impl Default for LicenseSession {
    fn default() -> Self {
        Self::new()
    }
}
