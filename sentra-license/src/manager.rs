//! Serialized owner of the license session.
//!
//! All transitions (login results, expiry checks, terminations) take the same
//! lock, and each is published on a `watch` channel while the lock is held.
//! A login result is applied only if it belongs to the instance that is still
//! authenticating, so a `Terminated` state can never be overwritten by a late
//! `Authenticated` result.

use crate::authority::{LoginPayload, LoginResponse, RemoteAuthority, TrialPayload};
use crate::codec::LicenseCodec;
use crate::device::{DeviceFingerprint, DeviceId, HostIdentity, SystemIdentity};
use crate::error::{LicenseError, LicenseResult};
use crate::key::LicenseKey;
use crate::session::{LicenseSession, TerminationReason};
use chrono::{DateTime, Utc};
use sentra_types::{format_duration, Clock, SessionId, SessionState, SessionStatus, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on one authority round trip.
    pub request_timeout: Duration,
    /// Cadence of the background expiry check.
    pub expiry_check_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            expiry_check_interval: Duration::from_secs(1),
        }
    }
}

/// Point-in-time view of the session for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub activated_at: Option<DateTime<Utc>>,
    pub duration_secs: u64,
    pub remaining: Duration,
}

impl SessionSnapshot {
    /// Remaining time as an `H:MM:SS` countdown.
    #[must_use]
    pub fn remaining_display(&self) -> String {
        format_duration(self.remaining.as_secs())
    }
}

/// A login whose authority round trip is still in flight.
#[derive(Debug)]
pub struct PendingLogin {
    session: SessionId,
    rx: oneshot::Receiver<LicenseResult<SessionStatus>>,
}

impl PendingLogin {
    /// The session instance this login belongs to.
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Waits for the authority's verdict.
    ///
    /// # Errors
    ///
    /// Returns the rejection message, or [`LicenseError::LoginCancelled`] if a
    /// newer login or a termination retired this one first.
    pub async fn wait(self) -> LicenseResult<SessionStatus> {
        self.rx.await.unwrap_or(Err(LicenseError::LoginCancelled))
    }
}

enum LoginRequest {
    License(LoginPayload),
    Trial(TrialPayload),
}

struct Inner {
    session: LicenseSession,
    pending: Option<JoinHandle<()>>,
    /// Set by a tamper termination; refuses all further logins.
    locked_out: bool,
}

/// Owns the single live license session of a process.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Mutex<Inner>>,
    status_tx: Arc<watch::Sender<SessionStatus>>,
    authority: Arc<dyn RemoteAuthority>,
    identity: Arc<dyn SystemIdentity>,
    codec: LicenseCodec,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a manager using the host identity and the system clock.
    pub fn new(authority: Arc<dyn RemoteAuthority>, codec: LicenseCodec) -> Self {
        let session = LicenseSession::new();
        let (status_tx, _) = watch::channel(session.status());
        Self {
            inner: Arc::new(Mutex::new(Inner {
                session,
                pending: None,
                locked_out: false,
            })),
            status_tx: Arc::new(status_tx),
            authority,
            identity: Arc::new(HostIdentity),
            codec,
            clock: Arc::new(SystemClock),
            config: SessionConfig::default(),
        }
    }

    /// Replaces the identity source used for device binding.
    #[must_use]
    pub fn with_identity(mut self, identity: Arc<dyn SystemIdentity>) -> Self {
        self.identity = identity;
        self
    }

    /// Replaces the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Current status, without waiting on the session lock.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.status_tx.borrow()
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// The device ID this host binds sessions to.
    pub fn device_id(&self) -> LicenseResult<DeviceId> {
        DeviceFingerprint::generate(self.identity.as_ref())
    }

    /// Starts a license login.
    ///
    /// Any live session is retired first: an authenticating one goes back to
    /// `Unauthenticated`, an authenticated one is `Terminated`. The authority
    /// is called from a spawned task; the returned handle resolves once its
    /// verdict has been applied.
    ///
    /// # Errors
    ///
    /// Fails without touching the current session if the key is unusable or
    /// the device identity cannot be read, and with
    /// [`LicenseError::SessionTerminated`] after a tamper termination.
    pub async fn begin_login(&self, key: &str) -> LicenseResult<PendingLogin> {
        let key = LicenseKey::parse(key)?;
        let device_id = self.device_id()?;
        let payload = LoginPayload {
            encoded_key: key.encode(&self.codec),
            device_id: device_id.clone(),
        };
        self.start(Some(key), device_id, LoginRequest::License(payload))
            .await
    }

    /// Starts a free-trial login bound to this device.
    pub async fn begin_trial(&self) -> LicenseResult<PendingLogin> {
        let device_id = self.device_id()?;
        let payload = TrialPayload {
            device_id: device_id.clone(),
        };
        self.start(None, device_id, LoginRequest::Trial(payload))
            .await
    }

    async fn start(
        &self,
        key: Option<LicenseKey>,
        device_id: DeviceId,
        request: LoginRequest,
    ) -> LicenseResult<PendingLogin> {
        let mut inner = self.inner.lock().await;
        if inner.locked_out {
            return Err(LicenseError::SessionTerminated);
        }
        self.retire(&mut inner);

        let mut session = LicenseSession::new();
        session.start_authenticating(key, device_id)?;
        let id = session.id();
        inner.session = session;
        self.publish(&inner);
        debug!(session = %id, "login started");

        let (tx, rx) = oneshot::channel();
        let this = self.clone();
        inner.pending = Some(tokio::spawn(async move {
            let response = this.request(request).await;
            let result = this.on_login_result(id, response).await;
            let _ = tx.send(result);
        }));

        Ok(PendingLogin { session: id, rx })
    }

    async fn request(&self, request: LoginRequest) -> LoginResponse {
        let call = async {
            match &request {
                LoginRequest::License(payload) => self.authority.validate(payload).await,
                LoginRequest::Trial(payload) => self.authority.start_trial(payload).await,
            }
        };
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(error = %e, "license authority request failed");
                LoginResponse::rejected("unable to reach the license server")
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.request_timeout.as_millis() as u64,
                    "license authority request timed out"
                );
                LoginResponse::rejected("the license server did not respond")
            }
        }
    }

    /// Applies the authority's verdict to the session it was issued for.
    ///
    /// Results for a session that is no longer the live, authenticating
    /// instance are discarded.
    ///
    /// # Errors
    ///
    /// [`LicenseError::LoginRejected`] with the server's message on failure;
    /// [`LicenseError::LoginCancelled`], [`LicenseError::SessionTerminated`]
    /// or [`LicenseError::SessionExpired`] if the result was discarded.
    pub async fn on_login_result(
        &self,
        session: SessionId,
        response: LoginResponse,
    ) -> LicenseResult<SessionStatus> {
        let mut inner = self.inner.lock().await;
        if inner.session.id() != session {
            debug!(session = %session, "discarding login result for a retired session");
            return Err(LicenseError::LoginCancelled);
        }

        let applied = if response.success {
            inner
                .session
                .accept(self.clock.now(), response.granted_secs())
        } else {
            inner.session.reject()
        };
        if let Err(e) = applied {
            debug!(session = %session, state = %inner.session.state(), "discarding late login result");
            return Err(e);
        }

        inner.pending = None;
        self.publish(&inner);

        if response.success {
            info!(
                session = %session,
                duration_secs = inner.session.duration_secs(),
                "session authenticated"
            );
            Ok(inner.session.status())
        } else {
            info!(session = %session, "login rejected");
            let message = response.error_message.trim();
            Err(LicenseError::LoginRejected(if message.is_empty() {
                "license rejected".to_string()
            } else {
                message.to_string()
            }))
        }
    }

    /// Time left in the current session; zero unless authenticated.
    pub async fn remaining(&self) -> Duration {
        let mut inner = self.inner.lock().await;
        inner.session.remaining(self.clock.now())
    }

    /// Moves an authenticated session with no time left to `Expired`.
    /// Idempotent; returns the state after the check.
    pub async fn check_expiry(&self) -> SessionState {
        let mut inner = self.inner.lock().await;
        if inner.session.check_expiry(self.clock.now()) {
            info!(session = %inner.session.id(), "session expired");
            self.publish(&inner);
        }
        inner.session.state()
    }

    /// Ends the live session.
    ///
    /// A [`TerminationReason::Tamper`] termination also refuses every later
    /// login for the lifetime of this manager. Returns true if a live
    /// session was ended.
    pub async fn terminate(&self, reason: TerminationReason) -> bool {
        let mut inner = self.inner.lock().await;
        if reason == TerminationReason::Tamper {
            inner.locked_out = true;
        }
        if let Some(handle) = inner.pending.take() {
            handle.abort();
        }
        let ended = inner.session.terminate(reason);
        if ended {
            info!(session = %inner.session.id(), ?reason, "session terminated");
            self.publish(&inner);
        }
        ended
    }

    /// Ends the session at the user's request.
    pub async fn logout(&self) -> bool {
        self.terminate(TerminationReason::Logout).await
    }

    /// Returns `Ok` only while the session is authenticated.
    ///
    /// # Errors
    ///
    /// The error matches the reason the session is unusable.
    pub async fn ensure_active(&self) -> LicenseResult<()> {
        match self.check_expiry().await {
            SessionState::Authenticated => Ok(()),
            SessionState::Expired => Err(LicenseError::SessionExpired),
            SessionState::Terminated => Err(LicenseError::SessionTerminated),
            SessionState::Unauthenticated | SessionState::Authenticating => {
                Err(LicenseError::NotAuthenticated)
            }
        }
    }

    /// True once a tamper termination has happened.
    pub async fn is_locked_out(&self) -> bool {
        self.inner.lock().await.locked_out
    }

    /// Point-in-time view for a presentation layer.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let mut inner = self.inner.lock().await;
        let remaining = inner.session.remaining(self.clock.now());
        SessionSnapshot {
            status: inner.session.status(),
            activated_at: inner.session.activated_at(),
            duration_secs: inner.session.duration_secs(),
            remaining,
        }
    }

    /// Runs [`SessionManager::check_expiry`] on a fixed cadence until
    /// cancelled.
    pub async fn run_expiry_checks(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.expiry_check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.check_expiry().await;
                }
            }
        }
        debug!("expiry checks stopped");
    }

    fn retire(&self, inner: &mut Inner) {
        if let Some(handle) = inner.pending.take() {
            handle.abort();
        }
        let retired = match inner.session.state() {
            SessionState::Authenticated => inner.session.terminate(TerminationReason::Superseded),
            SessionState::Authenticating => inner.session.abandon(),
            _ => false,
        };
        if retired {
            self.publish(inner);
        }
    }

    fn publish(&self, inner: &Inner) {
        self.status_tx.send_replace(inner.session.status());
    }
}
