//! Shared test helpers for license tests.

#![allow(dead_code)]

use async_trait::async_trait;
use sentra_license::{
    LicenseCodec, LicenseError, LicenseResult, LoginPayload, LoginResponse, RemoteAuthority,
    SessionConfig, SessionManager, StaticIdentity, TrialPayload,
};
use sentra_types::ManualClock;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SHARED_KEY: &str = "k3y-material";

/// An authority that answers with a canned response after an optional delay.
pub struct FakeAuthority {
    response: Mutex<LicenseResult<LoginResponse>>,
    delay: Duration,
    logins: Mutex<Vec<LoginPayload>>,
    trials: Mutex<Vec<TrialPayload>>,
}

impl FakeAuthority {
    pub fn granting(duration_seconds: i64) -> Arc<Self> {
        Self::with(Ok(LoginResponse::granted(duration_seconds)), Duration::ZERO)
    }

    pub fn rejecting(message: &str) -> Arc<Self> {
        Self::with(Ok(LoginResponse::rejected(message)), Duration::ZERO)
    }

    pub fn failing() -> Arc<Self> {
        Self::with(
            Err(LicenseError::Network("connection refused".into())),
            Duration::ZERO,
        )
    }

    pub fn with(response: LicenseResult<LoginResponse>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(response),
            delay,
            logins: Mutex::new(Vec::new()),
            trials: Mutex::new(Vec::new()),
        })
    }

    pub fn set_response(&self, response: LoginResponse) {
        *self.response.lock().unwrap() = Ok(response);
    }

    pub fn logins(&self) -> Vec<LoginPayload> {
        self.logins.lock().unwrap().clone()
    }

    pub fn trials(&self) -> Vec<TrialPayload> {
        self.trials.lock().unwrap().clone()
    }

    fn answer(&self) -> LicenseResult<LoginResponse> {
        match &*self.response.lock().unwrap() {
            Ok(r) => Ok(r.clone()),
            Err(e) => Err(LicenseError::Network(e.to_string())),
        }
    }
}

#[async_trait]
impl RemoteAuthority for FakeAuthority {
    async fn validate(&self, payload: &LoginPayload) -> LicenseResult<LoginResponse> {
        self.logins.lock().unwrap().push(payload.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answer()
    }

    async fn start_trial(&self, payload: &TrialPayload) -> LicenseResult<LoginResponse> {
        self.trials.lock().unwrap().push(payload.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answer()
    }
}

pub fn identity() -> Arc<StaticIdentity> {
    Arc::new(StaticIdentity::new("WORKSTATION-7", "alice"))
}

/// A manager wired to `authority`, a fixed identity and a manual clock.
pub fn manager(authority: Arc<FakeAuthority>) -> (SessionManager, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    let manager = SessionManager::new(authority, LicenseCodec::new(SHARED_KEY).unwrap())
        .with_identity(identity())
        .with_clock(clock.clone())
        .with_config(SessionConfig {
            request_timeout: Duration::from_secs(5),
            expiry_check_interval: Duration::from_secs(1),
        });
    (manager, clock)
}
