//! Host doubles for client tests.

#![allow(dead_code)]

use async_trait::async_trait;
use sentra_client::{ClientConfig, MemorySettings};
use sentra_guard::{GuardResult, SystemProbe};
use sentra_input::{InjectionResult, KeyStateProbe, MovementEmitter};
use sentra_types::KeyCode;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const GOOD_DIGEST: &str = "0f0e0d0c0b0a09080706050403020100f0e0d0c0b0a090807060504030201000";

pub struct FakeProbe {
    digest: Mutex<String>,
}

impl FakeProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            digest: Mutex::new(GOOD_DIGEST.to_string()),
        })
    }

    pub fn tamper(&self) {
        *self.digest.lock().unwrap() = "patched".to_string();
    }
}

#[async_trait]
impl SystemProbe for FakeProbe {
    async fn list_modules(&self) -> GuardResult<Vec<String>> {
        Ok(vec!["sentra".into()])
    }

    async fn list_processes(&self) -> GuardResult<Vec<String>> {
        Ok(vec!["sentra".into()])
    }

    async fn hash_self(&self) -> GuardResult<String> {
        Ok(self.digest.lock().unwrap().clone())
    }

    async fn vm_signals(&self) -> GuardResult<Vec<String>> {
        Ok(Vec::new())
    }
}

pub struct Emitter {
    pub ready: AtomicBool,
    pub moves: Mutex<Vec<(i32, i32)>>,
}

impl Emitter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            moves: Mutex::new(Vec::new()),
        })
    }
}

impl MovementEmitter for Emitter {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn emit(&self, dx: i32, dy: i32) -> InjectionResult<()> {
        self.moves.lock().unwrap().push((dx, dy));
        Ok(())
    }
}

#[derive(Default)]
pub struct Keys {
    down: Mutex<HashSet<KeyCode>>,
}

impl Keys {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn press(&self, code: KeyCode) {
        self.down.lock().unwrap().insert(code);
    }

    pub fn release(&self, code: KeyCode) {
        self.down.lock().unwrap().remove(&code);
    }
}

impl KeyStateProbe for Keys {
    fn is_down(&self, code: KeyCode) -> bool {
        self.down.lock().unwrap().contains(&code)
    }
}

pub fn settings() -> Arc<MemorySettings> {
    Arc::new(MemorySettings::new())
}

/// A valid configuration pointing at `base_url` with fast guard cycles.
pub fn config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.license.authority_url = base_url.to_string();
    config.license.shared_key = "k3y-material".to_string();
    config.guard.interval_ms = 50;
    config.guard.check_timeout_ms = 1_000;
    config.guard.expected_digest = Some(GOOD_DIGEST.to_string());
    config
}
