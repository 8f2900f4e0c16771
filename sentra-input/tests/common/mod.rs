//! Test doubles for injection tests.

#![allow(dead_code)]

use async_trait::async_trait;
use sentra_input::{
    CommandSource, InjectionError, InjectionResult, Injector, KeyStateProbe, MovementEmitter,
    StepConfig,
};
use sentra_types::{KeyCode, MovementCommand, SessionId, SessionState, SessionStatus};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Records every delta it is asked to emit.
pub struct RecordingEmitter {
    pub ready: AtomicBool,
    moves: Mutex<Vec<(i32, i32)>>,
}

impl RecordingEmitter {
    pub fn ready() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            moves: Mutex::new(Vec::new()),
        })
    }

    pub fn offline() -> Arc<Self> {
        let emitter = Self::ready();
        emitter.ready.store(false, Ordering::SeqCst);
        emitter
    }

    pub fn moves(&self) -> Vec<(i32, i32)> {
        self.moves.lock().unwrap().clone()
    }

    pub fn total(&self) -> (i64, i64) {
        self.moves()
            .iter()
            .fold((0, 0), |(x, y), (dx, dy)| (x + i64::from(*dx), y + i64::from(*dy)))
    }
}

impl MovementEmitter for RecordingEmitter {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn emit(&self, dx: i32, dy: i32) -> InjectionResult<()> {
        if !self.is_ready() {
            return Err(InjectionError::DriverUnavailable);
        }
        self.moves.lock().unwrap().push((dx, dy));
        Ok(())
    }
}

/// A single key whose state the test flips.
pub struct FakeKeys {
    pub code: KeyCode,
    pub down: AtomicBool,
}

impl FakeKeys {
    pub fn holding(code: KeyCode) -> Arc<Self> {
        Arc::new(Self {
            code,
            down: AtomicBool::new(true),
        })
    }

    pub fn press(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.down.store(false, Ordering::SeqCst);
    }
}

impl KeyStateProbe for FakeKeys {
    fn is_down(&self, code: KeyCode) -> bool {
        code == self.code && self.down.load(Ordering::SeqCst)
    }
}

pub fn authenticated() -> (watch::Sender<SessionStatus>, watch::Receiver<SessionStatus>) {
    watch::channel(SessionStatus {
        session: SessionId::new(),
        state: SessionState::Authenticated,
    })
}

pub struct Rig {
    pub injector: Arc<Injector>,
    pub emitter: Arc<RecordingEmitter>,
    pub keys: Arc<FakeKeys>,
    pub session: watch::Sender<SessionStatus>,
}

/// An injector with default step sizing, an authenticated session and the
/// trigger held.
pub fn rig() -> Rig {
    rig_with(RecordingEmitter::ready())
}

pub fn rig_with(emitter: Arc<RecordingEmitter>) -> Rig {
    let keys = FakeKeys::holding(KeyCode::MOUSE1);
    let (session, rx) = authenticated();
    let injector = Arc::new(
        Injector::new(emitter.clone(), keys.clone(), rx, KeyCode::MOUSE1)
            .with_config(StepConfig::default()),
    );
    Rig {
        injector,
        emitter,
        keys,
        session,
    }
}

/// Hands out a fixed queue of commands and counts resets.
#[derive(Default)]
pub struct QueueSource {
    queue: Mutex<VecDeque<MovementCommand>>,
    pub resets: AtomicUsize,
}

impl QueueSource {
    pub fn new(commands: impl IntoIterator<Item = MovementCommand>) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(commands.into_iter().collect()),
            resets: AtomicUsize::new(0),
        })
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandSource for QueueSource {
    async fn next_command(&self) -> Option<MovementCommand> {
        self.queue.lock().unwrap().pop_front()
    }

    async fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}
