//! The key-polling loop that feeds the injector.

use crate::error::InjectionError;
use crate::injector::Injector;
use async_trait::async_trait;
use sentra_types::MovementCommand;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Supplies movement commands while the trigger is held, e.g. a recoil
/// pattern advancing one entry per call.
#[async_trait]
pub trait CommandSource: Send + Sync {
    /// The next command, or `None` when there is nothing to do right now.
    async fn next_command(&self) -> Option<MovementCommand>;

    /// Called once when the trigger is released.
    async fn reset(&self) {}
}

/// Counters for one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub commands: usize,
    pub completed: usize,
    pub aborted: usize,
    pub failed: usize,
}

/// Polls the trigger and injects commands from a [`CommandSource`].
pub struct InputLoop {
    injector: Arc<Injector>,
    source: Arc<dyn CommandSource>,
    poll_interval: Duration,
}

impl InputLoop {
    pub fn new(injector: Arc<Injector>, source: Arc<dyn CommandSource>) -> Self {
        Self {
            injector,
            source,
            poll_interval: Duration::from_millis(5),
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs until `cancel` fires. A failed command is dropped and the loop
    /// waits for the next poll.
    pub async fn run(&self, cancel: CancellationToken) -> LoopStats {
        let mut stats = LoopStats::default();
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut was_held = false;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let held = self.injector.trigger_held() && self.injector.session_active();
            if !held {
                if was_held {
                    self.source.reset().await;
                }
                was_held = false;
                continue;
            }
            was_held = true;

            let Some(command) = self.source.next_command().await else {
                continue;
            };
            stats.commands += 1;
            match self.injector.inject(command, &cancel).await {
                Ok(report) if report.is_complete() => stats.completed += 1,
                Ok(_) => stats.aborted += 1,
                Err(InjectionError::DriverUnavailable) => stats.failed += 1,
                Err(e) => {
                    debug!(error = %e, "movement command failed");
                    stats.failed += 1;
                }
            }
        }
        debug!(commands = stats.commands, "input loop stopped");
        stats
    }
}
