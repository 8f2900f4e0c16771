//! Destinations for threat reports and the session seam.

use crate::error::GuardResult;
use async_trait::async_trait;
use sentra_license::{SessionManager, TerminationReason};
use sentra_types::ThreatEvent;
use tracing::info;

/// Receives every threat event the guard emits. Delivery is best effort:
/// errors are logged by the guard and otherwise ignored.
#[async_trait]
pub trait ThreatSink: Send + Sync {
    async fn report(&self, event: &ThreatEvent) -> GuardResult<()>;
}

/// A sink that only writes events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl ThreatSink for LogSink {
    async fn report(&self, event: &ThreatEvent) -> GuardResult<()> {
        info!(
            id = %event.id,
            kind = %event.kind,
            severity = ?event.severity,
            details = %event.details,
            "threat observed"
        );
        Ok(())
    }
}

/// Ends the live session on a fatal finding.
#[async_trait]
pub trait SessionTerminator: Send + Sync {
    /// Returns true if a live session was ended.
    async fn terminate_for_tamper(&self) -> bool;
}

#[async_trait]
impl SessionTerminator for SessionManager {
    async fn terminate_for_tamper(&self) -> bool {
        self.terminate(TerminationReason::Tamper).await
    }
}
