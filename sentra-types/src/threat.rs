//! Threat events produced by the anti-tamper guard.

use crate::ThreatId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which check produced a threat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    /// A timed probe took an implausible amount of time.
    Timing,
    /// An unexpected module is loaded into the process.
    InjectedCode,
    /// A deny-listed process is running.
    SuspiciousProcess,
    /// The digest of the running binary does not match the known-good value.
    IntegrityMismatch,
    /// Virtualization or sandbox indicators were reported.
    VirtualMachine,
    /// Wall-clock time moved inconsistently with monotonic time.
    SystemClockManipulation,
}

impl ThreatKind {
    /// All kinds, in the order the guard runs its battery.
    pub const ALL: [ThreatKind; 6] = [
        Self::Timing,
        Self::SystemClockManipulation,
        Self::InjectedCode,
        Self::SuspiciousProcess,
        Self::IntegrityMismatch,
        Self::VirtualMachine,
    ];

    /// Stable snake_case name, used as the report `type`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timing => "timing",
            Self::InjectedCode => "injected_code",
            Self::SuspiciousProcess => "suspicious_process",
            Self::IntegrityMismatch => "integrity_mismatch",
            Self::VirtualMachine => "virtual_machine",
            Self::SystemClockManipulation => "system_clock_manipulation",
        }
    }

    /// Kinds that terminate the session on first detection.
    #[must_use]
    pub fn is_always_fatal(&self) -> bool {
        matches!(self, Self::IntegrityMismatch | Self::InjectedCode)
    }
}

impl fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How seriously a detection is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Fatal,
}

/// One positive detection from one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatEvent {
    pub id: ThreatId,
    pub kind: ThreatKind,
    pub details: String,
    pub observed_at: DateTime<Utc>,
    pub severity: Severity,
}

impl ThreatEvent {
    /// Creates an event observed at `observed_at`.
    pub fn new(
        kind: ThreatKind,
        details: impl Into<String>,
        observed_at: DateTime<Utc>,
        severity: Severity,
    ) -> Self {
        Self {
            id: ThreatId::new(),
            kind,
            details: details.into(),
            observed_at,
            severity,
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}
