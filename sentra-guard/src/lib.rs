//! Anti-tamper guard for Sentra.
//!
//! The guard periodically runs an ordered battery of independent checks:
//!
//! | Check | Kind | Default severity |
//! |-------|------|------------------|
//! | [`TimingCheck`] | `Timing` | warn |
//! | [`SystemClockCheck`] | `SystemClockManipulation` | warn |
//! | [`InjectedCodeCheck`] | `InjectedCode` | fatal |
//! | [`SuspiciousProcessCheck`] | `SuspiciousProcess` | warn |
//! | [`IntegrityCheck`] | `IntegrityMismatch` | fatal |
//! | [`VmCheck`] | `VirtualMachine` | warn |
//!
//! Warnings escalate to fatal through [`SeverityPolicy`]. Every event goes to
//! a [`ThreatSink`]; fatal ones also end the session through a
//! [`SessionTerminator`].

mod check;
mod error;
mod guard;
mod policy;
mod probe;
mod sink;

pub use check::{
    standard_battery, BatteryConfig, Check, CheckOutcome, InjectedCodeCheck, IntegrityCheck,
    SuspiciousProcessCheck, SystemClockCheck, TimingCheck, VmCheck,
};
pub use error::{GuardError, GuardResult};
pub use guard::{CycleReport, Guard, GuardConfig};
pub use policy::SeverityPolicy;
pub use probe::{
    digest_file, parse_mapped_modules, vm_marker, HostProbe, SystemProbe, DIGEST_CHUNK_SIZE,
};
pub use sink::{LogSink, SessionTerminator, ThreatSink};
