//! Severity escalation.
//!
//! Integrity and injected-code findings are fatal on first sight. Every
//! other kind starts as a warning and becomes fatal once it has fired
//! `threshold` times within the sliding `window`.

use sentra_types::{Severity, ThreatKind};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct SeverityPolicy {
    threshold: usize,
    window: Duration,
    hits: HashMap<ThreatKind, VecDeque<Instant>>,
}

impl SeverityPolicy {
    /// A threshold of zero is treated as one.
    #[must_use]
    pub fn new(threshold: usize, window: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            window,
            hits: HashMap::new(),
        }
    }

    /// Records a detection of `kind` at `now` and returns its severity.
    pub fn classify(&mut self, kind: ThreatKind, now: Instant) -> Severity {
        if kind.is_always_fatal() {
            return Severity::Fatal;
        }
        let hits = self.hits.entry(kind).or_default();
        while let Some(&oldest) = hits.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }
        hits.push_back(now);
        if hits.len() >= self.threshold {
            Severity::Fatal
        } else {
            Severity::Warn
        }
    }

    /// Detections of `kind` still inside the window as of the last
    /// [`classify`](Self::classify) call.
    #[must_use]
    pub fn recent(&self, kind: ThreatKind) -> usize {
        self.hits.get(&kind).map_or(0, VecDeque::len)
    }
}
