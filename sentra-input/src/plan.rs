//! Splitting a command into paced steps.
//!
//! A command of duration `d` is cut into `n` steps spaced `d / n` apart,
//! where each step lasts between the configured minimum and maximum and
//! `n` never exceeds `max_steps`. Step `i` moves the axis to
//! `round(target * ease(i / n))`, and emits the difference from the
//! previous step, so the deltas always sum to the exact target.

use crate::easing::ease;
use sentra_types::MovementCommand;
use std::time::Duration;

/// Longest duration a single command is paced over; longer requests are
/// shortened to this.
pub const MAX_COMMAND_MS: f64 = 3_600_000.0;

/// Step sizing limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepConfig {
    pub min_step: Duration,
    pub max_step: Duration,
    pub max_steps: usize,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            min_step: Duration::from_millis(8),
            max_step: Duration::from_millis(16),
            max_steps: 500,
        }
    }
}

/// One relative movement and when to emit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Offset from the start of the command.
    pub at: Duration,
    pub dx: i32,
    pub dy: i32,
}

/// The steps of one command. Steps that would move nothing are omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPlan {
    slots: usize,
    interval: Duration,
    steps: Vec<Step>,
}

impl StepPlan {
    /// Plans `command`. The duration is assumed to be validated.
    #[must_use]
    pub fn new(command: &MovementCommand, config: &StepConfig) -> Self {
        let duration_ms = if command.duration_ms.is_finite() {
            command.duration_ms.clamp(0.0, MAX_COMMAND_MS)
        } else {
            0.0
        };
        let slots = step_count(duration_ms, config);
        let interval = Duration::from_secs_f64(duration_ms / 1000.0 / slots as f64);

        let mut steps = Vec::with_capacity(slots);
        let (mut prev_x, mut prev_y) = (0i64, 0i64);
        for i in 1..=slots {
            let e = ease(command.easing, i as f64 / slots as f64);
            let x = (f64::from(command.dx) * e).round() as i64;
            let y = (f64::from(command.dy) * e).round() as i64;
            let (dx, dy) = (x - prev_x, y - prev_y);
            (prev_x, prev_y) = (x, y);
            if dx == 0 && dy == 0 {
                continue;
            }
            steps.push(Step {
                at: interval * i as u32,
                dx: dx as i32,
                dy: dy as i32,
            });
        }
        Self {
            slots,
            interval,
            steps,
        }
    }

    /// Number of time slots the command was divided into.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Spacing between slots.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total paced length: `slots * interval`.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.interval * self.slots as u32
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Sum of all deltas.
    #[must_use]
    pub fn total(&self) -> (i64, i64) {
        self.steps.iter().fold((0, 0), |(x, y), s| {
            (x + i64::from(s.dx), y + i64::from(s.dy))
        })
    }
}

fn step_count(duration_ms: f64, config: &StepConfig) -> usize {
    let max_ms = (config.max_step.as_secs_f64() * 1000.0).max(1.0);
    let min_ms = (config.min_step.as_secs_f64() * 1000.0).clamp(0.0, max_ms);
    let wanted = (duration_ms / max_ms).ceil() as usize;
    let ceiling = if min_ms > 0.0 {
        ((duration_ms / min_ms).floor() as usize).max(1)
    } else {
        usize::MAX
    };
    wanted.clamp(1, ceiling).min(config.max_steps.max(1))
}
