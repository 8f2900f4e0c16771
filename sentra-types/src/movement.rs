//! Movement commands for the input injection engine.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Velocity profile applied over a command's duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingKind {
    /// Constant velocity.
    Linear,
    /// Decelerating: `1 - (1 - t)^2`.
    #[default]
    EaseOutQuad,
    /// Accelerate then decelerate.
    EaseInOutQuad,
}

/// A relative cursor displacement to be spread over `duration_ms`.
///
/// Consumed once by the injection engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementCommand {
    pub dx: i32,
    pub dy: i32,
    pub duration_ms: f64,
    #[serde(default)]
    pub easing: EasingKind,
}

impl MovementCommand {
    /// Creates a command.
    #[must_use]
    pub fn new(dx: i32, dy: i32, duration_ms: f64, easing: EasingKind) -> Self {
        Self {
            dx,
            dy,
            duration_ms,
            easing,
        }
    }

    /// Checks that the duration is a finite, non-negative number.
    pub fn validate(&self) -> Result<()> {
        if !self.duration_ms.is_finite() || self.duration_ms < 0.0 {
            return Err(Error::InvalidCommand(format!(
                "duration must be finite and non-negative, got {}",
                self.duration_ms
            )));
        }
        Ok(())
    }

    /// Returns true when the command moves nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}
