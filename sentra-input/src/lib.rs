//! Input injection engine for Sentra.
//!
//! A [`MovementCommand`](sentra_types::MovementCommand) asks for a relative
//! displacement spread over a duration. The [`Injector`] plans it into
//! eased steps ([`StepPlan`]), waits for each step's deadline, re-checks
//! the gate and hands the delta to a [`MovementEmitter`]. The emitted
//! deltas of a completed command always add up to the requested target.
//!
//! [`InputLoop`] polls the trigger key and pulls commands from a
//! [`CommandSource`] while it is held.

mod easing;
mod error;
mod injector;
mod input_loop;
mod plan;

pub use easing::{ease, ease_in_out_quad, ease_out_quad, linear};
pub use error::{InjectionError, InjectionResult};
pub use injector::{AbortReason, InjectionReport, Injector, KeyStateProbe, MovementEmitter};
pub use input_loop::{CommandSource, InputLoop, LoopStats};
pub use plan::{Step, StepConfig, StepPlan, MAX_COMMAND_MS};
