//! Coffee brewing core: recipe generation and a step-synchronized brew timer.

pub mod error;
pub mod recipe;
pub mod reference;
pub mod session;
pub mod steps;
pub mod tables;
pub mod timer;
pub mod types;

pub use error::ParseLabelError;
pub use recipe::{CalculatedRecipe, RecipeStep, Severity, WarningMessage, generate_full_recipe};
pub use session::BrewSession;
pub use timer::{
    StartOutcome, StepCursor, TickGuard, TickOutcome, TickScheduler, TimerInstance, TimerPhase,
    TimerView, format_clock, format_step_time,
};
pub use types::{BrewMethod, GrindSize, RecipeInputs, RoastType};

#[inline]
pub(crate) fn clamp<T: PartialOrd>(v: T, lo: T, hi: T) -> T {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}
