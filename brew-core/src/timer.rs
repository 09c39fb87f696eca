//! Step-synchronized brew timer.
//!
//! A [`TimerInstance`] moves through `Idle -> Running <-> Paused -> Completed`
//! and back to `Idle` on reset. While running it owns a [`TickGuard`]; the
//! guard is the only way a timer can be running, and dropping it cancels the
//! scheduled ticks, so every exit from `Running` (pause, reset, completion,
//! an input change) releases the tick source.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::recipe::{CalculatedRecipe, RecipeStep};
use crate::types::BrewMethod;

/// Which recipe step the timer is on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "kebab-case")]
pub enum StepCursor {
    /// Before the first start.
    #[default]
    NotStarted,
    At(usize),
    /// Past every step.
    Finished,
}

impl StepCursor {
    pub fn index(self) -> Option<usize> {
        match self {
            StepCursor::At(i) => Some(i),
            _ => None,
        }
    }

    /// `Finished` becomes the last valid index so a stopped timer always has
    /// a step to show.
    fn pinned(self, step_count: usize) -> StepCursor {
        match self {
            StepCursor::Finished => match step_count.checked_sub(1) {
                Some(last) => StepCursor::At(last),
                None => StepCursor::NotStarted,
            },
            StepCursor::At(i) if i >= step_count => StepCursor::Finished.pinned(step_count),
            other => other,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Handle to one scheduled run of once-per-second ticks.
///
/// Dropping the guard cancels the run. Each acquisition carries a fresh
/// generation number; ticks are tagged with it so a tick that was already in
/// flight when its guard was dropped can be recognized and discarded.
pub struct TickGuard {
    method: BrewMethod,
    generation: u64,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TickGuard {
    pub fn new(method: BrewMethod, generation: u64, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            method,
            generation,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A guard with nothing to cancel, for callers that drive ticks by hand.
    pub fn detached(method: BrewMethod, generation: u64) -> Self {
        Self {
            method,
            generation,
            cancel: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TickGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            debug!(method = %self.method, generation = self.generation, "Tick source cancelled");
            cancel();
        }
    }
}

impl fmt::Debug for TickGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickGuard")
            .field("method", &self.method)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Something that can emit one tick per second for a brew method.
pub trait TickScheduler {
    /// Begin ticking `method`, tagging every tick with `generation`. Ticking
    /// stops when the returned guard is dropped.
    fn schedule(&mut self, method: BrewMethod, generation: u64) -> TickGuard;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// Fresh start from zero.
    Started,
    /// Continued from a paused (or already running) position.
    Resumed,
    NoRecipe,
    AlreadyComplete,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or the tick came from a cancelled guard.
    Ignored,
    Advanced { step_changed: bool },
    /// The tick ran past the total; the timer stopped itself.
    Completed,
}

/// Timer state for one brew method.
#[derive(Debug)]
pub struct TimerInstance {
    method: BrewMethod,
    seconds_elapsed: u32,
    cursor: StepCursor,
    guard: Option<TickGuard>,
}

impl TimerInstance {
    pub fn new(method: BrewMethod) -> Self {
        Self {
            method,
            seconds_elapsed: 0,
            cursor: StepCursor::NotStarted,
            guard: None,
        }
    }

    pub fn seconds_elapsed(&self) -> u32 {
        self.seconds_elapsed
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_some()
    }

    pub fn cursor(&self) -> StepCursor {
        self.cursor
    }

    /// Generation of the live tick guard, if running.
    pub fn generation(&self) -> Option<u64> {
        self.guard.as_ref().map(TickGuard::generation)
    }

    pub fn phase(&self, total_brew_time_seconds: u32) -> TimerPhase {
        if self.is_running() {
            TimerPhase::Running
        } else if self.seconds_elapsed == 0 && self.cursor == StepCursor::NotStarted {
            TimerPhase::Idle
        } else if total_brew_time_seconds > 0 && self.seconds_elapsed >= total_brew_time_seconds {
            TimerPhase::Completed
        } else {
            TimerPhase::Paused
        }
    }

    /// Starts or resumes against `recipe`. `acquire` is only called when the
    /// timer will actually run; any previous guard is dropped first.
    pub fn start(
        &mut self,
        recipe: Option<&CalculatedRecipe>,
        acquire: impl FnOnce() -> TickGuard,
    ) -> StartOutcome {
        let Some(recipe) = recipe else {
            debug!(method = %self.method, "Start ignored: no recipe");
            return StartOutcome::NoRecipe;
        };
        let total = recipe.total_brew_time_seconds;
        if self.seconds_elapsed >= total {
            debug!(method = %self.method, "Start ignored: brew already complete");
            return StartOutcome::AlreadyComplete;
        }

        let before = self.phase(total);
        let outcome = if self.seconds_elapsed == 0 {
            self.cursor = recipe
                .steps
                .iter()
                .position(|s| s.start_time_seconds == 0 && s.is_timed)
                .map_or(StepCursor::At(0), StepCursor::At);
            StartOutcome::Started
        } else {
            StartOutcome::Resumed
        };

        // the old guard must be gone before a new source starts ticking
        self.guard = None;
        self.guard = Some(acquire());
        self.log_transition(before, total);
        outcome
    }

    /// Stops ticking and keeps elapsed time and step position.
    pub fn pause(&mut self, total_brew_time_seconds: u32) -> bool {
        if self.guard.is_none() {
            debug!(method = %self.method, "Pause ignored: not running");
            return false;
        }
        let before = self.phase(total_brew_time_seconds);
        self.guard = None;
        self.log_transition(before, total_brew_time_seconds);
        true
    }

    pub fn reset(&mut self, total_brew_time_seconds: u32) {
        let before = self.phase(total_brew_time_seconds);
        self.guard = None;
        self.seconds_elapsed = 0;
        self.cursor = StepCursor::NotStarted;
        self.log_transition(before, total_brew_time_seconds);
    }

    /// Advances one second against `recipe`.
    pub fn tick(&mut self, recipe: &CalculatedRecipe) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Ignored;
        }
        let total = recipe.total_brew_time_seconds;
        let elapsed = self.seconds_elapsed + 1;
        let cursor = active_step(&recipe.steps, elapsed, total);

        if total > 0 && elapsed > total {
            self.seconds_elapsed = total;
            self.cursor = cursor.pinned(recipe.steps.len());
            self.guard = None;
            self.log_transition(TimerPhase::Running, total);
            return TickOutcome::Completed;
        }

        let step_changed = cursor != self.cursor;
        self.seconds_elapsed = elapsed;
        self.cursor = cursor;
        if step_changed {
            debug!(method = %self.method, elapsed, ?cursor, "Step changed");
        }
        TickOutcome::Advanced { step_changed }
    }

    fn log_transition(&self, before: TimerPhase, total: u32) {
        let after = self.phase(total);
        if before != after {
            info!(
                "Timer state changed ({}): {:?} -> {:?}",
                self.method, before, after
            );
        }
    }
}

/// The step whose interval contains `elapsed`.
///
/// A timed final step stays active through its end (inclusive); an untimed
/// step is active until the next step starts, or for good if it is last; any
/// other timed step covers `[start, start + duration)`.
pub fn active_step(steps: &[RecipeStep], elapsed: u32, total: u32) -> StepCursor {
    let last = steps.len().checked_sub(1);
    steps
        .iter()
        .enumerate()
        .position(|(idx, step)| {
            if Some(idx) == last && step.is_timed {
                elapsed <= step.end_time_seconds().min(total)
            } else if !step.is_timed {
                elapsed >= step.start_time_seconds
                    && steps
                        .get(idx + 1)
                        .is_none_or(|next| elapsed < next.start_time_seconds)
            } else {
                elapsed >= step.start_time_seconds && elapsed < step.end_time_seconds()
            }
        })
        .map_or(StepCursor::Finished, StepCursor::At)
}

/// Values derived for display from a timer and its recipe.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimerView<'a> {
    pub method: BrewMethod,
    pub phase: TimerPhase,
    pub seconds_elapsed: u32,
    pub total_brew_time_seconds: u32,
    pub cursor: StepCursor,
    pub current_step: Option<&'a RecipeStep>,
    pub next_step: Option<&'a RecipeStep>,
    /// Seconds spent in the current step; zero for untimed steps.
    pub elapsed_in_step: u32,
    /// Seconds left in the current step; zero unless it is timed and non-empty.
    pub remaining_in_step: u32,
    /// `elapsed / total`, zero for an empty recipe.
    pub overall_progress: f64,
    /// Fraction of the current step done, in `[0, 1]`.
    pub step_progress: f64,
}

impl<'a> TimerView<'a> {
    pub fn new(timer: &TimerInstance, recipe: &'a CalculatedRecipe) -> Self {
        let total = recipe.total_brew_time_seconds;
        let elapsed = timer.seconds_elapsed;
        let cursor = timer.cursor;

        let current_step = cursor.index().and_then(|i| recipe.steps.get(i));
        let next_step = match cursor {
            StepCursor::NotStarted => recipe.steps.first(),
            StepCursor::At(i) => recipe.steps.get(i + 1),
            StepCursor::Finished => None,
        };

        let elapsed_in_step = match current_step {
            Some(step) if step.is_timed => elapsed.saturating_sub(step.start_time_seconds),
            _ => 0,
        };
        let (remaining_in_step, step_progress) = match current_step {
            Some(step) if step.is_timed && step.duration_seconds > 0 => (
                step.duration_seconds.saturating_sub(elapsed_in_step),
                (f64::from(elapsed_in_step) / f64::from(step.duration_seconds)).min(1.0),
            ),
            _ => (0, 0.0),
        };

        let overall_progress = if total > 0 {
            f64::from(elapsed) / f64::from(total)
        } else {
            0.0
        };

        Self {
            method: timer.method,
            phase: timer.phase(total),
            seconds_elapsed: elapsed,
            total_brew_time_seconds: total,
            cursor,
            current_step,
            next_step,
            elapsed_in_step,
            remaining_in_step,
            overall_progress,
            step_progress,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == TimerPhase::Completed
    }
}

/// `MM:SS`, for the main clock.
pub fn format_clock(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// `M:SS`, for step durations.
pub fn format_step_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
