//! Application context: current inputs, the recipe they produce, and one
//! timer per brew method.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::clamp;
use crate::recipe::{CalculatedRecipe, generate_full_recipe};
use crate::tables::{self, MAX_WATER_IN_KETTLE_ML, MIN_WATER_IN_KETTLE_ML};
use crate::timer::{
    StartOutcome, TickOutcome, TickScheduler, TimerInstance, TimerPhase, TimerView,
};
use crate::types::{BrewMethod, GrindSize, RecipeInputs, RoastType};

/// Owns the recipe for the active method and every method's timer.
///
/// All mutation goes through `&mut self`, so a tick and a user command can
/// never interleave. Changing any input recomputes the recipe before the
/// call returns, and resets the active method's timer if it had started.
#[derive(Debug)]
pub struct BrewSession {
    inputs: RecipeInputs,
    recipe: CalculatedRecipe,
    timers: HashMap<BrewMethod, TimerInstance>,
    next_generation: u64,
}

impl BrewSession {
    pub fn new(inputs: RecipeInputs) -> Self {
        let inputs = normalize(inputs);
        let timers = BrewMethod::ALL
            .into_iter()
            .map(|m| (m, TimerInstance::new(m)))
            .collect();
        Self {
            recipe: generate_full_recipe(&inputs),
            inputs,
            timers,
            next_generation: 1,
        }
    }

    pub fn inputs(&self) -> &RecipeInputs {
        &self.inputs
    }

    pub fn recipe(&self) -> &CalculatedRecipe {
        &self.recipe
    }

    pub fn active_method(&self) -> BrewMethod {
        self.inputs.brew_method
    }

    pub fn timer(&self, method: BrewMethod) -> &TimerInstance {
        &self.timers[&method]
    }

    pub fn active_timer(&self) -> &TimerInstance {
        self.timer(self.active_method())
    }

    pub fn view(&self) -> TimerView<'_> {
        TimerView::new(self.active_timer(), &self.recipe)
    }

    /// Applies `update` to the inputs. Returns `false` when nothing changed
    /// after normalization, in which case the recipe and timers are untouched.
    pub fn update_inputs<F>(&mut self, update: F) -> bool
    where
        F: FnOnce(&mut RecipeInputs),
    {
        let mut next = self.inputs;
        update(&mut next);
        let next = normalize(next);
        if next == self.inputs {
            return false;
        }

        let previous_method = self.inputs.brew_method;
        if next.brew_method != previous_method {
            // the departing method keeps its elapsed time but stops ticking
            let total = self.recipe.total_brew_time_seconds;
            self.timer_mut(previous_method).pause(total);
        }

        self.inputs = next;
        self.recipe = generate_full_recipe(&self.inputs);
        debug!(inputs = ?self.inputs, "Inputs changed, recipe recomputed");

        let total = self.recipe.total_brew_time_seconds;
        let timer = self.timer_mut(next.brew_method);
        // a start with no ticks yet still counts as a started brew
        if timer.phase(total) != TimerPhase::Idle {
            info!(method = %next.brew_method, "Recipe changed, resetting timer");
            timer.reset(total);
        }
        true
    }

    pub fn set_roast_type(&mut self, roast: RoastType) -> bool {
        self.update_inputs(|i| i.roast_type = roast)
    }

    pub fn set_grind_size(&mut self, grind: GrindSize) -> bool {
        self.update_inputs(|i| i.grind_size = grind)
    }

    pub fn set_water_amount_in_kettle_ml(&mut self, ml: u32) -> bool {
        self.update_inputs(|i| i.water_amount_in_kettle_ml = ml)
    }

    pub fn set_brew_method(&mut self, method: BrewMethod) -> bool {
        self.update_inputs(|i| i.brew_method = method)
    }

    pub fn set_cups(&mut self, cups: u32) -> bool {
        self.update_inputs(|i| i.cups = cups)
    }

    /// Starts or resumes the active method's timer, acquiring a new tick
    /// source from `scheduler`.
    pub fn start(&mut self, scheduler: &mut impl TickScheduler) -> StartOutcome {
        let method = self.active_method();
        let generation = self.next_generation;
        let timer = self
            .timers
            .entry(method)
            .or_insert_with(|| TimerInstance::new(method));
        let outcome = timer.start(Some(&self.recipe), || scheduler.schedule(method, generation));
        if matches!(outcome, StartOutcome::Started | StartOutcome::Resumed) {
            self.next_generation += 1;
        }
        outcome
    }

    pub fn pause(&mut self) -> bool {
        let total = self.recipe.total_brew_time_seconds;
        let method = self.active_method();
        self.timer_mut(method).pause(total)
    }

    pub fn reset(&mut self) {
        let total = self.recipe.total_brew_time_seconds;
        let method = self.active_method();
        self.timer_mut(method).reset(total);
    }

    /// Applies one tick from the source tagged `generation`. Ticks from a
    /// cancelled source, or for a method that is not active, are ignored.
    pub fn tick(&mut self, method: BrewMethod, generation: u64) -> TickOutcome {
        if method != self.active_method() {
            debug!(%method, generation, "Tick ignored: method not active");
            return TickOutcome::Ignored;
        }
        let timer = self
            .timers
            .entry(method)
            .or_insert_with(|| TimerInstance::new(method));
        if timer.generation() != Some(generation) {
            debug!(%method, generation, "Tick ignored: stale generation");
            return TickOutcome::Ignored;
        }
        timer.tick(&self.recipe)
    }

    fn timer_mut(&mut self, method: BrewMethod) -> &mut TimerInstance {
        self.timers
            .entry(method)
            .or_insert_with(|| TimerInstance::new(method))
    }
}

impl Default for BrewSession {
    fn default() -> Self {
        Self::new(RecipeInputs::default())
    }
}

/// Clamps kettle volume to its range and cups to `1..=max` for the method.
fn normalize(mut inputs: RecipeInputs) -> RecipeInputs {
    inputs.water_amount_in_kettle_ml = clamp(
        inputs.water_amount_in_kettle_ml,
        MIN_WATER_IN_KETTLE_ML,
        MAX_WATER_IN_KETTLE_ML,
    );
    inputs.cups = clamp(inputs.cups, 1, tables::max_cups(inputs.brew_method));
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{StepCursor, TickGuard};

    /// Hands out detached guards and records what was scheduled.
    #[derive(Default)]
    struct ManualTicks {
        scheduled: Vec<(BrewMethod, u64)>,
    }

    impl TickScheduler for ManualTicks {
        fn schedule(&mut self, method: BrewMethod, generation: u64) -> TickGuard {
            self.scheduled.push((method, generation));
            TickGuard::detached(method, generation)
        }
    }

    impl ManualTicks {
        fn current(&self) -> (BrewMethod, u64) {
            *self.scheduled.last().unwrap()
        }
    }

    fn advance(session: &mut BrewSession, ticks: &ManualTicks, n: u32) {
        let (method, generation) = ticks.current();
        for _ in 0..n {
            session.tick(method, generation);
        }
    }

    #[test]
    fn test_new_session_is_idle_everywhere() {
        let session = BrewSession::default();
        for method in BrewMethod::ALL {
            let timer = session.timer(method);
            assert_eq!(timer.seconds_elapsed(), 0);
            assert!(!timer.is_running());
            assert_eq!(timer.cursor(), StepCursor::NotStarted);
        }
        assert_eq!(session.view().phase, TimerPhase::Idle);
    }

    #[test]
    fn test_input_change_resets_started_timer() {
        let mut session = BrewSession::default();
        let mut ticks = ManualTicks::default();
        session.start(&mut ticks);
        advance(&mut session, &ticks, 20);
        assert_eq!(session.active_timer().seconds_elapsed(), 20);

        assert!(session.set_roast_type(RoastType::Dark));
        let timer = session.active_timer();
        assert_eq!(timer.seconds_elapsed(), 0);
        assert!(!timer.is_running());
        assert_eq!(timer.cursor(), StepCursor::NotStarted);
        assert_eq!(session.recipe().inputs.roast_type, RoastType::Dark);
    }

    #[test]
    fn test_unchanged_input_keeps_timer() {
        let mut session = BrewSession::default();
        let mut ticks = ManualTicks::default();
        session.start(&mut ticks);
        advance(&mut session, &ticks, 5);

        assert!(!session.set_roast_type(RoastType::Medium));
        assert_eq!(session.active_timer().seconds_elapsed(), 5);
        assert!(session.active_timer().is_running());
    }

    #[test]
    fn test_stale_ticks_are_ignored() {
        let mut session = BrewSession::default();
        let mut ticks = ManualTicks::default();
        session.start(&mut ticks);
        let (method, first) = ticks.current();
        session.pause();
        session.start(&mut ticks);
        let (_, second) = ticks.current();
        assert_ne!(first, second);

        assert_eq!(session.tick(method, first), TickOutcome::Ignored);
        assert_eq!(session.active_timer().seconds_elapsed(), 0);
        assert_eq!(
            session.tick(method, second),
            TickOutcome::Advanced { step_changed: false }
        );
        assert_eq!(session.active_timer().seconds_elapsed(), 1);
    }

    #[test]
    fn test_tick_after_reset_is_ignored() {
        let mut session = BrewSession::default();
        let mut ticks = ManualTicks::default();
        session.start(&mut ticks);
        let (method, generation) = ticks.current();
        session.reset();
        assert_eq!(session.tick(method, generation), TickOutcome::Ignored);
        assert_eq!(session.view().phase, TimerPhase::Idle);
    }

    #[test]
    fn test_full_brew_completes() {
        let mut session = BrewSession::new(RecipeInputs {
            brew_method: BrewMethod::AeroPress,
            ..RecipeInputs::default()
        });
        let mut ticks = ManualTicks::default();
        assert_eq!(session.start(&mut ticks), StartOutcome::Started);
        let total = session.recipe().total_brew_time_seconds;
        advance(&mut session, &ticks, total + 5);

        let view = session.view();
        assert!(view.is_complete());
        assert_eq!(view.seconds_elapsed, total);
        assert_eq!(view.current_step.map(|s| s.id.as_str()), Some("aeropress-serve"));
        assert_eq!(session.start(&mut ticks), StartOutcome::AlreadyComplete);
        assert_eq!(ticks.scheduled.len(), 1);
    }

    #[test]
    fn test_switching_method_pauses_departing_timer() {
        let mut session = BrewSession::default();
        let mut ticks = ManualTicks::default();
        session.start(&mut ticks);
        advance(&mut session, &ticks, 12);
        let (pour_over, generation) = ticks.current();

        assert!(session.set_brew_method(BrewMethod::FrenchPress));
        let departed = session.timer(BrewMethod::PourOver);
        assert!(!departed.is_running());
        assert_eq!(departed.seconds_elapsed(), 12);
        assert_eq!(session.tick(pour_over, generation), TickOutcome::Ignored);
        assert_eq!(session.active_method(), BrewMethod::FrenchPress);

        // coming back is an input change for pour-over, so its timer resets
        assert!(session.set_brew_method(BrewMethod::PourOver));
        assert_eq!(session.active_timer().seconds_elapsed(), 0);
    }

    #[test]
    fn test_reselected_method_resets_when_left_before_first_tick() {
        let mut session = BrewSession::default();
        let mut ticks = ManualTicks::default();
        session.start(&mut ticks);
        assert_eq!(session.view().phase, TimerPhase::Running);

        session.set_brew_method(BrewMethod::AeroPress);
        let departed = session.timer(BrewMethod::PourOver);
        assert_eq!(departed.seconds_elapsed(), 0);
        assert!(!departed.is_running());

        session.set_grind_size(GrindSize::Coarse);
        assert!(session.set_brew_method(BrewMethod::PourOver));
        let timer = session.active_timer();
        assert_eq!(timer.cursor(), StepCursor::NotStarted);
        assert_eq!(session.view().phase, TimerPhase::Idle);
    }

    #[test]
    fn test_inactive_timer_untouched_by_input_change() {
        let mut session = BrewSession::default();
        let mut ticks = ManualTicks::default();
        session.start(&mut ticks);
        advance(&mut session, &ticks, 12);
        session.set_brew_method(BrewMethod::AeroPress);

        session.set_grind_size(GrindSize::Fine);
        assert_eq!(session.timer(BrewMethod::PourOver).seconds_elapsed(), 12);
    }

    #[test]
    fn test_inputs_are_normalized() {
        let mut session = BrewSession::default();
        session.set_cups(2);
        session.set_brew_method(BrewMethod::AeroPress);
        assert_eq!(session.inputs().cups, 1);

        session.set_water_amount_in_kettle_ml(5000);
        assert_eq!(session.inputs().water_amount_in_kettle_ml, MAX_WATER_IN_KETTLE_ML);
        session.set_cups(0);
        assert_eq!(session.inputs().cups, 1);
    }
}
