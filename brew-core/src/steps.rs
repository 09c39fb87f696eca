//! Per-method step generation.
//!
//! Pour-over lays its steps out in a single forward pass. AeroPress and
//! French Press use two passes: the first estimates every duration from the
//! method's heuristics, the second (`settle_final_step`) recomputes the final
//! timed step so it absorbs all rounding slack and ends exactly at the
//! recipe's total brew time. Step texts are rendered after the second pass so
//! they always quote the durations that are actually timed.

use crate::recipe::RecipeStep;
use crate::tables::{
    AEROPRESS_BLOOM_COFFEE_RATIO, AEROPRESS_BLOOM_WAIT_SECONDS, AEROPRESS_PLUNGE_SECONDS,
    FRENCH_PRESS_CRUST_BREAK_WAIT_SECONDS, FRENCH_PRESS_PLUNGE_SECONDS,
    POUROVER_BLOOM_COFFEE_RATIO, POUROVER_BLOOM_WAIT_SECONDS, POUROVER_DARK_BLOOM_WAIT_SECONDS,
    POUROVER_DEFAULT_MAIN_POURS,
};
use crate::types::{BrewMethod, RoastType};

/// Shortest plunge/press the final step may be settled to.
pub const FINAL_STEP_MIN_SECONDS: u32 = 10;
/// No earlier timed step is shortened below this when making room for the final one.
pub const RECLAIM_FLOOR_SECONDS: u32 = 5;

pub(crate) fn generate_steps(
    method: BrewMethod,
    roast: RoastType,
    coffee_grams: f64,
    total_water_ml: u32,
    total_brew_time: u32,
) -> Vec<RecipeStep> {
    match method {
        BrewMethod::PourOver => pour_over_steps(coffee_grams, total_water_ml, total_brew_time, roast),
        BrewMethod::AeroPress => aeropress_steps(coffee_grams, total_water_ml, total_brew_time),
        BrewMethod::FrenchPress => french_press_steps(total_water_ml, total_brew_time),
    }
}

fn timed(id: impl Into<String>, title: impl Into<String>, details: String, start: u32, duration: u32) -> RecipeStep {
    RecipeStep {
        id: id.into(),
        title: title.into(),
        details,
        start_time_seconds: start,
        duration_seconds: duration,
        is_timed: true,
    }
}

fn untimed(id: &str, title: &str, details: &str, start: u32) -> RecipeStep {
    RecipeStep {
        id: id.to_string(),
        title: title.to_string(),
        details: details.to_string(),
        start_time_seconds: start,
        duration_seconds: 0,
        is_timed: false,
    }
}

fn pour_over_steps(coffee_grams: f64, total_water_ml: u32, total: u32, roast: RoastType) -> Vec<RecipeStep> {
    let mut steps = Vec::new();
    let total_i = i64::from(total);
    let mut now: u32 = 0;

    steps.push(untimed(
        "pourover-prepare",
        "1. Prepare",
        "Rinse filter with hot water, discard rinse water. Add coffee grounds to dripper, \
         level the bed, and tare your scale.",
        now,
    ));

    let bloom_water = (coffee_grams * POUROVER_BLOOM_COFFEE_RATIO).round() as u32;
    let bloom_pour = 15;
    steps.push(timed(
        "pourover-bloom",
        "2. Bloom Pour",
        format!("Pour {bloom_water}mL of water evenly to saturate all grounds. Start your main timer."),
        now,
        bloom_pour,
    ));
    now += bloom_pour;

    let bloom_wait = if roast.is_dark_or_espresso() {
        POUROVER_DARK_BLOOM_WAIT_SECONDS
    } else {
        POUROVER_BLOOM_WAIT_SECONDS
    };
    steps.push(timed(
        "pourover-bloom-wait",
        "3. Wait for Bloom",
        format!("Allow coffee to bloom for {bloom_wait} seconds. Look for CO2 bubbles escaping."),
        now,
        bloom_wait,
    ));
    now += bloom_wait;

    let pours = POUROVER_DEFAULT_MAIN_POURS;
    let remaining_water = total_water_ml.saturating_sub(bloom_water);
    let water_per_pour = (f64::from(remaining_water) / f64::from(pours)).round() as u32;

    // each pour gets one phase, the drawdown half of one
    let budget = total_i - i64::from(now);
    let phase = ((budget as f64 / (f64::from(pours) + 0.5)).floor() as i64).max(30);
    let pour_duration = (phase as f64 * 0.6).round() as u32;
    let wait_duration = (phase as f64 * 0.4).round() as u32;

    let mut poured = bloom_water;
    for i in 0..pours {
        let is_last = i == pours - 1;
        if !is_last && now + pour_duration > total {
            break;
        }
        let amount = if is_last {
            total_water_ml.saturating_sub(bloom_water + water_per_pour * (pours - 1))
        } else {
            water_per_pour
        };
        poured += amount;
        steps.push(timed(
            format!("pourover-mainpour-{}", i + 1),
            format!("4. Main Pour {}/{pours}", i + 1),
            format!(
                "Slowly pour {amount}mL of water in a circular motion, avoiding the edges. \
                 Aim to reach {poured}mL total water."
            ),
            now,
            pour_duration,
        ));
        now += pour_duration;

        if !is_last && now + wait_duration < total {
            steps.push(timed(
                format!("pourover-waitpour-{}", i + 1),
                "Wait Briefly",
                "Allow water to partially draw down before next pour.".to_string(),
                now,
                wait_duration,
            ));
            now += wait_duration;
        }
    }

    let drawdown = total.saturating_sub(now).max(15);
    steps.push(timed(
        "pourover-drawdown",
        format!("{}. Final Drawdown", 3 + pours + (pours - 1)),
        "Allow all water to drip through the coffee bed. This should complete around your \
         target brew time."
            .to_string(),
        now,
        drawdown,
    ));

    steps.push(untimed(
        "pourover-serve",
        "Serve & Enjoy",
        "Once dripping slows to every few seconds, remove dripper. Swirl, serve, and enjoy \
         your coffee!",
        total,
    ));

    steps
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AeroPressPhase {
    AddCoffee,
    BloomWait,
    AddWater,
    Steep,
    PreparePlunge,
    Plunge,
}

fn aeropress_steps(coffee_grams: f64, total_water_ml: u32, total: u32) -> Vec<RecipeStep> {
    use AeroPressPhase::*;

    let total_i = i64::from(total);
    let reserve = i64::from(AEROPRESS_PLUNGE_SECONDS + 5);
    let mut plan: Vec<(AeroPressPhase, u32)> = Vec::new();
    let mut now: i64 = 0;

    // first pass: estimates
    plan.push((AddCoffee, 15));
    now += 15;

    let bloom_wait = i64::from(AEROPRESS_BLOOM_WAIT_SECONDS).min(total_i - now - reserve);
    if bloom_wait > 0 {
        plan.push((BloomWait, bloom_wait as u32));
        now += bloom_wait;
    }

    plan.push((AddWater, 10));
    now += 10;

    let steep = (total_i - now - reserve).max(15);
    plan.push((Steep, steep as u32));
    now += steep;

    plan.push((PreparePlunge, 10));
    now += 10;

    let plunge = i64::from(AEROPRESS_PLUNGE_SECONDS).min((total_i - now).max(10));
    plan.push((Plunge, plunge as u32));

    // second pass
    let mut durations: Vec<u32> = plan.iter().map(|(_, d)| *d).collect();
    settle_final_step(&mut durations, total);

    let bloom_water = (coffee_grams * AEROPRESS_BLOOM_COFFEE_RATIO).round() as u32;
    let remaining_water = total_water_ml.saturating_sub(bloom_water);

    let mut steps = vec![untimed(
        "aeropress-prepare",
        "1. Prepare (Inverted)",
        "Assemble AeroPress in inverted position (numbers upside down). Place on a sturdy mug \
         or server. Rinse paper filter in cap with hot water and set aside.",
        0,
    )];

    let mut start = 0;
    for (&(phase, _), &duration) in plan.iter().zip(&durations) {
        let step = match phase {
            AddCoffee => timed(
                "aeropress-addcoffee",
                "2. Add Coffee & Bloom Water",
                format!(
                    "Add {coffee_grams:.1}g of coffee. Pour {bloom_water}mL of water. Start timer. \
                     Stir gently to ensure all grounds are wet."
                ),
                start,
                duration,
            ),
            BloomWait => timed(
                "aeropress-bloomwait",
                "3. Wait for Bloom",
                format!("Allow coffee to bloom and saturate for {duration} seconds."),
                start,
                duration,
            ),
            AddWater => timed(
                "aeropress-addwater",
                "4. Add Remaining Water",
                format!("Add remaining {remaining_water}mL of water, filling to desired level."),
                start,
                duration,
            ),
            Steep => timed(
                "aeropress-steep",
                "5. Steep",
                format!("Wait for {duration} seconds for coffee to steep."),
                start,
                duration,
            ),
            PreparePlunge => timed(
                "aeropress-prepareplunge",
                "6. Prepare to Plunge",
                "Secure filter cap. Carefully flip AeroPress onto your mug. Position for plunging."
                    .to_string(),
                start,
                duration,
            ),
            Plunge => timed(
                "aeropress-plunge",
                "7. Plunge",
                format!(
                    "Slowly press plunger downwards for about {duration} seconds. \
                     Stop if you hear a hiss."
                ),
                start,
                duration,
            ),
        };
        start += duration;
        steps.push(step);
    }

    steps.push(untimed(
        "aeropress-serve",
        "8. Serve",
        "Your coffee concentrate is ready. Dilute with hot water to taste if desired. Enjoy!",
        total,
    ));

    steps
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FrenchPressPhase {
    AddWater,
    InitialSteep,
    BreakCrust,
    ContinueSteep,
    Press,
}

fn french_press_steps(total_water_ml: u32, total: u32) -> Vec<RecipeStep> {
    use FrenchPressPhase::*;

    let total_i = i64::from(total);
    let press_reserve = i64::from(FRENCH_PRESS_PLUNGE_SECONDS);
    let mut plan: Vec<(FrenchPressPhase, u32)> = Vec::new();
    let mut now: i64 = 0;

    plan.push((AddWater, 20));
    now += 20;

    // leave room for the crust break, more steeping and the press
    let steep_and_press = total_i - now - press_reserve;
    let initial = i64::from(FRENCH_PRESS_CRUST_BREAK_WAIT_SECONDS).min((steep_and_press - 30).max(30));
    plan.push((InitialSteep, initial as u32));
    now += initial;

    plan.push((BreakCrust, 10));
    now += 10;

    let continued = (total_i - now - press_reserve).max(30);
    plan.push((ContinueSteep, continued as u32));
    now += continued;

    let press = press_reserve.min((total_i - now).max(10));
    plan.push((Press, press as u32));

    let mut durations: Vec<u32> = plan.iter().map(|(_, d)| *d).collect();
    settle_final_step(&mut durations, total);

    let mut steps = vec![untimed(
        "frenchpress-prepare",
        "1. Preheat & Add Coffee",
        "Preheat French Press vessel with hot water, then discard. Add coffee grounds.",
        0,
    )];

    let mut start = 0;
    for (&(phase, _), &duration) in plan.iter().zip(&durations) {
        let step = match phase {
            AddWater => timed(
                "frenchpress-addwater",
                "2. Add Water",
                format!(
                    "Pour {total_water_ml}mL of hot water over grounds, ensuring all are saturated. \
                     Start timer. Place lid on top, plunger up."
                ),
                start,
                duration,
            ),
            InitialSteep => timed(
                "frenchpress-initialsteep",
                "3. Initial Steep",
                format!("Let coffee steep for {duration} seconds."),
                start,
                duration,
            ),
            BreakCrust => timed(
                "frenchpress-breakcrust",
                "4. Break Crust",
                "Gently stir the top layer (the crust) to allow grounds to sink.".to_string(),
                start,
                duration,
            ),
            ContinueSteep => timed(
                "frenchpress-continuesteep",
                "5. Continue Steeping",
                format!("Allow coffee to continue steeping for {duration} seconds."),
                start,
                duration,
            ),
            Press => timed(
                "frenchpress-press",
                "6. Press",
                format!(
                    "Slowly and steadily press the plunger all the way down over about {duration} seconds."
                ),
                start,
                duration,
            ),
        };
        start += duration;
        steps.push(step);
    }

    steps.push(untimed(
        "frenchpress-serve",
        "7. Serve Immediately",
        "Pour coffee into mugs immediately to prevent over-extraction. Enjoy!",
        total,
    ));

    steps
}

/// Recomputes the last duration as `total - sum(others)`, floored at
/// [`FINAL_STEP_MIN_SECONDS`]. When the floor pushes the timeline past
/// `total`, the overrun is taken back from the earlier steps, longest first
/// (later step on ties), never shortening one below [`RECLAIM_FLOOR_SECONDS`].
pub fn settle_final_step(durations: &mut [u32], total: u32) {
    let Some((last, prior)) = durations.split_last_mut() else {
        return;
    };
    let prior_sum: u32 = prior.iter().sum();
    *last = total.saturating_sub(prior_sum).max(FINAL_STEP_MIN_SECONDS);

    let mut overrun = (prior_sum + *last).saturating_sub(total);
    while overrun > 0 {
        let Some(idx) = prior
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > RECLAIM_FLOOR_SECONDS)
            .max_by_key(|(i, d)| (**d, *i))
            .map(|(i, _)| i)
        else {
            break;
        };
        let take = (prior[idx] - RECLAIM_FLOOR_SECONDS).min(overrun);
        prior[idx] -= take;
        overrun -= take;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::generate_full_recipe;
    use crate::types::{GrindSize, RecipeInputs};
    use std::collections::HashSet;

    fn recipe_steps(method: BrewMethod, roast: RoastType, grind: GrindSize) -> Vec<RecipeStep> {
        generate_full_recipe(&RecipeInputs {
            roast_type: roast,
            grind_size: grind,
            water_amount_in_kettle_ml: 1000,
            brew_method: method,
            cups: 1,
        })
        .steps
    }

    #[test]
    fn test_timed_steps_tile_the_brew_for_every_input() {
        for method in BrewMethod::ALL {
            for roast in RoastType::ALL {
                for grind in GrindSize::ALL {
                    for cups in 1..=2 {
                        let r = generate_full_recipe(&RecipeInputs {
                            roast_type: roast,
                            grind_size: grind,
                            water_amount_in_kettle_ml: 1000,
                            brew_method: method,
                            cups,
                        });
                        let total = r.total_brew_time_seconds;
                        let mut expected_start = 0;
                        for step in r.timed_steps() {
                            assert_eq!(step.start_time_seconds, expected_start, "{method:?} {roast:?} {grind:?}");
                            assert!(step.duration_seconds > 0);
                            expected_start = step.end_time_seconds();
                        }
                        assert_eq!(expected_start, total, "{method:?} {roast:?} {grind:?}");

                        let serve = r.steps.last().unwrap();
                        assert!(!serve.is_timed);
                        assert_eq!(serve.start_time_seconds, total);
                        assert!(!r.steps[0].is_timed);

                        let ids: HashSet<_> = r.steps.iter().map(|s| s.id.as_str()).collect();
                        assert_eq!(ids.len(), r.steps.len());
                    }
                }
            }
        }
    }

    #[test]
    fn test_pour_over_medium_layout() {
        let steps = recipe_steps(BrewMethod::PourOver, RoastType::Medium, GrindSize::Medium);
        let layout: Vec<_> = steps
            .iter()
            .map(|s| (s.id.as_str(), s.start_time_seconds, s.duration_seconds))
            .collect();
        // 135s left after bloom: phase 54, pour 32, wait 22
        assert_eq!(
            layout,
            vec![
                ("pourover-prepare", 0, 0),
                ("pourover-bloom", 0, 15),
                ("pourover-bloom-wait", 15, 45),
                ("pourover-mainpour-1", 60, 32),
                ("pourover-waitpour-1", 92, 22),
                ("pourover-mainpour-2", 114, 32),
                ("pourover-drawdown", 146, 49),
                ("pourover-serve", 195, 0),
            ]
        );
        assert_eq!(steps[6].title, "6. Final Drawdown");
    }

    #[test]
    fn test_pour_over_water_adds_up() {
        // 240 mL / 16 = 15g coffee, bloom 30 mL, two pours of 105 mL
        let steps = recipe_steps(BrewMethod::PourOver, RoastType::Medium, GrindSize::Medium);
        assert!(steps[1].details.contains("Pour 30mL"));
        assert!(steps[3].details.contains("pour 105mL"));
        assert!(steps[5].details.contains("Aim to reach 240mL"));
    }

    #[test]
    fn test_dark_pour_over_blooms_shorter() {
        let steps = recipe_steps(BrewMethod::PourOver, RoastType::Dark, GrindSize::Medium);
        assert_eq!(steps[2].duration_seconds, 30);
    }

    #[test]
    fn test_aeropress_plunge_absorbs_overrun() {
        // Medium/Medium is 75s: the estimates add up to 90s
        let steps = recipe_steps(BrewMethod::AeroPress, RoastType::Medium, GrindSize::Medium);
        let plunge = steps.iter().find(|s| s.id == "aeropress-plunge").unwrap();
        assert_eq!(plunge.duration_seconds, FINAL_STEP_MIN_SECONDS);
        assert_eq!(plunge.end_time_seconds(), 75);

        let bloom = steps.iter().find(|s| s.id == "aeropress-bloomwait").unwrap();
        assert_eq!(bloom.duration_seconds, 15);
        assert!(bloom.details.contains("for 15 seconds"));
    }

    #[test]
    fn test_aeropress_long_brew_keeps_bloom() {
        // Light/Coarse is 110s
        let steps = recipe_steps(BrewMethod::AeroPress, RoastType::Light, GrindSize::Coarse);
        let durations: Vec<_> = steps.iter().filter(|s| s.is_timed).map(|s| s.duration_seconds).collect();
        assert_eq!(durations, vec![15, 30, 10, 30, 10, 15]);
    }

    #[test]
    fn test_aeropress_short_brew_skips_bloom_wait() {
        let steps = recipe_steps(BrewMethod::AeroPress, RoastType::Espresso, GrindSize::Fine);
        assert!(steps.iter().all(|s| s.id != "aeropress-bloomwait"));
    }

    #[test]
    fn test_french_press_press_settles_at_thirty() {
        let steps = recipe_steps(BrewMethod::FrenchPress, RoastType::Medium, GrindSize::Coarse);
        let durations: Vec<_> = steps.iter().filter(|s| s.is_timed).map(|s| s.duration_seconds).collect();
        // 270s: 20 + 60 + 10 + 150 + 30
        assert_eq!(durations, vec![20, 60, 10, 150, 30]);
        assert_eq!(steps.last().unwrap().title, "7. Serve Immediately");
    }

    #[test]
    fn test_settle_final_step_fills_slack() {
        let mut d = vec![20, 30, 10];
        settle_final_step(&mut d, 100);
        assert_eq!(d, vec![20, 30, 50]);
    }

    #[test]
    fn test_settle_final_step_reclaims_longest_first() {
        let mut d = vec![15, 10, 15, 10, 20];
        settle_final_step(&mut d, 35);
        assert_eq!(d, vec![5, 10, 5, 5, 10]);
        assert_eq!(d.iter().sum::<u32>(), 35);
    }

    #[test]
    fn test_settle_final_step_empty_is_noop() {
        let mut d: Vec<u32> = Vec::new();
        settle_final_step(&mut d, 10);
        assert!(d.is_empty());
    }
}
