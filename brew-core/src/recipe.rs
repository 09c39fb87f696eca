//! Recipe engine: five inputs in, one fully time-boxed recipe out.

use serde::Serialize;
use tracing::debug;

use crate::clamp;
use crate::steps::generate_steps;
use crate::tables;
use crate::types::{BrewMethod, GrindSize, RecipeInputs, RoastType};

/// One instruction in a recipe.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecipeStep {
    /// Stable key, unique within the recipe (e.g. `pourover-bloom`).
    pub id: String,
    pub title: String,
    pub details: String,
    /// Offset from the start of the brew.
    pub start_time_seconds: u32,
    pub duration_seconds: u32,
    /// Untimed steps are the prepare/serve bookends and last zero seconds.
    pub is_timed: bool,
}

impl RecipeStep {
    pub fn end_time_seconds(&self) -> u32 {
        self.start_time_seconds + self.duration_seconds
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Info,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WarningMessage {
    pub id: &'static str,
    pub severity: Severity,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<&'static str>,
}

/// Everything needed to brew one batch. Replaced wholesale on any input change.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CalculatedRecipe {
    pub target_temperature_celsius: u32,
    pub wait_time_after_boil_seconds: u32,
    /// Rounded to one decimal.
    pub coffee_amount_grams: f64,
    pub water_for_brewing_ml: u32,
    /// `1:N` with N to one decimal.
    pub coffee_to_water_ratio: String,
    pub total_brew_time_seconds: u32,
    pub steps: Vec<RecipeStep>,
    pub warnings: Vec<WarningMessage>,
    /// Inputs as used, with `cups` clamped to the method's maximum.
    pub inputs: RecipeInputs,
}

impl CalculatedRecipe {
    pub fn actual_cups(&self) -> u32 {
        self.inputs.cups
    }

    pub fn timed_steps(&self) -> impl Iterator<Item = &RecipeStep> {
        self.steps.iter().filter(|s| s.is_timed)
    }

    pub fn has_warning(&self, id: &str) -> bool {
        self.warnings.iter().any(|w| w.id == id)
    }
}

pub const WARN_FINE_POUROVER_DARK: &str = "preground-fine-pourover-dark";
pub const WARN_FINE_FRENCH_PRESS: &str = "fine-grind-frenchpress";
pub const WARN_LIGHT_COARSE_AEROPRESS: &str = "light-coarse-aeropress";
pub const WARN_ESPRESSO_POUROVER: &str = "espresso-pourover";

/// Builds the complete recipe. Never fails: every lookup falls back and
/// every number is clamped.
pub fn generate_full_recipe(inputs: &RecipeInputs) -> CalculatedRecipe {
    let RecipeInputs {
        roast_type,
        grind_size,
        water_amount_in_kettle_ml,
        brew_method,
        cups,
    } = *inputs;

    let portion = coffee_and_water(brew_method, roast_type, cups);
    let total_brew_time = adjusted_brew_time_seconds(brew_method, roast_type, grind_size);
    let warnings = generate_warnings(roast_type, grind_size, brew_method);

    let mut target_temp = tables::target_temperature_c(roast_type);
    if warnings.iter().any(|w| w.id == WARN_FINE_POUROVER_DARK) {
        // cooler water tames the over-extraction of a clogged bed
        target_temp = (target_temp - 5.0).max(70.0);
    }

    let wait = wait_time_after_boil_seconds(target_temp, water_amount_in_kettle_ml);

    let steps = generate_steps(
        brew_method,
        roast_type,
        portion.coffee_grams,
        portion.water_ml,
        total_brew_time,
    );

    debug!(
        method = %brew_method,
        roast = %roast_type,
        grind = %grind_size,
        total_brew_time,
        steps = steps.len(),
        warnings = warnings.len(),
        "Recipe generated"
    );

    CalculatedRecipe {
        target_temperature_celsius: target_temp.round() as u32,
        wait_time_after_boil_seconds: wait,
        coffee_amount_grams: portion.coffee_grams,
        water_for_brewing_ml: portion.water_ml,
        coffee_to_water_ratio: portion.ratio_string,
        total_brew_time_seconds: total_brew_time,
        steps,
        warnings,
        inputs: RecipeInputs {
            cups: portion.actual_cups,
            ..*inputs
        },
    }
}

/// Seconds to wait after the boil for the kettle to cool to `target_c`.
/// Larger volumes cool slower, scaling with the inverse square root of volume.
pub fn wait_time_after_boil_seconds(target_c: f64, kettle_ml: u32) -> u32 {
    if target_c >= 100.0 {
        return 0;
    }
    let drop_needed = 100.0 - target_c;
    let volume_factor = (tables::REFERENCE_WATER_VOLUME_ML / f64::from(kettle_ml.max(1))).sqrt();
    let rate = tables::BASE_COOLING_RATE_PER_MINUTE * volume_factor;
    let minutes = drop_needed / rate;
    (minutes * 60.0).round() as u32
}

/// Coffee and water for a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Portion {
    pub coffee_grams: f64,
    pub water_ml: u32,
    pub ratio_string: String,
    pub actual_cups: u32,
}

pub fn coffee_and_water(method: BrewMethod, roast: RoastType, requested_cups: u32) -> Portion {
    let actual_cups = requested_cups.min(tables::max_cups(method));
    let water_ml = tables::water_per_cup_ml(method) * actual_cups;

    let ratio = tables::coffee_water_ratio(method, roast);

    let coffee = f64::from(water_ml) / ratio;

    Portion {
        coffee_grams: round1(coffee),
        water_ml,
        ratio_string: format!("1:{ratio:.1}"),
        actual_cups,
    }
}

/// Base time for the roast, shifted for the grind, clamped to the method's range.
pub fn adjusted_brew_time_seconds(method: BrewMethod, roast: RoastType, grind: GrindSize) -> u32 {
    let base = tables::base_brew_time_seconds(method, roast);
    let adjustment = tables::grind_adjustment_seconds(method, grind).unwrap_or(0);

    let (lo, hi) = tables::brew_time_bounds_seconds(method);
    let adjusted = i64::from(base) + i64::from(adjustment);
    clamp(adjusted, i64::from(lo), i64::from(hi)) as u32
}

/// Contextual warnings. Each rule is independent; several may fire.
pub fn generate_warnings(
    roast: RoastType,
    grind: GrindSize,
    method: BrewMethod,
) -> Vec<WarningMessage> {
    let mut warnings = Vec::new();

    if grind.is_fine() && method == BrewMethod::PourOver && roast.is_dark_or_espresso() {
        warnings.push(WarningMessage {
            id: WARN_FINE_POUROVER_DARK,
            severity: Severity::Critical,
            message: "Pre-ground fine or espresso grind with darker roasts in a pour-over can lead to issues.",
            recommendation: Some(
                "This combination may cause over-extraction or clogging. Consider using an AeroPress, \
                 or if proceeding with pour-over, the calculator has adjusted for cooler water. \
                 Pour gently and ensure even distribution.",
            ),
        });
    }

    if grind.is_fine() && method == BrewMethod::FrenchPress {
        warnings.push(WarningMessage {
            id: WARN_FINE_FRENCH_PRESS,
            severity: Severity::Critical,
            message: "Fine grind is likely to pass through a French Press filter.",
            recommendation: Some(
                "This can result in a muddy, over-extracted cup. \
                 A coarser grind is highly recommended for French Press.",
            ),
        });
    }

    if roast == RoastType::Light && grind.is_coarse() && method == BrewMethod::AeroPress {
        warnings.push(WarningMessage {
            id: WARN_LIGHT_COARSE_AEROPRESS,
            severity: Severity::Critical,
            message: "Light roast with a coarse grind in an AeroPress might under-extract.",
            recommendation: Some(
                "Light roasts are harder to extract. Consider a finer grind (medium-fine) \
                 or a longer brew time for better flavor development with AeroPress.",
            ),
        });
    }

    if roast.is_espresso()
        && method == BrewMethod::PourOver
        && !warnings.iter().any(|w| w.id == WARN_FINE_POUROVER_DARK)
    {
        warnings.push(WarningMessage {
            id: WARN_ESPRESSO_POUROVER,
            severity: Severity::Info,
            message: "Using Espresso Roast for Pour-Over.",
            recommendation: Some(
                "Espresso roasts extract faster. The recipe has been adjusted for cooler water \
                 and a potentially shorter brew time. Monitor drawdown closely.",
            ),
        });
    }

    warnings
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
