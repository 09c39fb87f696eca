//! Brewing reference values.

use crate::types::{BrewMethod, GrindSize, RoastType};

/// °C lost per minute by 1000 mL of just-boiled water in a kettle.
pub const BASE_COOLING_RATE_PER_MINUTE: f64 = 4.4;
pub const REFERENCE_WATER_VOLUME_ML: f64 = 1000.0;

pub const DEFAULT_WATER_IN_KETTLE_ML: u32 = 1000;
pub const MIN_WATER_IN_KETTLE_ML: u32 = 500;
pub const MAX_WATER_IN_KETTLE_ML: u32 = 1700;

pub const POUROVER_BLOOM_COFFEE_RATIO: f64 = 2.0;
/// Bloom wait for light/medium roasts; darker roasts use the short one.
pub const POUROVER_BLOOM_WAIT_SECONDS: u32 = 45;
pub const POUROVER_DARK_BLOOM_WAIT_SECONDS: u32 = 30;
pub const POUROVER_DEFAULT_MAIN_POURS: u32 = 2;

pub const AEROPRESS_BLOOM_COFFEE_RATIO: f64 = 2.0;
pub const AEROPRESS_BLOOM_WAIT_SECONDS: u32 = 30;
pub const AEROPRESS_PLUNGE_SECONDS: u32 = 20;

pub const FRENCH_PRESS_CRUST_BREAK_WAIT_SECONDS: u32 = 60;
pub const FRENCH_PRESS_PLUNGE_SECONDS: u32 = 30;

pub fn target_temperature_c(roast: RoastType) -> f64 {
    match roast {
        RoastType::Light => 96.0,
        RoastType::Medium => 93.0,
        RoastType::Dark => 91.0,
        RoastType::Espresso => 88.0,
        RoastType::EspressoAxil => 85.0,
    }
}

pub fn water_per_cup_ml(method: BrewMethod) -> u32 {
    match method {
        BrewMethod::PourOver => 240,
        BrewMethod::AeroPress => 200,
        BrewMethod::FrenchPress => 275,
    }
}

pub fn max_cups(method: BrewMethod) -> u32 {
    match method {
        BrewMethod::PourOver => 2,
        BrewMethod::AeroPress => 1,
        BrewMethod::FrenchPress => 2,
    }
}

/// Water:coffee ratio (water grams per coffee gram).
pub fn coffee_water_ratio(method: BrewMethod, roast: RoastType) -> f64 {
    use RoastType::*;
    match (method, roast) {
        (BrewMethod::PourOver, Light) => 16.5,
        (BrewMethod::PourOver, Medium) => 16.0,
        (BrewMethod::PourOver, Dark | Espresso | EspressoAxil) => 15.0,
        (BrewMethod::AeroPress | BrewMethod::FrenchPress, Light) => 15.0,
        (BrewMethod::AeroPress | BrewMethod::FrenchPress, Medium) => 14.0,
        (BrewMethod::AeroPress | BrewMethod::FrenchPress, Dark | Espresso | EspressoAxil) => 13.0,
    }
}

pub fn base_brew_time_seconds(method: BrewMethod, roast: RoastType) -> u32 {
    use RoastType::*;
    match (method, roast) {
        (BrewMethod::PourOver, Light) => 210,
        (BrewMethod::PourOver, Medium) => 195,
        (BrewMethod::PourOver, Dark) => 180,
        (BrewMethod::PourOver, Espresso) => 165,
        (BrewMethod::PourOver, EspressoAxil) => 180,
        (BrewMethod::AeroPress, Light) => 90,
        (BrewMethod::AeroPress, Medium) => 75,
        (BrewMethod::AeroPress, Dark) => 60,
        (BrewMethod::AeroPress, Espresso) => 50,
        (BrewMethod::AeroPress, EspressoAxil) => 60,
        (BrewMethod::FrenchPress, Light) => 300,
        (BrewMethod::FrenchPress, Medium) => 270,
        (BrewMethod::FrenchPress, Dark) => 240,
        (BrewMethod::FrenchPress, Espresso) => 210,
        (BrewMethod::FrenchPress, EspressoAxil) => 240,
    }
}

/// Seconds added to (or removed from) the base brew time for a grind.
/// `None` means the grind is the method's baseline.
pub fn grind_adjustment_seconds(method: BrewMethod, grind: GrindSize) -> Option<i32> {
    use GrindSize::*;
    match (method, grind) {
        (BrewMethod::PourOver, Fine | PreGroundFine) => Some(-45),
        (BrewMethod::PourOver, MediumFine) => Some(-15),
        (BrewMethod::PourOver, MediumCoarse) => Some(15),
        (BrewMethod::PourOver, Coarse) => Some(45),
        (BrewMethod::AeroPress, Fine | PreGroundFine) => Some(-15),
        (BrewMethod::AeroPress, MediumFine) => Some(-5),
        (BrewMethod::AeroPress, MediumCoarse) => Some(10),
        (BrewMethod::AeroPress, Coarse) => Some(20),
        (BrewMethod::FrenchPress, Fine | PreGroundFine) => Some(-90),
        (BrewMethod::FrenchPress, MediumFine) => Some(-45),
        (BrewMethod::FrenchPress, MediumCoarse) => Some(30),
        // coarse is what a press wants anyway
        (BrewMethod::FrenchPress, Coarse) => None,
        (_, Medium | PreGroundMedium) => None,
    }
}

/// Inclusive `(min, max)` brew time for a method, seconds.
pub fn brew_time_bounds_seconds(method: BrewMethod) -> (u32, u32) {
    match method {
        BrewMethod::PourOver => (120, 300),
        BrewMethod::AeroPress => (30, 180),
        BrewMethod::FrenchPress => (150, 360),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_combination_has_ratio_and_base_time() {
        for method in BrewMethod::ALL {
            let (lo, hi) = brew_time_bounds_seconds(method);
            for roast in RoastType::ALL {
                let ratio = coffee_water_ratio(method, roast);
                assert!((13.0..=16.5).contains(&ratio), "{method} {roast}: {ratio}");
                let base = base_brew_time_seconds(method, roast);
                assert!((lo..=hi).contains(&base), "{method} {roast}: {base}");
            }
        }
    }

    #[test]
    fn test_axil_blend_brews_like_dark() {
        for method in BrewMethod::ALL {
            assert_eq!(
                base_brew_time_seconds(method, RoastType::EspressoAxil),
                base_brew_time_seconds(method, RoastType::Dark)
            );
        }
    }
}
