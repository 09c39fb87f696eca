use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseLabelError;

/// Roast level of the beans.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RoastType {
    Light,
    Medium,
    Dark,
    Espresso,
    /// Axil seasonal espresso blend, roasted darker than a typical espresso.
    EspressoAxil,
}

/// Grind size, including the two common supermarket pre-grinds.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum GrindSize {
    Fine,
    MediumFine,
    Medium,
    MediumCoarse,
    Coarse,
    PreGroundFine,
    PreGroundMedium,
}

/// Brewing device.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BrewMethod {
    PourOver,
    #[serde(rename = "aeropress")]
    AeroPress,
    FrenchPress,
}

impl RoastType {
    pub const ALL: [RoastType; 5] = [
        RoastType::Light,
        RoastType::Medium,
        RoastType::Dark,
        RoastType::Espresso,
        RoastType::EspressoAxil,
    ];

    /// Dark, Espresso and the Axil blend share most of their handling.
    pub fn is_dark_or_espresso(self) -> bool {
        matches!(
            self,
            RoastType::Dark | RoastType::Espresso | RoastType::EspressoAxil
        )
    }

    pub fn is_espresso(self) -> bool {
        matches!(self, RoastType::Espresso | RoastType::EspressoAxil)
    }

    pub fn label(self) -> &'static str {
        match self {
            RoastType::Light => "Light Roast",
            RoastType::Medium => "Medium Roast",
            RoastType::Dark => "Dark Roast",
            RoastType::Espresso => "Espresso Roast",
            RoastType::EspressoAxil => "Espresso Roast (Axil Seasonal)",
        }
    }

    fn key(self) -> &'static str {
        match self {
            RoastType::Light => "light",
            RoastType::Medium => "medium",
            RoastType::Dark => "dark",
            RoastType::Espresso => "espresso",
            RoastType::EspressoAxil => "espresso-axil",
        }
    }
}

impl GrindSize {
    pub const ALL: [GrindSize; 7] = [
        GrindSize::Fine,
        GrindSize::MediumFine,
        GrindSize::Medium,
        GrindSize::MediumCoarse,
        GrindSize::Coarse,
        GrindSize::PreGroundFine,
        GrindSize::PreGroundMedium,
    ];

    /// Fine or pre-ground fine (espresso) grind.
    pub fn is_fine(self) -> bool {
        matches!(self, GrindSize::Fine | GrindSize::PreGroundFine)
    }

    pub fn is_coarse(self) -> bool {
        matches!(self, GrindSize::Coarse | GrindSize::MediumCoarse)
    }

    pub fn label(self) -> &'static str {
        match self {
            GrindSize::Fine => "Fine",
            GrindSize::MediumFine => "Medium-Fine",
            GrindSize::Medium => "Medium",
            GrindSize::MediumCoarse => "Medium-Coarse",
            GrindSize::Coarse => "Coarse",
            GrindSize::PreGroundFine => "Pre-Ground (Fine/Espresso)",
            GrindSize::PreGroundMedium => "Pre-Ground (Medium)",
        }
    }

    fn key(self) -> &'static str {
        match self {
            GrindSize::Fine => "fine",
            GrindSize::MediumFine => "medium-fine",
            GrindSize::Medium => "medium",
            GrindSize::MediumCoarse => "medium-coarse",
            GrindSize::Coarse => "coarse",
            GrindSize::PreGroundFine => "pre-ground-fine",
            GrindSize::PreGroundMedium => "pre-ground-medium",
        }
    }
}

impl BrewMethod {
    pub const ALL: [BrewMethod; 3] = [
        BrewMethod::PourOver,
        BrewMethod::AeroPress,
        BrewMethod::FrenchPress,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BrewMethod::PourOver => "Pour-Over",
            BrewMethod::AeroPress => "AeroPress",
            BrewMethod::FrenchPress => "French Press",
        }
    }

    fn key(self) -> &'static str {
        match self {
            BrewMethod::PourOver => "pour-over",
            BrewMethod::AeroPress => "aeropress",
            BrewMethod::FrenchPress => "french-press",
        }
    }
}

macro_rules! label_impls {
    ($ty:ident, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = ParseLabelError;

            /// Accepts the kebab-case key (`pour-over`) or the display label (`Pour-Over`),
            /// case-insensitively.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $ty::ALL
                    .into_iter()
                    .find(|v| {
                        v.key().eq_ignore_ascii_case(wanted)
                            || v.label().eq_ignore_ascii_case(wanted)
                    })
                    .ok_or_else(|| ParseLabelError::new($kind, wanted))
            }
        }
    };
}

label_impls!(RoastType, "roast type");
label_impls!(GrindSize, "grind size");
label_impls!(BrewMethod, "brew method");

/// The five user parameters a recipe is computed from.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeInputs {
    pub roast_type: RoastType,
    pub grind_size: GrindSize,
    /// Water boiled in the kettle, mL. Drives the cooling estimate only.
    pub water_amount_in_kettle_ml: u32,
    pub brew_method: BrewMethod,
    /// Requested cups; clamped to the method's maximum by the engine.
    pub cups: u32,
}

impl Default for RecipeInputs {
    fn default() -> Self {
        Self {
            roast_type: RoastType::Medium,
            grind_size: GrindSize::Medium,
            water_amount_in_kettle_ml: crate::tables::DEFAULT_WATER_IN_KETTLE_ML,
            brew_method: BrewMethod::PourOver,
            cups: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_keys_and_labels() {
        assert_eq!("pour-over".parse::<BrewMethod>().unwrap(), BrewMethod::PourOver);
        assert_eq!("French Press".parse::<BrewMethod>().unwrap(), BrewMethod::FrenchPress);
        assert_eq!(" ESPRESSO-AXIL ".parse::<RoastType>().unwrap(), RoastType::EspressoAxil);
        assert_eq!(
            "Pre-Ground (Fine/Espresso)".parse::<GrindSize>().unwrap(),
            GrindSize::PreGroundFine
        );
    }

    #[test]
    fn test_rejects_unknown_label() {
        let err = "siphon".parse::<BrewMethod>().unwrap_err();
        assert_eq!(err.to_string(), "unknown brew method: `siphon`");
    }

    #[test]
    fn test_serde_names_match_parse_keys() {
        for method in BrewMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.key()));
        }
        for grind in GrindSize::ALL {
            let json = serde_json::to_string(&grind).unwrap();
            assert_eq!(json, format!("\"{}\"", grind.key()));
        }
        for roast in RoastType::ALL {
            let json = serde_json::to_string(&roast).unwrap();
            assert_eq!(json, format!("\"{}\"", roast.key()));
        }
    }
}
