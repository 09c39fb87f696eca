//! Static reference material shown alongside recipes.

use crate::types::GrindSize;

pub struct GrindVisual {
    pub description: &'static str,
    pub example: &'static str,
}

/// What a grind size looks like and what it is usually used for.
pub fn grind_visual(grind: GrindSize) -> GrindVisual {
    let (description, example) = match grind {
        GrindSize::Fine => (
            "Very fine, like powdered sugar or flour.",
            "Espresso, Turkish coffee.",
        ),
        GrindSize::PreGroundFine => (
            "Fine, similar to table salt. Often labeled for espresso.",
            "Some AeroPress, moka pot.",
        ),
        GrindSize::MediumFine => (
            "Slightly finer than table salt, like granulated sugar.",
            "Cone pour-overs (Hario V60), AeroPress.",
        ),
        GrindSize::Medium => (
            "Consistency of regular sand or kosher salt.",
            "Drip machines, flat-bottom pour-overs (Kalita Wave).",
        ),
        GrindSize::PreGroundMedium => (
            "General purpose pre-ground, like kosher salt.",
            "Drip machines, some percolators.",
        ),
        GrindSize::MediumCoarse => (
            "Coarser than sand, like rough sand or coarse salt.",
            "Chemex, Clever Dripper, some French Press.",
        ),
        GrindSize::Coarse => (
            "Very coarse, like breadcrumbs or sea salt.",
            "French Press, cold brew, percolators.",
        ),
    };
    GrindVisual {
        description,
        example,
    }
}

/// `(name, url)` of the guides the brewing tables were drawn from.
pub const SOURCE_REFERENCES: &[(&str, &str)] = &[
    (
        "Market Lane Coffee Pour-Over Guide",
        "https://marketlane.com.au/pages/how-to-brew-pour-over-coffee",
    ),
    (
        "Market Lane Coffee Equipment & Guides",
        "https://marketlane.com.au/pages/brew-guide",
    ),
    (
        "Axil Seasonal Espresso Blend",
        "https://axilcoffee.com.au/products/seasonal-blend-oto",
    ),
    (
        "Axil French Press Guide",
        "https://axilcoffee.com.au/blogs/axil-coffee-roasters/how-to-the-ultimate-guide-to-making-the-perfect-french-press-coffee",
    ),
    (
        "Perfect Daily Grind - Roast Level Adjustments",
        "https://perfectdailygrind.com/2019/10/how-to-adjust-your-brewing-recipe-for-coffee-roast-level/",
    ),
    (
        "Counter Culture Coffee - Brewing Ratios",
        "https://counterculturecoffee.com/blogs/counter-culture-coffee/coffee-basics-brewing-ratios",
    ),
    (
        "Serious Eats - Pour-Over Science",
        "https://www.seriouseats.com/make-better-pourover-coffee-how-pourover-works-temperature-timing",
    ),
    (
        "AeroPress Official Recipes",
        "https://aeropress.com/pages/how-to-use",
    ),
    (
        "Coffee Grind Size Research (North Star)",
        "https://www.northstarroast.com/blogs/brewing/the-importance-of-grind-size",
    ),
    (
        "Coffee Bros - Pour-Over Recipes",
        "https://coffeebros.com/blogs/coffee/the-perfect-pour-over-guide",
    ),
];
