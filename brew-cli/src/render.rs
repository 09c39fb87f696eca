use brew_core::reference::{SOURCE_REFERENCES, grind_visual};
use brew_core::{CalculatedRecipe, GrindSize, Severity, format_clock, format_step_time, tables};
use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};

fn table_with_header(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            header
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

fn fmt_g(x: f64) -> String {
    let v = (x * 10.0).round() / 10.0;
    if (v - v.round()).abs() < 1e-9 {
        format!("{:.0} g", v)
    } else {
        format!("{:.1} g", v)
    }
}

pub fn print_recipe(recipe: &CalculatedRecipe) {
    let inputs = &recipe.inputs;
    let max_cups = tables::max_cups(inputs.brew_method);

    let mut summary = table_with_header(&["Parameter", "Value", "Notes"]);
    summary.add_row(vec![
        Cell::new("Method"),
        Cell::new(inputs.brew_method),
        Cell::new(format!("{} roast | {} grind", inputs.roast_type, inputs.grind_size)),
    ]);
    summary.add_row(vec![
        Cell::new("Cups"),
        Cell::new(recipe.actual_cups()),
        Cell::new(format!("max {max_cups} for this method")),
    ]);
    summary.add_row(vec![
        Cell::new("Water temperature"),
        Cell::new(format!("{}°C", recipe.target_temperature_celsius)),
        Cell::new(""),
    ]);
    summary.add_row(vec![
        Cell::new("Wait after boil"),
        Cell::new(format_step_time(recipe.wait_time_after_boil_seconds)),
        Cell::new(format!("{} mL in kettle", inputs.water_amount_in_kettle_ml)),
    ]);
    summary.add_row(vec![
        Cell::new("Coffee"),
        Cell::new(fmt_g(recipe.coffee_amount_grams)),
        Cell::new(format!("ratio {}", recipe.coffee_to_water_ratio)),
    ]);
    summary.add_row(vec![
        Cell::new("Water"),
        Cell::new(format!("{} mL", recipe.water_for_brewing_ml)),
        Cell::new(""),
    ]);
    summary.add_row(vec![
        Cell::new("Brew time"),
        Cell::new(format_clock(recipe.total_brew_time_seconds)),
        Cell::new(""),
    ]);

    println!("\n=== Recipe ===");
    println!("{}", summary);

    println!("\n=== Steps ===");
    println!("{}", steps_table(recipe));

    if !recipe.warnings.is_empty() {
        println!("\n=== Warnings ===");
        for w in &recipe.warnings {
            let tag = match w.severity {
                Severity::Critical => "CRITICAL",
                Severity::Info => "info",
            };
            println!("• [{tag}] {}", w.message);
            if let Some(rec) = w.recommendation {
                println!("  → {rec}");
            }
        }
    }
}

pub fn steps_table(recipe: &CalculatedRecipe) -> Table {
    let mut table = table_with_header(&["Start", "Duration", "Step", "Details"]);
    for step in &recipe.steps {
        let duration = if step.is_timed {
            format_step_time(step.duration_seconds)
        } else {
            String::new()
        };
        table.add_row(vec![
            Cell::new(format_clock(step.start_time_seconds)),
            Cell::new(duration),
            Cell::new(&step.title),
            Cell::new(&step.details),
        ]);
    }
    table
}

/// Wall-clock times for taking the kettle off, starting the brew and finishing.
struct Schedule {
    off_boil: NaiveDateTime,
    brew_start: NaiveDateTime,
    done: NaiveDateTime,
}

fn schedule(recipe: &CalculatedRecipe, off_boil: NaiveDateTime) -> Schedule {
    let brew_start = off_boil + TimeDelta::seconds(i64::from(recipe.wait_time_after_boil_seconds));
    let done = brew_start + TimeDelta::seconds(i64::from(recipe.total_brew_time_seconds));
    Schedule {
        off_boil,
        brew_start,
        done,
    }
}

fn hhmm(t: NaiveDateTime) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

/// Without `start` the kettle is assumed to come off the boil `now`.
fn off_boil_at(start: Option<NaiveTime>, now: NaiveDateTime) -> NaiveDateTime {
    let st = start.unwrap_or_else(|| now.time());
    now.date().and_time(st)
}

pub fn print_schedule(recipe: &CalculatedRecipe, start: Option<NaiveTime>) {
    let s = schedule(recipe, off_boil_at(start, Local::now().naive_local()));

    println!("\n=== Timeline ===");
    println!(
        "- Off the boil, let it cool: {} → from {}",
        format_step_time(recipe.wait_time_after_boil_seconds),
        hhmm(s.off_boil)
    );
    println!(
        "- Brew:                      {} → start ~{}, ready ~{}",
        format_clock(recipe.total_brew_time_seconds),
        hhmm(s.brew_start),
        hhmm(s.done)
    );
}

pub fn print_grinds() {
    let mut table = table_with_header(&["Grind", "Looks like", "Used for"]);
    for grind in GrindSize::ALL {
        let visual = grind_visual(grind);
        table.add_row(vec![
            Cell::new(grind),
            Cell::new(visual.description),
            Cell::new(visual.example),
        ]);
    }
    println!("\n=== Grind sizes ===");
    println!("{}", table);

    println!("\nSources:");
    for (name, url) in SOURCE_REFERENCES {
        println!("• {name}: {url}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brew_core::{RecipeInputs, generate_full_recipe};
    use chrono::NaiveDate;

    #[test]
    fn test_fmt_g_drops_trailing_zero() {
        assert_eq!(fmt_g(15.0), "15 g");
        assert_eq!(fmt_g(29.14), "29.1 g");
    }

    #[test]
    fn test_schedule_adds_wait_then_brew() {
        let recipe = generate_full_recipe(&RecipeInputs::default());
        let off = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        let s = schedule(&recipe, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_time(off));
        // 95 s wait, 195 s brew
        assert_eq!(hhmm(s.brew_start), "07:01");
        assert_eq!(s.done - s.off_boil, TimeDelta::seconds(290));
        assert_eq!(hhmm(s.done), "07:04");
    }

    #[test]
    fn test_missing_start_means_now() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 1)
            .and_then(|d| d.and_hms_opt(8, 15, 0))
            .unwrap();
        assert_eq!(off_boil_at(None, now), now);
        let at = NaiveTime::from_hms_opt(6, 30, 0).unwrap();
        assert_eq!(hhmm(off_boil_at(Some(at), now)), "06:30");
    }

    #[test]
    fn test_schedule_crosses_midnight() {
        let recipe = generate_full_recipe(&RecipeInputs::default());
        let off = NaiveTime::from_hms_opt(23, 58, 0).unwrap();
        let s = schedule(&recipe, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_time(off));
        assert_eq!(hhmm(s.done), "00:02");
        assert_eq!(s.done.date(), NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
    }

    #[test]
    fn test_steps_table_has_row_per_step() {
        let recipe = generate_full_recipe(&RecipeInputs::default());
        let table = steps_table(&recipe);
        assert_eq!(table.row_iter().count(), recipe.steps.len());
    }
}
