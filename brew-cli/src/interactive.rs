//! The `brew` subcommand: a timer session driven by stdin commands.

use anyhow::{Context, Result, bail};
use brew_core::tables::{MAX_WATER_IN_KETTLE_ML, MIN_WATER_IN_KETTLE_ML};
use brew_core::{
    BrewMethod, BrewSession, GrindSize, RecipeInputs, RoastType, StartOutcome, TickOutcome,
    TickScheduler, TimerPhase, TimerView, format_clock, format_step_time,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::render;
use crate::ticker::{TickEvent, TokioTicker};

const HELP: &str = "\
Commands:
  start | pause | reset     control the timer
  status                    show where the brew is
  steps | recipe            show the steps or the whole recipe
  roast <light|medium|dark|espresso|espresso-axil>
  grind <fine|medium-fine|medium|medium-coarse|coarse|pre-ground-fine|pre-ground-medium>
  method <pour-over|aeropress|french-press>
  kettle <ml>               water in the kettle (500-1700)
  cups <n>                  cups to brew (1-4, capped per method)
  help | quit";

#[derive(Debug, Clone, Copy, PartialEq)]
enum UserCommand {
    Start,
    Pause,
    Reset,
    Status,
    Steps,
    Recipe,
    Roast(RoastType),
    Grind(GrindSize),
    Method(BrewMethod),
    Kettle(u32),
    Cups(u32),
    Help,
    Quit,
}

/// `Ok(None)` for a blank line.
fn parse_command(line: &str) -> Result<Option<UserCommand>> {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let cmd = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(None),
        "start" | "s" => UserCommand::Start,
        "pause" | "p" => UserCommand::Pause,
        "reset" => UserCommand::Reset,
        "status" => UserCommand::Status,
        "steps" => UserCommand::Steps,
        "recipe" => UserCommand::Recipe,
        "roast" => UserCommand::Roast(arg.parse()?),
        "grind" => UserCommand::Grind(arg.parse()?),
        "method" => UserCommand::Method(arg.parse()?),
        "kettle" => {
            let ml: u32 = arg
                .parse()
                .with_context(|| format!("invalid kettle volume `{arg}`"))?;
            if !(MIN_WATER_IN_KETTLE_ML..=MAX_WATER_IN_KETTLE_ML).contains(&ml) {
                bail!("kettle must be between {MIN_WATER_IN_KETTLE_ML} and {MAX_WATER_IN_KETTLE_ML} mL");
            }
            UserCommand::Kettle(ml)
        }
        "cups" => {
            let cups: u32 = arg
                .parse()
                .with_context(|| format!("invalid cup count `{arg}`"))?;
            if !(1..=4).contains(&cups) {
                bail!("cups must be between 1 and 4");
            }
            UserCommand::Cups(cups)
        }
        "help" | "?" => UserCommand::Help,
        "quit" | "exit" | "q" => UserCommand::Quit,
        other => bail!("unknown command `{other}` (try `help`)"),
    };
    Ok(Some(cmd))
}

/// `00:20 / 03:15  Running   3. Wait for Bloom (0:40 left) | next: ...`
fn status_line(view: &TimerView<'_>) -> String {
    let mut line = format!(
        "{} / {}  {:<9} ",
        format_clock(view.seconds_elapsed),
        format_clock(view.total_brew_time_seconds),
        format!("{:?}", view.phase),
    );
    match view.current_step {
        Some(step) => {
            line.push_str(&step.title);
            if step.is_timed && view.phase != TimerPhase::Completed {
                line.push_str(&format!(" ({} left)", format_step_time(view.remaining_in_step)));
            }
        }
        None => line.push('-'),
    }
    if let Some(next) = view.next_step {
        line.push_str(&format!(" | next: {}", next.title));
    }
    line
}

fn print_recipe_brief(session: &BrewSession) {
    let r = session.recipe();
    println!(
        "{}: {}°C after {} off the boil, {:.1} g coffee, {} mL water ({}), brew {}",
        session.active_method(),
        r.target_temperature_celsius,
        format_step_time(r.wait_time_after_boil_seconds),
        r.coffee_amount_grams,
        r.water_for_brewing_ml,
        r.coffee_to_water_ratio,
        format_clock(r.total_brew_time_seconds),
    );
    for w in &r.warnings {
        println!("  ! {}", w.message);
    }
}

/// Applies one input change and reports what happened to the timers.
fn change_inputs<F>(session: &mut BrewSession, update: F)
where
    F: FnOnce(&mut RecipeInputs),
{
    let method = session.active_method();
    let was_started = session.view().phase != TimerPhase::Idle;
    let was_running = session.active_timer().is_running();

    if !session.update_inputs(update) {
        println!("No change.");
        return;
    }
    if session.active_method() != method {
        if was_running {
            println!("{method} timer paused.");
        }
    } else if was_started {
        println!("Recipe changed, timer reset.");
    }
    print_recipe_brief(session);
}

/// Returns `false` when the session should end.
fn apply(session: &mut BrewSession, ticker: &mut impl TickScheduler, cmd: UserCommand) -> bool {
    debug!(?cmd, "Command");
    match cmd {
        UserCommand::Start => match session.start(ticker) {
            StartOutcome::Started => {
                println!("Started.");
                if let Some(step) = session.view().current_step {
                    println!("→ {}: {}", step.title, step.details);
                }
            }
            StartOutcome::Resumed => println!("Resumed at {}.", format_clock(session.view().seconds_elapsed)),
            StartOutcome::AlreadyComplete => println!("Brew already complete, `reset` to go again."),
            StartOutcome::NoRecipe => println!("No recipe to time."),
        },
        UserCommand::Pause => {
            if session.pause() {
                println!("Paused at {}.", format_clock(session.view().seconds_elapsed));
            } else {
                println!("Timer is not running.");
            }
        }
        UserCommand::Reset => {
            session.reset();
            println!("Timer reset.");
        }
        UserCommand::Status => println!("{}", status_line(&session.view())),
        UserCommand::Steps => println!("{}", render::steps_table(session.recipe())),
        UserCommand::Recipe => render::print_recipe(session.recipe()),
        UserCommand::Roast(r) => change_inputs(session, |i| i.roast_type = r),
        UserCommand::Grind(g) => change_inputs(session, |i| i.grind_size = g),
        UserCommand::Method(m) => change_inputs(session, |i| i.brew_method = m),
        UserCommand::Kettle(ml) => change_inputs(session, |i| i.water_amount_in_kettle_ml = ml),
        UserCommand::Cups(n) => change_inputs(session, |i| i.cups = n),
        UserCommand::Help => println!("{HELP}"),
        UserCommand::Quit => return false,
    }
    true
}

fn on_tick(session: &mut BrewSession, ev: TickEvent) {
    match session.tick(ev.method, ev.generation) {
        TickOutcome::Ignored => {}
        TickOutcome::Advanced { step_changed } => {
            let view = session.view();
            if step_changed {
                if let Some(step) = view.current_step {
                    println!("→ {}: {}", step.title, step.details);
                }
            }
            println!("{}", status_line(&view));
        }
        TickOutcome::Completed => println!("Brew complete. Enjoy!"),
    }
}

pub async fn run(inputs: RecipeInputs) -> Result<()> {
    let mut session = BrewSession::new(inputs);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut ticker = TokioTicker::new(tx);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_recipe_brief(&session);
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read command from stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(cmd)) => {
                        if !apply(&mut session, &mut ticker, cmd) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{e:#}"),
                }
            }
            Some(ev) = rx.recv() => on_tick(&mut session, ev),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brew_core::TickGuard;

    struct Detached;

    impl TickScheduler for Detached {
        fn schedule(&mut self, method: BrewMethod, generation: u64) -> TickGuard {
            TickGuard::detached(method, generation)
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("  ").unwrap(), None);
        assert_eq!(parse_command("START").unwrap(), Some(UserCommand::Start));
        assert_eq!(
            parse_command("method aeropress").unwrap(),
            Some(UserCommand::Method(BrewMethod::AeroPress))
        );
        assert_eq!(
            parse_command("grind  medium-coarse ").unwrap(),
            Some(UserCommand::Grind(GrindSize::MediumCoarse))
        );
        assert_eq!(parse_command("kettle 750").unwrap(), Some(UserCommand::Kettle(750)));
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        let err = parse_command("method siphon").unwrap_err();
        assert_eq!(err.to_string(), "unknown brew method: `siphon`");
        assert!(parse_command("kettle 2000").is_err());
        assert!(parse_command("cups lots").is_err());
        assert!(parse_command("grind").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn test_status_line_shows_step_and_next() {
        let mut session = BrewSession::default();
        session.start(&mut Detached);
        let generation = session.active_timer().generation().unwrap();
        for _ in 0..20 {
            session.tick(BrewMethod::PourOver, generation);
        }
        let line = status_line(&session.view());
        assert!(line.starts_with("00:20 / 03:15  Running"), "{line}");
        assert!(line.contains("3. Wait for Bloom (0:40 left)"), "{line}");
        assert!(line.contains("| next: "), "{line}");
    }

    #[test]
    fn test_apply_quit_and_input_change() {
        let mut session = BrewSession::default();
        assert!(apply(&mut session, &mut Detached, UserCommand::Start));
        assert!(apply(&mut session, &mut Detached, UserCommand::Roast(RoastType::Dark)));
        assert_eq!(session.view().phase, TimerPhase::Idle);
        assert!(!apply(&mut session, &mut Detached, UserCommand::Quit));
    }
}
