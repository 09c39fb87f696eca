use anyhow::{Context, Result, bail};
use brew_core::{BrewMethod, GrindSize, RecipeInputs, RoastType, generate_full_recipe};
use chrono::NaiveTime;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod interactive;
mod render;
mod ticker;

/// Roast CLI enum mirrors brew-core (derive for Clap).
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum RoastFlag {
    Light,
    Medium,
    Dark,
    Espresso,
    EspressoAxil,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum GrindFlag {
    Fine,
    MediumFine,
    Medium,
    MediumCoarse,
    Coarse,
    PreGroundFine,
    PreGroundMedium,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum MethodFlag {
    PourOver,
    #[value(name = "aeropress")]
    #[serde(rename = "aeropress")]
    AeroPress,
    FrenchPress,
}

impl From<RoastFlag> for RoastType {
    fn from(r: RoastFlag) -> Self {
        match r {
            RoastFlag::Light => RoastType::Light,
            RoastFlag::Medium => RoastType::Medium,
            RoastFlag::Dark => RoastType::Dark,
            RoastFlag::Espresso => RoastType::Espresso,
            RoastFlag::EspressoAxil => RoastType::EspressoAxil,
        }
    }
}

impl From<GrindFlag> for GrindSize {
    fn from(g: GrindFlag) -> Self {
        match g {
            GrindFlag::Fine => GrindSize::Fine,
            GrindFlag::MediumFine => GrindSize::MediumFine,
            GrindFlag::Medium => GrindSize::Medium,
            GrindFlag::MediumCoarse => GrindSize::MediumCoarse,
            GrindFlag::Coarse => GrindSize::Coarse,
            GrindFlag::PreGroundFine => GrindSize::PreGroundFine,
            GrindFlag::PreGroundMedium => GrindSize::PreGroundMedium,
        }
    }
}

impl From<MethodFlag> for BrewMethod {
    fn from(m: MethodFlag) -> Self {
        match m {
            MethodFlag::PourOver => BrewMethod::PourOver,
            MethodFlag::AeroPress => BrewMethod::AeroPress,
            MethodFlag::FrenchPress => BrewMethod::FrenchPress,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "brew-cli",
    about = "Coffee brewing recipes with a step-by-step brew timer.",
    version
)]
struct Cli {
    /// Debug logging (otherwise RUST_LOG, default warn)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the recipe for the given parameters
    Recipe {
        #[command(flatten)]
        args: BrewArgs,

        /// Emit the recipe as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Interactive brew timer (commands on stdin)
    Brew {
        #[command(flatten)]
        args: BrewArgs,
    },
    /// Grind size guide and sources
    Grinds,
}

#[derive(Parser, Debug, Clone, PartialEq)]
struct BrewArgs {
    /// Roast level of the beans
    #[arg(long, value_enum, default_value_t = RoastFlag::Medium)]
    roast: RoastFlag,

    /// Grind size
    #[arg(long, value_enum, default_value_t = GrindFlag::Medium)]
    grind: GrindFlag,

    /// Brewing device
    #[arg(long, value_enum, default_value_t = MethodFlag::PourOver)]
    method: MethodFlag,

    /// Water boiled in the kettle, mL (500–1700)
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u32).range(500..=1700))]
    kettle_ml: u32,

    /// Cups to brew (capped per method: pour-over 2, aeropress 1, french press 2)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=4))]
    cups: u32,

    /// Time the kettle comes off the boil, HH:MM (defaults to now)
    #[arg(long)]
    start: Option<String>,

    /// Load a profile JSON before applying CLI overrides
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Save the current effective parameters to a profile JSON
    #[arg(long)]
    save_profile: Option<PathBuf>,
}

impl BrewArgs {
    fn inputs(&self) -> RecipeInputs {
        RecipeInputs {
            roast_type: self.roast.into(),
            grind_size: self.grind.into(),
            water_amount_in_kettle_ml: self.kettle_ml,
            brew_method: self.method.into(),
            cups: self.cups,
        }
    }

    fn start_time(&self) -> Result<Option<NaiveTime>> {
        self.start
            .as_deref()
            .map(|hhmm| {
                NaiveTime::parse_from_str(hhmm, "%H:%M")
                    .with_context(|| format!("invalid --start `{hhmm}`, expected HH:MM"))
            })
            .transpose()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Profile {
    roast: RoastFlag,
    grind: GrindFlag,
    method: MethodFlag,
    kettle_ml: u32,
    cups: u32,
    start: Option<String>,
}

impl From<&BrewArgs> for Profile {
    fn from(a: &BrewArgs) -> Self {
        Profile {
            roast: a.roast,
            grind: a.grind,
            method: a.method,
            kettle_ml: a.kettle_ml,
            cups: a.cups,
            start: a.start.clone(),
        }
    }
}

/// Profile values fill in whatever the command line left at its default.
fn merge_profile(mut args: BrewArgs, p: Profile) -> BrewArgs {
    // Defaults snapshot to detect "unset" fields
    let def = BrewArgs::parse_from(["brew-cli"]);

    macro_rules! take {
        ($field:ident) => {
            if args.$field == def.$field { p.$field } else { args.$field }
        };
    }

    args.roast = take!(roast);
    args.grind = take!(grind);
    args.method = take!(method);
    args.kettle_ml = take!(kettle_ml);
    args.cups = take!(cups);
    if args.start.is_none() {
        args.start = p.start;
    }
    args
}

/// Applies `--profile` and `--save-profile`, then validates.
fn resolve_args(mut args: BrewArgs) -> Result<BrewArgs> {
    if let Some(path) = args.profile.clone() {
        let txt = fs::read_to_string(&path)
            .with_context(|| format!("failed to read profile: {}", path.display()))?;
        let p: Profile = serde_json::from_str(&txt)
            .with_context(|| format!("invalid profile JSON: {}", path.display()))?;
        info!(profile = %path.display(), "Loaded profile");
        args = merge_profile(args, p);
    }

    if !(500..=1700).contains(&args.kettle_ml) {
        bail!("kettle-ml must be between 500 and 1700");
    }
    if args.cups == 0 {
        bail!("cups must be at least 1");
    }
    args.start_time()?;

    if let Some(path) = &args.save_profile {
        let prof = Profile::from(&args);
        fs::write(path, serde_json::to_string_pretty(&prof)?)
            .with_context(|| format!("failed to save profile: {}", path.display()))?;
        println!("Profile saved to {}", path.display());
    }

    Ok(args)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Recipe { args, json } => {
            let args = resolve_args(args)?;
            let recipe = generate_full_recipe(&args.inputs());
            if json {
                println!("{}", serde_json::to_string_pretty(&recipe)?);
            } else {
                render::print_recipe(&recipe);
                render::print_schedule(&recipe, args.start_time()?);
            }
        }
        Command::Brew { args } => {
            let args = resolve_args(args)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start the timer runtime")?;
            let result = runtime.block_on(interactive::run(args.inputs()));
            // stdin's blocking reader would otherwise hold the shutdown open
            runtime.shutdown_background();
            result?;
        }
        Command::Grinds => render::print_grinds(),
    }

    Ok(())
}
