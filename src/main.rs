//! # BAC Tracker Application Entry Point
//!
//! This binary is the collaborator around the pure estimation library: it owns the
//! drink log on disk, turns command-line picks into drink events, applies the
//! pruning and auto-clear policies, and prints the current status and chart.


use anyhow::{anyhow, Context};
use bac_tracker_lib::{
    config::{Config, DEFAULT_CONFIG_FILE},
    drink_log::{standard_drink, DrinkLog, STANDARD_DRINKS},
    renderer::draw_ascii,
    time_utils::{next_entry_default, resolve_entry_time},
    BacEstimate, BacModel, BacTimeline, DrinkEvent, DrinkId, Sex, Status, TimelineWindow,
    UserProfile,
};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bac-tracker")]
#[command(about = "Estimate blood alcohol concentration from a drink log", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the drink log location
    #[arg(short, long, env = "BAC_TRACKER_DATA")]
    data: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current BAC, status and when it drops below the next threshold
    Status,
    /// Log a drink
    Add {
        /// Volume in millilitres
        #[arg(long)]
        volume: f64,
        /// Alcohol by volume in percent
        #[arg(long)]
        strength: f64,
        /// Optional name
        #[arg(long, default_value = "")]
        name: String,
        /// Time consumed as HH:MM (defaults to the suggested next entry time)
        #[arg(long)]
        at: Option<String>,
    },
    /// Log one of the standard drinks (beer, wine, shot, cocktail, pastis)
    Preset {
        id: String,
        /// Time consumed as HH:MM (defaults to the suggested next entry time)
        #[arg(long)]
        at: Option<String>,
    },
    /// Log a previously saved drink again
    Again {
        id: DrinkId,
        #[arg(long)]
        at: Option<String>,
    },
    /// List tracked and saved drinks
    List,
    /// Remove a tracked drink
    Remove { id: DrinkId },
    /// Remove a saved drink
    Forget { id: DrinkId },
    /// Draw the BAC timeline
    Chart,
    /// Update weight and sex category
    Profile {
        #[arg(long)]
        weight: f64,
        /// male or female
        #[arg(long)]
        sex: Sex,
    },
    /// Clear drinks, saved drinks and profile
    Reset,
    /// Re-evaluate the status on a fixed cadence until interrupted
    Watch,
}

/// Everything a command needs, resolved once at startup.
struct App {
    config: Config,
    data_path: PathBuf,
    model: BacModel,
    window: TimelineWindow,
}

impl App {
    fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config = Config::load_from_path(&cli.config);
        let data_path = cli.data.clone().unwrap_or_else(|| config.app.data_file.clone());
        let window = config.window().context("invalid [timeline] configuration")?;
        let model = config.model();
        Ok(Self {
            config,
            data_path,
            model,
            window,
        })
    }

    fn load_log(&self) -> anyhow::Result<DrinkLog> {
        let exists = self.data_path.exists();
        let mut log = DrinkLog::load(&self.data_path)
            .with_context(|| format!("reading drink log {}", self.data_path.display()))?;
        if !exists {
            log.profile = self.config.profile().context("invalid [profile] configuration")?;
        }
        Ok(log)
    }

    fn save_log(&self, log: &DrinkLog) -> anyhow::Result<()> {
        log.save(&self.data_path)
            .with_context(|| format!("writing drink log {}", self.data_path.display()))
    }
}

/// Parse `HH:MM` into an instant, or propose the default next entry time.
fn entry_time(at: Option<&str>, log: &DrinkLog, now: DateTime<Local>) -> anyhow::Result<DateTime<Utc>> {
    let (hour, minute) = match at {
        Some(text) => {
            let (h, m) = text
                .split_once(':')
                .ok_or_else(|| anyhow!("expected HH:MM, got {text:?}"))?;
            (
                h.trim().parse::<u32>().with_context(|| format!("bad hour in {text:?}"))?,
                m.trim().parse::<u32>().with_context(|| format!("bad minute in {text:?}"))?,
            )
        }
        None => {
            let last = log.last_drink().map(|drink| drink.timestamp().with_timezone(&Local));
            let pick = next_entry_default(last.as_ref(), &now);
            (pick.hour, pick.minute)
        }
    };

    let resolved = resolve_entry_time(hour, minute, &now)?;
    debug!(hour, minute, resolved = %resolved, "resolved entry time");
    Ok(resolved.with_timezone(&Utc))
}

fn status_line(estimate: &BacEstimate) -> String {
    let badge = match estimate.status {
        Status::Safe => "OK",
        Status::Caution => "!!",
        Status::Danger => "XX",
    };
    format!(
        "[{badge}] {:.3} g/L ({}) - {}",
        estimate.bac, estimate.status, estimate.message
    )
}

fn sober_line(timeline: &BacTimeline) -> Option<String> {
    let target = timeline.sober_target()?;
    let when = match target.at {
        Some(at) => at.with_timezone(&Local).format("%H:%M").to_string(),
        None => "beyond the chart window".to_string(),
    };
    Some(if target.threshold > 0.0 {
        format!("Below {:.1} g/L at {when}", target.threshold)
    } else {
        format!("Sober at {when}")
    })
}

fn print_status(estimate: &BacEstimate, timeline: &BacTimeline) {
    println!("{}", status_line(estimate));
    if let Some(line) = sober_line(timeline) {
        println!("{line}");
    }
}

/// Evaluate, print, apply housekeeping and persist.
fn refresh_and_report(app: &App, log: &mut DrinkLog, chart: bool) -> anyhow::Result<()> {
    let now = Utc::now();
    // Timeline first: refresh may clear the drinks it needs
    let timeline = log.timeline(&app.model, now, &app.window);
    let estimate = log.refresh(&app.model, now);

    print_status(&estimate, &timeline);
    if chart {
        draw_ascii(&timeline, &Local);
    }
    app.save_log(log)
}

fn add_event(app: &App, log: &mut DrinkLog, event: DrinkEvent) -> anyhow::Result<()> {
    println!(
        "Added {} ({} ml at {}%) at {}",
        event.name(),
        event.volume_ml(),
        event.strength_percent(),
        event.timestamp().with_timezone(&Local).format("%H:%M")
    );
    log.add_drink(event);
    refresh_and_report(app, log, false)
}

fn list(log: &DrinkLog) {
    if log.drinks.is_empty() {
        println!("No drinks tracked.");
    } else {
        println!("Tracked drinks:");
        for drink in &log.drinks {
            println!(
                "  {}  {}  {} ml ({}%)  {}",
                drink.timestamp().with_timezone(&Local).format("%H:%M"),
                drink.id(),
                drink.volume_ml(),
                drink.strength_percent(),
                drink.name()
            );
        }
    }

    if !log.saved_drinks.is_empty() {
        println!("Saved drinks:");
        for saved in &log.saved_drinks {
            println!(
                "  {}  {} ml ({}%)  {}",
                saved.id, saved.volume_ml, saved.strength_percent, saved.name
            );
        }
    }
}

async fn watch(app: &App) -> anyhow::Result<()> {
    watch_until(app, tokio::signal::ctrl_c()).await
}

/// Tick until `shutdown` completes.
///
/// `shutdown` is pinned once for the whole loop, so a signal that arrives while a
/// tick is being processed is still seen on the next pass.
async fn watch_until<F: Future>(app: &App, shutdown: F) -> anyhow::Result<()> {
    let period = std::time::Duration::from_secs(app.config.app.refresh_seconds.max(1));
    let mut ticker = tokio::time::interval(period);
    info!(path = %app.data_path.display(), ?period, "watching drink log");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Re-read each tick so edits from another invocation show up
                let mut log = app.load_log()?;
                let now = Utc::now();
                let estimate = log.refresh(&app.model, now);
                println!("{} {}", now.with_timezone(&Local).format("%H:%M:%S"), status_line(&estimate));
                app.save_log(&log)?;
            }
            _ = &mut shutdown => {
                info!("interrupted, stopping watch");
                return Ok(());
            }
        }
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app = App::new(&cli)?;
    let mut log = app.load_log()?;

    match cli.command.unwrap_or(Command::Status) {
        Command::Status => refresh_and_report(&app, &mut log, false)?,
        Command::Chart => refresh_and_report(&app, &mut log, true)?,
        Command::Add {
            volume,
            strength,
            name,
            at,
        } => {
            let timestamp = entry_time(at.as_deref(), &log, Local::now())?;
            let event = DrinkEvent::new(name, volume, strength, timestamp)?;
            add_event(&app, &mut log, event)?;
        }
        Command::Preset { id, at } => {
            let preset = standard_drink(&id).ok_or_else(|| {
                let known: Vec<_> = STANDARD_DRINKS.iter().map(|d| d.id).collect();
                anyhow!("unknown preset {id:?}, expected one of {}", known.join(", "))
            })?;
            let timestamp = entry_time(at.as_deref(), &log, Local::now())?;
            add_event(&app, &mut log, preset.to_event(timestamp)?)?;
        }
        Command::Again { id, at } => {
            let saved = log
                .saved_drinks
                .iter()
                .find(|saved| saved.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("no saved drink with id {id}"))?;
            let timestamp = entry_time(at.as_deref(), &log, Local::now())?;
            add_event(&app, &mut log, saved.to_event(timestamp)?)?;
        }
        Command::List => list(&log),
        Command::Remove { id } => {
            if !log.remove_drink(id) {
                return Err(anyhow!("no tracked drink with id {id}"));
            }
            refresh_and_report(&app, &mut log, false)?;
        }
        Command::Forget { id } => {
            if !log.remove_saved_drink(id) {
                return Err(anyhow!("no saved drink with id {id}"));
            }
            app.save_log(&log)?;
        }
        Command::Profile { weight, sex } => {
            log.profile = UserProfile::new(weight, sex)?;
            println!("Profile set to {weight} kg, {sex}");
            refresh_and_report(&app, &mut log, false)?;
        }
        Command::Reset => {
            log.reset();
            log.profile = app.config.profile()?;
            app.save_log(&log)?;
            println!("Drink log reset.");
        }
        Command::Watch => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(watch(&app))?;
        }
    }

    Ok(())
}
