//! Weekly flex-hours totals and end-of-day projection, computed from the text
//! a time-tracking page renders.
//!
//! The [`acquisition::AcquisitionController`] waits for the host page to
//! render, reads a [`snapshot::TimeSnapshot`], and runs the pipeline:
//! locate ([`locate`]) → parse ([`timefmt`]) → validate ([`validation`]) →
//! project ([`schedule`]). The result goes to an
//! [`acquisition::Presenter`].

pub mod acquisition;
pub mod config;
pub mod error;
pub mod locate;
pub mod schedule;
pub mod settings;
pub mod snapshot;
pub mod timefmt;
pub mod utils;
pub mod validation;

use std::{fs, io, path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Weekday;

use acquisition::{AcquisitionController, AcquisitionStatus, ConsolePresenter, FixtureDocument};
use config::FlexConfig;
use settings::SettingsStore;
use snapshot::TimeSnapshot;
use utils::logging;

pub use error::FlexError;

pub const USAGE: &str =
    "usage: flextime <snapshot.json> [weekday] [--json]\n       flextime debug <on|off>";

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliArgs {
    snapshot: PathBuf,
    weekday: Option<Weekday>,
    json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Acquire(CliArgs),
    /// Persist the debug logging toggle.
    SetDebug(bool),
}

fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().peekable();

    if args.peek().map(String::as_str) == Some("debug") {
        args.next();
        let enabled = match args.next().as_deref() {
            Some("on") => true,
            Some("off") => false,
            _ => bail!("{USAGE}"),
        };
        if let Some(extra) = args.next() {
            bail!("unexpected argument '{extra}'\n{USAGE}");
        }
        return Ok(Command::SetDebug(enabled));
    }

    let mut snapshot = None;
    let mut weekday = None;
    let mut json = false;

    for arg in args {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => bail!("{USAGE}"),
            _ if snapshot.is_none() => snapshot = Some(PathBuf::from(arg)),
            _ if weekday.is_none() => {
                let day = arg
                    .parse::<Weekday>()
                    .map_err(|_| anyhow!("unknown weekday '{arg}'\n{USAGE}"))?;
                weekday = Some(day);
            }
            _ => bail!("unexpected argument '{arg}'\n{USAGE}"),
        }
    }

    Ok(Command::Acquire(CliArgs {
        snapshot: snapshot.ok_or_else(|| anyhow!("{USAGE}"))?,
        weekday,
        json,
    }))
}

/// CLI entry. Either persists the debug toggle, or loads a snapshot fixture,
/// runs one acquisition cycle against it and prints the summary.
///
/// Exits with failure when the cycle ends without a result.
pub fn run() -> Result<ExitCode> {
    let command = parse_args(std::env::args().skip(1))?;
    let settings = SettingsStore::new(SettingsStore::default_path())?;

    let args = match command {
        Command::SetDebug(enabled) => {
            settings.set_debug(enabled)?;
            println!(
                "debug logging {} ({})",
                if enabled { "on" } else { "off" },
                settings.path().display()
            );
            return Ok(ExitCode::SUCCESS);
        }
        Command::Acquire(args) => args,
    };

    let debug = logging::debug_from_env().unwrap_or_else(|| settings.debug());
    logging::init(debug);

    log::info!("flextime starting up (debug={debug})");

    let contents = fs::read_to_string(&args.snapshot)
        .with_context(|| format!("Failed to read snapshot {}", args.snapshot.display()))?;
    let snapshot: TimeSnapshot = serde_json::from_str(&contents)
        .with_context(|| format!("Malformed snapshot {}", args.snapshot.display()))?;

    // The fixture is already rendered; there is nothing to wait for.
    let mut config = FlexConfig::default();
    config.timing.initial_delay = Duration::ZERO;

    let mut controller = AcquisitionController::new(config);
    if let Some(day) = args.weekday {
        controller = controller.with_weekday(day);
    }

    let host = FixtureDocument::rendered(snapshot);
    let mut presenter = ConsolePresenter::new(io::stdout().lock()).with_json(args.json);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    match runtime.block_on(controller.run(&host, &mut presenter)) {
        AcquisitionStatus::Done => Ok(ExitCode::SUCCESS),
        status => {
            eprintln!("flextime: cycle ended without a result ({status:?})");
            Ok(ExitCode::FAILURE)
        }
    }
}
