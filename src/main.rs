//! Command-line entry point and terminal presentation.
//!
//! The binary is a thin collaborator around the engine: it parses arguments,
//! resolves the starting coordinate (CLI override, then persisted settings,
//! then the compiled-in default), runs one fetch batch, renders the
//! resulting `LoadState` with the visual logger, and persists the coordinate
//! for next time. All statistics live in the library; this file only decides
//! what to print.
//!
//! Times are converted to the local wall clock here, at the presentation
//! edge. The engine itself deals in UTC instants throughout.

use anyhow::Result;
use chrono::Local;
use std::process::ExitCode;

use daylightr::constants::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_PLACE_NAME};
use daylightr::settings::Settings;
use daylightr::{
    Coordinate, LoadState, SolarEngine, SolarStats, SunriseSunsetClient, log_block_start,
    log_decorated, log_end, log_error, log_error_exit, log_indented, log_pipe, log_version,
    log_warning,
};

/// What the parsed command line asks us to do.
enum CliAction {
    /// Run a fetch, optionally overriding the persisted coordinate.
    Run {
        coordinate_override: Option<Coordinate>,
        place_name: Option<String>,
    },
    ShowHelp,
    ShowVersion,
    /// Unknown or malformed arguments; show help and fail.
    ShowHelpDueToError(String),
}

fn parse_args(args: &[String]) -> CliAction {
    let mut coordinate_override = None;
    let mut place_name = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return CliAction::ShowHelp,
            "--version" | "-V" => return CliAction::ShowVersion,
            "--name" => match iter.next() {
                Some(name) => place_name = Some(name.clone()),
                None => {
                    return CliAction::ShowHelpDueToError("--name requires a value".to_string());
                }
            },
            // Matched before the unknown-option arm so negative latitudes
            // like "-33.86,151.21" are not mistaken for flags
            positional if positional.contains(',') => match parse_coordinate(positional) {
                Some(coordinate) => coordinate_override = Some(coordinate),
                None => {
                    return CliAction::ShowHelpDueToError(format!(
                        "'{positional}' is not a valid LAT,LON pair"
                    ));
                }
            },
            unknown => {
                return CliAction::ShowHelpDueToError(format!("unknown option '{unknown}'"));
            }
        }
    }

    CliAction::Run {
        coordinate_override,
        place_name,
    }
}

/// Parse a `LAT,LON` pair in decimal degrees, rejecting out-of-range values.
fn parse_coordinate(s: &str) -> Option<Coordinate> {
    let (lat, lng) = s.split_once(',')?;
    let coordinate = Coordinate::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
    coordinate.is_valid().then_some(coordinate)
}

fn print_usage() {
    log_block_start!("Usage: daylightr [LAT,LON] [OPTIONS]");
    log_indented!("LAT,LON         Coordinate in decimal degrees (e.g. 55.6761,12.5683)");
    log_indented!("--name <NAME>   Display name for the location");
    log_indented!("-h, --help      Show this help");
    log_indented!("-V, --version   Show version");
    log_end!();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match parse_args(&args) {
        CliAction::ShowHelp => {
            log_version!();
            print_usage();
            ExitCode::SUCCESS
        }
        CliAction::ShowVersion => {
            log_version!();
            log_end!();
            ExitCode::SUCCESS
        }
        CliAction::ShowHelpDueToError(message) => {
            log_version!();
            log_pipe!();
            log_error!("{message}");
            print_usage();
            ExitCode::FAILURE
        }
        CliAction::Run {
            coordinate_override,
            place_name,
        } => match run(coordinate_override, place_name).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                log_error_exit!("{err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(coordinate_override: Option<Coordinate>, place_name: Option<String>) -> Result<()> {
    log_version!();

    let settings = Settings::load().unwrap_or_else(|err| {
        log_pipe!();
        log_warning!("Could not load settings ({err:#}), starting fresh");
        Settings::default()
    });
    let default = Coordinate::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE);
    let coordinate = coordinate_override.unwrap_or_else(|| settings.coordinate_or(default));

    let engine = SolarEngine::new(SunriseSunsetClient::new(), coordinate);
    match place_name {
        Some(name) => engine.set_place_name(name),
        None if coordinate == default => engine.set_place_name(DEFAULT_PLACE_NAME),
        None => engine.set_place_name(coordinate.to_string()),
    }

    log_block_start!("Fetching ephemeris data for {}", engine.place_name());
    engine.fetch_if_needed().await;

    match engine.state() {
        LoadState::Loaded(stats) => {
            render_stats(&stats, &engine.place_name());
            if let Err(err) = Settings::remember_coordinate(coordinate) {
                log_pipe!();
                log_warning!("Could not persist location: {err:#}");
            }
            log_end!();
            Ok(())
        }
        LoadState::Error(message) => anyhow::bail!(message),
        // Unreachable: fetch_if_needed settles before returning
        LoadState::Idle | LoadState::Loading => anyhow::bail!("engine never settled"),
    }
}

/// Render a statistics snapshot in the logger's block style.
fn render_stats(stats: &SolarStats, place: &str) {
    let minutes = stats.today.day_length_minutes();

    log_block_start!("Daylight in {place}");
    log_indented!("Day length: {}h {:02}m", minutes / 60, minutes % 60);
    log_indented!(
        "Sunrise {} · Sunset {}",
        stats.today.sunrise.with_timezone(&Local).format("%H:%M"),
        stats.today.sunset.with_timezone(&Local).format("%H:%M")
    );
    if let (Some(begin), Some(end)) = (stats.today.civil_twilight_begin, stats.today.civil_twilight_end) {
        log_indented!(
            "Civil twilight {} – {}",
            begin.with_timezone(&Local).format("%H:%M"),
            end.with_timezone(&Local).format("%H:%M")
        );
    }

    log_block_start!("Since the {}", stats.most_recent_solstice.name());
    log_indented!("Day length {} min", signed(stats.minutes_change_since_solstice));
    log_indented!("Sunrise {} min", signed(stats.sunrise_shift_minutes));
    log_indented!("Sunset {} min", signed(stats.sunset_shift_minutes));
    log_indented!("vs yesterday: {} min", signed(stats.minutes_change_from_yesterday));

    log_block_start!(
        "{}% of the way to the year's longest day",
        stats.percent_of_year_range
    );
    if stats.days_until_next_key_day == 0 {
        log_decorated!("Today is the {}", stats.next_key_day.name());
    } else {
        log_decorated!(
            "{} in {} days",
            stats.next_key_day.name(),
            stats.days_until_next_key_day
        );
    }
}

fn signed(minutes: i64) -> String {
    format!("{minutes:+}")
}
