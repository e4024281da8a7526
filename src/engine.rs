//! Solar statistics orchestrator and load-state machine.
//!
//! This module drives everything: it computes the batch dates from "now"
//! via the solstice calendar, launches exactly five concurrent ephemeris
//! fetches (today, yesterday, the most recent solstice, and the winter and
//! summer solstice anchors), combines the results into a [`SolarStats`]
//! snapshot, and publishes the outcome through a [`LoadState`] cell.
//!
//! ## State machine
//!
//! ```text
//! Idle --fetch_if_needed()--> Loading --success--> Loaded(stats)
//!                             Loading --failure--> Error(message)
//! (any) --refresh()--------> Idle, then immediately Loading again
//! (any) --set_location()---> Idle, then immediately Loading again
//! ```
//!
//! `fetch_if_needed` is a no-op unless the state is `Idle`; that single rule
//! is what guarantees at most one batch in flight per engine and shrugs off
//! request storms from repeated UI appearance events. `refresh` and
//! `set_location` are the only preempting operations: they advance the batch
//! epoch so a superseded batch that later settles is silently discarded
//! rather than published over the fresh one.
//!
//! The state is held in a `tokio::sync::watch` cell, so collaborators get a
//! read-only current value plus change notification, delivered in publication
//! order. The engine itself is execution-context agnostic; observing updates
//! on one consistent context (the UI thread, typically) is the subscriber's
//! responsibility.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use crate::ephemeris::{Coordinate, DayRecord, EphemerisProvider};
use crate::solstice::{self, InvalidDateComponents, KeyDay};
use crate::time_source;

/// The engine's sole externally observable mutable state.
///
/// Exactly one variant holds at any time. Partial fetch results never leak:
/// `Loaded` always carries a complete snapshot built from all five fetches.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// No fetch requested yet, or the last result was invalidated.
    Idle,
    /// A fetch batch is in flight.
    Loading,
    /// The last batch succeeded.
    Loaded(SolarStats),
    /// The last batch failed; the message is ready for display.
    Error(String),
}

/// A snapshot of today's daylight situation, derived from five day records.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarStats {
    /// Today's full record (sunrise, sunset, twilight, day length).
    pub today: DayRecord,
    /// Day-length delta vs yesterday, minutes (positive = longer today).
    pub minutes_change_from_yesterday: i64,
    /// Day-length delta vs the most recent solstice, minutes.
    pub minutes_change_since_solstice: i64,
    /// Sunrise clock-time shift vs the solstice, minutes
    /// (positive = sunrise earlier today).
    pub sunrise_shift_minutes: i64,
    /// Sunset clock-time shift vs the solstice, minutes
    /// (positive = sunset later today).
    pub sunset_shift_minutes: i64,
    /// Which solstice the "since" comparisons are against.
    pub most_recent_solstice: KeyDay,
    /// The next equinox or solstice coming up.
    pub next_key_day: KeyDay,
    /// Days until `next_key_day`; 0 when today is that key day.
    pub days_until_next_key_day: i64,
    /// Where today's length sits between the year's shortest and longest
    /// day, 0–100.
    pub percent_of_year_range: u8,
}

/// The orchestrator: one logical instance per tracked coordinate.
pub struct SolarEngine<P: EphemerisProvider> {
    provider: P,
    coordinate: Mutex<Coordinate>,
    place_name: Mutex<String>,
    /// Advanced by `refresh`/`set_location`; a batch publishes only if the
    /// epoch it started under is still current.
    batch_epoch: AtomicU64,
    state: watch::Sender<LoadState>,
}

impl<P: EphemerisProvider> SolarEngine<P> {
    /// Create an engine at the given starting coordinate.
    ///
    /// The default coordinate is an explicit constructor argument, not a
    /// hidden static; callers decide where it comes from (settings store,
    /// compiled-in fallback, geocoding collaborator).
    pub fn new(provider: P, coordinate: Coordinate) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            provider,
            coordinate: Mutex::new(coordinate),
            place_name: Mutex::new(String::new()),
            batch_epoch: AtomicU64::new(0),
            state,
        }
    }

    /// The current load state.
    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Subscribe to load-state changes. Values arrive in publication order.
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    /// The coordinate the next batch will use.
    pub fn coordinate(&self) -> Coordinate {
        *self.coordinate.lock().unwrap()
    }

    /// Human-readable place name for the current coordinate.
    ///
    /// Content is owned by the geocoding collaborator; the engine only
    /// stores it for display.
    pub fn place_name(&self) -> String {
        self.place_name.lock().unwrap().clone()
    }

    /// Update the display name shown next to the statistics.
    pub fn set_place_name(&self, name: impl Into<String>) {
        *self.place_name.lock().unwrap() = name.into();
    }

    /// Start a fetch batch unless one already ran or is running.
    ///
    /// No-op unless the state is `Idle`; calling this while `Loading` or
    /// `Loaded` issues zero additional fetches. On entry the coordinate is
    /// snapshotted once, so a `set_location` arriving mid-flight cannot
    /// produce a mixed batch.
    pub async fn fetch_if_needed(&self) {
        // The epoch snapshot happens inside the same state transition so a
        // preempting refresh/set_location can never slip between the two.
        let mut epoch = 0;
        let entered = self.state.send_if_modified(|state| {
            if matches!(state, LoadState::Idle) {
                *state = LoadState::Loading;
                epoch = self.batch_epoch.load(Ordering::SeqCst);
                true
            } else {
                false
            }
        });
        if !entered {
            return;
        }

        let coordinate = self.coordinate();

        let outcome = self.run_batch(coordinate).await;

        let published = self.state.send_if_modified(|state| {
            if self.batch_epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            *state = match outcome {
                Ok(stats) => LoadState::Loaded(stats),
                Err(err) => LoadState::Error(format!("{err:#}")),
            };
            true
        });

        if !published {
            log_debug!("Discarding superseded fetch batch for {coordinate}");
        }
    }

    /// Force back to `Idle` and immediately re-trigger a fetch.
    ///
    /// The only recovery path after `Error`; there is no automatic retry.
    pub async fn refresh(&self) {
        self.reset_to_idle();
        self.fetch_if_needed().await;
    }

    /// Change the coordinate, invalidating any previous result, and fetch.
    pub async fn set_location(&self, coordinate: Coordinate) {
        *self.coordinate.lock().unwrap() = coordinate;
        self.reset_to_idle();
        self.fetch_if_needed().await;
    }

    /// Unconditionally return to `Idle`, invalidating any in-flight batch.
    ///
    /// The epoch advance and the state write share the watch sender's
    /// internal lock, so a batch observes either both or neither.
    fn reset_to_idle(&self) {
        self.state.send_if_modified(|state| {
            self.batch_epoch.fetch_add(1, Ordering::SeqCst);
            *state = LoadState::Idle;
            true
        });
    }

    /// Run one batch: resolve the five target dates, fetch them all
    /// concurrently, and derive the combined statistics.
    ///
    /// The batch succeeds only if all five fetches succeed. `try_join!`
    /// surfaces the first failure it observes and drops the remaining
    /// futures with it; which failure wins when several fail concurrently is
    /// implementation-defined.
    async fn run_batch(&self, coordinate: Coordinate) -> Result<SolarStats> {
        let today = time_source::today();
        let yesterday = today.pred_opt().ok_or(InvalidDateComponents)?;
        let (solstice_date, solstice_label) = solstice::most_recent_solstice(today)?;
        let (next_key_day, days_until_next_key_day) = solstice::next_key_day(today)?;
        let anchors = solstice::solstice_anchors(today)?;

        let (today_rec, yesterday_rec, solstice_rec, winter_rec, summer_rec) = tokio::try_join!(
            self.fetch_one(coordinate, today),
            self.fetch_one(coordinate, yesterday),
            self.fetch_one(coordinate, solstice_date),
            self.fetch_one(coordinate, anchors.winter),
            self.fetch_one(coordinate, anchors.summer),
        )?;

        Ok(derive_stats(DerivationInputs {
            today: today_rec,
            yesterday: yesterday_rec,
            solstice: solstice_rec,
            winter: winter_rec,
            summer: summer_rec,
            solstice_label,
            next_key_day,
            days_until_next_key_day,
        }))
    }

    async fn fetch_one(&self, coordinate: Coordinate, date: NaiveDate) -> Result<DayRecord> {
        self.provider
            .day_record(coordinate, date)
            .await
            .with_context(|| format!("Fetching solar data for {date} failed"))
    }
}

/// The five records plus the calendar facts computed at batch start.
struct DerivationInputs {
    today: DayRecord,
    yesterday: DayRecord,
    solstice: DayRecord,
    winter: DayRecord,
    summer: DayRecord,
    solstice_label: KeyDay,
    next_key_day: KeyDay,
    days_until_next_key_day: i64,
}

/// Combine five day records into the derived statistics.
///
/// Shift signs follow the display convention: positive sunrise shift means
/// sunrise is earlier today than at the solstice, positive sunset shift means
/// sunset is later today. Clock times are the minute-of-day carried on the
/// stored instants, not elapsed durations.
fn derive_stats(inputs: DerivationInputs) -> SolarStats {
    let percent_of_year_range = solstice::percent_progress(
        inputs.today.day_length_minutes(),
        inputs.winter.day_length_minutes(),
        inputs.summer.day_length_minutes(),
    );

    SolarStats {
        minutes_change_from_yesterday: inputs.today.day_length_minutes()
            - inputs.yesterday.day_length_minutes(),
        minutes_change_since_solstice: inputs.today.day_length_minutes()
            - inputs.solstice.day_length_minutes(),
        sunrise_shift_minutes: inputs.solstice.sunrise_minute_of_day()
            - inputs.today.sunrise_minute_of_day(),
        sunset_shift_minutes: inputs.today.sunset_minute_of_day()
            - inputs.solstice.sunset_minute_of_day(),
        most_recent_solstice: inputs.solstice_label,
        next_key_day: inputs.next_key_day,
        days_until_next_key_day: inputs.days_until_next_key_day,
        percent_of_year_range,
        today: inputs.today,
    }
}
