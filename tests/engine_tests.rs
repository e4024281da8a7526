//! Orchestrator tests against a canned ephemeris provider.
//!
//! The clock is pinned to 2024-06-10 so the five batch dates are fixed:
//! today, 2024-06-09, the operative winter solstice 2023-12-21 (which is
//! also the most recent solstice for that date), and the summer solstice
//! 2024-06-21. The provider serves hand-built records for those dates, so
//! every derived figure is checkable by hand.

use chrono::{NaiveDate, TimeZone};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use daylightr::ephemeris::{Coordinate, DayRecord, EphemerisError, EphemerisProvider};
use daylightr::solstice::{self, KeyDay};
use daylightr::time_source::{self, FixedClock};
use daylightr::{LoadState, SolarEngine};

/// Pin the shared clock to noon, 2024-06-10 local time and return that day.
/// First caller installs the clock; later calls are no-ops with the same
/// date, so every test in this binary agrees on "today".
fn pin_today() -> NaiveDate {
    let fixed = chrono::Local
        .with_ymd_and_hms(2024, 6, 10, 12, 0, 0)
        .unwrap();
    time_source::set_time_source(Arc::new(FixedClock(fixed)));
    time_source::today()
}

fn record(date: NaiveDate, minutes: u32, sunrise: (u32, u32), sunset: (u32, u32)) -> DayRecord {
    DayRecord {
        sunrise: date.and_hms_opt(sunrise.0, sunrise.1, 0).unwrap().and_utc(),
        sunset: date.and_hms_opt(sunset.0, sunset.1, 0).unwrap().and_utc(),
        day_length_seconds: minutes * 60,
        civil_twilight_begin: None,
        civil_twilight_end: None,
    }
}

/// Records for the five dates a 2024-06-10 batch resolves to.
fn canned_records(today: NaiveDate) -> HashMap<NaiveDate, DayRecord> {
    let yesterday = today.pred_opt().unwrap();
    let (solstice_date, _) = solstice::most_recent_solstice(today).unwrap();
    let anchors = solstice::solstice_anchors(today).unwrap();

    let mut records = HashMap::new();
    records.insert(today, record(today, 600, (4, 0), (20, 0)));
    records.insert(yesterday, record(yesterday, 598, (4, 2), (19, 58)));
    records.insert(solstice_date, record(solstice_date, 470, (8, 0), (15, 50)));
    records.insert(anchors.winter, record(anchors.winter, 470, (8, 0), (15, 50)));
    records.insert(anchors.summer, record(anchors.summer, 1007, (3, 44), (20, 16)));
    records
}

fn coordinate() -> Coordinate {
    Coordinate::new(55.6761, 12.5683)
}

/// Test double serving canned records, with optional failure injection and
/// an optional gate that holds every fetch until the test releases it.
#[derive(Clone)]
struct CannedProvider {
    records: Arc<HashMap<NaiveDate, DayRecord>>,
    fail_dates: Arc<Mutex<HashSet<NaiveDate>>>,
    fail_coordinate: Option<Coordinate>,
    calls: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
}

impl CannedProvider {
    fn new(records: HashMap<NaiveDate, DayRecord>) -> Self {
        Self {
            records: Arc::new(records),
            fail_dates: Arc::new(Mutex::new(HashSet::new())),
            fail_coordinate: None,
            calls: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    fn failing_for_date(self, date: NaiveDate) -> Self {
        self.fail_dates.lock().unwrap().insert(date);
        self
    }

    fn failing_for_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.fail_coordinate = Some(coordinate);
        self
    }

    fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self.clone(), gate)
    }

    fn clear_failures(&self) {
        self.fail_dates.lock().unwrap().clear();
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EphemerisProvider for CannedProvider {
    fn day_record(
        &self,
        coordinate: Coordinate,
        date: NaiveDate,
    ) -> impl Future<Output = Result<DayRecord, EphemerisError>> + Send {
        let this = self.clone();
        async move {
            this.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &this.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            if this.fail_coordinate == Some(coordinate) {
                return Err(EphemerisError::ApiStatus("INVALID_REQUEST".to_string()));
            }
            if this.fail_dates.lock().unwrap().contains(&date) {
                return Err(EphemerisError::ApiStatus("INVALID_DATE".to_string()));
            }
            this.records
                .get(&date)
                .cloned()
                .ok_or(EphemerisError::InvalidResponse)
        }
    }
}

#[tokio::test]
async fn successful_batch_publishes_hand_computed_stats() {
    let today = pin_today();
    let provider = CannedProvider::new(canned_records(today));
    let engine = SolarEngine::new(provider.clone(), coordinate());

    assert_eq!(engine.state(), LoadState::Idle);
    engine.fetch_if_needed().await;

    match engine.state() {
        LoadState::Loaded(stats) => {
            assert_eq!(stats.minutes_change_from_yesterday, 2);
            assert_eq!(stats.minutes_change_since_solstice, 130);
            assert_eq!(stats.sunrise_shift_minutes, 240);
            assert_eq!(stats.sunset_shift_minutes, 250);
            assert_eq!(stats.percent_of_year_range, 24);
            assert_eq!(stats.most_recent_solstice, KeyDay::WinterSolstice);
            assert_eq!(stats.next_key_day, KeyDay::SummerSolstice);
            assert_eq!(stats.days_until_next_key_day, 11);
            assert_eq!(stats.today.day_length_minutes(), 600);
        }
        other => panic!("expected Loaded, got {other:?}"),
    }
    assert_eq!(provider.calls(), 5, "a batch is exactly five fetches");
}

#[tokio::test]
async fn one_failed_fetch_publishes_error_never_loaded() {
    let today = pin_today();
    let provider = CannedProvider::new(canned_records(today))
        .failing_for_date(today.pred_opt().unwrap());
    let engine = SolarEngine::new(provider, coordinate());

    engine.fetch_if_needed().await;

    match engine.state() {
        LoadState::Error(message) => {
            assert!(message.contains("INVALID_DATE"), "got: {message}");
        }
        other => panic!("a failed batch must surface Error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_is_a_noop_once_loaded() {
    let today = pin_today();
    let provider = CannedProvider::new(canned_records(today));
    let engine = SolarEngine::new(provider.clone(), coordinate());

    engine.fetch_if_needed().await;
    let loaded = engine.state();
    assert!(matches!(loaded, LoadState::Loaded(_)));

    engine.fetch_if_needed().await;
    engine.fetch_if_needed().await;

    assert_eq!(provider.calls(), 5, "repeat triggers must issue no fetches");
    assert_eq!(engine.state(), loaded);
}

#[tokio::test]
async fn fetch_is_a_noop_while_loading() {
    let today = pin_today();
    let (provider, gate) = CannedProvider::new(canned_records(today)).gated();
    let engine = Arc::new(SolarEngine::new(provider.clone(), coordinate()));

    let mut rx = engine.subscribe();
    let in_flight = tokio::spawn({
        let engine = engine.clone();
        async move { engine.fetch_if_needed().await }
    });

    rx.wait_for(|state| matches!(state, LoadState::Loading))
        .await
        .unwrap();

    // A duplicate trigger while Loading returns without fetching
    engine.fetch_if_needed().await;
    assert_eq!(provider.calls(), 5);

    gate.add_permits(5);
    in_flight.await.unwrap();

    assert!(matches!(engine.state(), LoadState::Loaded(_)));
    assert_eq!(provider.calls(), 5);
}

#[tokio::test]
async fn states_are_observed_in_publication_order() {
    let today = pin_today();
    let (provider, gate) = CannedProvider::new(canned_records(today)).gated();
    let engine = Arc::new(SolarEngine::new(provider, coordinate()));

    let mut rx = engine.subscribe();
    let in_flight = tokio::spawn({
        let engine = engine.clone();
        async move { engine.fetch_if_needed().await }
    });

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), LoadState::Loading);

    gate.add_permits(5);
    in_flight.await.unwrap();

    rx.changed().await.unwrap();
    assert!(matches!(*rx.borrow_and_update(), LoadState::Loaded(_)));
}

#[tokio::test]
async fn refresh_forces_a_fresh_batch() {
    let today = pin_today();
    let provider = CannedProvider::new(canned_records(today));
    let engine = SolarEngine::new(provider.clone(), coordinate());

    engine.fetch_if_needed().await;
    assert_eq!(provider.calls(), 5);

    engine.refresh().await;
    assert_eq!(provider.calls(), 10);
    assert!(matches!(engine.state(), LoadState::Loaded(_)));
}

#[tokio::test]
async fn error_recovers_only_through_refresh() {
    let today = pin_today();
    let provider = CannedProvider::new(canned_records(today)).failing_for_date(today);
    let engine = SolarEngine::new(provider.clone(), coordinate());

    engine.fetch_if_needed().await;
    assert!(matches!(engine.state(), LoadState::Error(_)));

    // No retry happened on its own
    assert_eq!(provider.calls(), 5);

    provider.clear_failures();
    engine.refresh().await;
    assert!(matches!(engine.state(), LoadState::Loaded(_)));
    assert_eq!(provider.calls(), 10);
}

#[tokio::test]
async fn set_location_invalidates_and_refetches() {
    let today = pin_today();
    let provider = CannedProvider::new(canned_records(today));
    let engine = SolarEngine::new(provider.clone(), coordinate());

    engine.fetch_if_needed().await;
    assert_eq!(provider.calls(), 5);

    let elsewhere = Coordinate::new(40.7128, -74.0060);
    engine.set_location(elsewhere).await;

    assert_eq!(engine.coordinate(), elsewhere);
    assert_eq!(provider.calls(), 10);
    assert!(matches!(engine.state(), LoadState::Loaded(_)));
}

#[tokio::test]
async fn superseded_batch_is_discarded_not_published() {
    let today = pin_today();
    let bad = Coordinate::new(0.0, 0.0);
    let (provider, gate) = CannedProvider::new(canned_records(today))
        .failing_for_coordinate(bad)
        .gated();
    let engine = Arc::new(SolarEngine::new(provider.clone(), coordinate()));

    // First batch starts at the failing coordinate and blocks on the gate
    let mut rx = engine.subscribe();
    let stale = tokio::spawn({
        let engine = engine.clone();
        async move {
            engine.set_location(bad).await;
        }
    });
    rx.wait_for(|state| matches!(state, LoadState::Loading))
        .await
        .unwrap();

    // Location change preempts it with a batch at the good coordinate
    let fresh = tokio::spawn({
        let engine = engine.clone();
        async move {
            engine.set_location(coordinate()).await;
        }
    });

    gate.add_permits(10);
    stale.await.unwrap();
    fresh.await.unwrap();

    // The stale batch's Error must not overwrite the fresh Loaded state
    assert!(matches!(engine.state(), LoadState::Loaded(_)));
    assert_eq!(engine.coordinate(), coordinate());
    assert_eq!(provider.calls(), 10);
}
