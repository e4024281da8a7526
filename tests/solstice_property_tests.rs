//! Property tests for the seasonal progress interpolation.

use proptest::prelude::*;

use daylightr::solstice::percent_progress;

/// Day lengths in minutes that a real coordinate could produce.
fn minutes_strategy() -> impl Strategy<Value = i64> {
    0..=1440i64
}

/// A non-degenerate progress window: winter strictly shorter than summer.
fn window_strategy() -> impl Strategy<Value = (i64, i64)> {
    (0..=1400i64, 1..=200i64).prop_map(|(winter, span)| (winter, (winter + span).min(1440)))
}

proptest! {
    /// Progress is always inside 0..=100, even for day lengths far outside
    /// the window.
    #[test]
    fn percent_is_always_within_bounds(
        today in -2000..4000i64,
        (winter, summer) in window_strategy()
    ) {
        let percent = percent_progress(today, winter, summer);
        prop_assert!(percent <= 100);
    }

    /// Progress is monotonic non-decreasing in today's day length.
    #[test]
    fn percent_is_monotonic_in_today(
        (winter, summer) in window_strategy(),
        a in 0..=1440i64,
        b in 0..=1440i64
    ) {
        let (shorter, longer) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            percent_progress(shorter, winter, summer)
                <= percent_progress(longer, winter, summer)
        );
    }

    /// The window endpoints map exactly to 0 and 100.
    #[test]
    fn percent_endpoints_are_exact((winter, summer) in window_strategy()) {
        prop_assert_eq!(percent_progress(winter, winter, summer), 0);
        prop_assert_eq!(percent_progress(summer, winter, summer), 100);
    }

    /// A degenerate or inverted window always yields the defined fallback.
    #[test]
    fn degenerate_window_is_fifty(
        today in minutes_strategy(),
        winter in minutes_strategy(),
        shrink in 0..=300i64
    ) {
        let summer = winter - shrink;
        prop_assert_eq!(percent_progress(today, winter, summer), 50);
    }
}
