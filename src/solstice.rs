//! Solstice and equinox calendar arithmetic.
//!
//! Pure, deterministic date logic with no I/O. The four key days use fixed
//! Northern-Hemisphere calendar approximations (Mar 20, Jun 21, Sep 22,
//! Dec 21) rather than orbital mechanics; for day-length comparisons at the
//! resolution of minutes, the fixed dates are indistinguishable from the
//! astronomical ones.
//!
//! Boundary rule throughout: a day exactly equal to a key day counts as that
//! key day (`>=`, never `>`), so "days since the solstice" is 0 on the
//! solstice itself.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::constants::{
    FALL_EQUINOX_DAY, SPRING_EQUINOX_DAY, SUMMER_SOLSTICE_DAY, WINTER_SOLSTICE_DAY,
};

/// Calendar extraction failed while building a fixed key-day date.
///
/// Defensive only: the fixed (month, day) pairs are valid in every year
/// chrono can represent, so this is reachable only at the extreme edges of
/// chrono's year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid date components for calendar arithmetic")]
pub struct InvalidDateComponents;

/// The four fixed key days of the solar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDay {
    SpringEquinox,
    SummerSolstice,
    FallEquinox,
    WinterSolstice,
}

impl KeyDay {
    /// Display name used by the presentation layer.
    pub fn name(&self) -> &'static str {
        match self {
            KeyDay::SpringEquinox => "Spring Equinox",
            KeyDay::SummerSolstice => "Summer Solstice",
            KeyDay::FallEquinox => "Fall Equinox",
            KeyDay::WinterSolstice => "Winter Solstice",
        }
    }

    /// Fixed (month, day) of this key day.
    fn month_day(&self) -> (u32, u32) {
        match self {
            KeyDay::SpringEquinox => SPRING_EQUINOX_DAY,
            KeyDay::SummerSolstice => SUMMER_SOLSTICE_DAY,
            KeyDay::FallEquinox => FALL_EQUINOX_DAY,
            KeyDay::WinterSolstice => WINTER_SOLSTICE_DAY,
        }
    }

    /// The key days in calendar order within a year.
    const IN_CALENDAR_ORDER: [KeyDay; 4] = [
        KeyDay::SpringEquinox,
        KeyDay::SummerSolstice,
        KeyDay::FallEquinox,
        KeyDay::WinterSolstice,
    ];
}

/// The winter and summer solstice dates anchoring the current progress window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolsticeAnchors {
    /// The operative winter solstice: this year's if already reached,
    /// otherwise last year's.
    pub winter: NaiveDate,
    /// This year's summer solstice.
    pub summer: NaiveDate,
}

/// Build the date of a key day in a given year.
pub fn key_date(year: i32, key: KeyDay) -> Result<NaiveDate, InvalidDateComponents> {
    let (month, day) = key.month_day();
    NaiveDate::from_ymd_opt(year, month, day).ok_or(InvalidDateComponents)
}

/// The most recent solstice on or before `today`, with its label.
///
/// Candidates are this year's summer and winter solstices and the previous
/// year's winter solstice; the latest one not after `today` wins.
pub fn most_recent_solstice(
    today: NaiveDate,
) -> Result<(NaiveDate, KeyDay), InvalidDateComponents> {
    let winter = key_date(today.year(), KeyDay::WinterSolstice)?;
    let summer = key_date(today.year(), KeyDay::SummerSolstice)?;
    let previous_winter = key_date(today.year() - 1, KeyDay::WinterSolstice)?;

    if today >= winter {
        Ok((winter, KeyDay::WinterSolstice))
    } else if today >= summer {
        Ok((summer, KeyDay::SummerSolstice))
    } else {
        Ok((previous_winter, KeyDay::WinterSolstice))
    }
}

/// The next key day on or after `today`, and how many days until it.
///
/// Scans the current year's key days in calendar order; when all four have
/// passed, wraps to next year's spring equinox. `days_until` is 0 when
/// `today` is itself the key day.
pub fn next_key_day(today: NaiveDate) -> Result<(KeyDay, i64), InvalidDateComponents> {
    for key in KeyDay::IN_CALENDAR_ORDER {
        let date = key_date(today.year(), key)?;
        if date >= today {
            return Ok((key, (date - today).num_days()));
        }
    }

    let next_spring = key_date(today.year() + 1, KeyDay::SpringEquinox)?;
    Ok((KeyDay::SpringEquinox, (next_spring - today).num_days()))
}

/// The solstice pair anchoring the day-length progress window for `today`.
///
/// Summer is always this year's; winter is this year's once reached,
/// otherwise last year's, so the window always brackets `today`.
pub fn solstice_anchors(today: NaiveDate) -> Result<SolsticeAnchors, InvalidDateComponents> {
    let this_winter = key_date(today.year(), KeyDay::WinterSolstice)?;
    let winter = if today >= this_winter {
        this_winter
    } else {
        key_date(today.year() - 1, KeyDay::WinterSolstice)?
    };
    let summer = key_date(today.year(), KeyDay::SummerSolstice)?;

    Ok(SolsticeAnchors { winter, summer })
}

/// Position today's day length between the year's shortest and longest day.
///
/// Linear interpolation `(today - winter) / (summer - winter) * 100`, rounded
/// to the nearest integer and clamped to 0..=100. A degenerate window
/// (`summer <= winter`) yields the defined fallback of 50 instead of
/// dividing by zero.
pub fn percent_progress(today_minutes: i64, winter_minutes: i64, summer_minutes: i64) -> u8 {
    let range = summer_minutes - winter_minutes;
    if range <= 0 {
        return 50;
    }

    let fraction = (today_minutes - winter_minutes) as f64 / range as f64;
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}
