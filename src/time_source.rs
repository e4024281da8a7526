//! Time source abstraction for real and pinned clocks.
//!
//! The orchestrator computes its batch dates from "now" exactly once per
//! batch. This module is the seam that makes those computations
//! deterministic under test: production code reads the system clock, while
//! tests (with the `testing-support` feature) install a fixed clock so
//! "today", "yesterday", and the solstice anchors never move mid-test.

use chrono::{DateTime, Local, NaiveDate};
use std::sync::{Arc, OnceLock};

static TIME_SOURCE: OnceLock<Arc<dyn TimeSource>> = OnceLock::new();

/// Trait for abstracting clock reads.
pub trait TimeSource: Send + Sync {
    /// The current local date-time.
    fn now(&self) -> DateTime<Local>;
}

/// Real-time implementation that reads the system clock.
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock pinned to one instant, for deterministic tests.
#[cfg(any(test, feature = "testing-support"))]
pub struct FixedClock(pub DateTime<Local>);

#[cfg(any(test, feature = "testing-support"))]
impl TimeSource for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Install a time source. First caller wins; later calls are ignored, which
/// lets every test in a binary pin the same clock without coordination.
#[cfg(any(test, feature = "testing-support"))]
pub fn set_time_source(source: Arc<dyn TimeSource>) {
    let _ = TIME_SOURCE.set(source);
}

fn source() -> &'static Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(SystemClock))
}

/// The current local date-time from the installed source.
pub fn now() -> DateTime<Local> {
    source().now()
}

/// Today's calendar day from the installed source.
pub fn today() -> NaiveDate {
    now().date_naive()
}
