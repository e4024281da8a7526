//! # Daylightr Library
//!
//! Internal library for the daylightr binary.
//!
//! This library exists to enable testing of the engine internals and to keep
//! a clean separation between CLI dispatch (main.rs) and the solar
//! statistics engine that presentation layers consume.
//!
//! ## Architecture
//!
//! - **Engine**: `engine` module — the `SolarEngine` orchestrator, its
//!   `LoadState` machine, and the derived `SolarStats` snapshot
//! - **Ephemeris**: `ephemeris` module — HTTP client for the
//!   sunrise-sunset.org API and the `EphemerisProvider` seam used by tests
//! - **Calendar**: `solstice` module — pure solstice/equinox date arithmetic
//!   and the seasonal progress interpolation
//! - **Parsing**: `timestamp` module — tolerant ISO-8601 instant parsing
//! - **Settings**: `settings` module — persisted last-coordinate store
//! - **Infrastructure**: logging macros, compiled-in defaults, and the
//!   pluggable time source used to pin "today" under test

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod constants;
pub mod engine;
pub mod ephemeris;
pub mod settings;
pub mod solstice;
pub mod time_source;
pub mod timestamp;

// Re-exports for the binary and for collaborators embedding the engine
pub use engine::{LoadState, SolarEngine, SolarStats};
pub use ephemeris::{Coordinate, DayRecord, EphemerisProvider, SunriseSunsetClient};
pub use solstice::KeyDay;
