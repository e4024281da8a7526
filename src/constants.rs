//! Compiled-in defaults and fixed calendar data.
//!
//! Everything here is a deliberate constant: the ephemeris endpoint, the
//! fallback coordinate used before any location has been persisted, and the
//! fixed Northern-Hemisphere calendar days used by the solstice calendar.
//! The default coordinate is passed explicitly into the engine at
//! construction rather than read from a hidden global.

/// Base URL of the sunrise-sunset.org ephemeris API.
pub const EPHEMERIS_API_URL: &str = "https://api.sunrise-sunset.org/json";

/// Default latitude used on first run, before a location is persisted
/// (Royal Observatory, Greenwich).
pub const DEFAULT_LATITUDE: f64 = 51.4769;

/// Default longitude used on first run, before a location is persisted.
pub const DEFAULT_LONGITUDE: f64 = -0.0005;

/// Display name matching the default coordinate.
pub const DEFAULT_PLACE_NAME: &str = "Greenwich";

/// Fixed calendar day (month, day) of the spring equinox.
pub const SPRING_EQUINOX_DAY: (u32, u32) = (3, 20);

/// Fixed calendar day (month, day) of the summer solstice.
pub const SUMMER_SOLSTICE_DAY: (u32, u32) = (6, 21);

/// Fixed calendar day (month, day) of the fall equinox.
pub const FALL_EQUINOX_DAY: (u32, u32) = (9, 22);

/// Fixed calendar day (month, day) of the winter solstice.
pub const WINTER_SOLSTICE_DAY: (u32, u32) = (12, 21);

/// Settings file name inside the config directory.
pub const SETTINGS_FILE: &str = "daylightr.toml";

/// Config directory name under XDG_CONFIG_HOME.
pub const CONFIG_DIR_NAME: &str = "daylightr";
