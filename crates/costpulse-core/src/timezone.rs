//! Calendar date of "now" for report periods
//!
//! Periods are computed from a local calendar date, not an instant, so the
//! zone decides which day is "today". Precedence: `--utc`, `--timezone`,
//! the `TZ` variable, then the system zone (UTC if it cannot be detected).

use crate::error::{CostpulseError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

/// Zone used to turn the current instant into a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneConfig {
    pub tz: Tz,
}

impl TimezoneConfig {
    /// Resolve the zone from the command-line flags
    pub fn from_cli(timezone: Option<&str>, use_utc: bool) -> Result<Self> {
        let tz = match (use_utc, timezone) {
            (true, _) => Tz::UTC,
            (false, Some(name)) => name.parse::<Tz>().map_err(|_| {
                CostpulseError::InvalidTimezone(format!(
                    "'{name}'. Use an IANA name such as 'Asia/Tokyo' or 'UTC'"
                ))
            })?,
            (false, None) => local_timezone(),
        };
        Ok(Self { tz })
    }

    pub fn name(&self) -> &str {
        self.tz.name()
    }

    /// Calendar date of `now` in this zone
    pub fn date_of(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

/// `TZ` if it names a valid zone, else the detected system zone, else UTC
pub fn local_timezone() -> Tz {
    if let Some(tz) = std::env::var("TZ").ok().and_then(|v| v.parse::<Tz>().ok()) {
        debug!("Using timezone from TZ: {}", tz.name());
        return tz;
    }

    match iana_time_zone::get_timezone() {
        Ok(name) => name.parse::<Tz>().unwrap_or_else(|_| {
            debug!("Unknown system timezone '{}', using UTC", name);
            Tz::UTC
        }),
        Err(e) => {
            debug!("System timezone not detected ({:?}), using UTC", e);
            Tz::UTC
        }
    }
}
