//! Nanosecond-resolution timestamps.
//!
//! This module provides the [`Timestamp`] type used for entry access and
//! modification times. Timestamps count seconds and nanoseconds relative to
//! the Unix epoch and may lie before it.
//!
//! Whether a time is *present* at all is expressed with `Option<Timestamp>` on
//! [`Entry`](crate::Entry): an absent time is `None`, never the epoch.
//!
//! # Precision
//!
//! ISO9660 directory records and Rock Ridge `TF` entries store dates with
//! one-second resolution. Writing a timestamp into an image therefore
//! truncates its sub-second part; the in-memory value keeps full nanosecond
//! precision.
//!
//! # Example
//!
//! ```rust
//! use iso_archiver::Timestamp;
//!
//! let ts = Timestamp::new(1_700_000_000, 250_000_000);
//! assert_eq!(ts.as_unix_secs(), 1_700_000_000);
//! assert_eq!(ts.subsec_nanos(), 250_000_000);
//! assert_eq!(ts.to_string(), "2023-11-14T22:13:20.25Z");
//! ```

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NANOS_PER_SECOND: u32 = 1_000_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

/// A point in time with nanosecond resolution.
///
/// Ordering follows chronological order. `subsec_nanos` is always normalized
/// into `0..1_000_000_000`, so `-0.5s` is stored as `secs = -1, nanos = 5e8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    secs: i64,
    nanos: u32,
}

impl Timestamp {
    /// The Unix epoch, 1970-01-01T00:00:00Z.
    pub const UNIX_EPOCH: Timestamp = Timestamp { secs: 0, nanos: 0 };

    /// Creates a timestamp from Unix seconds and a nanosecond offset.
    ///
    /// Nanoseconds of one second or more carry into `secs`.
    pub const fn new(secs: i64, nanos: u32) -> Self {
        let carry = (nanos / NANOS_PER_SECOND) as i64;
        Self {
            secs: secs.saturating_add(carry),
            nanos: nanos % NANOS_PER_SECOND,
        }
    }

    /// Creates a timestamp from whole Unix seconds.
    #[inline]
    pub const fn from_unix_secs(secs: i64) -> Self {
        Self { secs, nanos: 0 }
    }

    /// Creates a timestamp from a `SystemTime`, including pre-epoch times.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                let secs = -(d.as_secs() as i64);
                match d.subsec_nanos() {
                    0 => Self::new(secs, 0),
                    n => Self::new(secs - 1, NANOS_PER_SECOND - n),
                }
            }
        }
    }

    /// Returns whole seconds relative to the Unix epoch (floor).
    #[inline]
    pub const fn as_unix_secs(&self) -> i64 {
        self.secs
    }

    /// Returns the sub-second part in nanoseconds (0..1_000_000_000).
    #[inline]
    pub const fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    /// Converts to a `SystemTime`.
    pub fn as_system_time(&self) -> SystemTime {
        if self.secs >= 0 {
            UNIX_EPOCH + Duration::new(self.secs as u64, self.nanos)
        } else {
            UNIX_EPOCH - Duration::from_secs(self.secs.unsigned_abs())
                + Duration::from_nanos(u64::from(self.nanos))
        }
    }

    /// Converts to a [`filetime::FileTime`] for applying to extracted files.
    pub fn as_file_time(&self) -> filetime::FileTime {
        filetime::FileTime::from_unix_time(self.secs, self.nanos)
    }

    /// Splits the timestamp into UTC calendar fields.
    pub fn to_civil(&self) -> CivilTime {
        let days = self.secs.div_euclid(SECONDS_PER_DAY);
        let rem = self.secs.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        CivilTime {
            year,
            month,
            day,
            hour: (rem / 3600) as u8,
            minute: (rem % 3600 / 60) as u8,
            second: (rem % 60) as u8,
            nanos: self.nanos,
        }
    }

    /// Builds a timestamp from UTC calendar fields.
    ///
    /// Out-of-range fields are not rejected; they roll over the way the
    /// arithmetic naturally carries them.
    pub fn from_civil(civil: &CivilTime) -> Self {
        let days = days_from_civil(civil.year, civil.month, civil.day);
        let secs = days * SECONDS_PER_DAY
            + i64::from(civil.hour) * 3600
            + i64::from(civil.minute) * 60
            + i64::from(civil.second);
        Self::new(secs, civil.nanos)
    }
}

impl Default for Timestamp {
    /// Returns the Unix epoch.
    fn default() -> Self {
        Self::UNIX_EPOCH
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl From<Timestamp> for SystemTime {
    fn from(ts: Timestamp) -> SystemTime {
        ts.as_system_time()
    }
}

impl fmt::Display for Timestamp {
    /// Formats as RFC 3339 in UTC, trimming trailing zero fractions.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.to_civil();
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            c.year, c.month, c.day, c.hour, c.minute, c.second
        )?;
        if c.nanos != 0 {
            let frac = format!("{:09}", c.nanos);
            write!(f, ".{}", frac.trim_end_matches('0'))?;
        }
        f.write_str("Z")
    }
}

/// Broken-down UTC calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilTime {
    /// Proleptic Gregorian year.
    pub year: i64,
    /// Month, 1-12.
    pub month: u8,
    /// Day of month, 1-31.
    pub day: u8,
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// Second, 0-59.
    pub second: u8,
    /// Nanoseconds within the second.
    pub nanos: u32,
}

// Howard Hinnant's days_from_civil / civil_from_days.
fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let m = i64::from(month);
    let y = if m <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400);
    let mp = (m + 9) % 12;
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
