//! Core units, constants, epochs, and shared primitives for the Snoopy workspace.

/// Physical constants expressed in SI units.
pub mod constants {
    /// Metres per astronomical unit.
    pub const AU_M: f64 = 149_597_870_691.0;
    /// Heliocentric gravitational parameter (m³/s²).
    pub const MU_SUN_M3_S2: f64 = 1.327_124_400_18e20;
    /// Seconds per Julian day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    /// Days per Julian century.
    pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;
    /// Degrees to radians.
    pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;
    /// Julian date of 2000-01-01 00:00:00, the MJD2000 origin.
    pub const MJD2000_JD_OFFSET: f64 = 2_451_544.5;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::{AU_M, DEG2RAD};

    /// Convert kilometres to metres.
    #[inline]
    pub fn km_to_m(v: f64) -> f64 {
        v * 1_000.0
    }

    /// Convert kilometres per second to metres per second.
    #[inline]
    pub fn kms_to_ms(v: f64) -> f64 {
        v * 1_000.0
    }

    /// Convert astronomical units to metres.
    #[inline]
    pub fn au_to_m(v: f64) -> f64 {
        v * AU_M
    }

    #[inline]
    pub fn deg_to_rad(v: f64) -> f64 {
        v * DEG2RAD
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in metres or m/s depending on context.
    pub type Vector3 = [f64; 3];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Euclidean distance `|a - b|`, used for every delta-v magnitude.
    ///
    /// Written component-wise so that `distance(a, b)` and `distance(b, a)` square
    /// identical magnitudes and agree bit for bit.
    #[inline]
    pub fn distance(a: &Vector3, b: &Vector3) -> f64 {
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        let dz = a[2] - b[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Cross product `a × b`.
    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }
}

/// Epochs and day/second conversions shared across crates.
pub mod time {
    use std::fmt;

    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use super::constants::{MJD2000_JD_OFFSET, SECONDS_PER_DAY};

    const ACCEPTED_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    const MILLIS_PER_DAY: f64 = 86_400_000.0;

    #[derive(Debug, Error)]
    pub enum TimeError {
        #[error("invalid epoch string `{epoch}`")]
        InvalidEpoch { epoch: String },
        #[error("epoch {mjd2000} (MJD2000) cannot be represented as a calendar date")]
        Unrepresentable { mjd2000: f64 },
    }

    /// Convert days to seconds.
    #[inline]
    pub fn days_to_seconds(days: f64) -> f64 {
        days * SECONDS_PER_DAY
    }

    /// A point in time, stored as fractional days since 2000-01-01 00:00:00.
    ///
    /// No time scale is attached: ephemerides consume the value as-is, and time of
    /// flight is the plain Julian-day difference.
    #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Epoch {
        mjd2000: f64,
    }

    impl Epoch {
        pub const fn from_mjd2000(days: f64) -> Self {
            Self { mjd2000: days }
        }

        pub fn from_julian_date(jd: f64) -> Self {
            Self {
                mjd2000: jd - MJD2000_JD_OFFSET,
            }
        }

        pub fn from_calendar(datetime: &NaiveDateTime) -> Self {
            let delta = *datetime - mjd2000_origin();
            let millis = delta.num_milliseconds() as f64;
            Self {
                mjd2000: millis / MILLIS_PER_DAY,
            }
        }

        /// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS[.fff]` or the ISO `T`-separated form.
        pub fn parse(text: &str) -> Result<Self, TimeError> {
            let trimmed = text.trim();
            for format in ACCEPTED_FORMATS {
                if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
                    return Ok(Self::from_calendar(&datetime));
                }
            }
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                return Ok(Self::from_calendar(&date.and_time(chrono::NaiveTime::MIN)));
            }
            Err(TimeError::InvalidEpoch {
                epoch: text.to_string(),
            })
        }

        #[inline]
        pub fn mjd2000(&self) -> f64 {
            self.mjd2000
        }

        #[inline]
        pub fn julian_date(&self) -> f64 {
            self.mjd2000 + MJD2000_JD_OFFSET
        }

        #[inline]
        pub fn add_days(&self, days: f64) -> Self {
            Self {
                mjd2000: self.mjd2000 + days,
            }
        }

        /// Seconds elapsed from `earlier` to `self`, via the Julian-day difference.
        #[inline]
        pub fn seconds_since(&self, earlier: &Epoch) -> f64 {
            days_to_seconds(self.julian_date() - earlier.julian_date())
        }

        pub fn to_calendar(&self) -> Result<NaiveDateTime, TimeError> {
            let millis = (self.mjd2000 * MILLIS_PER_DAY).round();
            if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
                return Err(TimeError::Unrepresentable {
                    mjd2000: self.mjd2000,
                });
            }
            let delta = TimeDelta::try_milliseconds(millis as i64).ok_or(
                TimeError::Unrepresentable {
                    mjd2000: self.mjd2000,
                },
            )?;
            mjd2000_origin()
                .checked_add_signed(delta)
                .ok_or(TimeError::Unrepresentable {
                    mjd2000: self.mjd2000,
                })
        }

        /// ISO-8601 rendering with millisecond precision.
        pub fn to_iso_string(&self) -> String {
            match self.to_calendar() {
                Ok(datetime) => datetime.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
                Err(_) => format!("MJD2000 {}", self.mjd2000),
            }
        }
    }

    impl fmt::Display for Epoch {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.to_calendar() {
                Ok(datetime) => write!(f, "{}", datetime.format("%Y-%b-%d %H:%M:%S")),
                Err(_) => write!(f, "MJD2000 {}", self.mjd2000),
            }
        }
    }

    fn mjd2000_origin() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2000, 1, 1)
            .map(|date| date.and_time(chrono::NaiveTime::MIN))
            .unwrap_or_default()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_calendar_forms() {
            let a = Epoch::parse("2041-03-01").unwrap();
            let b = Epoch::parse("2041-03-01 00:00:00").unwrap();
            let c = Epoch::parse("2041-03-01T00:00:00.000").unwrap();
            assert_eq!(a, b);
            assert_eq!(b, c);
            assert_eq!(Epoch::parse("2000-01-01").unwrap().mjd2000(), 0.0);
            assert_eq!(Epoch::parse("2000-01-02 12:00:00").unwrap().mjd2000(), 1.5);
        }

        #[test]
        fn rejects_garbage() {
            assert!(matches!(
                Epoch::parse("March first"),
                Err(TimeError::InvalidEpoch { .. })
            ));
        }

        #[test]
        fn formats_like_porkchop_tables() {
            let epoch = Epoch::parse("2041-03-28").unwrap();
            assert_eq!(epoch.to_string(), "2041-Mar-28 00:00:00");
            assert_eq!(epoch.to_iso_string(), "2041-03-28T00:00:00.000");
        }

        #[test]
        fn julian_date_round_trips_whole_days() {
            let epoch = Epoch::from_julian_date(2_458_137.5);
            assert_eq!(epoch.mjd2000(), 6_593.0);
            assert_eq!(epoch.julian_date(), 2_458_137.5);
        }
    }
}
