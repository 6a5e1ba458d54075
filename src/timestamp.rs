use crate::prelude::*;

use core::fmt::Display;
use core::num::ParseIntError;
use core::ops::Add;
use core::str::FromStr;
use core::time::Duration;

use chrono::{offset::Utc, DateTime, TimeZone};
use flex_error::{define_error, TraceError};
use serde_derive::{Deserialize, Serialize};

/// A newtype wrapper over `Option<DateTime<Utc>>` to keep track of host
/// block times and upgrade timeouts.
///
/// The protocol represents a timestamp as a `u64` Unix timestamp in
/// nanoseconds, with 0 representing the absence of a timestamp. We keep
/// the absence explicit with an `Option`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Debug, Default, Deserialize, Serialize, Hash)]
pub struct Timestamp {
    time: Option<DateTime<Utc>>,
}

impl Timestamp {
    /// A protocol value of 0 indicates that the timestamp is not set. In this case,
    /// our domain type takes the value of None.
    pub fn from_nanoseconds(nanoseconds: u64) -> Result<Timestamp, ParseTimestampError> {
        if nanoseconds == 0 {
            Ok(Timestamp { time: None })
        } else {
            // `chrono` only converts from `i64` nanoseconds, which can overflow for
            // large `u64` values, so we go through seconds + nanos instead.
            let (s, ns) = util::break_in_secs_and_nanos(nanoseconds);

            match Utc.timestamp_opt(s, ns) {
                chrono::LocalResult::None => {
                    Err(ParseTimestampError::invalid_timestamp_conversion(s, ns))
                }
                chrono::LocalResult::Single(ts) => Ok(Timestamp { time: Some(ts) }),
                chrono::LocalResult::Ambiguous(_, _) => {
                    Err(ParseTimestampError::ambiguous_timestamp_conversion(s, ns))
                }
            }
        }
    }

    /// Returns a `Timestamp` representation of a timestamp not being set.
    pub fn none() -> Self {
        Timestamp { time: None }
    }

    pub fn is_set(&self) -> bool {
        self.time.is_some()
    }

    /// Convert a `Timestamp` from [`chrono::DateTime<Utc>`].
    pub fn from_datetime(time: DateTime<Utc>) -> Timestamp {
        Timestamp { time: Some(time) }
    }

    /// Convert a `Timestamp` to `u64` value in nanoseconds. If no timestamp
    /// is set, the result is 0.
    pub fn as_nanoseconds(&self) -> u64 {
        self.time.map_or(0, |time| {
            // Timestamps are only built from `u64` nanoseconds, so they never precede the epoch.
            let s = u64::try_from(time.timestamp()).unwrap_or_default();

            util::assemble_in_nanos(s, time.timestamp_subsec_nanos())
        })
    }

    /// Convert a `Timestamp` to an optional [`chrono::DateTime<Utc>`]
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    /// Checks whether the current timestamp is at or past the `other`
    /// timestamp. Returns false if either of them is not set.
    pub fn reached(&self, other: &Timestamp) -> bool {
        match (self.time, other.time) {
            (Some(time1), Some(time2)) => time1 >= time2,
            _ => false,
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Timestamp({})",
            self.time
                .map_or("NoTimestamp".to_string(), |time| time.to_rfc3339())
        )
    }
}

define_error! {
    #[derive(Debug, PartialEq, Eq)]
    TimestampOverflowError {
        TimestampOverflow
            |_| { "Timestamp overflow when modifying with duration" }
    }
}

impl Add<Duration> for Timestamp {
    type Output = Result<Timestamp, TimestampOverflowError>;

    fn add(self, duration: Duration) -> Result<Timestamp, TimestampOverflowError> {
        match self.as_datetime() {
            Some(datetime) => {
                let duration2 = chrono::Duration::from_std(duration)
                    .map_err(|_| TimestampOverflowError::timestamp_overflow())?;
                datetime
                    .checked_add_signed(duration2)
                    .map(Self::from_datetime)
                    .ok_or_else(TimestampOverflowError::timestamp_overflow)
            }
            None => Ok(self),
        }
    }
}

define_error! {
    #[derive(Debug, PartialEq, Eq)]
    ParseTimestampError {
        ParseInt
            [ TraceError<ParseIntError> ]
            | _ | { "error parsing u64 integer from string"},

        InvalidTimestampConversion
            {
                secs: i64,
                nanos: u32,
            }
            | _ | { "error converting into Timestamp from seconds + nanoseconds" },

        AmbiguousTimestampConversion
            {
                secs: i64,
                nanos: u32,
            }
            | _ | { "ambigous conversion into Timestamp from seconds + nanoseconds" },
    }
}

impl FromStr for Timestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let nanoseconds = u64::from_str(s).map_err(ParseTimestampError::parse_int)?;

        Timestamp::from_nanoseconds(nanoseconds)
    }
}

pub mod util {

    const NANOS_PER_SEC: u64 = 1_000_000_000;

    /// Helper for the [`Timestamp::from_nanoseconds`] constructor.
    ///
    /// Converts `u64` nanoseconds into its constituent
    /// seconds (represented as `i64`) plus the remaining
    /// nanoseconds (represented as `u32`).
    ///
    /// [`Timestamp::from_nanoseconds`]: super::Timestamp::from_nanoseconds
    pub(super) fn break_in_secs_and_nanos(nanoseconds: u64) -> (i64, u32) {
        let seconds = nanoseconds / NANOS_PER_SEC;

        // u64::MAX divided by NANOS_PER_SEC fits into i64
        let out_secs = seconds as i64;
        let out_nanos = (nanoseconds % NANOS_PER_SEC) as u32;

        (out_secs, out_nanos)
    }

    pub(super) fn assemble_in_nanos(s: u64, subsec_ns: u32) -> u64 {
        let ns = s * NANOS_PER_SEC;

        ns + subsec_ns as u64
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use test_log::test;

    use super::Timestamp;

    #[test]
    fn test_timestamp_comparisons() {
        let nil_timestamp = Timestamp::from_nanoseconds(0).unwrap();
        assert_eq!(nil_timestamp.time, None);
        assert_eq!(nil_timestamp.as_nanoseconds(), 0);

        let timestamp1 = Timestamp::from_nanoseconds(1).unwrap();
        assert_eq!(timestamp1.as_nanoseconds(), 1);

        let timestamp2 = Timestamp::from_nanoseconds(1_000_000_000).unwrap();
        assert_eq!(timestamp2.time.unwrap().timestamp(), 1);
        assert_eq!(timestamp2.as_nanoseconds(), 1_000_000_000);

        assert!(Timestamp::from_nanoseconds(u64::MAX).is_ok());

        assert!(timestamp2.reached(&timestamp1));
        assert!(timestamp2.reached(&timestamp2));
        assert!(!timestamp1.reached(&timestamp2));
        assert!(!timestamp1.reached(&nil_timestamp));
        assert!(!nil_timestamp.reached(&timestamp1));
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let time0 = Timestamp::none();
        let time1 = Timestamp::from_nanoseconds(100).unwrap();
        let time2 = Timestamp::from_nanoseconds(150).unwrap();
        let duration = Duration::from_nanos(50);

        assert_eq!(time2, (time1 + duration).unwrap());
        assert_eq!(time0, (time0 + duration).unwrap());
    }

    #[test]
    fn timestamp_parses_from_nanoseconds_string() {
        let parsed: Timestamp = "1700000000000000000".parse().unwrap();
        assert_eq!(parsed.as_nanoseconds(), 1_700_000_000_000_000_000);
        assert!("not-a-number".parse::<Timestamp>().is_err());
    }
}
