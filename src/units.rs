use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MetricsError, Result};

/// Named time units, each a fixed number of nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 8] = [
        TimeUnit::Nanoseconds,
        TimeUnit::Microseconds,
        TimeUnit::Milliseconds,
        TimeUnit::Seconds,
        TimeUnit::Minutes,
        TimeUnit::Hours,
        TimeUnit::Days,
        TimeUnit::Weeks,
    ];

    /// Length of one unit in nanoseconds.
    pub fn nanos(self) -> f64 {
        match self {
            Self::Nanoseconds => 1.0,
            Self::Microseconds => 1e3,
            Self::Milliseconds => 1e6,
            Self::Seconds => 1e9,
            Self::Minutes => 6e10,
            Self::Hours => 3.6e12,
            Self::Days => 8.64e13,
            Self::Weeks => 6.048e14,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nanoseconds => "nanoseconds",
            Self::Microseconds => "microseconds",
            Self::Milliseconds => "milliseconds",
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
        }
    }

    /// Converts a per-nanosecond rate into a per-unit rate.
    pub fn scale_rate(self, per_nanosecond: f64) -> f64 {
        per_nanosecond * self.nanos()
    }

    /// Converts a nanosecond duration into this unit.
    pub fn scale_duration(self, nanoseconds: f64) -> f64 {
        nanoseconds / self.nanos()
    }
}

impl FromStr for TimeUnit {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| MetricsError::UnknownTimeUnit(s.to_owned()))
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TimeUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TimeUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_named_unit() {
        for unit in TimeUnit::ALL {
            assert_eq!(unit.as_str().parse::<TimeUnit>().unwrap(), unit);
        }
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert_eq!(
            "fortnights".parse::<TimeUnit>(),
            Err(MetricsError::UnknownTimeUnit("fortnights".into()))
        );
        // names are exact, not case-folded
        assert!("Seconds".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn table_matches_nanosecond_lengths() {
        assert_eq!(TimeUnit::Microseconds.nanos(), 1_000.0);
        assert_eq!(TimeUnit::Minutes.nanos(), 60.0 * TimeUnit::Seconds.nanos());
        assert_eq!(TimeUnit::Weeks.nanos(), 7.0 * TimeUnit::Days.nanos());
    }

    #[test]
    fn scales_rates_and_durations() {
        // 2 events per microsecond == 2e6 per second
        assert_eq!(TimeUnit::Seconds.scale_rate(2e-3), 2e6);
        assert_eq!(TimeUnit::Milliseconds.scale_duration(2_500_000.0), 2.5);
    }

    #[test]
    fn serde_uses_names() {
        let json = serde_json::to_string(&TimeUnit::Hours).unwrap();
        assert_eq!(json, "\"hours\"");
        assert!(serde_json::from_str::<TimeUnit>("\"eons\"").is_err());
    }
}
