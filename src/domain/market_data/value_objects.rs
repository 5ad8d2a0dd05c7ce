use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};

use crate::domain::errors::{DataFeedError, FeedResult};

/// Value Object - epoch seconds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Display, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Truncates to whole seconds
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.div_euclid(1000))
    }

    pub const fn secs(&self) -> i64 {
        self.0
    }

    pub const fn as_millis(&self) -> i64 {
        self.0.saturating_mul(1000)
    }

    pub const fn saturating_sub_millis(&self, millis: u64) -> Self {
        Self::from_millis(self.as_millis().saturating_sub(millis as i64))
    }
}

/// Value Object - chart bucket size, serialized with the widget's resolution strings
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumIter,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum Resolution {
    #[strum(serialize = "1")]
    #[serde(rename = "1")]
    OneMinute,

    #[strum(serialize = "3")]
    #[serde(rename = "3")]
    ThreeMinutes,

    #[strum(serialize = "5")]
    #[serde(rename = "5")]
    FiveMinutes,

    #[strum(serialize = "15")]
    #[serde(rename = "15")]
    FifteenMinutes,

    #[strum(serialize = "30")]
    #[serde(rename = "30")]
    ThirtyMinutes,

    #[strum(serialize = "60")]
    #[serde(rename = "60")]
    OneHour,

    #[strum(serialize = "120")]
    #[serde(rename = "120")]
    TwoHours,

    #[strum(serialize = "240")]
    #[serde(rename = "240")]
    FourHours,

    #[strum(to_string = "1D", serialize = "D")]
    #[serde(rename = "1D", alias = "D")]
    OneDay,

    #[strum(to_string = "1W", serialize = "W")]
    #[serde(rename = "1W", alias = "W")]
    OneWeek,

    #[strum(to_string = "1M", serialize = "M")]
    #[serde(rename = "1M", alias = "M")]
    OneMonth,
}

impl Resolution {
    pub fn parse(value: &str) -> FeedResult<Self> {
        value
            .trim()
            .parse::<Resolution>()
            .map_err(|_| DataFeedError::UnsupportedResolution(value.to_string()))
    }

    pub fn duration_ms(&self) -> u64 {
        const MINUTE: u64 = 60 * 1000;
        match self {
            Self::OneMinute => MINUTE,
            Self::ThreeMinutes => 3 * MINUTE,
            Self::FiveMinutes => 5 * MINUTE,
            Self::FifteenMinutes => 15 * MINUTE,
            Self::ThirtyMinutes => 30 * MINUTE,
            Self::OneHour => 60 * MINUTE,
            Self::TwoHours => 120 * MINUTE,
            Self::FourHours => 240 * MINUTE,
            Self::OneDay => 24 * 60 * MINUTE,
            Self::OneWeek => 7 * 24 * 60 * MINUTE,
            Self::OneMonth => 30 * 24 * 60 * MINUTE, // approximate
        }
    }

    /// Widget strings in ascending bucket size
    pub fn supported() -> Vec<String> {
        Self::iter().map(|r| r.as_ref().to_string()).collect()
    }
}

/// Half-open time window `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarRange {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl BarRange {
    pub fn new(from: Timestamp, to: Timestamp) -> Self {
        Self { from, to }
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    pub fn contains(&self, time: Timestamp) -> bool {
        time >= self.from && time < self.to
    }
}
