use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month};

use crate::ValidationError;

const ISO_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DAY_FIRST_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[day]-[month]-[year]");

/// Calendar date of a price observation, day resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate(Date);

impl TradeDate {
    /// Parse a `YYYY-MM-DD` date.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), ISO_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
                expected: "YYYY-MM-DD",
            })
    }

    /// Parse the first whitespace-delimited token of `input` as `YYYY-MM-DD`.
    ///
    /// Source cells such as `2020-01-02 00:00:00` carry a time part that is ignored.
    pub fn parse_leading(input: &str) -> Result<Self, ValidationError> {
        let token = input.split_whitespace().next().unwrap_or_default();
        Self::parse(token).map_err(|_| ValidationError::InvalidDate {
            value: input.to_owned(),
            expected: "YYYY-MM-DD",
        })
    }

    /// Parse a `DD-MM-YYYY` date.
    pub fn parse_day_first(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), DAY_FIRST_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
                expected: "DD-MM-YYYY",
            })
    }

    pub fn from_calendar(year: i32, month: u8, day: u8) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            value: format!("{year:04}-{month:02}-{day:02}"),
            expected: "YYYY-MM-DD",
        };
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|_| invalid())
    }

    pub fn into_inner(self) -> Date {
        self.0
    }

    pub fn format_iso(self) -> String {
        self.0
            .format(ISO_FORMAT)
            .unwrap_or_else(|_| String::from("<unformattable>"))
    }
}

impl Display for TradeDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for TradeDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for TradeDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
