//! ISO-8601 timestamps as reported by the shop API.
//!
//! Timestamps are kept as the text the API sent. Display code only ever
//! needs the calendar date prefix, so there is no reason to parse them.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of characters in an ISO-8601 calendar date (`YYYY-MM-DD`).
const CALENDAR_DATE_LEN: usize = 10;

/// An ISO-8601 timestamp such as `2023-05-17T10:00:00.000Z`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IsoTimestamp(String);

impl IsoTimestamp {
    /// Wrap a timestamp string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw timestamp text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The calendar-date part: the first 10 characters of the timestamp.
    ///
    /// Shorter inputs are returned whole.
    ///
    /// ```
    /// use kgp_shop_core::IsoTimestamp;
    ///
    /// let ts = IsoTimestamp::new("2023-05-17T10:00:00Z");
    /// assert_eq!(ts.calendar_date(), "2023-05-17");
    /// ```
    #[must_use]
    pub fn calendar_date(&self) -> &str {
        self.0
            .char_indices()
            .nth(CALENDAR_DATE_LEN)
            .map_or(self.0.as_str(), |(end, _)| &self.0[..end])
    }
}

impl fmt::Display for IsoTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IsoTimestamp {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for IsoTimestamp {
    fn from(value: String) -> Self {
        Self(value)
    }
}
