//! Order progress states.

use serde::{Deserialize, Serialize};

use super::IsoTimestamp;

/// A point in an order's lifecycle (payment, delivery).
///
/// The shop API reports these as a flag plus an optional timestamp
/// (`isPaid` / `paidAt`). A milestone only counts as reached when the flag is
/// set; the timestamp alone is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "at")]
pub enum Milestone {
    /// Not reached yet.
    #[default]
    Pending,
    /// Reached at the given time. The time may be missing on old records.
    Reached(Option<IsoTimestamp>),
}

impl Milestone {
    /// Build a milestone from the API's flag + timestamp pair.
    #[must_use]
    pub fn from_flag(reached: bool, at: Option<IsoTimestamp>) -> Self {
        if reached {
            Self::Reached(at)
        } else {
            Self::Pending
        }
    }

    /// Whether the milestone has been reached.
    #[must_use]
    pub const fn is_reached(&self) -> bool {
        matches!(self, Self::Reached(_))
    }

    /// The calendar date the milestone was reached, if known.
    #[must_use]
    pub fn calendar_date(&self) -> Option<&str> {
        match self {
            Self::Reached(Some(at)) => Some(at.calendar_date()),
            Self::Reached(None) | Self::Pending => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flag_ignores_timestamp_when_not_reached() {
        let m = Milestone::from_flag(false, Some(IsoTimestamp::new("2023-05-17T10:00:00Z")));
        assert_eq!(m, Milestone::Pending);
        assert!(!m.is_reached());
        assert_eq!(m.calendar_date(), None);
    }

    #[test]
    fn test_reached_milestone_reports_date() {
        let m = Milestone::from_flag(true, Some(IsoTimestamp::new("2023-05-18T09:30:00Z")));
        assert!(m.is_reached());
        assert_eq!(m.calendar_date(), Some("2023-05-18"));
    }

    #[test]
    fn test_reached_without_timestamp() {
        let m = Milestone::from_flag(true, None);
        assert!(m.is_reached());
        assert_eq!(m.calendar_date(), None);
    }
}
