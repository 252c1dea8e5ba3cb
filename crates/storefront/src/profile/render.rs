//! Render model for the profile screen.
//!
//! Plain data the template turns into HTML. Nothing here knows about HTTP.

use kgp_shop_core::Milestone;

use crate::api::OrderSummary;

/// Everything the profile screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRender {
    /// Local validation message (password mismatch).
    pub message: Option<String>,
    /// The last profile update succeeded.
    pub update_succeeded: bool,
    /// The last profile update failed with this message.
    pub update_error: Option<String>,
    /// A profile update is in flight.
    pub update_in_flight: bool,
    pub profile: ProfileArea,
    pub orders: OrdersArea,
}

impl ProfileRender {
    /// Whether anything on screen is still waiting for data.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.update_in_flight
            || matches!(self.profile, ProfileArea::Loading)
            || matches!(self.orders, OrdersArea::Loading)
    }
}

/// The left-hand profile column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileArea {
    Loading,
    Failed(String),
    Ready(ProfileFields),
}

impl ProfileArea {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Loading | Self::Ready(_) => None,
        }
    }

    #[must_use]
    pub const fn fields(&self) -> Option<&ProfileFields> {
        match self {
            Self::Ready(fields) => Some(fields),
            Self::Loading | Self::Failed(_) => None,
        }
    }
}

/// Values the form inputs are bound to.
///
/// Password inputs are never echoed back into the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub name: String,
    pub email: String,
}

/// The order history column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrdersArea {
    Loading,
    Failed(String),
    Table(Vec<OrderRow>),
}

impl OrdersArea {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Loading | Self::Table(_) => None,
        }
    }

    #[must_use]
    pub fn rows(&self) -> Option<&[OrderRow]> {
        match self {
            Self::Table(rows) => Some(rows),
            Self::Loading | Self::Failed(_) => None,
        }
    }
}

/// One line of the order history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub id: String,
    pub date: String,
    pub total: String,
    pub paid: StatusCell,
    pub delivered: StatusCell,
    pub detail_href: String,
}

impl From<&OrderSummary> for OrderRow {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: order.id.to_string(),
            date: order.created_at.calendar_date().to_owned(),
            total: order.total_price.to_string(),
            paid: StatusCell::from(&order.paid),
            delivered: StatusCell::from(&order.delivered),
            detail_href: format!("/order/{}", order.id),
        }
    }
}

/// Paid / delivered column contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCell {
    /// Reached; the calendar date when the API recorded one.
    Reached(Option<String>),
    /// Not reached yet (rendered as the negative marker).
    NotYet,
}

impl StatusCell {
    #[must_use]
    pub const fn is_reached(&self) -> bool {
        matches!(self, Self::Reached(_))
    }

    #[must_use]
    pub fn date(&self) -> Option<&str> {
        match self {
            Self::Reached(date) => date.as_deref(),
            Self::NotYet => None,
        }
    }
}

impl From<&Milestone> for StatusCell {
    fn from(milestone: &Milestone) -> Self {
        match milestone {
            Milestone::Pending => Self::NotYet,
            Milestone::Reached(_) => Self::Reached(milestone.calendar_date().map(ToOwned::to_owned)),
        }
    }
}

#[cfg(test)]
mod tests {
    use kgp_shop_core::{IsoTimestamp, OrderId, Price};

    use super::*;

    fn order(is_paid: bool, is_delivered: bool) -> OrderSummary {
        OrderSummary {
            id: OrderId::new("6470a1b2"),
            created_at: IsoTimestamp::new("2023-05-17T10:00:00Z"),
            total_price: Price::from_cents(12_050),
            paid: Milestone::from_flag(is_paid, Some(IsoTimestamp::new("2023-05-18T11:00:00Z"))),
            delivered: Milestone::from_flag(
                is_delivered,
                Some(IsoTimestamp::new("2023-05-20T16:45:00Z")),
            ),
        }
    }

    #[test]
    fn test_row_truncates_created_at_to_date() {
        let row = OrderRow::from(&order(false, false));
        assert_eq!(row.date, "2023-05-17");
        assert_eq!(row.id, "6470a1b2");
        assert_eq!(row.total, "120.5");
        assert_eq!(row.detail_href, "/order/6470a1b2");
    }

    #[test]
    fn test_unpaid_order_shows_negative_marker() {
        let row = OrderRow::from(&order(false, false));
        assert_eq!(row.paid, StatusCell::NotYet);
        assert_eq!(row.paid.date(), None);
        assert_eq!(row.delivered, StatusCell::NotYet);
    }

    #[test]
    fn test_paid_and_delivered_show_dates() {
        let row = OrderRow::from(&order(true, true));
        assert_eq!(row.paid.date(), Some("2023-05-18"));
        assert_eq!(row.delivered.date(), Some("2023-05-20"));
    }

    #[test]
    fn test_reached_without_timestamp_has_no_date() {
        let cell = StatusCell::from(&Milestone::Reached(None));
        assert!(cell.is_reached());
        assert_eq!(cell.date(), None);
    }
}
