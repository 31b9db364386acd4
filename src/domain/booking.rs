use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub stripe_id: Option<String>,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub trip_type: TripType,
    pub from: String,
    pub to: String,
    pub departing_date: NaiveDate,
    pub returning_date: Option<NaiveDate>,
    pub departure_time: String,
    pub return_time: Option<String>,
    pub passengers: i64,
    pub address: Option<String>,
    pub price_cents: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TripType {
    #[serde(rename = "one-way")]
    OneWay,
    #[serde(rename = "round-trip")]
    RoundTrip,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "one-way",
            TripType::RoundTrip => "round-trip",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "one-way" => Some(TripType::OneWay),
            "round-trip" => Some(TripType::RoundTrip),
            _ => None,
        }
    }

    /// Product label shown on the checkout page.
    pub fn label(&self) -> &'static str {
        match self {
            TripType::OneWay => "One Way",
            TripType::RoundTrip => "Round Trip",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "PAID" => Some(PaymentStatus::Paid),
            "FAILED" => Some(PaymentStatus::Failed),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// Trip details shared by checkout holds and webhook-created bookings.
#[derive(Debug, Clone)]
pub struct TripDetails {
    pub trip_type: TripType,
    pub from: String,
    pub to: String,
    pub departing_date: NaiveDate,
    pub returning_date: Option<NaiveDate>,
    pub departure_time: String,
    pub return_time: Option<String>,
    pub passengers: i64,
    pub address: Option<String>,
}

/// Seat reservation placed while a checkout session is open.
#[derive(Debug, Clone)]
pub struct NewHold {
    pub id: Uuid,
    pub trip: TripDetails,
    pub price_cents: i64,
}

/// Payment facts reported by a completed checkout session.
#[derive(Debug, Clone)]
pub struct CompletedCheckout {
    pub session_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub amount_total_cents: i64,
    pub paid: bool,
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
}

/// Body of `POST /:locale/api/checkout`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub trip_type: String,
    #[validate(length(min = 1, message = "Pick up location is required"))]
    pub from: String,
    #[validate(length(min = 1, message = "Drop off location is required"))]
    pub to: String,
    #[validate(length(min = 1, message = "Departing date is required"))]
    pub departing_date: String,
    pub returning_date: Option<String>,
    #[validate(length(min = 1, message = "Departure time is required"))]
    pub departure_time: String,
    pub return_time: Option<String>,
    #[validate(range(min = 1, max = 10, message = "Passengers must be between 1 and 10"))]
    pub passengers: i64,
    #[validate(length(max = 500, message = "Address is too long"))]
    pub address: Option<String>,
    /// Per-seat price the client displayed; the server recomputes it.
    pub price: Option<serde_json::Value>,
    pub return_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub count: i64,
    pub held: i64,
    pub remaining_spots: i64,
    pub max_spots: i64,
}

/// Parse a calendar date sent as `YYYY-MM-DD` or as an RFC 3339 timestamp.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_type_strings() {
        assert_eq!(TripType::from_str("one-way"), Some(TripType::OneWay));
        assert_eq!(TripType::from_str("round-trip"), Some(TripType::RoundTrip));
        assert_eq!(TripType::from_str("ONE_WAY"), None);
        assert_eq!(TripType::RoundTrip.label(), "Round Trip");
    }

    #[test]
    fn test_status_round_trip_through_strings() {
        for status in [BookingStatus::Pending, BookingStatus::Confirmed, BookingStatus::Cancelled] {
            assert_eq!(BookingStatus::from_str(status.as_str()), Some(status));
        }
        for status in [PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Failed, PaymentStatus::Refunded] {
            assert_eq!(PaymentStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_parse_calendar_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(parse_calendar_date("2025-03-14"), Some(expected));
        assert_eq!(parse_calendar_date("2025-03-14T08:00:00.000Z"), Some(expected));
        assert_eq!(parse_calendar_date("March 14"), None);
    }
}
