//! Shuttle route catalog and fare table.
//!
//! Fares are per seat. Parties of [`GROUP_MIN_PASSENGERS`] or more ride at the
//! group fare. Only the 45 USD one-way fare and the 5:30 AM pickup are
//! published on the booking form; the rest of the table is operator-set.

use serde::Serialize;

use crate::{
    domain::TripType,
    error::{AppError, Result},
};

pub const CONVOY_HMART: &str = "Convoy (H Mart)";
pub const LAX: &str = "LAX";

pub const MIN_PASSENGERS: i64 = 1;
pub const MAX_PASSENGERS: i64 = 10;
pub const GROUP_MIN_PASSENGERS: i64 = 5;

const SAN_DIEGO_PICKUPS: &[&str] = &["5:30 AM", "9:30 AM", "1:30 PM"];
const LAX_PICKUPS: &[&str] = &["11:00 AM", "3:00 PM", "7:00 PM"];

#[derive(Debug, Clone, Copy)]
pub struct Fare {
    pub one_way_cents: i64,
    pub round_trip_cents: i64,
}

impl Fare {
    fn for_trip(&self, trip_type: TripType) -> i64 {
        match trip_type {
            TripType::OneWay => self.one_way_cents,
            TripType::RoundTrip => self.round_trip_cents,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub from: &'static str,
    pub to: &'static str,
    pub departure_times: &'static [&'static str],
    pub return_times: &'static [&'static str],
    pub fare: Fare,
    pub group_fare: Fare,
}

const STANDARD_FARE: Fare = Fare { one_way_cents: 4500, round_trip_cents: 8500 };
const GROUP_FARE: Fare = Fare { one_way_cents: 4000, round_trip_cents: 7500 };

static ROUTES: &[Route] = &[
    Route {
        from: CONVOY_HMART,
        to: LAX,
        departure_times: SAN_DIEGO_PICKUPS,
        return_times: LAX_PICKUPS,
        fare: STANDARD_FARE,
        group_fare: GROUP_FARE,
    },
    Route {
        from: LAX,
        to: CONVOY_HMART,
        departure_times: LAX_PICKUPS,
        return_times: SAN_DIEGO_PICKUPS,
        fare: STANDARD_FARE,
        group_fare: GROUP_FARE,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub unit_price_cents: i64,
    pub passengers: i64,
    pub total_cents: i64,
}

/// Route as published to the booking form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub from: &'static str,
    pub to: &'static str,
    pub departure_times: &'static [&'static str],
    pub return_times: &'static [&'static str],
    pub one_way_cents: i64,
    pub round_trip_cents: i64,
    pub group_one_way_cents: i64,
    pub group_round_trip_cents: i64,
    pub group_min_passengers: i64,
    pub max_passengers: i64,
}

pub fn routes() -> Vec<RouteInfo> {
    ROUTES
        .iter()
        .map(|r| RouteInfo {
            from: r.from,
            to: r.to,
            departure_times: r.departure_times,
            return_times: r.return_times,
            one_way_cents: r.fare.one_way_cents,
            round_trip_cents: r.fare.round_trip_cents,
            group_one_way_cents: r.group_fare.one_way_cents,
            group_round_trip_cents: r.group_fare.round_trip_cents,
            group_min_passengers: GROUP_MIN_PASSENGERS,
            max_passengers: MAX_PASSENGERS,
        })
        .collect()
}

pub fn find_route(from: &str, to: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|r| r.from == from && r.to == to)
}

pub fn quote(trip_type: TripType, from: &str, to: &str, passengers: i64) -> Result<Quote> {
    let route = find_route(from, to)
        .ok_or_else(|| AppError::field("to", format!("No shuttle runs from {} to {}", from, to)))?;

    if !(MIN_PASSENGERS..=MAX_PASSENGERS).contains(&passengers) {
        return Err(AppError::field(
            "passengers",
            format!("Passengers must be between {} and {}", MIN_PASSENGERS, MAX_PASSENGERS),
        ));
    }

    let fare = if passengers >= GROUP_MIN_PASSENGERS {
        route.group_fare
    } else {
        route.fare
    };
    let unit_price_cents = fare.for_trip(trip_type);

    Ok(Quote {
        unit_price_cents,
        passengers,
        total_cents: unit_price_cents * passengers,
    })
}

/// Checks pickup times against the route's schedule.
pub fn validate_times(
    route: &Route,
    trip_type: TripType,
    departure_time: &str,
    return_time: Option<&str>,
) -> Result<()> {
    if !route.departure_times.contains(&departure_time) {
        return Err(AppError::field(
            "departureTime",
            format!("Departure pick up time must be one of: {}", route.departure_times.join(", ")),
        ));
    }

    if trip_type == TripType::RoundTrip {
        match return_time {
            Some(t) if route.return_times.contains(&t) => {}
            Some(_) => {
                return Err(AppError::field(
                    "returnTime",
                    format!("Return pick up time must be one of: {}", route.return_times.join(", ")),
                ))
            }
            None => return Err(AppError::field("returnTime", "Return pick up time is required")),
        }
    }

    Ok(())
}

/// Parses a client-side price ("45", "45.00" or 45) into cents.
pub fn price_to_cents(value: &serde_json::Value) -> Option<i64> {
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some((amount * 100.0).round() as i64)
}
