use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::{
    api::{extract::AppJson, handlers::path_locale, state::AppState},
    domain::{Availability, Booking, CheckoutRequest, CheckoutResponse, TripType},
    error::{AppError, Result},
    pricing::{self, Quote, RouteInfo},
    service::booking_service::WebhookAck,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub trip_type: String,
    pub from: String,
    pub to: String,
    pub passengers: i64,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub from: String,
    pub to: String,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    #[serde(default)]
    pub email: String,
}

pub async fn routes() -> Json<Vec<RouteInfo>> {
    Json(pricing::routes())
}

pub async fn quote(Query(params): Query<QuoteQuery>) -> Result<Json<Quote>> {
    let trip_type = TripType::from_str(&params.trip_type)
        .ok_or_else(|| AppError::field("tripType", "Trip type must be one-way or round-trip"))?;

    let quote = pricing::quote(trip_type, &params.from, &params.to, params.passengers)?;
    Ok(Json(quote))
}

pub async fn availability(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<Json<Availability>> {
    let availability = state.service_context.booking_service
        .availability(&params.from, &params.to, &params.date)
        .await?;

    Ok(Json(availability))
}

pub async fn checkout(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    AppJson(req): AppJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let locale = path_locale(&locale)?;

    let response = state.service_context.booking_service
        .create_checkout(req, locale, &state.settings.server.base_url)
        .await?;

    Ok(Json(response))
}

pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    let ack = state.service_context.booking_service
        .handle_webhook(&body, signature)
        .await?;

    Ok(Json(ack))
}

pub async fn localized_webhook(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    path_locale(&locale)?;
    webhook(State(state), headers, body).await
}

pub async fn booking_by_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Booking>> {
    let booking = state.service_context.booking_service
        .booking_by_session(&session_id)
        .await?;

    Ok(Json(booking))
}

pub async fn bookings_by_email(
    State(state): State<AppState>,
    Query(params): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>> {
    let bookings = state.service_context.booking_service
        .bookings_by_email(&params.email)
        .await?;

    Ok(Json(bookings))
}
