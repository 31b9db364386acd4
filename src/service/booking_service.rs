use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{BookingConfig, MAX_HOLD_MINUTES, MIN_HOLD_MINUTES},
    domain::{
        parse_calendar_date, Availability, Booking, BookingStatus, CheckoutRequest,
        CheckoutResponse, CompletedCheckout, Locale, NewHold, PaymentStatus, TripDetails, TripType,
    },
    error::{AppError, Result},
    payments::{
        webhook::{self, CompletedSession, PaymentEvent},
        CheckoutSessionRequest, PaymentGateway,
    },
    pricing,
    repository::{BookingFilter, BookingRepository},
};

/// Completion events can arrive this long after a session expires.
const WEBHOOK_GRACE_MINUTES: i64 = 15;

const DEFAULT_RETURN_PATH: &str = "/shuttle-service";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<Uuid>,
}

impl WebhookAck {
    fn ok() -> Self {
        Self { success: true, booking_id: None }
    }
}

pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    webhook_secret: Option<String>,
    config: BookingConfig,
}

impl BookingService {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        webhook_secret: Option<String>,
        config: BookingConfig,
    ) -> Self {
        Self {
            repo,
            gateway,
            webhook_secret,
            config,
        }
    }

    fn hold_cutoff(&self) -> DateTime<Utc> {
        Utc::now() - Duration::minutes(self.config.hold_minutes)
    }

    pub async fn availability(&self, from: &str, to: &str, date: &str) -> Result<Availability> {
        if pricing::find_route(from, to).is_none() {
            return Err(AppError::field("to", format!("No shuttle runs from {} to {}", from, to)));
        }
        let date = parse_calendar_date(date)
            .ok_or_else(|| AppError::field("date", "Date must be YYYY-MM-DD"))?;

        let counts = self
            .repo
            .count_for_route_day(from, to, date, self.hold_cutoff())
            .await?;
        let max_spots = self.config.max_bookings_per_route_day;

        Ok(Availability {
            count: counts.paid,
            held: counts.held,
            remaining_spots: (max_spots - counts.paid - counts.held).max(0),
            max_spots,
        })
    }

    pub async fn create_checkout(
        &self,
        request: CheckoutRequest,
        locale: Locale,
        origin: &str,
    ) -> Result<CheckoutResponse> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("Online payments are not available".to_string()))?;

        request.validate()?;
        let trip = Self::trip_from_request(&request)?;
        let quote = pricing::quote(trip.trip_type, &trip.from, &trip.to, trip.passengers)?;

        if let Some(client_price) = request.price.as_ref().and_then(pricing::price_to_cents) {
            if client_price != quote.unit_price_cents {
                tracing::warn!(
                    "Ignoring client price {} for {} -> {}; charging {}",
                    client_price, trip.from, trip.to, quote.unit_price_cents
                );
            }
        }

        let return_path = Self::return_path(request.return_url.as_deref())?;

        let hold = NewHold {
            id: Uuid::new_v4(),
            trip: trip.clone(),
            price_cents: quote.total_cents,
        };
        let booking = self
            .repo
            .place_hold(hold, self.config.max_bookings_per_route_day, self.hold_cutoff())
            .await?
            .ok_or_else(|| {
                tracing::info!(
                    "Route {} -> {} is full on {}",
                    trip.from, trip.to, trip.departing_date
                );
                AppError::Conflict("Sorry, this shuttle is fully booked for the selected date".to_string())
            })?;

        let origin = origin.trim_end_matches('/');
        let session_minutes = self
            .config
            .hold_minutes
            .clamp(MIN_HOLD_MINUTES, MAX_HOLD_MINUTES);
        let session_expires_at = Utc::now() + Duration::minutes(session_minutes);

        let session_request = CheckoutSessionRequest {
            product_name: format!("{} - {} to {}", trip.trip_type.label(), trip.from, trip.to),
            description: Self::trip_description(&trip),
            unit_amount_cents: quote.unit_price_cents,
            quantity: trip.passengers as u64,
            success_url: format!(
                "{}/{}/shuttle-service?payment=success&session_id={{CHECKOUT_SESSION_ID}}",
                origin,
                locale.as_str()
            ),
            cancel_url: format!("{}/{}{}", origin, locale.as_str(), return_path),
            client_reference_id: booking.id.to_string(),
            metadata: Self::trip_metadata(booking.id, &trip),
            expires_at: session_expires_at,
        };

        let session = match gateway.create_checkout_session(session_request).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Checkout session creation failed for booking {}: {}", booking.id, e);
                self.repo.cancel_hold(booking.id).await?;
                return Err(e);
            }
        };

        // The seat stays held for as long as the session can still be paid.
        let hold_until = session_expires_at + Duration::minutes(WEBHOOK_GRACE_MINUTES);
        self.repo.attach_session(booking.id, &session.id, hold_until).await?;

        tracing::info!(
            "Checkout session {} opened for booking {} ({} x{})",
            session.id, booking.id, trip.trip_type.as_str(), trip.passengers
        );

        Ok(CheckoutResponse {
            session_id: session.id,
            url: session.url,
        })
    }

    pub async fn handle_webhook(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookAck> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or_else(|| AppError::ServiceUnavailable("Webhooks are not configured".to_string()))?;
        let signature = signature
            .ok_or_else(|| AppError::BadRequest("Missing stripe-signature header".to_string()))?;

        let payload = std::str::from_utf8(payload)
            .map_err(|_| AppError::BadRequest("Webhook payload is not valid UTF-8".to_string()))?;
        let event = webhook::construct_event(payload, signature, secret).map_err(|e| {
            tracing::warn!("Rejected webhook delivery: {}", e);
            e
        })?;
        tracing::info!("Processing webhook event {}", event.id);

        match event.event {
            PaymentEvent::CheckoutCompleted(session) => {
                let booking = self.complete_checkout(session).await?;
                Ok(WebhookAck {
                    success: true,
                    booking_id: Some(booking.id),
                })
            }
            PaymentEvent::CheckoutExpired { session_id } => {
                let released = self.repo.expire_session(&session_id).await?;
                tracing::info!("Checkout session {} expired, released {} hold(s)", session_id, released);
                Ok(WebhookAck::ok())
            }
            PaymentEvent::ChargeRefunded { charge_id, payment_intent } => {
                match payment_intent {
                    Some(ref intent) => {
                        let updated = self.repo.mark_refunded(intent).await?;
                        tracing::info!("Charge {} refunded, {} booking(s) cancelled", charge_id, updated);
                    }
                    None => tracing::warn!("Refunded charge {} has no payment intent", charge_id),
                }
                Ok(WebhookAck::ok())
            }
            PaymentEvent::PaymentFailed { payment_intent } => {
                let updated = self.repo.mark_payment_failed(&payment_intent).await?;
                tracing::warn!("Payment {} failed, {} booking(s) cancelled", payment_intent, updated);
                Ok(WebhookAck::ok())
            }
            PaymentEvent::Other(event_type) => {
                tracing::debug!("Unhandled webhook event type: {:?}", event_type);
                Ok(WebhookAck::ok())
            }
        }
    }

    async fn complete_checkout(&self, session: CompletedSession) -> Result<Booking> {
        let payment_method = match (&self.gateway, &session.payment_intent) {
            (Some(gateway), Some(intent)) => match gateway.payment_method_for_intent(intent).await {
                Ok(method) => method,
                Err(e) => {
                    tracing::warn!("Could not look up payment method for {}: {}", intent, e);
                    None
                }
            },
            _ => None,
        };

        let checkout = CompletedCheckout {
            session_id: session.id.clone(),
            customer_email: session.email.clone(),
            customer_name: session.name.clone(),
            amount_total_cents: session.amount_total.unwrap_or(0),
            paid: session.paid,
            payment_id: session.payment_intent.clone(),
            payment_method,
        };
        let max_per_day = self.config.max_bookings_per_route_day;

        let booking = match self
            .repo
            .confirm_checkout(&checkout, max_per_day, self.hold_cutoff())
            .await?
        {
            Some(booking) => booking,
            None => {
                // No hold carries this session id; rebuild the trip from metadata.
                let trip = Self::trip_from_metadata(&session.metadata).ok_or_else(|| {
                    AppError::Internal(format!("Checkout session {} has incomplete metadata", session.id))
                })?;
                let booking = self
                    .repo
                    .insert_confirmed(trip, &checkout, max_per_day, self.hold_cutoff())
                    .await?;
                tracing::info!("Booking {} created from session {}", booking.id, session.id);
                booking
            }
        };

        if booking.status == BookingStatus::Cancelled && booking.payment_status == PaymentStatus::Paid {
            tracing::error!(
                "Booking {} was paid after {} -> {} on {} filled up; refund payment {}",
                booking.id,
                booking.from,
                booking.to,
                booking.departing_date,
                booking.payment_id.as_deref().unwrap_or("unknown")
            );
        } else {
            tracing::info!("Booking {} confirmed by session {}", booking.id, session.id);
        }

        Ok(booking)
    }

    pub async fn booking_by_session(&self, session_id: &str) -> Result<Booking> {
        self.repo
            .find_by_stripe_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    pub async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::field("email", "Email is required"));
        }
        self.repo.list_paid_by_email(email).await
    }

    pub async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        self.repo.list(filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Booking> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    pub async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let booking = self.repo.update_status(id, status).await?;
        tracing::info!("Booking {} set to {}", id, status.as_str());
        Ok(booking)
    }

    pub async fn release_stale_holds(&self) -> Result<u64> {
        self.repo.release_stale_holds(self.hold_cutoff()).await
    }

    fn trip_from_request(request: &CheckoutRequest) -> Result<TripDetails> {
        let trip_type = TripType::from_str(&request.trip_type)
            .ok_or_else(|| AppError::field("tripType", "Trip type must be one-way or round-trip"))?;

        let route = pricing::find_route(&request.from, &request.to).ok_or_else(|| {
            AppError::field("to", format!("No shuttle runs from {} to {}", request.from, request.to))
        })?;

        let departing_date = parse_calendar_date(&request.departing_date)
            .ok_or_else(|| AppError::field("departingDate", "Departing date must be YYYY-MM-DD"))?;

        let returning_date = match trip_type {
            TripType::OneWay => None,
            TripType::RoundTrip => {
                let raw = request
                    .returning_date
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .ok_or_else(|| AppError::field("returningDate", "Returning date is required"))?;
                let date = parse_calendar_date(raw)
                    .ok_or_else(|| AppError::field("returningDate", "Returning date must be YYYY-MM-DD"))?;
                if date < departing_date {
                    return Err(AppError::field(
                        "returningDate",
                        "Returning date cannot be before the departing date",
                    ));
                }
                Some(date)
            }
        };

        let return_time = match trip_type {
            TripType::OneWay => None,
            TripType::RoundTrip => request.return_time.clone().filter(|t| !t.trim().is_empty()),
        };

        pricing::validate_times(route, trip_type, &request.departure_time, return_time.as_deref())?;

        Ok(TripDetails {
            trip_type,
            from: route.from.to_string(),
            to: route.to.to_string(),
            departing_date,
            returning_date,
            departure_time: request.departure_time.clone(),
            return_time,
            passengers: request.passengers,
            address: request
                .address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        })
    }

    /// Only same-site relative paths are accepted for the cancel redirect.
    fn return_path(return_url: Option<&str>) -> Result<&str> {
        match return_url.map(str::trim).filter(|u| !u.is_empty()) {
            None => Ok(DEFAULT_RETURN_PATH),
            Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => Ok(path),
            Some(_) => Err(AppError::field("returnUrl", "Return URL must be a relative path")),
        }
    }

    fn trip_description(trip: &TripDetails) -> String {
        let mut description = format!("{} {}", trip.departing_date, trip.departure_time);
        if let (Some(date), Some(time)) = (trip.returning_date, trip.return_time.as_ref()) {
            description.push_str(&format!(" - Return: {} {}", date, time));
        }
        description
    }

    fn trip_metadata(booking_id: Uuid, trip: &TripDetails) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("bookingId".to_string(), booking_id.to_string());
        metadata.insert("tripType".to_string(), trip.trip_type.as_str().to_string());
        metadata.insert("from".to_string(), trip.from.clone());
        metadata.insert("to".to_string(), trip.to.clone());
        metadata.insert("departingDate".to_string(), trip.departing_date.to_string());
        metadata.insert("departureTime".to_string(), trip.departure_time.clone());
        metadata.insert("passengers".to_string(), trip.passengers.to_string());
        if let Some(date) = trip.returning_date {
            metadata.insert("returningDate".to_string(), date.to_string());
        }
        if let Some(ref time) = trip.return_time {
            metadata.insert("returnTime".to_string(), time.clone());
        }
        if let Some(ref address) = trip.address {
            metadata.insert("address".to_string(), address.clone());
        }
        metadata
    }

    fn trip_from_metadata(metadata: &HashMap<String, String>) -> Option<TripDetails> {
        let get = |key: &str| metadata.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let departing_date: NaiveDate = parse_calendar_date(get("departingDate")?)?;
        Some(TripDetails {
            trip_type: TripType::from_str(get("tripType").unwrap_or("one-way"))?,
            from: get("from")?.to_string(),
            to: get("to")?.to_string(),
            departing_date,
            returning_date: get("returningDate").and_then(parse_calendar_date),
            departure_time: get("departureTime")?.to_string(),
            return_time: get("returnTime").map(str::to_string),
            passengers: get("passengers").and_then(|p| p.parse().ok()).unwrap_or(1),
            address: get("address").map(str::to_string),
        })
    }
}
