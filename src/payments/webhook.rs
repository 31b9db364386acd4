//! Stripe webhook verification, narrowed to the events the booking flow
//! reacts to.

use std::collections::HashMap;

use stripe::{
    CheckoutSession, CheckoutSessionPaymentStatus, EventObject, EventType, Webhook, WebhookError,
};

use crate::error::{AppError, Result};

/// The parts of a completed checkout session a booking is built from.
#[derive(Debug, Clone)]
pub struct CompletedSession {
    pub id: String,
    pub amount_total: Option<i64>,
    pub paid: bool,
    pub payment_intent: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl From<CheckoutSession> for CompletedSession {
    fn from(session: CheckoutSession) -> Self {
        let details = session.customer_details.as_ref();
        let email = details
            .and_then(|d| d.email.clone())
            .or_else(|| session.customer_email.clone())
            .unwrap_or_default();

        Self {
            id: session.id.to_string(),
            amount_total: session.amount_total,
            paid: session.payment_status == CheckoutSessionPaymentStatus::Paid,
            payment_intent: session.payment_intent.as_ref().map(|intent| intent.id().to_string()),
            email,
            name: details.and_then(|d| d.name.clone()),
            metadata: session.metadata.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PaymentEvent {
    CheckoutCompleted(CompletedSession),
    CheckoutExpired { session_id: String },
    ChargeRefunded { charge_id: String, payment_intent: Option<String> },
    PaymentFailed { payment_intent: String },
    Other(EventType),
}

#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub id: String,
    pub event: PaymentEvent,
}

/// Checks the `Stripe-Signature` header against `secret` and decodes the event.
pub fn construct_event(payload: &str, signature: &str, secret: &str) -> Result<WebhookEvent> {
    let event = Webhook::construct_event(payload, signature, secret).map_err(|e| match e {
        WebhookError::BadSignature | WebhookError::BadHeader(_) => {
            AppError::BadRequest("Invalid signature".to_string())
        }
        WebhookError::BadTimestamp(_) => {
            AppError::BadRequest("Webhook timestamp outside tolerance".to_string())
        }
        WebhookError::BadParse(e) => AppError::BadRequest(format!("Malformed webhook event: {}", e)),
        WebhookError::BadKey => AppError::Internal("Invalid webhook secret".to_string()),
    })?;

    let id = event.id.to_string();
    let event = match (event.type_, event.data.object) {
        (EventType::CheckoutSessionCompleted, EventObject::CheckoutSession(session)) => {
            PaymentEvent::CheckoutCompleted(session.into())
        }
        (EventType::CheckoutSessionExpired, EventObject::CheckoutSession(session)) => {
            PaymentEvent::CheckoutExpired { session_id: session.id.to_string() }
        }
        (EventType::ChargeRefunded, EventObject::Charge(charge)) => PaymentEvent::ChargeRefunded {
            charge_id: charge.id.to_string(),
            payment_intent: charge.payment_intent.as_ref().map(|intent| intent.id().to_string()),
        },
        (EventType::PaymentIntentPaymentFailed, EventObject::PaymentIntent(intent)) => {
            PaymentEvent::PaymentFailed { payment_intent: intent.id.to_string() }
        }
        (event_type, _) => PaymentEvent::Other(event_type),
    };

    Ok(WebhookEvent { id, event })
}
