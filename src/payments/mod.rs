use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

pub mod stripe_client;
pub mod webhook;

pub use stripe_client::StripeGateway;

/// Hosted checkout page for one booking attempt.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub product_name: String,
    pub description: String,
    pub unit_amount_cents: i64,
    pub quantity: u64,
    pub success_url: String,
    pub cancel_url: String,
    pub client_reference_id: String,
    pub metadata: HashMap<String, String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CheckoutSessionCreated {
    pub id: String,
    pub url: String,
}

/// The payment processor as seen by the booking flow.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> Result<CheckoutSessionCreated>;

    /// First payment method type recorded on a payment intent, e.g. `card`.
    async fn payment_method_for_intent(&self, payment_intent_id: &str) -> Result<Option<String>>;
}
