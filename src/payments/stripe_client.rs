use async_trait::async_trait;
use stripe::{
    CheckoutSession, CheckoutSessionCustomerCreation, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData, CreateCheckoutSessionLineItemsPriceDataProductData,
    CreateCheckoutSessionPaymentMethodTypes, Currency, PaymentIntent, PaymentIntentId,
};

use crate::{
    error::{AppError, Result},
    payments::{CheckoutSessionCreated, CheckoutSessionRequest, PaymentGateway},
};

pub struct StripeGateway {
    client: Client,
    currency: Currency,
}

impl StripeGateway {
    pub fn new(api_key: String, currency: &str) -> Result<Self> {
        let currency = currency
            .to_lowercase()
            .parse::<Currency>()
            .map_err(|_| AppError::Internal(format!("Unsupported currency: {}", currency)))?;

        Ok(Self {
            client: Client::new(api_key),
            currency,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> Result<CheckoutSessionCreated> {
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.customer_creation = Some(CheckoutSessionCustomerCreation::Always);
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.client_reference_id = Some(&request.client_reference_id);
        params.expires_at = Some(request.expires_at.timestamp());

        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: self.currency,
                unit_amount: Some(request.unit_amount_cents),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: request.product_name.clone(),
                    description: Some(request.description.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            quantity: Some(request.quantity),
            ..Default::default()
        }]);

        params.metadata = Some(request.metadata.clone());

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| AppError::Payment(format!("Stripe error: {}", e)))?;

        let url = session
            .url
            .ok_or_else(|| AppError::Payment("No checkout URL returned".to_string()))?;

        Ok(CheckoutSessionCreated {
            id: session.id.to_string(),
            url,
        })
    }

    async fn payment_method_for_intent(&self, payment_intent_id: &str) -> Result<Option<String>> {
        let id = payment_intent_id
            .parse::<PaymentIntentId>()
            .map_err(|e| AppError::BadRequest(format!("Invalid payment intent id: {}", e)))?;

        let intent = PaymentIntent::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| AppError::Payment(format!("Stripe error: {}", e)))?;

        Ok(intent.payment_method_types.into_iter().next())
    }
}
