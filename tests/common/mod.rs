#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use acetour::{
    api::{create_app, state::AppState},
    config::Settings,
    domain::{CreateUserRequest, UserRole},
    error::{AppError, Result},
    media::{MediaHost, UploadedImage},
    payments::{CheckoutSessionCreated, CheckoutSessionRequest, PaymentGateway},
    repository::UserRepository,
    service::ServiceContext,
};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use serde_json::{json, Value};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const ADMIN_EMAIL: &str = "admin@acetour.com";
pub const ADMIN_PASSWORD: &str = "correct-horse";

/// Records every checkout it is asked to open.
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<CheckoutSessionRequest>>,
    counter: AtomicUsize,
    pub fail: bool,
}

impl FakeGateway {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn last_request(&self) -> Option<CheckoutSessionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> Result<CheckoutSessionCreated> {
        if self.fail {
            return Err(AppError::Payment("processor unavailable".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request);
        Ok(CheckoutSessionCreated {
            id: format!("cs_test_{}", n),
            url: format!("https://checkout.test/pay/cs_test_{}", n),
        })
    }

    async fn payment_method_for_intent(&self, _payment_intent_id: &str) -> Result<Option<String>> {
        Ok(Some("card".to_string()))
    }
}

pub struct FakeMediaHost;

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn upload_image(&self, filename: &str, _data: Vec<u8>) -> Result<UploadedImage> {
        Ok(UploadedImage {
            url: format!("https://images.test/{}", filename),
            original_filename: filename.to_string(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub ctx: Arc<ServiceContext>,
    pub gateway: Arc<FakeGateway>,
}

pub async fn test_pool() -> SqlitePool {
    // One connection keeps a single shared in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate test database");

    pool
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.server.base_url = "https://acetour.test".to_string();
    settings.auth.session_secret = "test-session-secret".to_string();
    settings.stripe.enabled = true;
    settings.stripe.secret_key = Some("sk_test_unused".to_string());
    settings.stripe.webhook_secret = Some(WEBHOOK_SECRET.to_string());
    settings
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_gateway(FakeGateway::default(), test_settings()).await
    }

    pub async fn with_gateway(gateway: FakeGateway, settings: Settings) -> Self {
        let gateway = Arc::new(gateway);
        let payment_gateway: Arc<dyn PaymentGateway> = gateway.clone();
        Self::build(gateway, Some(payment_gateway), settings).await
    }

    /// Payments switched off, as when Stripe is not configured.
    pub async fn without_payments() -> Self {
        let mut settings = test_settings();
        settings.stripe.enabled = false;
        Self::build(Arc::new(FakeGateway::default()), None, settings).await
    }

    async fn build(
        gateway: Arc<FakeGateway>,
        payment_gateway: Option<Arc<dyn PaymentGateway>>,
        settings: Settings,
    ) -> Self {
        let pool = test_pool().await;

        let ctx = Arc::new(ServiceContext::new(pool.clone(), &settings, payment_gateway));
        let router = create_app(AppState::new(
            ctx.clone(),
            Some(Arc::new(FakeMediaHost)),
            Arc::new(settings),
        ));

        Self {
            router,
            pool,
            ctx,
            gateway,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: &Value, cookie: Option<&str>) -> Response<Body> {
        self.send_json("POST", uri, body, cookie).await
    }

    pub async fn put_json(&self, uri: &str, body: &Value, cookie: Option<&str>) -> Response<Body> {
        self.send_json("PUT", uri, body, cookie).await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: &Value, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send_empty("GET", uri, cookie).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send_empty("DELETE", uri, cookie).await
    }

    async fn send_empty(&self, method: &str, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// Posts `event` to the webhook endpoint with a valid signature.
    pub async fn deliver_webhook(&self, event: &Value) -> Response<Body> {
        let payload = event.to_string();
        let signature = sign_payload(&payload, chrono::Utc::now().timestamp());

        self.request(
            Request::builder()
                .method("POST")
                .uri("/api/webhook")
                .header(header::CONTENT_TYPE, "application/json")
                .header("stripe-signature", signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
    }

    pub async fn create_user(&self, email: &str, password: &str, role: UserRole) {
        self.ctx
            .user_repo
            .create(CreateUserRequest {
                email: email.to_string(),
                name: Some("Test".to_string()),
                password: password.to_string(),
                role,
            })
            .await
            .unwrap();
    }

    /// Creates the admin account and returns a `Cookie` header value.
    pub async fn login_admin(&self) -> String {
        self.create_user(ADMIN_EMAIL, ADMIN_PASSWORD, UserRole::Admin).await;

        let response = self
            .post_json(
                "/auth/login",
                &serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
                None,
            )
            .await;
        assert!(response.status().is_success(), "login failed: {}", response.status());

        session_cookie(&response).expect("No session cookie returned")
    }
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with("session="))
        .and_then(|c| c.split(';').next())
        .map(str::to_string)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub fn checkout_body(departing_date: &str, passengers: i64) -> Value {
    serde_json::json!({
        "tripType": "one-way",
        "from": "Convoy (H Mart)",
        "to": "LAX",
        "departingDate": departing_date,
        "departureTime": "5:30 AM",
        "passengers": passengers,
        "price": "45",
        "returnUrl": "/shuttle-service"
    })
}

/// `Stripe-Signature` header value for `payload` sent at `timestamp`.
pub fn sign_payload(payload: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

/// Event envelope as Stripe delivers it.
pub fn stripe_event(event_type: &str, object: Value) -> Value {
    let object_id = object["id"].as_str().unwrap_or("unknown").to_string();
    json!({
        "id": format!("evt_{}", object_id),
        "object": "event",
        "type": event_type,
        "api_version": "2024-06-20",
        "created": 1_900_000_000,
        "livemode": false,
        "pending_webhooks": 1,
        "data": { "object": object }
    })
}

pub fn checkout_session_object(session_id: &str, payment_status: &str) -> Value {
    json!({
        "id": session_id,
        "object": "checkout.session",
        "automatic_tax": { "enabled": false },
        "created": 1_900_000_000,
        "currency": "usd",
        "custom_fields": [],
        "custom_text": {},
        "expires_at": 1_900_003_600,
        "livemode": false,
        "metadata": {},
        "mode": "payment",
        "payment_method_types": ["card"],
        "payment_status": payment_status,
        "shipping_options": []
    })
}

pub fn completed_event(session_id: &str, payment_intent: &str, amount_total: i64, metadata: Value) -> Value {
    let mut session = checkout_session_object(session_id, "paid");
    session["amount_total"] = json!(amount_total);
    session["payment_intent"] = json!(payment_intent);
    session["customer_details"] = json!({ "email": "rider@example.com", "name": "Min Rider" });
    session["metadata"] = metadata;
    stripe_event("checkout.session.completed", session)
}

pub fn expired_event(session_id: &str) -> Value {
    stripe_event("checkout.session.expired", checkout_session_object(session_id, "unpaid"))
}

pub fn refunded_event(charge_id: &str, payment_intent: &str) -> Value {
    stripe_event(
        "charge.refunded",
        json!({
            "id": charge_id,
            "object": "charge",
            "amount": 4500,
            "amount_captured": 4500,
            "amount_refunded": 4500,
            "billing_details": {},
            "captured": true,
            "created": 1_900_000_000,
            "currency": "usd",
            "disputed": false,
            "livemode": false,
            "metadata": {},
            "paid": true,
            "payment_intent": payment_intent,
            "refunded": true,
            "status": "succeeded"
        }),
    )
}

pub fn payment_intent_event(event_type: &str, payment_intent: &str) -> Value {
    stripe_event(
        event_type,
        json!({
            "id": payment_intent,
            "object": "payment_intent",
            "amount": 4500,
            "amount_capturable": 0,
            "amount_received": 0,
            "capture_method": "automatic",
            "confirmation_method": "automatic",
            "created": 1_900_000_000,
            "currency": "usd",
            "livemode": false,
            "metadata": {},
            "payment_method_types": ["card"],
            "status": "requires_payment_method"
        }),
    )
}
