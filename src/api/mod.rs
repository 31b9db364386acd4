pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    Router,
    routing::{get, post, put},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

use crate::media::MAX_FILE_SIZE;
use state::AppState;

pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // Auth routes
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))

        // Public API
        .nest("/api", api_routes())

        // Locale-prefixed endpoints the site posts to
        .route("/:locale/api/checkout", post(handlers::shuttle::checkout))
        .route("/:locale/api/webhook", post(handlers::shuttle::localized_webhook))

        // Admin routes
        .nest("/admin", admin_routes(app_state.clone()))

        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shuttle/routes", get(handlers::shuttle::routes))
        .route("/shuttle/quote", get(handlers::shuttle::quote))
        .route("/shuttle/availability", get(handlers::shuttle::availability))
        .route("/webhook", post(handlers::shuttle::webhook))
        .route("/bookings", get(handlers::shuttle::bookings_by_email))
        .route("/bookings/session/:session_id", get(handlers::shuttle::booking_by_session))
        .route("/faqs", get(handlers::content::list_faqs))
        .route("/mice-cards", get(handlers::content::list_mice_cards))
        .route("/reviews", get(handlers::content::list_reviews))
        .route("/newsletter", post(handlers::forms::subscribe))
        .route("/support", post(handlers::forms::submit_inquiry))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::auth::me))
        .route("/password", put(handlers::auth::change_password))
        .nest("/faqs", faq_routes())
        .nest("/mice-cards", mice_card_routes())
        .nest("/reviews", review_routes())
        .route("/inquiries", get(handlers::admin::list_inquiries))
        .route(
            "/inquiries/:id",
            get(handlers::admin::get_inquiry).delete(handlers::admin::delete_inquiry),
        )
        .route("/inquiries/:id/status", put(handlers::admin::update_inquiry_status))
        .route("/newsletter", get(handlers::admin::list_subscriptions))
        .route("/newsletter/:id", axum::routing::delete(handlers::admin::delete_subscription))
        .route("/bookings", get(handlers::admin::list_bookings))
        .route("/bookings/:id", get(handlers::admin::get_booking))
        .route("/bookings/:id/status", put(handlers::admin::update_booking_status))
        .route(
            "/media",
            post(handlers::admin::upload_media)
                // Multipart framing on top of the largest accepted image.
                .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 64 * 1024)),
        )
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}

fn faq_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::admin_content::list_faqs).post(handlers::admin_content::create_faq))
        .route(
            "/:id",
            get(handlers::admin_content::get_faq)
                .put(handlers::admin_content::update_faq)
                .delete(handlers::admin_content::delete_faq),
        )
}

fn mice_card_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::admin_content::list_mice_cards).post(handlers::admin_content::create_mice_card),
        )
        .route(
            "/:id",
            get(handlers::admin_content::get_mice_card)
                .put(handlers::admin_content::update_mice_card)
                .delete(handlers::admin_content::delete_mice_card),
        )
}

fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::admin_content::list_reviews).post(handlers::admin_content::create_review))
        .route(
            "/:id",
            get(handlers::admin_content::get_review)
                .put(handlers::admin_content::update_review)
                .delete(handlers::admin_content::delete_review),
        )
}
