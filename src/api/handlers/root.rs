use axum::{http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Ace Tour API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Tours, MICE services and the Convoy - LAX airport shuttle",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "shuttle": "/api/shuttle/routes",
            "faqs": "/api/faqs",
            "auth": "/auth/login",
            "admin": "/admin"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
