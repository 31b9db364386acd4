use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    api::{extract::AppJson, state::AppState},
    domain::{FormMessage, NewsletterInput, SupportInquiryInput},
    error::Result,
};

pub async fn subscribe(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewsletterInput>,
) -> Result<(StatusCode, Json<FormMessage>)> {
    let message = state.service_context.form_service.subscribe(req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn submit_inquiry(
    State(state): State<AppState>,
    AppJson(req): AppJson<SupportInquiryInput>,
) -> Result<(StatusCode, Json<FormMessage>)> {
    let (_inquiry, message) = state.service_context.form_service.submit_inquiry(req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
