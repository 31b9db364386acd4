use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{extract::AppJson, state::AppState},
    domain::{Booking, BookingStatus, InquiryStatus, NewsletterSubscription, PaymentStatus, SupportInquiry},
    error::{AppError, Result},
    media::{self, UploadedImage},
    repository::BookingFilter,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InquiryListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// Bookings

pub async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<BookingListQuery>,
) -> Result<Json<Vec<Booking>>> {
    let status = non_empty(&params.status)
        .map(|s| BookingStatus::from_str(s).ok_or_else(|| AppError::field("status", "Unknown booking status")))
        .transpose()?;
    let payment_status = non_empty(&params.payment_status)
        .map(|s| {
            PaymentStatus::from_str(s)
                .ok_or_else(|| AppError::field("paymentStatus", "Unknown payment status"))
        })
        .transpose()?;

    let bookings = state.service_context.booking_service
        .list(BookingFilter { status, payment_status })
        .await?;

    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    Ok(Json(state.service_context.booking_service.get(id).await?))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<StatusUpdate>,
) -> Result<Json<Booking>> {
    let status = BookingStatus::from_str(&req.status)
        .ok_or_else(|| AppError::field("status", "Status must be PENDING, CONFIRMED or CANCELLED"))?;

    Ok(Json(state.service_context.booking_service.update_status(id, status).await?))
}

// Support inquiries

pub async fn list_inquiries(
    State(state): State<AppState>,
    Query(params): Query<InquiryListQuery>,
) -> Result<Json<Vec<SupportInquiry>>> {
    let status = non_empty(&params.status)
        .map(|s| InquiryStatus::from_str(s).ok_or_else(|| AppError::field("status", "Unknown inquiry status")))
        .transpose()?;

    Ok(Json(state.service_context.inquiry_repo.list(status).await?))
}

pub async fn get_inquiry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SupportInquiry>> {
    let inquiry = state.service_context.inquiry_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;

    Ok(Json(inquiry))
}

pub async fn update_inquiry_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<StatusUpdate>,
) -> Result<Json<SupportInquiry>> {
    let status = InquiryStatus::from_str(&req.status)
        .ok_or_else(|| AppError::field("status", "Status must be PENDING, IN_PROGRESS or COMPLETED"))?;

    Ok(Json(state.service_context.inquiry_repo.update_status(id, status).await?))
}

pub async fn delete_inquiry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.inquiry_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Newsletter

pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsletterSubscription>>> {
    Ok(Json(state.service_context.newsletter_repo.list().await?))
}

pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.newsletter_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Media

pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedImage>)> {
    let media_host = state
        .media_host
        .clone()
        .ok_or_else(|| AppError::ServiceUnavailable("Image uploads are not configured".to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::field("file", "Invalid filename"))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)))?;

        media::validate_upload(&filename, data.len())?;

        let uploaded = media_host.upload_image(&filename, data.to_vec()).await?;
        tracing::info!("Uploaded image {} ({} bytes)", filename, data.len());

        return Ok((StatusCode::CREATED, Json(uploaded)));
    }

    Err(AppError::field("file", "No file uploaded"))
}
