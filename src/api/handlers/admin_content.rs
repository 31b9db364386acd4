use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{extract::AppJson, state::AppState},
    domain::{Faq, FaqInput, MiceCard, MiceCardInput, Review, ReviewInput},
    error::{AppError, Result},
};

// FAQs

pub async fn list_faqs(State(state): State<AppState>) -> Result<Json<Vec<Faq>>> {
    Ok(Json(state.service_context.faq_repo.list().await?))
}

pub async fn get_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Faq>> {
    let faq = state.service_context.faq_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("FAQ not found".to_string()))?;

    Ok(Json(faq))
}

pub async fn create_faq(
    State(state): State<AppState>,
    AppJson(req): AppJson<FaqInput>,
) -> Result<(StatusCode, Json<Faq>)> {
    req.validate()?;
    let faq = state.service_context.faq_repo.create(req).await?;
    tracing::info!("FAQ {} created", faq.id);
    Ok((StatusCode::CREATED, Json(faq)))
}

pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<FaqInput>,
) -> Result<Json<Faq>> {
    req.validate()?;
    Ok(Json(state.service_context.faq_repo.update(id, req).await?))
}

pub async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.faq_repo.delete(id).await?;
    tracing::info!("FAQ {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

// MICE cards

pub async fn list_mice_cards(State(state): State<AppState>) -> Result<Json<Vec<MiceCard>>> {
    Ok(Json(state.service_context.mice_card_repo.list().await?))
}

pub async fn get_mice_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MiceCard>> {
    let card = state.service_context.mice_card_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("MICE card not found".to_string()))?;

    Ok(Json(card))
}

pub async fn create_mice_card(
    State(state): State<AppState>,
    AppJson(req): AppJson<MiceCardInput>,
) -> Result<(StatusCode, Json<MiceCard>)> {
    req.validate()?;
    let card = state.service_context.mice_card_repo.create(req).await?;
    tracing::info!("MICE card {} created", card.id);
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn update_mice_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<MiceCardInput>,
) -> Result<Json<MiceCard>> {
    req.validate()?;
    Ok(Json(state.service_context.mice_card_repo.update(id, req).await?))
}

pub async fn delete_mice_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.mice_card_repo.delete(id).await?;
    tracing::info!("MICE card {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

// Reviews

pub async fn list_reviews(State(state): State<AppState>) -> Result<Json<Vec<Review>>> {
    Ok(Json(state.service_context.review_repo.list().await?))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Review>> {
    let review = state.service_context.review_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

    Ok(Json(review))
}

pub async fn create_review(
    State(state): State<AppState>,
    AppJson(req): AppJson<ReviewInput>,
) -> Result<(StatusCode, Json<Review>)> {
    req.validate()?;
    let review = state.service_context.review_repo.create(req).await?;
    tracing::info!("Review {} created", review.id);
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<ReviewInput>,
) -> Result<Json<Review>> {
    req.validate()?;
    Ok(Json(state.service_context.review_repo.update(id, req).await?))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.review_repo.delete(id).await?;
    tracing::info!("Review {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
