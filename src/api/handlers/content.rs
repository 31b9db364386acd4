use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::state::AppState,
    domain::{Faq, Locale, PublicMiceCard, PublicReview},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct FaqQuery {
    pub locale: Option<String>,
}

pub async fn list_faqs(
    State(state): State<AppState>,
    Query(params): Query<FaqQuery>,
) -> Result<Json<Vec<Faq>>> {
    let locale = match params.locale.as_deref() {
        None | Some("") => Locale::default(),
        Some(raw) => Locale::from_str(raw)
            .ok_or_else(|| AppError::field("locale", "Locale must be en or ko"))?,
    };

    let faqs = state.service_context.faq_repo.list_active(locale).await?;
    Ok(Json(faqs))
}

pub async fn list_mice_cards(State(state): State<AppState>) -> Result<Json<Vec<PublicMiceCard>>> {
    let cards = state.service_context.mice_card_repo.list_active().await?;
    Ok(Json(cards.into_iter().map(PublicMiceCard::from).collect()))
}

pub async fn list_reviews(State(state): State<AppState>) -> Result<Json<Vec<PublicReview>>> {
    let reviews = state.service_context.review_repo.list_active().await?;
    Ok(Json(reviews.into_iter().map(PublicReview::from).collect()))
}
