use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::{booking::parse_calendar_date, locale::Locale};

// =============================================================================
// FAQ
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub locale: Locale,
    pub order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FaqInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    pub category: Option<String>,
    #[serde(default = "default_locale")]
    #[validate(custom(function = "validate_locale"))]
    pub locale: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// =============================================================================
// MICE card
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiceCard {
    pub id: Uuid,
    pub label: String,
    pub date: NaiveDate,
    pub content: String,
    pub image_url: String,
    pub image_alt: String,
    pub order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MiceCardInput {
    #[validate(length(min = 1, message = "Label is required"))]
    pub label: String,
    #[validate(
        length(min = 1, message = "Date is required"),
        custom(function = "validate_card_date")
    )]
    pub date: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[validate(length(min = 1, message = "Image URL is required"))]
    pub image_url: String,
    #[validate(length(min = 1, message = "Image alt text is required"))]
    pub image_alt: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl MiceCardInput {
    /// Only meaningful after `validate()` has passed.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.date)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CardImage {
    pub url: String,
    pub alt: String,
}

/// Shape the MICE page renders.
#[derive(Debug, Clone, Serialize)]
pub struct PublicMiceCard {
    pub id: Uuid,
    pub label: String,
    pub date: String,
    pub content: String,
    pub image: CardImage,
}

impl From<MiceCard> for PublicMiceCard {
    fn from(card: MiceCard) -> Self {
        Self {
            id: card.id,
            label: card.label,
            date: card.date.format("%B %-d, %Y").to_string(),
            content: card.content,
            image: CardImage {
                url: card.image_url,
                alt: card.image_alt,
            },
        }
    }
}

// =============================================================================
// Review
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub reviewer_initial: String,
    pub reviewer_name: String,
    pub review_text: String,
    pub read_more_link: Option<String>,
    pub order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    #[validate(custom(function = "validate_single_char"))]
    pub reviewer_initial: String,
    #[validate(length(min = 1, message = "Reviewer name is required"))]
    pub reviewer_name: String,
    #[validate(length(min = 1, message = "Review text is required"))]
    pub review_text: String,
    pub read_more_link: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicReview {
    pub id: Uuid,
    pub reviewer_initial: String,
    pub reviewer_name: String,
    pub review_text: String,
    pub read_more_link: Option<String>,
}

impl From<Review> for PublicReview {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            reviewer_initial: review.reviewer_initial,
            reviewer_name: review.reviewer_name,
            review_text: review.review_text,
            read_more_link: review.read_more_link,
        }
    }
}

// =============================================================================
// Validation helpers
// =============================================================================

fn default_locale() -> String {
    Locale::En.as_str().to_string()
}

fn default_true() -> bool {
    true
}

fn validate_locale(locale: &str) -> Result<(), ValidationError> {
    match Locale::from_str(locale) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("locale").with_message("Locale must be en or ko".into())),
    }
}

fn validate_card_date(date: &str) -> Result<(), ValidationError> {
    if date.is_empty() || parse_calendar_date(date).is_some() {
        // Emptiness is reported by the length rule.
        return Ok(());
    }
    Err(ValidationError::new("date").with_message("Date must be YYYY-MM-DD".into()))
}

fn validate_single_char(initial: &str) -> Result<(), ValidationError> {
    if initial.chars().count() == 1 {
        return Ok(());
    }
    Err(ValidationError::new("initial").with_message("Initial must be a single character".into()))
}
