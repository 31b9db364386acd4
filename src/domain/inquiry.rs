use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportInquiry {
    pub id: Uuid,
    pub inquiry_type: InquiryType,
    pub full_name: String,
    pub email: String,
    pub inquiry: String,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InquiryType {
    TravelConsultation,
    ShuttleService,
    MiceService,
}

impl InquiryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryType::TravelConsultation => "TRAVEL_CONSULTATION",
            InquiryType::ShuttleService => "SHUTTLE_SERVICE",
            InquiryType::MiceService => "MICE_SERVICE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TRAVEL_CONSULTATION" => Some(InquiryType::TravelConsultation),
            "SHUTTLE_SERVICE" => Some(InquiryType::ShuttleService),
            "MICE_SERVICE" => Some(InquiryType::MiceService),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InquiryStatus {
    Pending,
    InProgress,
    Completed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::Pending => "PENDING",
            InquiryStatus::InProgress => "IN_PROGRESS",
            InquiryStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(InquiryStatus::Pending),
            "IN_PROGRESS" => Some(InquiryStatus::InProgress),
            "COMPLETED" => Some(InquiryStatus::Completed),
            _ => None,
        }
    }
}

/// Support form submission. The type arrives as a string so an unknown
/// value surfaces as a field error rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupportInquiryInput {
    pub inquiry_type: String,
    #[validate(length(min = 2, message = "Full name must be at least 2 characters"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 10, max = 1000, message = "Inquiry must be between 10 and 1000 characters"))]
    pub inquiry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterSubscription {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewsletterInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Acknowledgement returned by the public forms.
#[derive(Debug, Clone, Serialize)]
pub struct FormMessage {
    pub message: String,
}
