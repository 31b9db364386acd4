use std::sync::Arc;

use validator::Validate;

use crate::{
    domain::{FormMessage, InquiryType, NewsletterInput, SupportInquiry, SupportInquiryInput},
    error::{AppError, Result},
    repository::{InquiryRepository, NewsletterRepository},
};

pub const NEWSLETTER_THANKS: &str = "Thank you for subscribing to our newsletter!";
pub const NEWSLETTER_DUPLICATE: &str = "This email is already subscribed to our newsletter.";
pub const INQUIRY_THANKS: &str = "Thank you for your inquiry. We will get back to you soon.";

/// Public newsletter and support forms.
pub struct FormService {
    newsletter_repo: Arc<dyn NewsletterRepository>,
    inquiry_repo: Arc<dyn InquiryRepository>,
}

impl FormService {
    pub fn new(
        newsletter_repo: Arc<dyn NewsletterRepository>,
        inquiry_repo: Arc<dyn InquiryRepository>,
    ) -> Self {
        Self {
            newsletter_repo,
            inquiry_repo,
        }
    }

    pub async fn subscribe(&self, input: NewsletterInput) -> Result<FormMessage> {
        let input = NewsletterInput {
            email: input.email.trim().to_lowercase(),
        };
        input.validate()?;

        match self.newsletter_repo.subscribe(&input.email).await? {
            Some(subscription) => {
                tracing::info!("Newsletter subscription {} created", subscription.id);
                Ok(FormMessage {
                    message: NEWSLETTER_THANKS.to_string(),
                })
            }
            None => Err(AppError::field("email", NEWSLETTER_DUPLICATE)),
        }
    }

    pub async fn submit_inquiry(&self, input: SupportInquiryInput) -> Result<(SupportInquiry, FormMessage)> {
        // Report every field problem at once, including the type.
        let mut errors = match input.validate() {
            Ok(()) => Default::default(),
            Err(e) => match AppError::from(e) {
                AppError::InvalidFields(errors) => errors,
                other => return Err(other),
            },
        };

        let inquiry_type = InquiryType::from_str(&input.inquiry_type);
        if inquiry_type.is_none() {
            errors
                .entry("inquiryType".to_string())
                .or_default()
                .push("Please select an inquiry type".to_string());
        }

        let inquiry_type = match inquiry_type {
            Some(t) if errors.is_empty() => t,
            _ => return Err(AppError::InvalidFields(errors)),
        };

        let inquiry = self.inquiry_repo.create(inquiry_type, input).await?;
        tracing::info!("Support inquiry {} received ({})", inquiry.id, inquiry_type.as_str());

        Ok((
            inquiry,
            FormMessage {
                message: INQUIRY_THANKS.to_string(),
            },
        ))
    }
}
