pub mod booking_service;
pub mod form_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;
use crate::auth::AuthService;
use crate::config::Settings;
use crate::error::Result;
use crate::payments::PaymentGateway;
use booking_service::BookingService;
use form_service::FormService;

pub struct ServiceContext {
    pub booking_repo: Arc<dyn BookingRepository>,
    pub faq_repo: Arc<dyn FaqRepository>,
    pub mice_card_repo: Arc<dyn MiceCardRepository>,
    pub review_repo: Arc<dyn ReviewRepository>,
    pub inquiry_repo: Arc<dyn InquiryRepository>,
    pub newsletter_repo: Arc<dyn NewsletterRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_service: Arc<AuthService>,
    pub booking_service: Arc<BookingService>,
    pub form_service: Arc<FormService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        settings: &Settings,
        payment_gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        let booking_repo: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(db_pool.clone()));
        let inquiry_repo: Arc<dyn InquiryRepository> =
            Arc::new(SqliteInquiryRepository::new(db_pool.clone()));
        let newsletter_repo: Arc<dyn NewsletterRepository> =
            Arc::new(SqliteNewsletterRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(db_pool.clone(), &settings.auth));

        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            payment_gateway,
            settings
                .stripe
                .webhook_secret
                .clone()
                .filter(|_| settings.stripe.enabled),
            settings.booking.clone(),
        ));
        let form_service = Arc::new(FormService::new(
            newsletter_repo.clone(),
            inquiry_repo.clone(),
        ));

        Self {
            booking_repo,
            faq_repo: Arc::new(SqliteFaqRepository::new(db_pool.clone())),
            mice_card_repo: Arc::new(SqliteMiceCardRepository::new(db_pool.clone())),
            review_repo: Arc::new(SqliteReviewRepository::new(db_pool.clone())),
            inquiry_repo,
            newsletter_repo,
            user_repo: Arc::new(SqliteUserRepository::new(db_pool.clone())),
            auth_service,
            booking_service,
            form_service,
            db_pool,
        }
    }

    /// Drops expired sessions and releases unpaid holds past their TTL.
    pub async fn run_housekeeping(&self) -> Result<()> {
        let sessions = self.auth_service.cleanup_expired_sessions().await?;
        let holds = self.booking_service.release_stale_holds().await?;

        if sessions > 0 || holds > 0 {
            tracing::info!("Housekeeping removed {} session(s), released {} hold(s)", sessions, holds);
        }

        Ok(())
    }
}
