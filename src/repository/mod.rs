use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod booking_repository;
pub mod faq_repository;
pub mod inquiry_repository;
pub mod mice_card_repository;
pub mod newsletter_repository;
pub mod review_repository;
pub mod user_repository;

pub use booking_repository::SqliteBookingRepository;
pub use faq_repository::SqliteFaqRepository;
pub use inquiry_repository::SqliteInquiryRepository;
pub use mice_card_repository::SqliteMiceCardRepository;
pub use newsletter_repository::SqliteNewsletterRepository;
pub use review_repository::SqliteReviewRepository;
pub use user_repository::SqliteUserRepository;

/// Paid and held booking counts for one route on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDayCount {
    pub paid: i64,
    pub held: i64,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts a PENDING hold unless paid bookings plus holds newer than
    /// `hold_cutoff` already reach `max_per_day`. Returns `None` when full.
    async fn place_hold(
        &self,
        hold: NewHold,
        max_per_day: i64,
        hold_cutoff: DateTime<Utc>,
    ) -> Result<Option<Booking>>;
    /// Records the checkout session backing a hold. The hold keeps counting
    /// until `hold_until` even when it is older than the hold cutoff.
    async fn attach_session(&self, id: Uuid, stripe_id: &str, hold_until: DateTime<Utc>) -> Result<()>;
    async fn cancel_hold(&self, id: Uuid) -> Result<()>;
    async fn count_for_route_day(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
        hold_cutoff: DateTime<Utc>,
    ) -> Result<RouteDayCount>;
    /// Confirms the booking created for `checkout.session_id`. A hold that
    /// already lost its seat is confirmed only if the route still has room;
    /// otherwise the payment is recorded on a `CANCELLED` row for refund.
    /// Returns `None` when no booking carries that session id.
    async fn confirm_checkout(
        &self,
        checkout: &CompletedCheckout,
        max_per_day: i64,
        hold_cutoff: DateTime<Utc>,
    ) -> Result<Option<Booking>>;
    /// Inserts a booking for a session that has no hold, `CONFIRMED` when
    /// the route has room and `CANCELLED` when it does not.
    async fn insert_confirmed(
        &self,
        trip: TripDetails,
        checkout: &CompletedCheckout,
        max_per_day: i64,
        hold_cutoff: DateTime<Utc>,
    ) -> Result<Booking>;
    async fn expire_session(&self, stripe_id: &str) -> Result<u64>;
    async fn mark_refunded(&self, payment_id: &str) -> Result<u64>;
    async fn mark_payment_failed(&self, payment_id: &str) -> Result<u64>;
    async fn release_stale_holds(&self, hold_cutoff: DateTime<Utc>) -> Result<u64>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;
    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<Booking>>;
    async fn list_paid_by_email(&self, email: &str) -> Result<Vec<Booking>>;
    async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>>;
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking>;
}

#[async_trait]
pub trait FaqRepository: Send + Sync {
    async fn create(&self, input: FaqInput) -> Result<Faq>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Faq>>;
    async fn list(&self) -> Result<Vec<Faq>>;
    async fn list_active(&self, locale: Locale) -> Result<Vec<Faq>>;
    async fn update(&self, id: Uuid, input: FaqInput) -> Result<Faq>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait MiceCardRepository: Send + Sync {
    async fn create(&self, input: MiceCardInput) -> Result<MiceCard>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<MiceCard>>;
    async fn list(&self) -> Result<Vec<MiceCard>>;
    async fn list_active(&self) -> Result<Vec<MiceCard>>;
    async fn update(&self, id: Uuid, input: MiceCardInput) -> Result<MiceCard>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create(&self, input: ReviewInput) -> Result<Review>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>>;
    async fn list(&self) -> Result<Vec<Review>>;
    async fn list_active(&self) -> Result<Vec<Review>>;
    async fn update(&self, id: Uuid, input: ReviewInput) -> Result<Review>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait InquiryRepository: Send + Sync {
    async fn create(&self, inquiry_type: InquiryType, input: SupportInquiryInput) -> Result<SupportInquiry>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<SupportInquiry>>;
    async fn list(&self, status: Option<InquiryStatus>) -> Result<Vec<SupportInquiry>>;
    async fn update_status(&self, id: Uuid, status: InquiryStatus) -> Result<SupportInquiry>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait NewsletterRepository: Send + Sync {
    /// Returns `None` when the email is already subscribed.
    async fn subscribe(&self, email: &str) -> Result<Option<NewsletterSubscription>>;
    async fn list(&self) -> Result<Vec<NewsletterSubscription>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: CreateUserRequest) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn password_hash(&self, email: &str) -> Result<Option<String>>;
    async fn set_password(&self, id: Uuid, password: &str) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}
