use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::NewsletterSubscription,
    error::{is_unique_violation, AppError, Result},
    repository::NewsletterRepository,
};

#[derive(FromRow)]
struct SubscriptionRow {
    id: String,
    email: String,
    created_at: NaiveDateTime,
}

pub struct SqliteNewsletterRepository {
    pool: SqlitePool,
}

impl SqliteNewsletterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_subscription(row: SubscriptionRow) -> Result<NewsletterSubscription> {
        Ok(NewsletterSubscription {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.email,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl NewsletterRepository for SqliteNewsletterRepository {
    async fn subscribe(&self, email: &str) -> Result<Option<NewsletterSubscription>> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        let inserted = sqlx::query(
            "INSERT INTO newsletter_subscriptions (id, email, created_at) VALUES (?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(email)
        .bind(now)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(Some(NewsletterSubscription {
                id,
                email: email.to_string(),
                created_at: DateTime::from_naive_utc_and_offset(now, Utc),
            })),
            Err(ref e) if is_unique_violation(e) => Ok(None),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<NewsletterSubscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT id, email, created_at FROM newsletter_subscriptions ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_subscription).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM newsletter_subscriptions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Subscription not found".to_string()));
        }

        Ok(())
    }
}
