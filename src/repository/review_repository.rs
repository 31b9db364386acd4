use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Review, ReviewInput},
    error::{AppError, Result},
    repository::ReviewRepository,
};

#[derive(FromRow)]
struct ReviewRow {
    id: String,
    reviewer_initial: String,
    reviewer_name: String,
    review_text: String,
    read_more_link: Option<String>,
    sort_order: i64,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteReviewRepository {
    pool: SqlitePool,
}

impl SqliteReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_review(row: ReviewRow) -> Result<Review> {
        Ok(Review {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            reviewer_initial: row.reviewer_initial,
            reviewer_name: row.reviewer_name,
            review_text: row.review_text,
            read_more_link: row.read_more_link,
            order: row.sort_order,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl ReviewRepository for SqliteReviewRepository {
    async fn create(&self, input: ReviewInput) -> Result<Review> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let link = input.read_more_link.as_deref().filter(|l| !l.trim().is_empty());

        sqlx::query(
            r#"
            INSERT INTO reviews (
                id, reviewer_initial, reviewer_name, review_text, read_more_link,
                sort_order, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&input.reviewer_initial)
        .bind(&input.reviewer_name)
        .bind(&input.review_text)
        .bind(link)
        .bind(input.order)
        .bind(if input.is_active { 1i32 } else { 0i32 })
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created review".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, reviewer_initial, reviewer_name, review_text, read_more_link,
                   sort_order, is_active, created_at, updated_at
            FROM reviews
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_review).transpose()
    }

    async fn list(&self) -> Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, reviewer_initial, reviewer_name, review_text, read_more_link,
                   sort_order, is_active, created_at, updated_at
            FROM reviews
            ORDER BY sort_order ASC, created_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_review).collect()
    }

    async fn list_active(&self) -> Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, reviewer_initial, reviewer_name, review_text, read_more_link,
                   sort_order, is_active, created_at, updated_at
            FROM reviews
            WHERE is_active = 1
            ORDER BY sort_order ASC, created_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_review).collect()
    }

    async fn update(&self, id: Uuid, input: ReviewInput) -> Result<Review> {
        let link = input.read_more_link.as_deref().filter(|l| !l.trim().is_empty());

        let result = sqlx::query(
            r#"
            UPDATE reviews
            SET reviewer_initial = ?, reviewer_name = ?, review_text = ?,
                read_more_link = ?, sort_order = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&input.reviewer_initial)
        .bind(&input.reviewer_name)
        .bind(&input.review_text)
        .bind(link)
        .bind(input.order)
        .bind(if input.is_active { 1i32 } else { 0i32 })
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Review not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated review".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Review not found".to_string()));
        }

        Ok(())
    }
}
