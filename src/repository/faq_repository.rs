use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Faq, FaqInput, Locale},
    error::{AppError, Result},
    repository::FaqRepository,
};

#[derive(FromRow)]
struct FaqRow {
    id: String,
    title: String,
    content: String,
    category: Option<String>,
    locale: String,
    sort_order: i64,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteFaqRepository {
    pool: SqlitePool,
}

impl SqliteFaqRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_faq(row: FaqRow) -> Result<Faq> {
        Ok(Faq {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            content: row.content,
            category: row.category,
            locale: Locale::from_str(&row.locale)
                .ok_or_else(|| AppError::Database(format!("Invalid locale: {}", row.locale)))?,
            order: row.sort_order,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    // Validation has already accepted the locale string.
    fn locale_of(input: &FaqInput) -> &'static str {
        Locale::from_str(&input.locale).unwrap_or_default().as_str()
    }

    fn blank_to_none(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[async_trait]
impl FaqRepository for SqliteFaqRepository {
    async fn create(&self, input: FaqInput) -> Result<Faq> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO faqs (
                id, title, content, category, locale, sort_order, is_active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&input.title)
        .bind(&input.content)
        .bind(Self::blank_to_none(&input.category))
        .bind(Self::locale_of(&input))
        .bind(input.order)
        .bind(if input.is_active { 1i32 } else { 0i32 })
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created FAQ".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Faq>> {
        let row = sqlx::query_as::<_, FaqRow>(
            r#"
            SELECT id, title, content, category, locale, sort_order, is_active,
                   created_at, updated_at
            FROM faqs
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_faq).transpose()
    }

    async fn list(&self) -> Result<Vec<Faq>> {
        let rows = sqlx::query_as::<_, FaqRow>(
            r#"
            SELECT id, title, content, category, locale, sort_order, is_active,
                   created_at, updated_at
            FROM faqs
            ORDER BY sort_order ASC, created_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_faq).collect()
    }

    async fn list_active(&self, locale: Locale) -> Result<Vec<Faq>> {
        let rows = sqlx::query_as::<_, FaqRow>(
            r#"
            SELECT id, title, content, category, locale, sort_order, is_active,
                   created_at, updated_at
            FROM faqs
            WHERE is_active = 1 AND locale = ?
            ORDER BY sort_order ASC, created_at DESC
            "#
        )
        .bind(locale.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_faq).collect()
    }

    async fn update(&self, id: Uuid, input: FaqInput) -> Result<Faq> {
        let result = sqlx::query(
            r#"
            UPDATE faqs
            SET title = ?, content = ?, category = ?, locale = ?, sort_order = ?,
                is_active = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(Self::blank_to_none(&input.category))
        .bind(Self::locale_of(&input))
        .bind(input.order)
        .bind(if input.is_active { 1i32 } else { 0i32 })
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("FAQ not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated FAQ".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("FAQ not found".to_string()));
        }

        Ok(())
    }
}
