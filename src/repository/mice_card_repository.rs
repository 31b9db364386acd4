use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{MiceCard, MiceCardInput},
    error::{AppError, Result},
    repository::MiceCardRepository,
};

#[derive(FromRow)]
struct MiceCardRow {
    id: String,
    label: String,
    card_date: String,
    content: String,
    image_url: String,
    image_alt: String,
    sort_order: i64,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteMiceCardRepository {
    pool: SqlitePool,
}

impl SqliteMiceCardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_card(row: MiceCardRow) -> Result<MiceCard> {
        Ok(MiceCard {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            label: row.label,
            date: NaiveDate::parse_from_str(&row.card_date, "%Y-%m-%d")
                .map_err(|e| AppError::Database(format!("Invalid card date {}: {}", row.card_date, e)))?,
            content: row.content,
            image_url: row.image_url,
            image_alt: row.image_alt,
            order: row.sort_order,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn card_date(input: &MiceCardInput) -> Result<String> {
        input
            .parsed_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .ok_or_else(|| AppError::field("date", "Date must be YYYY-MM-DD"))
    }
}

#[async_trait]
impl MiceCardRepository for SqliteMiceCardRepository {
    async fn create(&self, input: MiceCardInput) -> Result<MiceCard> {
        let id = Uuid::new_v4();
        let card_date = Self::card_date(&input)?;
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO mice_cards (
                id, label, card_date, content, image_url, image_alt,
                sort_order, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&input.label)
        .bind(&card_date)
        .bind(&input.content)
        .bind(&input.image_url)
        .bind(&input.image_alt)
        .bind(input.order)
        .bind(if input.is_active { 1i32 } else { 0i32 })
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created MICE card".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MiceCard>> {
        let row = sqlx::query_as::<_, MiceCardRow>(
            r#"
            SELECT id, label, card_date, content, image_url, image_alt,
                   sort_order, is_active, created_at, updated_at
            FROM mice_cards
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_card).transpose()
    }

    async fn list(&self) -> Result<Vec<MiceCard>> {
        let rows = sqlx::query_as::<_, MiceCardRow>(
            r#"
            SELECT id, label, card_date, content, image_url, image_alt,
                   sort_order, is_active, created_at, updated_at
            FROM mice_cards
            ORDER BY sort_order ASC, card_date DESC
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_card).collect()
    }

    async fn list_active(&self) -> Result<Vec<MiceCard>> {
        let rows = sqlx::query_as::<_, MiceCardRow>(
            r#"
            SELECT id, label, card_date, content, image_url, image_alt,
                   sort_order, is_active, created_at, updated_at
            FROM mice_cards
            WHERE is_active = 1
            ORDER BY sort_order ASC, card_date DESC
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_card).collect()
    }

    async fn update(&self, id: Uuid, input: MiceCardInput) -> Result<MiceCard> {
        let card_date = Self::card_date(&input)?;

        let result = sqlx::query(
            r#"
            UPDATE mice_cards
            SET label = ?, card_date = ?, content = ?, image_url = ?, image_alt = ?,
                sort_order = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&input.label)
        .bind(&card_date)
        .bind(&input.content)
        .bind(&input.image_url)
        .bind(&input.image_alt)
        .bind(input.order)
        .bind(if input.is_active { 1i32 } else { 0i32 })
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("MICE card not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated MICE card".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM mice_cards WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("MICE card not found".to_string()));
        }

        Ok(())
    }
}
