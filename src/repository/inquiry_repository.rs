use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{InquiryStatus, InquiryType, SupportInquiry, SupportInquiryInput},
    error::{AppError, Result},
    repository::InquiryRepository,
};

#[derive(FromRow)]
struct InquiryRow {
    id: String,
    inquiry_type: String,
    full_name: String,
    email: String,
    inquiry: String,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteInquiryRepository {
    pool: SqlitePool,
}

impl SqliteInquiryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_inquiry(row: InquiryRow) -> Result<SupportInquiry> {
        Ok(SupportInquiry {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            inquiry_type: InquiryType::from_str(&row.inquiry_type)
                .ok_or_else(|| AppError::Database(format!("Invalid inquiry type: {}", row.inquiry_type)))?,
            full_name: row.full_name,
            email: row.email,
            inquiry: row.inquiry,
            status: InquiryStatus::from_str(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid inquiry status: {}", row.status)))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl InquiryRepository for SqliteInquiryRepository {
    async fn create(&self, inquiry_type: InquiryType, input: SupportInquiryInput) -> Result<SupportInquiry> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO support_inquiries (
                id, inquiry_type, full_name, email, inquiry, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, 'PENDING', ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(inquiry_type.as_str())
        .bind(input.full_name.trim())
        .bind(input.email.trim())
        .bind(input.inquiry.trim())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created inquiry".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SupportInquiry>> {
        let row = sqlx::query_as::<_, InquiryRow>(
            r#"
            SELECT id, inquiry_type, full_name, email, inquiry, status, created_at, updated_at
            FROM support_inquiries
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_inquiry).transpose()
    }

    async fn list(&self, status: Option<InquiryStatus>) -> Result<Vec<SupportInquiry>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, InquiryRow>(
                    r#"
                    SELECT id, inquiry_type, full_name, email, inquiry, status, created_at, updated_at
                    FROM support_inquiries
                    WHERE status = ?
                    ORDER BY created_at DESC
                    "#
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, InquiryRow>(
                    r#"
                    SELECT id, inquiry_type, full_name, email, inquiry, status, created_at, updated_at
                    FROM support_inquiries
                    ORDER BY created_at DESC
                    "#
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_inquiry).collect()
    }

    async fn update_status(&self, id: Uuid, status: InquiryStatus) -> Result<SupportInquiry> {
        let result = sqlx::query("UPDATE support_inquiries SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inquiry not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated inquiry".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM support_inquiries WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inquiry not found".to_string()));
        }

        Ok(())
    }
}
