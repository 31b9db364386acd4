use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{
    query::Query,
    sqlite::{Sqlite, SqliteArguments},
    FromRow, SqlitePool,
};
use uuid::Uuid;

use crate::{
    domain::{
        Booking, BookingStatus, CompletedCheckout, NewHold, PaymentStatus, TripDetails, TripType,
    },
    error::{is_unique_violation, AppError, Result},
    repository::{BookingFilter, BookingRepository, RouteDayCount},
};

const BOOKING_COLUMNS: &str = r#"
    id, stripe_id, customer_email, customer_name, trip_type,
    from_location, to_location, departing_date, returning_date,
    departure_time, return_time, passengers, address, price_cents,
    status, payment_status, payment_id, payment_method,
    paid_at, refunded_at, created_at, updated_at
"#;

/// Rows that occupy a seat: paid bookings that were not cancelled, bookings
/// confirmed while an asynchronous payment settles, and holds that are
/// younger than the cutoff or whose checkout session can still be paid.
/// `HELD_PREDICATE` binds the hold cutoff, then the current time.
const PAID_PREDICATE: &str = "payment_status = 'PAID' AND status != 'CANCELLED'";
const HELD_PREDICATE: &str = r#"
    payment_status = 'PENDING'
    AND (
        status = 'CONFIRMED'
        OR (status = 'PENDING' AND (created_at > ? OR hold_expires_at > ?))
    )
"#;

/// Customer and payment columns written when a checkout completes.
const CHECKOUT_ASSIGNMENTS: &str = r#"
    customer_email = ?,
    customer_name = ?,
    price_cents = ?,
    payment_status = ?,
    payment_id = ?,
    payment_method = ?,
    paid_at = COALESCE(paid_at, ?),
    updated_at = ?
"#;

#[derive(FromRow)]
struct BookingRow {
    id: String,
    stripe_id: Option<String>,
    customer_email: String,
    customer_name: Option<String>,
    trip_type: String,
    from_location: String,
    to_location: String,
    departing_date: String,
    returning_date: Option<String>,
    departure_time: String,
    return_time: Option<String>,
    passengers: i64,
    address: Option<String>,
    price_cents: i64,
    status: String,
    payment_status: String,
    payment_id: Option<String>,
    payment_method: Option<String>,
    paid_at: Option<NaiveDateTime>,
    refunded_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        Ok(Booking {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            stripe_id: row.stripe_id,
            customer_email: row.customer_email,
            customer_name: row.customer_name,
            trip_type: TripType::from_str(&row.trip_type)
                .ok_or_else(|| AppError::Database(format!("Invalid trip type: {}", row.trip_type)))?,
            from: row.from_location,
            to: row.to_location,
            departing_date: Self::parse_date(&row.departing_date)?,
            returning_date: row.returning_date.as_deref().map(Self::parse_date).transpose()?,
            departure_time: row.departure_time,
            return_time: row.return_time,
            passengers: row.passengers,
            address: row.address,
            price_cents: row.price_cents,
            status: BookingStatus::from_str(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid booking status: {}", row.status)))?,
            payment_status: PaymentStatus::from_str(&row.payment_status).ok_or_else(|| {
                AppError::Database(format!("Invalid payment status: {}", row.payment_status))
            })?,
            payment_id: row.payment_id,
            payment_method: row.payment_method,
            paid_at: row.paid_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            refunded_at: row.refunded_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_date(s: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| AppError::Database(format!("Invalid date {}: {}", s, e)))
    }

    fn date_to_str(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Seats taken on the updated row's route and day, excluding that row.
    fn seats_taken_by_others() -> String {
        format!(
            r#"(
                SELECT COUNT(*) FROM bookings AS other
                WHERE other.from_location = bookings.from_location
                  AND other.to_location = bookings.to_location
                  AND other.departing_date = bookings.departing_date
                  AND other.id != bookings.id
                  AND (({paid}) OR ({held}))
            )"#,
            paid = PAID_PREDICATE,
            held = HELD_PREDICATE,
        )
    }

    fn bind_checkout<'q>(
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        checkout: &'q CompletedCheckout,
        now: NaiveDateTime,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        let payment_status = if checkout.paid { PaymentStatus::Paid } else { PaymentStatus::Pending };
        query
            .bind(&checkout.customer_email)
            .bind(&checkout.customer_name)
            .bind(checkout.amount_total_cents)
            .bind(payment_status.as_str())
            .bind(&checkout.payment_id)
            .bind(&checkout.payment_method)
            .bind(checkout.paid.then_some(now))
            .bind(now)
    }

    async fn fetch_many(&self, sql: &str, binds: Vec<String>) -> Result<Vec<Booking>> {
        let mut query = sqlx::query_as::<_, BookingRow>(sql);
        for value in binds {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn place_hold(
        &self,
        hold: NewHold,
        max_per_day: i64,
        hold_cutoff: DateTime<Utc>,
    ) -> Result<Option<Booking>> {
        let id_str = hold.id.to_string();
        let trip = &hold.trip;
        let departing = Self::date_to_str(trip.departing_date);
        let returning = trip.returning_date.map(Self::date_to_str);
        let now = Utc::now().naive_utc();
        let cutoff = hold_cutoff.naive_utc();

        // Count and insert in one statement so concurrent checkouts cannot
        // both take the last seat.
        let sql = format!(
            r#"
            INSERT INTO bookings (
                id, customer_email, trip_type, from_location, to_location,
                departing_date, returning_date, departure_time, return_time,
                passengers, address, price_cents, status, payment_status,
                created_at, updated_at
            )
            SELECT ?, '', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'PENDING', 'PENDING', ?, ?
            WHERE (
                SELECT COUNT(*) FROM bookings
                WHERE from_location = ? AND to_location = ? AND departing_date = ?
                  AND (({paid}) OR ({held}))
            ) < ?
            "#,
            paid = PAID_PREDICATE,
            held = HELD_PREDICATE,
        );

        let result = sqlx::query(&sql)
            .bind(&id_str)
            .bind(trip.trip_type.as_str())
            .bind(&trip.from)
            .bind(&trip.to)
            .bind(&departing)
            .bind(&returning)
            .bind(&trip.departure_time)
            .bind(&trip.return_time)
            .bind(trip.passengers)
            .bind(&trip.address)
            .bind(hold.price_cents)
            .bind(now)
            .bind(now)
            .bind(&trip.from)
            .bind(&trip.to)
            .bind(&departing)
            .bind(cutoff)
            .bind(now)
            .bind(max_per_day)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(hold.id).await
    }

    async fn attach_session(&self, id: Uuid, stripe_id: &str, hold_until: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE bookings SET stripe_id = ?, hold_expires_at = ?, updated_at = ? WHERE id = ?")
            .bind(stripe_id)
            .bind(hold_until.naive_utc())
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn cancel_hold(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'CANCELLED', payment_status = 'FAILED', updated_at = ?
            WHERE id = ? AND status = 'PENDING'
            "#
        )
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn count_for_route_day(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
        hold_cutoff: DateTime<Utc>,
    ) -> Result<RouteDayCount> {
        let sql = format!(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN {paid} THEN 1 ELSE 0 END), 0) AS paid,
                COALESCE(SUM(CASE WHEN {held} THEN 1 ELSE 0 END), 0) AS held
            FROM bookings
            WHERE from_location = ? AND to_location = ? AND departing_date = ?
            "#,
            paid = PAID_PREDICATE,
            held = HELD_PREDICATE,
        );

        let (paid, held): (i64, i64) = sqlx::query_as(&sql)
            .bind(hold_cutoff.naive_utc())
            .bind(Utc::now().naive_utc())
            .bind(from)
            .bind(to)
            .bind(Self::date_to_str(date))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(RouteDayCount { paid, held })
    }

    async fn confirm_checkout(
        &self,
        checkout: &CompletedCheckout,
        max_per_day: i64,
        hold_cutoff: DateTime<Utc>,
    ) -> Result<Option<Booking>> {
        let now = Utc::now().naive_utc();
        let cutoff = hold_cutoff.naive_utc();

        // The hold still owns its seat, or the completion is a redelivery.
        // A refunded booking keeps its state.
        let keep_sql = format!(
            r#"
            UPDATE bookings
            SET status = 'CONFIRMED', {assignments}
            WHERE stripe_id = ? AND payment_status != 'REFUNDED'
              AND (
                  status = 'CONFIRMED'
                  OR (status = 'PENDING' AND (created_at > ? OR hold_expires_at > ?))
              )
            "#,
            assignments = CHECKOUT_ASSIGNMENTS,
        );
        let kept = Self::bind_checkout(sqlx::query(&keep_sql), checkout, now)
            .bind(&checkout.session_id)
            .bind(cutoff)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if kept.rows_affected() == 0 {
            // The hold lapsed or was released: take a seat only if one is free.
            let reclaim_sql = format!(
                r#"
                UPDATE bookings
                SET status = 'CONFIRMED', {assignments}
                WHERE stripe_id = ? AND status != 'CONFIRMED'
                  AND payment_status IN ('PENDING', 'FAILED')
                  AND {taken} < ?
                "#,
                assignments = CHECKOUT_ASSIGNMENTS,
                taken = Self::seats_taken_by_others(),
            );
            let reclaimed = Self::bind_checkout(sqlx::query(&reclaim_sql), checkout, now)
                .bind(&checkout.session_id)
                .bind(cutoff)
                .bind(now)
                .bind(max_per_day)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if reclaimed.rows_affected() == 0 {
                // Full: keep the payment on a cancelled row so it can be refunded.
                let record_sql = format!(
                    r#"
                    UPDATE bookings
                    SET status = 'CANCELLED', {assignments}
                    WHERE stripe_id = ? AND status != 'CONFIRMED'
                      AND payment_status IN ('PENDING', 'FAILED')
                    "#,
                    assignments = CHECKOUT_ASSIGNMENTS,
                );
                Self::bind_checkout(sqlx::query(&record_sql), checkout, now)
                    .bind(&checkout.session_id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }

        self.find_by_stripe_id(&checkout.session_id).await
    }

    async fn insert_confirmed(
        &self,
        trip: TripDetails,
        checkout: &CompletedCheckout,
        max_per_day: i64,
        hold_cutoff: DateTime<Utc>,
    ) -> Result<Booking> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let payment_status = if checkout.paid { PaymentStatus::Paid } else { PaymentStatus::Pending };
        let departing = Self::date_to_str(trip.departing_date);

        let sql = format!(
            r#"
            INSERT INTO bookings (
                id, stripe_id, customer_email, customer_name, trip_type,
                from_location, to_location, departing_date, returning_date,
                departure_time, return_time, passengers, address, price_cents,
                status, payment_status, payment_id, payment_method,
                paid_at, created_at, updated_at
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                CASE WHEN (
                    SELECT COUNT(*) FROM bookings
                    WHERE from_location = ? AND to_location = ? AND departing_date = ?
                      AND (({paid}) OR ({held}))
                ) < ? THEN 'CONFIRMED' ELSE 'CANCELLED' END,
                ?, ?, ?, ?, ?, ?
            )
            "#,
            paid = PAID_PREDICATE,
            held = HELD_PREDICATE,
        );

        let inserted = sqlx::query(&sql)
            .bind(id.to_string())
            .bind(&checkout.session_id)
            .bind(&checkout.customer_email)
            .bind(&checkout.customer_name)
            .bind(trip.trip_type.as_str())
            .bind(&trip.from)
            .bind(&trip.to)
            .bind(&departing)
            .bind(trip.returning_date.map(Self::date_to_str))
            .bind(&trip.departure_time)
            .bind(&trip.return_time)
            .bind(trip.passengers)
            .bind(&trip.address)
            .bind(checkout.amount_total_cents)
            .bind(&trip.from)
            .bind(&trip.to)
            .bind(&departing)
            .bind(hold_cutoff.naive_utc())
            .bind(now)
            .bind(max_per_day)
            .bind(payment_status.as_str())
            .bind(&checkout.payment_id)
            .bind(&checkout.payment_method)
            .bind(checkout.paid.then_some(now))
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => {}
            // Concurrent redelivery already created it.
            Err(ref e) if is_unique_violation(e) => {
                return self
                    .find_by_stripe_id(&checkout.session_id)
                    .await?
                    .ok_or_else(|| AppError::Database("Booking vanished after conflict".to_string()));
            }
            Err(e) => return Err(AppError::Database(e.to_string())),
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created booking".to_string())
        })
    }

    async fn expire_session(&self, stripe_id: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'CANCELLED', payment_status = 'FAILED', updated_at = ?
            WHERE stripe_id = ? AND status = 'PENDING'
            "#
        )
        .bind(Utc::now().naive_utc())
        .bind(stripe_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn mark_refunded(&self, payment_id: &str) -> Result<u64> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = 'REFUNDED', status = 'CANCELLED',
                refunded_at = ?, updated_at = ?
            WHERE payment_id = ?
            "#
        )
        .bind(now)
        .bind(now)
        .bind(payment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn mark_payment_failed(&self, payment_id: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = 'FAILED', status = 'CANCELLED', updated_at = ?
            WHERE payment_id = ?
            "#
        )
        .bind(Utc::now().naive_utc())
        .bind(payment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn release_stale_holds(&self, hold_cutoff: DateTime<Utc>) -> Result<u64> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'CANCELLED', payment_status = 'FAILED', updated_at = ?
            WHERE status = 'PENDING' AND payment_status = 'PENDING' AND created_at <= ?
              AND (hold_expires_at IS NULL OR hold_expires_at <= ?)
            "#
        )
        .bind(now)
        .bind(hold_cutoff.naive_utc())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = ?", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE stripe_id = ?", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(stripe_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn list_paid_by_email(&self, email: &str) -> Result<Vec<Booking>> {
        let sql = format!(
            r#"
            SELECT {} FROM bookings
            WHERE customer_email = ? AND payment_status = 'PAID'
            ORDER BY created_at DESC
            "#,
            BOOKING_COLUMNS
        );
        self.fetch_many(&sql, vec![email.to_string()]).await
    }

    async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            binds.push(status.as_str().to_string());
        }
        if let Some(payment_status) = filter.payment_status {
            conditions.push("payment_status = ?");
            binds.push(payment_status.as_str().to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM bookings {} ORDER BY created_at DESC",
            BOOKING_COLUMNS, where_clause
        );
        self.fetch_many(&sql, binds).await
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let result = sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated booking".to_string())
        })
    }
}
