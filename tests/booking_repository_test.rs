mod common;

use std::sync::Arc;

use acetour::{
    domain::{BookingStatus, CompletedCheckout, NewHold, PaymentStatus, TripDetails, TripType},
    repository::{BookingRepository, SqliteBookingRepository},
};
use chrono::{Duration, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use uuid::Uuid;

const MAX_PER_DAY: i64 = 30;

fn trip(date: NaiveDate) -> TripDetails {
    TripDetails {
        trip_type: TripType::OneWay,
        from: "Convoy (H Mart)".to_string(),
        to: "LAX".to_string(),
        departing_date: date,
        returning_date: None,
        departure_time: "5:30 AM".to_string(),
        return_time: None,
        passengers: 1,
        address: None,
    }
}

fn paid_checkout(session_id: &str) -> CompletedCheckout {
    CompletedCheckout {
        session_id: session_id.to_string(),
        customer_email: "rider@example.com".to_string(),
        customer_name: Some("Rider".to_string()),
        amount_total_cents: 4500,
        paid: true,
        payment_id: Some(format!("pi_{}", session_id)),
        payment_method: Some("card".to_string()),
    }
}

fn hold(date: NaiveDate) -> NewHold {
    NewHold {
        id: Uuid::new_v4(),
        trip: trip(date),
        price_cents: 4500,
    }
}

fn hold_cutoff() -> chrono::DateTime<Utc> {
    Utc::now() - Duration::minutes(60)
}

async fn fill_route(repo: &SqliteBookingRepository, day: NaiveDate, paid: usize) -> anyhow::Result<()> {
    for i in 0..paid {
        let checkout = paid_checkout(&format!("cs_seed_{}_{}", day, i));
        repo.insert_confirmed(trip(day), &checkout, MAX_PER_DAY, hold_cutoff()).await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_capacity_rejects_hold_when_route_day_is_full() -> anyhow::Result<()> {
    let pool = common::test_pool().await;
    let repo = SqliteBookingRepository::new(pool);
    let day = NaiveDate::from_ymd_opt(2030, 5, 1).unwrap();
    let cutoff = hold_cutoff();

    fill_route(&repo, day, 30).await?;

    let counts = repo.count_for_route_day("Convoy (H Mart)", "LAX", day, cutoff).await?;
    assert_eq!(counts.paid, 30);
    assert_eq!(counts.held, 0);

    assert!(repo.place_hold(hold(day), MAX_PER_DAY, cutoff).await?.is_none());

    // Other days and the opposite direction are unaffected.
    let next_day = day.succ_opt().unwrap();
    assert!(repo.place_hold(hold(next_day), MAX_PER_DAY, cutoff).await?.is_some());

    let mut reverse = hold(day);
    reverse.trip.from = "LAX".to_string();
    reverse.trip.to = "Convoy (H Mart)".to_string();
    assert!(repo.place_hold(reverse, MAX_PER_DAY, cutoff).await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_holds_count_until_released() -> anyhow::Result<()> {
    let pool = common::test_pool().await;
    let repo = SqliteBookingRepository::new(pool);
    let day = NaiveDate::from_ymd_opt(2030, 5, 2).unwrap();
    let cutoff = hold_cutoff();

    let first = repo.place_hold(hold(day), 2, cutoff).await?.expect("first hold");
    assert_eq!(first.status, BookingStatus::Pending);
    assert_eq!(first.payment_status, PaymentStatus::Pending);
    repo.place_hold(hold(day), 2, cutoff).await?.expect("second hold");

    assert!(repo.place_hold(hold(day), 2, cutoff).await?.is_none());

    // A cutoff in the future treats every hold without a session as stale.
    let released = repo.release_stale_holds(Utc::now() + Duration::minutes(1)).await?;
    assert_eq!(released, 2);

    let cancelled = repo.find_by_id(first.id).await?.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Failed);

    assert!(repo.place_hold(hold(day), 2, cutoff).await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_hold_lasts_as_long_as_its_session() -> anyhow::Result<()> {
    let pool = common::test_pool().await;
    let repo = SqliteBookingRepository::new(pool);
    let day = NaiveDate::from_ymd_opt(2030, 5, 6).unwrap();

    let held = repo.place_hold(hold(day), MAX_PER_DAY, hold_cutoff()).await?.unwrap();
    repo.attach_session(held.id, "cs_open", Utc::now() + Duration::minutes(45)).await?;

    // Past the hold cutoff, but the session can still be paid.
    let late_cutoff = Utc::now() + Duration::minutes(1);
    let counts = repo.count_for_route_day("Convoy (H Mart)", "LAX", day, late_cutoff).await?;
    assert_eq!(counts.held, 1);
    assert_eq!(repo.release_stale_holds(late_cutoff).await?, 0);

    let confirmed = repo
        .confirm_checkout(&paid_checkout("cs_open"), MAX_PER_DAY, late_cutoff)
        .await?
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.payment_status, PaymentStatus::Paid);

    Ok(())
}

#[tokio::test]
async fn test_late_payment_cannot_exceed_capacity() -> anyhow::Result<()> {
    let pool = common::test_pool().await;
    let repo = SqliteBookingRepository::new(pool);
    let day = NaiveDate::from_ymd_opt(2030, 5, 7).unwrap();

    fill_route(&repo, day, 29).await?;

    // Last seat held, then its session lapses and housekeeping releases it.
    let late = repo.place_hold(hold(day), MAX_PER_DAY, hold_cutoff()).await?.unwrap();
    repo.attach_session(late.id, "cs_late", Utc::now() - Duration::minutes(1)).await?;
    assert_eq!(repo.release_stale_holds(Utc::now() + Duration::minutes(1)).await?, 1);

    // The seat is resold and paid.
    let other = repo.place_hold(hold(day), MAX_PER_DAY, hold_cutoff()).await?.expect("seat is free again");
    repo.attach_session(other.id, "cs_other", Utc::now() + Duration::minutes(45)).await?;
    let other = repo
        .confirm_checkout(&paid_checkout("cs_other"), MAX_PER_DAY, hold_cutoff())
        .await?
        .unwrap();
    assert_eq!(other.status, BookingStatus::Confirmed);

    // The released hold's payment arrives afterwards.
    let late = repo
        .confirm_checkout(&paid_checkout("cs_late"), MAX_PER_DAY, hold_cutoff())
        .await?
        .unwrap();
    assert_eq!(late.status, BookingStatus::Cancelled);
    assert_eq!(late.payment_status, PaymentStatus::Paid);
    assert_eq!(late.payment_id.as_deref(), Some("pi_cs_late"));

    let counts = repo.count_for_route_day("Convoy (H Mart)", "LAX", day, hold_cutoff()).await?;
    assert_eq!(counts.paid, 30);
    assert_eq!(counts.held, 0);

    // Redelivery leaves it cancelled.
    let again = repo
        .confirm_checkout(&paid_checkout("cs_late"), MAX_PER_DAY, hold_cutoff())
        .await?
        .unwrap();
    assert_eq!(again.status, BookingStatus::Cancelled);

    Ok(())
}

#[tokio::test]
async fn test_late_payment_takes_a_free_seat() -> anyhow::Result<()> {
    let pool = common::test_pool().await;
    let repo = SqliteBookingRepository::new(pool);
    let day = NaiveDate::from_ymd_opt(2030, 5, 8).unwrap();

    let held = repo.place_hold(hold(day), MAX_PER_DAY, hold_cutoff()).await?.unwrap();
    repo.attach_session(held.id, "cs_slow", Utc::now() - Duration::minutes(1)).await?;
    repo.release_stale_holds(Utc::now() + Duration::minutes(1)).await?;

    let booking = repo
        .confirm_checkout(&paid_checkout("cs_slow"), MAX_PER_DAY, hold_cutoff())
        .await?
        .unwrap();
    assert_eq!(booking.id, held.id);
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.payment_status, PaymentStatus::Paid);

    Ok(())
}

#[tokio::test]
async fn test_session_without_hold_respects_capacity() -> anyhow::Result<()> {
    let pool = common::test_pool().await;
    let repo = SqliteBookingRepository::new(pool);
    let day = NaiveDate::from_ymd_opt(2030, 5, 9).unwrap();

    fill_route(&repo, day, 30).await?;

    let overflow = repo
        .insert_confirmed(trip(day), &paid_checkout("cs_overflow"), MAX_PER_DAY, hold_cutoff())
        .await?;
    assert_eq!(overflow.status, BookingStatus::Cancelled);
    assert_eq!(overflow.payment_status, PaymentStatus::Paid);

    let counts = repo.count_for_route_day("Convoy (H Mart)", "LAX", day, hold_cutoff()).await?;
    assert_eq!(counts.paid, 30);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_holds_never_oversell() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("holds.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let repo = Arc::new(SqliteBookingRepository::new(pool.clone()));
    let day = NaiveDate::from_ymd_opt(2030, 5, 10).unwrap();

    let attempts: Vec<_> = (0..60)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.place_hold(hold(day), MAX_PER_DAY, hold_cutoff()).await })
        })
        .collect();

    let mut placed = 0;
    let mut full = 0;
    for attempt in attempts {
        match attempt.await?? {
            Some(_) => placed += 1,
            None => full += 1,
        }
    }
    assert_eq!(placed, 30);
    assert_eq!(full, 30);

    let counts = repo.count_for_route_day("Convoy (H Mart)", "LAX", day, hold_cutoff()).await?;
    assert_eq!(counts.held, 30);

    pool.close().await;
    Ok(())
}

#[tokio::test]
async fn test_confirm_checkout_is_idempotent() -> anyhow::Result<()> {
    let pool = common::test_pool().await;
    let repo = SqliteBookingRepository::new(pool);
    let day = NaiveDate::from_ymd_opt(2030, 5, 3).unwrap();
    let cutoff = hold_cutoff();

    let held = repo.place_hold(hold(day), MAX_PER_DAY, cutoff).await?.unwrap();
    repo.attach_session(held.id, "cs_abc", Utc::now() + Duration::minutes(45)).await?;

    let checkout = paid_checkout("cs_abc");
    let first = repo.confirm_checkout(&checkout, MAX_PER_DAY, cutoff).await?.unwrap();
    let second = repo.confirm_checkout(&checkout, MAX_PER_DAY, cutoff).await?.unwrap();

    assert_eq!(first.id, held.id);
    assert_eq!(second.id, held.id);
    assert_eq!(second.status, BookingStatus::Confirmed);
    assert_eq!(second.payment_status, PaymentStatus::Paid);
    assert_eq!(second.customer_email, "rider@example.com");
    assert!(second.paid_at.is_some());

    // Inserting again for the same session returns the existing row.
    let again = repo.insert_confirmed(trip(day), &checkout, MAX_PER_DAY, cutoff).await?;
    assert_eq!(again.id, held.id);

    let all = repo.list(Default::default()).await?;
    assert_eq!(all.len(), 1);

    assert!(repo
        .confirm_checkout(&paid_checkout("cs_unknown"), MAX_PER_DAY, cutoff)
        .await?
        .is_none());

    Ok(())
}

#[tokio::test]
async fn test_refund_and_failure_by_payment_id() -> anyhow::Result<()> {
    let pool = common::test_pool().await;
    let repo = SqliteBookingRepository::new(pool);
    let day = NaiveDate::from_ymd_opt(2030, 5, 4).unwrap();
    let cutoff = hold_cutoff();

    let refunded = repo.insert_confirmed(trip(day), &paid_checkout("cs_r"), MAX_PER_DAY, cutoff).await?;
    let failed = repo.insert_confirmed(trip(day), &paid_checkout("cs_f"), MAX_PER_DAY, cutoff).await?;

    assert_eq!(repo.mark_refunded("pi_cs_r").await?, 1);
    assert_eq!(repo.mark_payment_failed("pi_cs_f").await?, 1);
    assert_eq!(repo.mark_refunded("pi_missing").await?, 0);

    let refunded = repo.find_by_id(refunded.id).await?.unwrap();
    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
    assert_eq!(refunded.status, BookingStatus::Cancelled);
    assert!(refunded.refunded_at.is_some());

    let failed = repo.find_by_id(failed.id).await?.unwrap();
    assert_eq!(failed.payment_status, PaymentStatus::Failed);
    assert_eq!(failed.status, BookingStatus::Cancelled);

    // A redelivered completion must not resurrect a refunded booking.
    let after = repo.confirm_checkout(&paid_checkout("cs_r"), MAX_PER_DAY, cutoff).await?.unwrap();
    assert_eq!(after.payment_status, PaymentStatus::Refunded);

    assert_eq!(repo.list_paid_by_email("rider@example.com").await?.len(), 0);

    Ok(())
}
