mod common;

use acetour::{
    domain::{BookingStatus, CompletedCheckout, PaymentStatus, TripDetails, TripType},
    repository::BookingRepository,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{
    body_json, checkout_body, completed_event, expired_event, payment_intent_event, refunded_event,
    TestApp,
};
use serde_json::json;

async fn open_checkout(app: &TestApp, date: &str, passengers: i64) -> String {
    let response = app.post_json("/en/api/checkout", &checkout_body(date, passengers), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_completed_checkout_confirms_hold_once() -> anyhow::Result<()> {
    let app = TestApp::new().await;
    let session_id = open_checkout(&app, "2030-09-01", 2).await;

    let event = completed_event(&session_id, "pi_123", 9000, json!({}));
    let first = app.deliver_webhook(&event).await;
    assert_eq!(first.status(), StatusCode::OK);
    let ack = body_json(first).await;
    assert_eq!(ack["success"], true);
    let booking_id = ack["bookingId"].as_str().unwrap().to_string();

    // Stripe retries deliveries; the second one must not add a booking.
    let second = body_json(app.deliver_webhook(&event).await).await;
    assert_eq!(second["bookingId"], booking_id.as_str());

    let bookings = app.ctx.booking_repo.list(Default::default()).await?;
    assert_eq!(bookings.len(), 1);
    let booking = &bookings[0];
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(booking.payment_id.as_deref(), Some("pi_123"));
    assert_eq!(booking.payment_method.as_deref(), Some("card"));
    assert_eq!(booking.customer_email, "rider@example.com");
    assert_eq!(booking.customer_name.as_deref(), Some("Min Rider"));

    let found = body_json(app.get(&format!("/api/bookings/session/{}", session_id), None).await).await;
    assert_eq!(found["id"], booking_id.as_str());
    assert_eq!(found["status"], "CONFIRMED");

    let mine = body_json(app.get("/api/bookings?email=rider@example.com", None).await).await;
    assert_eq!(mine.as_array().map(Vec::len), Some(1));

    let availability = app.ctx.booking_service
        .availability("Convoy (H Mart)", "LAX", "2030-09-01")
        .await?;
    // Capacity is counted in bookings, not seats.
    assert_eq!(availability.count, 1);
    assert_eq!(availability.held, 0);

    Ok(())
}

#[tokio::test]
async fn test_completed_checkout_without_hold_uses_metadata() -> anyhow::Result<()> {
    let app = TestApp::new().await;

    let metadata = json!({
        "tripType": "round-trip",
        "from": "LAX",
        "to": "Convoy (H Mart)",
        "departingDate": "2030-09-10",
        "returningDate": "2030-09-12",
        "departureTime": "11:00 AM",
        "returnTime": "9:30 AM",
        "passengers": "3"
    });
    let response = app
        .deliver_webhook(&completed_event("cs_orphan", "pi_orphan", 25500, metadata))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let booking = app.ctx.booking_repo.find_by_stripe_id("cs_orphan").await?.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.passengers, 3);
    assert_eq!(booking.price_cents, 25500);
    assert_eq!(booking.from, "LAX");
    assert_eq!(booking.return_time.as_deref(), Some("9:30 AM"));

    Ok(())
}

#[tokio::test]
async fn test_completed_checkout_with_missing_metadata_fails() -> anyhow::Result<()> {
    let app = TestApp::new().await;

    let response = app
        .deliver_webhook(&completed_event("cs_unknown", "pi_unknown", 4500, json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.ctx.booking_repo.list(Default::default()).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_refund_and_payment_failure_events() -> anyhow::Result<()> {
    let app = TestApp::new().await;

    let refunded_session = open_checkout(&app, "2030-09-20", 1).await;
    app.deliver_webhook(&completed_event(&refunded_session, "pi_refund", 4500, json!({}))).await;
    let failed_session = open_checkout(&app, "2030-09-21", 1).await;
    app.deliver_webhook(&completed_event(&failed_session, "pi_fail", 4500, json!({}))).await;

    let refund = refunded_event("ch_1", "pi_refund");
    assert_eq!(app.deliver_webhook(&refund).await.status(), StatusCode::OK);

    let failure = payment_intent_event("payment_intent.payment_failed", "pi_fail");
    assert_eq!(app.deliver_webhook(&failure).await.status(), StatusCode::OK);

    let refunded = app.ctx.booking_repo.find_by_stripe_id(&refunded_session).await?.unwrap();
    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
    assert_eq!(refunded.status, BookingStatus::Cancelled);

    let failed = app.ctx.booking_repo.find_by_stripe_id(&failed_session).await?.unwrap();
    assert_eq!(failed.payment_status, PaymentStatus::Failed);
    assert_eq!(failed.status, BookingStatus::Cancelled);

    // Cancelled seats go back on sale.
    let availability = app.ctx.booking_service
        .availability("Convoy (H Mart)", "LAX", "2030-09-20")
        .await?;
    assert_eq!(availability.count, 0);

    Ok(())
}

#[tokio::test]
async fn test_expired_session_releases_hold() -> anyhow::Result<()> {
    let app = TestApp::new().await;
    let session_id = open_checkout(&app, "2030-09-25", 4).await;

    let held = app.ctx.booking_service
        .availability("Convoy (H Mart)", "LAX", "2030-09-25")
        .await?;
    assert_eq!(held.held, 1);
    assert_eq!(held.remaining_spots, 29);

    assert_eq!(app.deliver_webhook(&expired_event(&session_id)).await.status(), StatusCode::OK);

    let after = app.ctx.booking_service
        .availability("Convoy (H Mart)", "LAX", "2030-09-25")
        .await?;
    assert_eq!(after.held, 0);

    let booking = app.ctx.booking_repo.find_by_stripe_id(&session_id).await?.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    Ok(())
}

#[tokio::test]
async fn test_webhook_signature_is_required() -> anyhow::Result<()> {
    let app = TestApp::new().await;
    let payload = completed_event("cs_x", "pi_x", 4500, json!({})).to_string();

    let unsigned = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/webhook")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.clone()))
                .unwrap(),
        )
        .await;
    assert_eq!(unsigned.status(), StatusCode::BAD_REQUEST);

    let forged = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/en/api/webhook")
                .header("stripe-signature", "t=1700000000,v1=deadbeef")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await;
    assert_eq!(forged.status(), StatusCode::BAD_REQUEST);

    assert!(app.ctx.booking_repo.list(Default::default()).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unknown_events_are_acknowledged() -> anyhow::Result<()> {
    let app = TestApp::new().await;

    for event_type in ["payment_intent.created", "payment_intent.not_yet_invented"] {
        let response = app.deliver_webhook(&payment_intent_event(event_type, "pi_other")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);
    }

    let missing = app.get("/api/bookings/session/cs_nope", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let no_email = app.get("/api/bookings", None).await;
    assert_eq!(no_email.status(), StatusCode::UNPROCESSABLE_ENTITY);

    Ok(())
}

#[tokio::test]
async fn test_payment_for_released_seat_on_full_route_is_not_booked() -> anyhow::Result<()> {
    let app = TestApp::new().await;
    let day = chrono::NaiveDate::from_ymd_opt(2030, 10, 1).unwrap();

    for i in 0..29 {
        app.ctx.booking_repo.insert_confirmed(
            TripDetails {
                trip_type: TripType::OneWay,
                from: "Convoy (H Mart)".to_string(),
                to: "LAX".to_string(),
                departing_date: day,
                returning_date: None,
                departure_time: "5:30 AM".to_string(),
                return_time: None,
                passengers: 1,
                address: None,
            },
            &CompletedCheckout {
                session_id: format!("cs_paid_{}", i),
                customer_email: format!("rider{}@example.com", i),
                customer_name: None,
                amount_total_cents: 4500,
                paid: true,
                payment_id: Some(format!("pi_paid_{}", i)),
                payment_method: Some("card".to_string()),
            },
            30,
            chrono::Utc::now(),
        ).await?;
    }

    // The last seat is held, the session expires and the seat is sold again.
    let expired_session = open_checkout(&app, "2030-10-01", 1).await;
    app.deliver_webhook(&expired_event(&expired_session)).await;
    let resold_session = open_checkout(&app, "2030-10-01", 1).await;
    let resold = app.deliver_webhook(&completed_event(&resold_session, "pi_resold", 4500, json!({}))).await;
    assert_eq!(resold.status(), StatusCode::OK);

    // Payment for the expired session still lands.
    let late = app.deliver_webhook(&completed_event(&expired_session, "pi_late", 4500, json!({}))).await;
    assert_eq!(late.status(), StatusCode::OK);

    let booking = app.ctx.booking_repo.find_by_stripe_id(&expired_session).await?.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(booking.payment_id.as_deref(), Some("pi_late"));

    let availability = app.ctx.booking_service
        .availability("Convoy (H Mart)", "LAX", "2030-10-01")
        .await?;
    assert_eq!(availability.count, 30);
    assert_eq!(availability.remaining_spots, 0);

    Ok(())
}
