//! End-to-end HTTP flow over the in-memory store.
//!
//! Drives the real route table: a guest submits a request, the admin logs in
//! with the PIN and confirms it, and the requester cancels via the emailed
//! link page.

#[allow(dead_code)]
#[path = "support/harness.rs"]
mod harness;

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use hall_booking::Trace;
use hall_booking::domain::ports::{BookingCommand, BookingQuery, SettingsCommand};
use hall_booking::domain::{AdminAuthService, SettingsService, TRACE_ID_HEADER};
use hall_booking::inbound::http::health::HealthState;
use hall_booking::inbound::http::rate_limit::RateLimiter;
use hall_booking::inbound::http::state::{HttpState, HttpStatePorts};
use hall_booking::inbound::http::{configure_api, configure_pages};
use harness::{Harness, harness};
use mockable::Clock;
use rstest::rstest;
use serde_json::{Value, json};
use zeroize::Zeroizing;

const PIN: &str = "2468";

fn http_state(h: &Harness) -> web::Data<HttpState> {
    let clock = Arc::clone(&h.clock) as Arc<dyn Clock>;
    let admin = AdminAuthService::new(
        Zeroizing::new(PIN.to_owned()),
        Arc::clone(&h.tokens),
        Arc::clone(&clock),
    );
    web::Data::new(HttpState::new(
        HttpStatePorts {
            bookings: Arc::clone(&h.service) as Arc<dyn BookingCommand>,
            bookings_query: Arc::clone(&h.service) as Arc<dyn BookingQuery>,
            settings: Arc::new(SettingsService::new(Arc::clone(&h.store), None))
                as Arc<dyn SettingsCommand>,
            admin: Arc::new(admin),
        },
        RateLimiter::for_pin_attempts(clock),
    ))
}

fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

fn booking_body(room: i64, name: &str, start: &str, end: &str) -> Value {
    json!({
        "roomId": room,
        "start": start,
        "end": end,
        "name": name,
        "email": format!("{}@example.org", name.to_lowercase()),
        "purpose": "Choir rehearsal"
    })
}

#[rstest]
#[actix_web::test]
async fn request_confirm_and_cancel_through_http() {
    let h = harness().await;
    let app = test::init_service(
        App::new()
            .app_data(http_state(&h))
            .app_data(web::Data::new(HealthState::new()))
            .wrap(Trace)
            .service(
                web::scope("/api")
                    .wrap(session_middleware())
                    .configure(configure_api),
            )
            .configure(configure_pages),
    )
    .await;

    let created = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/bookings")
            .set_json(booking_body(
                h.room.id().get(),
                "Ada",
                "2030-05-04T10:00:00Z",
                "2030-05-04T12:00:00Z",
            ))
            .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert!(created.headers().contains_key(TRACE_ID_HEADER));
    let created: Value = test::read_body_json(created).await;
    assert_eq!(created["status"], "pending");
    let id = created["bookingId"].as_i64().expect("booking id");

    let anonymous = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/bookings/{id}/confirm"))
            .to_request(),
    )
    .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let wrong_pin = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/admin/verify-pin")
            .set_json(json!({ "pin": "0000" }))
            .to_request(),
    )
    .await;
    assert_eq!(wrong_pin.status(), StatusCode::UNAUTHORIZED);

    let login = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/admin/verify-pin")
            .set_json(json!({ "pin": PIN }))
            .to_request(),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
    let cookie: Cookie<'static> = login
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned();

    let confirmed = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/bookings/{id}/confirm"))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(confirmed.status(), StatusCode::OK);
    let confirmed: Value = test::read_body_json(confirmed).await;
    assert_eq!(confirmed["status"], "confirmed");

    let clashing = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/bookings")
            .set_json(booking_body(
                h.room.id().get(),
                "Grace",
                "2030-05-04T11:00:00Z",
                "2030-05-04T13:00:00Z",
            ))
            .to_request(),
    )
    .await;
    assert_eq!(clashing.status(), StatusCode::CONFLICT);
    let clashing: Value = test::read_body_json(clashing).await;
    assert_eq!(clashing["code"], "conflict");

    let cancel_token = h.notifier.last_cancel_token().expect("cancel link sent");
    let cancelled = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/booking/cancel/{cancel_token}"))
            .to_request(),
    )
    .await;
    assert_eq!(cancelled.status(), StatusCode::OK);
    let page = test::read_body(cancelled).await;
    let page = std::str::from_utf8(&page).expect("utf-8 page");
    assert!(page.contains("Booking cancelled"));

    let listing = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/bookings?year=2030&month=5")
            .to_request(),
    )
    .await;
    assert_eq!(listing.status(), StatusCode::OK);
    let listing: Value = test::read_body_json(listing).await;
    assert_eq!(listing, json!([]));

    let logs = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/logs")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(logs.status(), StatusCode::OK);
    let logs: Value = test::read_body_json(logs).await;
    assert_eq!(logs[0]["status"], "deleted");
}

#[rstest]
#[case("/booking/confirm/not-a-token")]
#[case("/booking/reject/not-a-token")]
#[case("/booking/cancel/not-a-token")]
#[actix_web::test]
async fn tampered_links_render_the_expired_page(#[case] uri: &str) {
    let h = harness().await;
    let app = test::init_service(
        App::new()
            .app_data(http_state(&h))
            .app_data(web::Data::new(HealthState::new()))
            .configure(configure_pages),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = test::read_body(res).await;
    let page = std::str::from_utf8(&page).expect("utf-8 page");
    assert!(page.contains("Link expired"));
}
