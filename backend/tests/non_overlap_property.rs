//! Seeded random workloads against the in-memory store.
//!
//! Whatever order requests, confirmations, rejections and deletions arrive
//! in, no two active confirmed bookings for a room may overlap.

#[allow(dead_code)]
#[path = "support/harness.rs"]
mod harness;

use futures::future::join_all;
use hall_booking::domain::ports::{BookingCommand, BookingQuery, ListBookingsRequest};
use hall_booking::domain::{Booking, BookingId, BookingStatus, ErrorCode};
use harness::{harness, request};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

fn assert_no_confirmed_overlap(bookings: &[Booking]) {
    let confirmed: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.is_active() && b.status() == BookingStatus::Confirmed)
        .collect();
    for (i, a) in confirmed.iter().enumerate() {
        for b in confirmed.iter().skip(i + 1) {
            assert!(
                a.room_id() != b.room_id() || !a.slot().overlaps(b.slot()),
                "confirmed bookings {} and {} overlap",
                a.id(),
                b.id()
            );
        }
    }
}

fn random_request_hours(rng: &mut SmallRng) -> ((u32, u32), (u32, u32)) {
    let start = rng.gen_range(6..20);
    let len = rng.gen_range(1..=4);
    ((start, rng.gen_range(0..2) * 30), ((start + len).min(23), 0))
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
#[case(2024)]
#[tokio::test]
async fn random_sequences_never_confirm_overlaps(#[case] seed: u64) {
    let h = harness().await;
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut ids: Vec<BookingId> = Vec::new();

    for step in 0..80 {
        match rng.gen_range(0..10) {
            0..=3 => {
                let (from, to) = random_request_hours(&mut rng);
                match h
                    .service
                    .create(request(h.room.id(), &format!("Guest {step}"), from, to))
                    .await
                {
                    Ok(created) => ids.push(created.booking_id),
                    Err(err) => assert!(
                        matches!(err.code(), ErrorCode::Conflict | ErrorCode::InvalidRequest),
                        "unexpected create failure: {err:?}"
                    ),
                }
            }
            4..=6 if !ids.is_empty() => {
                let id = ids[rng.gen_range(0..ids.len())];
                if let Err(err) = h.service.confirm(id).await {
                    assert!(
                        matches!(err.code(), ErrorCode::Conflict | ErrorCode::InvalidState),
                        "unexpected confirm failure: {err:?}"
                    );
                }
            }
            7 if !ids.is_empty() => {
                let id = ids[rng.gen_range(0..ids.len())];
                let _ = h.service.reject(id, None).await;
            }
            8 if !ids.is_empty() => {
                let id = ids[rng.gen_range(0..ids.len())];
                h.service.delete(id).await.expect("delete is idempotent");
            }
            _ => {}
        }

        let active = h
            .service
            .list_active(ListBookingsRequest::default())
            .await
            .expect("listing works");
        assert_no_confirmed_overlap(&active);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_confirmations_never_overlap() {
    let h = harness().await;
    let mut ids = Vec::new();
    for (i, (from, to)) in [((10, 0), (12, 0)), ((11, 0), (13, 0)), ((9, 30), (10, 30))]
        .into_iter()
        .enumerate()
    {
        let created = h
            .service
            .create(request(h.room.id(), &format!("Racer {i}"), from, to))
            .await
            .expect("pending requests never conflict");
        ids.push(created.booking_id);
    }

    let attempts = ids.iter().map(|&id| {
        let service = std::sync::Arc::clone(&h.service);
        tokio::spawn(async move { service.confirm(id).await })
    });
    let outcomes: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task completes"))
        .collect();

    let active = h
        .service
        .list_active(ListBookingsRequest::default())
        .await
        .expect("listing works");
    assert_no_confirmed_overlap(&active);
    assert!(outcomes.iter().any(Result::is_ok));
    assert!(
        outcomes
            .iter()
            .filter_map(|o| o.as_ref().err())
            .all(|err| err.code() == ErrorCode::Conflict)
    );
}
