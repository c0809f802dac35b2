//! Liveness and readiness probes.
//!
//! The process moves through three phases: `starting` until the listener is
//! bound, `serving` while it takes bookings, and `draining` once the server
//! future has returned. Readiness holds only while serving; liveness fails
//! only while draining.

use std::sync::atomic::{AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use utoipa::ToSchema;

/// Lifecycle phase reported by the probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Starting,
    Serving,
    Draining,
}

impl Phase {
    const fn to_raw(self) -> u8 {
        self as u8
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Starting,
            1 => Self::Serving,
            _ => Self::Draining,
        }
    }
}

/// Probe response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeBody {
    phase: Phase,
}

/// Phase shared between the bootstrap and the probe handlers.
#[derive(Debug)]
pub struct HealthState {
    phase: AtomicU8,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Starting.to_raw()),
        }
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        Phase::from_raw(self.phase.load(Ordering::Acquire))
    }

    /// Listener bound and storage prepared.
    pub fn mark_ready(&self) {
        // A draining process never returns to serving.
        let _ = self.phase.compare_exchange(
            Phase::Starting.to_raw(),
            Phase::Serving.to_raw(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Server stopped; both probes now fail.
    pub fn mark_draining(&self) {
        self.phase.store(Phase::Draining.to_raw(), Ordering::Release);
    }
}

fn probe(state: &HealthState, passing: impl FnOnce(Phase) -> bool) -> HttpResponse {
    let phase = state.phase();
    let mut response = if passing(phase) {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(ProbeBody { phase })
}

/// Readiness probe: 200 only while serving.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Accepting booking traffic", body = ProbeBody),
        (status = 503, description = "Starting up or draining", body = ProbeBody)
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    probe(&state, |phase| phase == Phase::Serving)
}

/// Liveness probe: 200 until the server starts draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Process is alive", body = ProbeBody),
        (status = 503, description = "Process is draining", body = ProbeBody)
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    probe(&state, |phase| phase != Phase::Draining)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use actix_web::http::StatusCode;
    use actix_web::App;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::Value;

    use super::*;

    async fn hit(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        uri: &str,
    ) -> (StatusCode, Value) {
        let req = actix_test::TestRequest::get().uri(uri).to_request();
        let res = actix_test::call_service(app, req).await;
        assert_eq!(
            res.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let status = res.status();
        (status, actix_test::read_body_json(res).await)
    }

    #[rstest]
    #[actix_web::test]
    async fn probes_follow_the_phase() {
        let state = web::Data::new(HealthState::new());
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .service(ready)
                .service(live),
        )
        .await;

        let (status, body) = hit(&app, "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["phase"], "starting");
        assert_eq!(hit(&app, "/health/live").await.0, StatusCode::OK);

        state.mark_ready();
        let (status, body) = hit(&app, "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "serving");

        state.mark_draining();
        assert_eq!(hit(&app, "/health/ready").await.0, StatusCode::SERVICE_UNAVAILABLE);
        let (status, body) = hit(&app, "/health/live").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["phase"], "draining");
    }

    #[rstest]
    fn draining_is_final() {
        let state = HealthState::new();
        state.mark_draining();
        state.mark_ready();
        assert_eq!(state.phase(), Phase::Draining);
    }
}
