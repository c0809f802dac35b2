//! Tracing middleware attaching a request-scoped trace identifier.
//!
//! A well-formed `trace-id` request header is reused; otherwise a fresh UUID
//! is generated. The identifier is installed via [`TraceId::scope`] so domain
//! errors raised inside the handler carry it, and it is echoed back on every
//! response. Each request gets one access-log line; signed tokens in email
//! link paths are masked there.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{error, info};

use crate::domain::{TRACE_ID_HEADER, TraceId};

const LINK_PREFIX: &str = "/booking/";

/// Request path safe for logs: `/booking/{action}/{token}` keeps the action
/// only.
fn loggable_path(path: &str) -> String {
    match path
        .strip_prefix(LINK_PREFIX)
        .and_then(|rest| rest.split_once('/'))
    {
        Some((action, token)) if !token.is_empty() => format!("{LINK_PREFIX}{action}/<token>"),
        _ => path.to_owned(),
    }
}

/// Middleware factory.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use hall_booking::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service wrapper produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let incoming = req
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok());
        let trace_id = TraceId::from_header(incoming).unwrap_or_else(TraceId::generate);
        let method = req.method().clone();
        let path = loggable_path(req.path());
        let started = Instant::now();

        let fut = self.service.call(req);

        Box::pin(TraceId::scope(trace_id, async move {
            let mut res = fut.await?;
            match HeaderValue::from_str(&trace_id.to_string()) {
                Ok(value) => {
                    res.response_mut()
                        .headers_mut()
                        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                }
                Err(err) => {
                    error!(error = %err, %trace_id, "failed to encode trace identifier header");
                }
            }
            info!(
                %trace_id,
                method = %method,
                path = %path,
                status = res.status().as_u16(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "request completed"
            );
            Ok(res)
        }))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use actix_web::test as actix_test;
    use actix_web::{App, HttpResponse, web};
    use rstest::rstest;

    use super::*;
    use crate::domain::Error;
    use crate::inbound::http::ApiResult;

    async fn echo_trace_id() -> HttpResponse {
        let id = TraceId::current().map(|id| id.to_string()).unwrap_or_default();
        HttpResponse::Ok().body(id)
    }

    async fn failing() -> ApiResult<HttpResponse> {
        Err(Error::not_found("no such booking"))
    }

    fn header(res: &ServiceResponse) -> String {
        res.headers()
            .get(TRACE_ID_HEADER)
            .expect("trace id header")
            .to_str()
            .expect("ascii header")
            .to_owned()
    }

    #[rstest]
    #[actix_web::test]
    async fn handler_sees_the_echoed_identifier() {
        let app = actix_test::init_service(
            App::new()
                .wrap(Trace)
                .route("/", web::get().to(echo_trace_id)),
        )
        .await;
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/").to_request()).await;
        let echoed = header(&res);
        let body = actix_test::read_body(res).await;
        assert_eq!(std::str::from_utf8(&body).expect("utf8"), echoed);
    }

    #[rstest]
    #[case("00000000-0000-0000-0000-0000000000ab", true)]
    #[case("not-a-uuid", false)]
    #[actix_web::test]
    async fn incoming_identifiers_are_reused_only_when_valid(
        #[case] incoming: &str,
        #[case] reused: bool,
    ) {
        let app = actix_test::init_service(
            App::new()
                .wrap(Trace)
                .route("/", web::get().to(echo_trace_id)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header((TRACE_ID_HEADER, incoming))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(header(&res) == incoming, reused);
    }

    #[rstest]
    #[case("/booking/cancel/eyJhbGciOi.sig", "/booking/cancel/<token>")]
    #[case("/booking/confirm/", "/booking/confirm/")]
    #[case("/api/bookings/12/confirm", "/api/bookings/12/confirm")]
    fn link_tokens_stay_out_of_access_logs(#[case] path: &str, #[case] logged: &str) {
        assert_eq!(loggable_path(path), logged);
    }

    #[rstest]
    #[actix_web::test]
    async fn error_bodies_carry_the_identifier() {
        let app = actix_test::init_service(App::new().wrap(Trace).route("/", web::get().to(failing))).await;
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/").to_request()).await;
        let echoed = header(&res);
        let body: serde_json::Value = actix_test::read_body_json(res).await;
        assert_eq!(body["traceId"], echoed.as_str());
    }
}
