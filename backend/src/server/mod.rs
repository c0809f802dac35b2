//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_http_state;

use std::time::Duration;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use hall_booking::Trace;
#[cfg(debug_assertions)]
use hall_booking::doc::ApiDoc;
use hall_booking::inbound::http::health::HealthState;
use hall_booking::inbound::http::state::HttpState;
use hall_booking::inbound::http::{configure_api, configure_pages};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Admin session cookie parameters shared by every worker.
#[derive(Clone)]
struct SessionCookie {
    key: Key,
    secure: bool,
    same_site: SameSite,
    ttl: Duration,
}

impl SessionCookie {
    fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let lifecycle = PersistentSession::default()
            .session_ttl(actix_web::cookie::time::Duration::seconds(ttl_secs));
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE_NAME.to_owned())
            .cookie_path("/".to_owned())
            .cookie_secure(self.secure)
            .cookie_http_only(true)
            .cookie_content_security(CookieContentSecurity::Private)
            .cookie_same_site(self.same_site)
            .session_lifecycle(lifecycle)
            .build()
    }
}

const SESSION_COOKIE_NAME: &str = "session";

/// Routes: `/api` behind the admin session cookie, link pages at the root,
/// Swagger UI in debug builds.
fn build_app(
    health: web::Data<HealthState>,
    state: web::Data<HttpState>,
    cookie: SessionCookie,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health)
        .app_data(state)
        .wrap(Trace)
        .service(
            web::scope("/api")
                .wrap(cookie.middleware())
                .configure(configure_api),
        )
        .configure(configure_pages);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the Actix HTTP server.
///
/// Builds the port implementations (seeding the hall room on first start),
/// binds the listener and marks the health state ready.
///
/// # Errors
/// Propagates [`std::io::Error`] when state construction, binding or server
/// start fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = build_http_state(&config).await?;
    let ttl = config
        .settings
        .admin_session_ttl()
        .map_err(|err| std::io::Error::other(format!("admin session lifetime: {err}")))?;
    let bind_addr = config.bind_addr;
    let cookie = SessionCookie {
        key: config.session.key,
        secure: config.session.cookie_secure,
        same_site: config.session.same_site,
        ttl,
    };

    let worker_health = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(worker_health.clone(), http_state.clone(), cookie.clone())
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "listening");
    health_state.mark_ready();
    Ok(server)
}
