//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie carries only the signed admin session token. [`AdminSession`]
//! is an extractor that succeeds when that token still verifies, so admin
//! handlers simply take it as an argument.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::Error;

use super::state::HttpState;

pub(crate) const ADMIN_TOKEN_KEY: &str = "admin_token";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store a freshly issued admin token, replacing any previous session.
    pub fn persist_admin_token(&self, token: &str) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(ADMIN_TOKEN_KEY, token)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// The stored admin token, if any.
    pub fn admin_token(&self) -> Result<Option<String>, Error> {
        self.0
            .get::<String>(ADMIN_TOKEN_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// Drop everything held in the session cookie.
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

/// Proof that the request carries a live admin session.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

impl FromRequest for AdminSession {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = SessionContext::from_request(req, payload);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
            let session = session.await?;
            let Some(token) = session.admin_token()? else {
                return Err(Error::unauthorized("admin login required"));
            };
            if state.admin.verify_session(&token) {
                Ok(AdminSession)
            } else {
                debug!("stale admin session presented");
                session.purge();
                Err(Error::unauthorized("admin session has expired"))
            }
        })
    }
}
