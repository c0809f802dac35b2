//! Backend entry-point: loads configuration, prepares storage and serves
//! the booking API, email link pages and OpenAPI docs.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use hall_booking::config::AppSettings;
use hall_booking::inbound::http::health::HealthState;
use hall_booking::inbound::http::session_config::fingerprint::key_fingerprint;
use hall_booking::inbound::http::session_config::{BuildMode, session_settings_from_env};
use hall_booking::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{ServerConfig, create_server};

fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let env = DefaultEnv::new();
    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load configuration: {err}"))?
        .with_literal_secrets(&env);
    let bind_addr = settings.bind_addr().wrap_err("invalid configuration")?;

    let session = session_settings_from_env(&env, BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session key loaded"
    );

    let database_url = settings.database_url().map(str::to_owned);
    let pool_size = settings.db_pool_size;
    let mut config = ServerConfig::new(session, settings, bind_addr);
    if let Some(url) = database_url {
        run_pending_migrations(&url)
            .await
            .wrap_err("failed to apply database migrations")?;
        let pool = DbPool::new(PoolConfig::new(url).with_max_size(pool_size))
            .await
            .wrap_err("failed to create database pool")?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)
        .await
        .wrap_err("failed to start server")?;
    let result = server.await;
    health_state.mark_draining();
    result.wrap_err("server terminated with an error")
}
