//! Backend entry-point: loads settings, wires the credential store and token
//! codec, and serves the REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use storefront::inbound::http::health::HealthState;
use storefront::inbound::http::token_config::{BuildMode, token_settings_from_env};

use server::{AppSettings, build_http_state, build_user_repository, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|err| std::io::Error::other(format!("failed to load settings: {err}")))?;
    let token_settings =
        token_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
            .map_err(std::io::Error::other)?;

    let clock = Arc::new(DefaultClock);
    let users = build_user_repository(&settings).await?;
    let http_state = build_http_state(&settings, users, &token_settings, clock.clone()).await?;
    let health_state = web::Data::new(HealthState::new(
        settings.service_name(),
        settings.port,
        clock,
    ));

    let (host, port) = settings.bind_addr();
    info!(%host, port, service = settings.service_name(), "starting server");
    let server = create_server(health_state.clone(), http_state, (host, port))?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
