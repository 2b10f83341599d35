//! Health endpoints: orchestration probes plus the public status and ping
//! checks used to confirm a deployment is answering.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Readiness, liveness and identity reported by the health endpoints.
///
/// Starts not ready but live; the server marks it ready once the listener is
/// bound.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    service: String,
    port: u16,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl HealthState {
    pub fn new(service: impl Into<String>, port: u16, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            service: service.into(),
            port,
            clock,
        }
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during
    /// shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Deployment status payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "UP")]
    pub status: String,
    #[schema(example = "storefront")]
    pub service: String,
    pub timestamp: DateTime<Utc>,
    #[schema(example = 8080)]
    pub port: u16,
    pub message: String,
}

/// Ping payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Pong {
    #[schema(example = "OK")]
    pub status: String,
    #[schema(example = "pong")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Readiness probe. 200 once the server can handle traffic, 503 before.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. 200 while the process is alive, 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

/// Confirm the application is deployed and running.
#[utoipa::path(
    get,
    path = "/api/health",
    tags = ["health"],
    operation_id = "health",
    security([]),
    responses((status = 200, description = "Deployment status", body = HealthStatus))
)]
#[get("/health")]
pub async fn health(state: web::Data<HealthState>) -> web::Json<HealthStatus> {
    web::Json(HealthStatus {
        status: "UP".to_owned(),
        service: state.service.clone(),
        timestamp: state.clock.utc(),
        port: state.port,
        message: "Application is deployed and running successfully".to_owned(),
    })
}

/// Cheapest possible liveness check for humans and scripts.
#[utoipa::path(
    get,
    path = "/api/ping",
    tags = ["health"],
    operation_id = "ping",
    security([]),
    responses((status = 200, description = "Pong", body = Pong))
)]
#[get("/ping")]
pub async fn ping(state: web::Data<HealthState>) -> web::Json<Pong> {
    web::Json(Pong {
        status: "OK".to_owned(),
        message: "pong".to_owned(),
        timestamp: state.clock.utc(),
    })
}
