//! HTTP inbound adapter exposing REST endpoints.
//!
//! [`configure`] registers every route together with the extractor error
//! handlers, so the server binary and the integration tests mount the same
//! surface. Handlers expect `web::Data<HttpState>` and, for the health
//! routes, `web::Data<HealthState>` in app data.

pub mod auth;
pub mod bearer;
pub mod error;
pub mod health;
pub mod state;
pub mod token_config;
pub mod users;
pub(crate) mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Mount the probes at the root and the API under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(health::ready)
        .service(health::live)
        .service(
            web::scope("/api")
                .service(auth::login)
                .service(auth::validate_token)
                .service(health::health)
                .service(health::ping)
                .service(users::create_user)
                .service(users::list_users)
                .service(users::get_user_by_username)
                .service(users::get_user_by_email)
                .service(users::get_user)
                .service(users::update_user)
                .service(users::delete_user),
        );
}
