//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint from the inbound layer, the
//! request and response schemas, and the bearer token security scheme. The
//! document backs Swagger UI in debug builds and is exported via
//! `cargo run --bin openapi_dump` for external tooling.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, Role};
use crate::inbound::http::auth::{LoginRequest, LoginResponse, ValidateResponse};
use crate::inbound::http::health::{HealthStatus, Pong};
use crate::inbound::http::users::{UserRequest, UserResponse};

/// Name the protected operations refer to in their `security` lists.
pub const BEARER_SCHEME: &str = "bearerAuth";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let mut scheme = Http::new(HttpAuthScheme::Bearer);
        scheme.bearer_format = Some("JWT".to_owned());
        scheme.description = Some("HS256 token issued by POST /api/auth/login.".to_owned());
        components.add_security_scheme(BEARER_SCHEME, SecurityScheme::Http(scheme));
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Storefront API",
        description = "Bearer-token authentication, user administration and health probes.",
        license(name = "MIT")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::validate_token,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::users::get_user_by_username,
        crate::inbound::http::users::get_user_by_email,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ping,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        LoginRequest,
        LoginResponse,
        ValidateResponse,
        UserRequest,
        UserResponse,
        HealthStatus,
        Pong,
    )),
    tags(
        (name = "auth", description = "Login and token validation"),
        (name = "users", description = "User administration"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document's structure.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn object_fields(doc: &utoipa::openapi::OpenApi, name: &str) -> Vec<String> {
        let schemas = &doc.components.as_ref().expect("components").schemas;
        match schemas.get(name).unwrap_or_else(|| panic!("{name} schema")) {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            _ => panic!("expected Object schema for {name}"),
        }
    }

    #[rstest]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().expect("components");
        assert!(components.security_schemes.contains_key(BEARER_SCHEME));
    }

    #[rstest]
    #[case("/api/auth/login")]
    #[case("/api/auth/validate")]
    #[case("/api/users")]
    #[case("/api/users/{id}")]
    #[case("/api/users/username/{username}")]
    #[case("/api/users/email/{email}")]
    #[case("/api/health")]
    #[case("/api/ping")]
    fn every_route_is_documented(#[case] path: &str) {
        assert!(ApiDoc::openapi().paths.paths.contains_key(path), "{path}");
    }

    #[rstest]
    fn user_response_never_documents_a_password() {
        let fields = object_fields(&ApiDoc::openapi(), "UserResponse");
        assert!(fields.contains(&"isEmailVerified".to_owned()));
        assert!(fields.iter().all(|field| !field.contains("password")));
    }

    #[rstest]
    fn login_request_uses_camel_case() {
        let fields = object_fields(&ApiDoc::openapi(), "LoginRequest");
        assert_eq!(fields, ["password", "usernameOrEmail"]);
    }
}
