//! Authentication endpoints.
//!
//! ```text
//! POST /api/auth/login {"usernameOrEmail":"alice","password":"correctpw"}
//! GET  /api/auth/validate?token=<jwt>
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, LoginCredentials, LoginGrant, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, ValidationCode, field_error};

/// Message for every credential rejection, whatever the internal reason.
pub(crate) const INVALID_CREDENTIALS: &str = "Invalid username/email or password";

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username_or_email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username_or_email, &value.password)
    }
}

/// Successful login payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Always `Bearer`.
    #[serde(rename = "type")]
    pub token_type: String,
    pub username: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl From<LoginGrant> for LoginResponse {
    fn from(grant: LoginGrant) -> Self {
        Self {
            token: grant.token,
            token_type: "Bearer".to_owned(),
            username: grant.username,
            email: grant.email,
            expires_at: grant.expires_at,
        }
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    let field = match err {
        LoginValidationError::EmptyIdentifier => FieldName::new("usernameOrEmail"),
        LoginValidationError::EmptyPassword => FieldName::new("password"),
    };
    field_error(field, ValidationCode::EmptyField, err.to_string())
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Credential store unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    match state.login.authenticate(&credentials).await? {
        Some(grant) => Ok(web::Json(LoginResponse::from(grant))),
        None => Err(Error::unauthorized(INVALID_CREDENTIALS)),
    }
}

/// Query string for [`validate_token`].
#[derive(Debug, Deserialize, IntoParams)]
pub struct ValidateQuery {
    /// Compact bearer token to check.
    pub token: String,
}

/// Result of a token check.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Report whether a token is currently valid and whom it belongs to.
#[utoipa::path(
    get,
    path = "/api/auth/validate",
    params(ValidateQuery),
    responses(
        (status = 200, description = "Token is valid", body = ValidateResponse),
        (status = 400, description = "Missing token parameter", body = Error),
        (status = 401, description = "Token is invalid or expired", body = ValidateResponse)
    ),
    tags = ["auth"],
    operation_id = "validateToken",
    security([])
)]
#[get("/auth/validate")]
pub async fn validate_token(
    state: web::Data<HttpState>,
    query: web::Query<ValidateQuery>,
) -> HttpResponse {
    let token = query.into_inner().token;
    let subject = state.tokens.parse(&token).ok().map(|claims| claims.subject);
    match subject {
        Some(username) if state.tokens.validate(&token, &username) => {
            HttpResponse::Ok().json(ValidateResponse {
                valid: true,
                username: Some(username),
            })
        }
        _ => HttpResponse::Unauthorized().json(ValidateResponse {
            valid: false,
            username: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::domain::ports::{MockLoginService, TokenCodec};
    use crate::domain::{ErrorCode, Role};
    use crate::inbound::http::error::{json_error_handler, query_error_handler};
    use crate::test_support::{AuthContext, UserFixture};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;

    async fn call(
        state: web::Data<HttpState>,
        request: actix_test::TestRequest,
    ) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(state)
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                .service(web::scope("/api").service(login).service(validate_token)),
        )
        .await;
        actix_test::call_service(&app, request.to_request()).await
    }

    fn login_request(identifier: &str, password: &str) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "usernameOrEmail": identifier, "password": password }))
    }

    async fn alice_context() -> AuthContext {
        AuthContext::with_users(vec![
            UserFixture::new("alice")
                .email("alice@example.com")
                .roles(&[Role::User])
                .build(),
        ])
        .await
    }

    #[rstest]
    #[actix_web::test]
    async fn login_returns_a_bearer_token() {
        let context = alice_context().await;
        let response = call(context.state(), login_request("alice", "correctpw")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["type"], "Bearer");
        assert_eq!(body["username"], "alice");
        assert_eq!(body["email"], "alice@example.com");
        let token = body["token"].as_str().expect("token string");
        assert!(context.tokens.validate(token, "alice"));
    }

    #[rstest]
    #[case::wrong_password("alice", "wrongpw")]
    #[case::unknown_user("ghost", "correctpw")]
    #[actix_web::test]
    async fn rejected_logins_share_one_response(#[case] identifier: &str, #[case] password: &str) {
        let context = alice_context().await;
        let response = call(context.state(), login_request(identifier, password)).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], "unauthorized");
        assert_eq!(body["message"], INVALID_CREDENTIALS);
    }

    #[rstest]
    #[case("   ", "pw", "usernameOrEmail")]
    #[case("alice", "", "password")]
    #[actix_web::test]
    async fn blank_fields_are_rejected_before_lookup(
        #[case] identifier: &str,
        #[case] password: &str,
        #[case] field: &str,
    ) {
        let mut service = MockLoginService::new();
        service.expect_authenticate().times(0);
        let context = AuthContext::new().await;
        let mut state = context.state().get_ref().clone();
        state.login = Arc::new(service);

        let response = call(web::Data::new(state), login_request(identifier, password)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], "empty_field");
    }

    #[rstest]
    #[actix_web::test]
    async fn store_outage_is_service_unavailable() {
        let mut service = MockLoginService::new();
        service
            .expect_authenticate()
            .returning(|_| Err(Error::service_unavailable("credential store unavailable")));
        let context = AuthContext::new().await;
        let mut state = context.state().get_ref().clone();
        state.login = Arc::new(service);

        let response = call(web::Data::new(state), login_request("alice", "pw")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], serde_json::to_value(ErrorCode::ServiceUnavailable).expect("code"));
    }

    #[rstest]
    #[actix_web::test]
    async fn validate_reports_the_token_owner() {
        let context = AuthContext::new().await;
        let token = context.token_for("alice", &[Role::User]);
        let request =
            actix_test::TestRequest::get().uri(&format!("/api/auth/validate?token={token}"));

        let response = call(context.state(), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body, json!({ "valid": true, "username": "alice" }));
    }

    #[rstest]
    #[case::garbage(None)]
    #[case::expired(Some(AuthContext::TTL_MILLIS as i64))]
    #[actix_web::test]
    async fn validate_rejects_bad_tokens(#[case] advance_millis: Option<i64>) {
        let context = AuthContext::new().await;
        let token = match advance_millis {
            Some(millis) => {
                let token = context.token_for("alice", &[Role::User]);
                context.clock.advance_millis(millis);
                token
            }
            None => "not-a-token".to_owned(),
        };
        let request =
            actix_test::TestRequest::get().uri(&format!("/api/auth/validate?token={token}"));

        let response = call(context.state(), request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body, json!({ "valid": false }));
    }

    #[rstest]
    #[actix_web::test]
    async fn validate_requires_the_token_parameter() {
        let context = AuthContext::new().await;
        let request = actix_test::TestRequest::get().uri("/api/auth/validate");
        let response = call(context.state(), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
