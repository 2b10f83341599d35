//! Bearer token extraction and route policy enforcement.
//!
//! Handlers declare their policy in the extractor type:
//!
//! ```text
//! async fn list_users(caller: Authorized<AdminOnly>, ...) -> ...
//! ```
//!
//! Missing, malformed, forged and expired tokens all answer `401 invalid
//! token`; a valid token whose roles miss the policy answers `403`.

use std::marker::PhantomData;

use actix_web::dev::Payload;
use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};
use tracing::{debug, error};

use crate::domain::{AccessDecision, Error, Policy, Principal};
use crate::inbound::http::state::HttpState;

const BEARER_SCHEME: &str = "bearer";

/// Compile-time policy marker used by [`Authorized`].
pub trait RequiredPolicy {
    const POLICY: Policy;
}

macro_rules! policy_markers {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl RequiredPolicy for $name {
                const POLICY: Policy = Policy::$name;
            }
        )*
    };
}

policy_markers! {
    /// Any valid token.
    Authenticated,
    AdminOnly,
    UserOnly,
    CustomerOnly,
    AdminOrUser,
    AdminOrCustomer,
}

/// Caller that passed policy `P`.
#[derive(Debug, Clone)]
pub struct Authorized<P> {
    principal: Principal,
    _policy: PhantomData<P>,
}

impl<P> Authorized<P> {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn into_principal(self) -> Principal {
        self.principal
    }
}

/// Token from an `Authorization: Bearer <token>` header, if well formed.
///
/// The scheme name is case-insensitive.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty()).then_some(token)
}

pub(crate) fn invalid_token() -> Error {
    Error::unauthorized("invalid token")
}

fn authorize(req: &HttpRequest, policy: Policy) -> Result<Principal, Error> {
    let Some(state) = req.app_data::<web::Data<HttpState>>() else {
        error!("HttpState missing from app data");
        return Err(Error::internal("HTTP state not configured"));
    };
    let Some(token) = bearer_token(req.headers()) else {
        debug!(?policy, "request without bearer token");
        return Err(invalid_token());
    };
    match state.guard.check_access(policy, token) {
        AccessDecision::Allowed(principal) => Ok(principal),
        AccessDecision::Denied(denial) if denial.is_token_failure() => Err(invalid_token()),
        AccessDecision::Denied(_) => Err(Error::forbidden("Access denied")),
    }
}

impl<P: RequiredPolicy> FromRequest for Authorized<P> {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize(req, P::POLICY).map(|principal| Self {
            principal,
            _policy: PhantomData,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::test_support::{AuthContext, bearer};
    use actix_web::http::StatusCode;
    use actix_web::http::header::HeaderValue;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;

    #[rstest]
    #[case("Bearer abc.def.ghi", Some("abc.def.ghi"))]
    #[case("bearer   abc ", Some("abc"))]
    #[case("Basic dXNlcjpwYXNz", None)]
    #[case("Bearer ", None)]
    #[case("abc.def.ghi", None)]
    fn bearer_header_parsing(#[case] header: &str, #[case] expected: Option<&str>) {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(header).expect("header"));
        assert_eq!(bearer_token(&headers), expected);
    }

    #[rstest]
    fn missing_header_yields_no_token() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    async fn admin_area(caller: Authorized<AdminOnly>) -> HttpResponse {
        HttpResponse::Ok().body(caller.into_principal().username)
    }

    #[rstest]
    #[case::admin(Some(&[Role::Admin][..]), StatusCode::OK)]
    #[case::wrong_role(Some(&[Role::Customer][..]), StatusCode::FORBIDDEN)]
    #[case::no_token(None, StatusCode::UNAUTHORIZED)]
    #[actix_web::test]
    async fn policy_outcomes_map_to_statuses(
        #[case] roles: Option<&[Role]>,
        #[case] expected: StatusCode,
    ) {
        let context = AuthContext::new().await;
        let app = actix_test::init_service(
            App::new()
                .app_data(context.state())
                .route("/admin", web::get().to(admin_area)),
        )
        .await;

        let mut request = actix_test::TestRequest::get().uri("/admin");
        if let Some(roles) = roles {
            request = request.insert_header(bearer(&context.token_for("root", roles)));
        }
        let response = actix_test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn expired_tokens_are_unauthorised() {
        let context = AuthContext::new().await;
        let token = context.token_for("root", &[Role::Admin]);
        context.clock.advance_millis(AuthContext::TTL_MILLIS as i64);
        let app = actix_test::init_service(
            App::new()
                .app_data(context.state())
                .route("/admin", web::get().to(admin_area)),
        )
        .await;

        let request = actix_test::TestRequest::get()
            .uri("/admin")
            .insert_header(bearer(&token))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = actix_test::read_body_json(response).await;
        assert_eq!(body["message"], "invalid token");
    }
}
