//! Declarative role policies and the guard that evaluates them.
//!
//! Each protected route names one [`Policy`]. The [`AccessGuard`] verifies the
//! caller's bearer token and matches its roles against the policy before any
//! business logic runs. Only verified claims are consulted; the credential
//! store is never queried here, so role changes apply from the next login.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{TokenCodec, TokenError};
use crate::domain::{Role, RoleSet, TokenClaims};

/// Named set of acceptable roles. A caller needs at least one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Any holder of a valid token, whatever their roles.
    Authenticated,
    AdminOnly,
    UserOnly,
    CustomerOnly,
    AdminOrUser,
    AdminOrCustomer,
}

impl Policy {
    /// Roles accepted by the policy; `None` means role-agnostic.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::{Policy, Role};
    ///
    /// assert_eq!(Policy::AdminOrUser.accepted_roles(), Some(&[Role::Admin, Role::User][..]));
    /// assert_eq!(Policy::Authenticated.accepted_roles(), None);
    /// ```
    pub fn accepted_roles(self) -> Option<&'static [Role]> {
        match self {
            Self::Authenticated => None,
            Self::AdminOnly => Some(&[Role::Admin]),
            Self::UserOnly => Some(&[Role::User]),
            Self::CustomerOnly => Some(&[Role::Customer]),
            Self::AdminOrUser => Some(&[Role::Admin, Role::User]),
            Self::AdminOrCustomer => Some(&[Role::Admin, Role::Customer]),
        }
    }

    /// Whether a caller holding `roles` satisfies the policy.
    pub fn permits(self, roles: &RoleSet) -> bool {
        self.accepted_roles()
            .is_none_or(|accepted| roles.contains_any(accepted))
    }
}

/// Authenticated caller, derived from verified token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub email: String,
    pub roles: RoleSet,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(Role::Admin)
    }
}

impl From<TokenClaims> for Principal {
    fn from(claims: TokenClaims) -> Self {
        Self {
            username: claims.subject,
            email: claims.email,
            roles: claims.roles,
        }
    }
}

/// Reason an access check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenial {
    MalformedToken,
    InvalidSignature,
    ExpiredToken,
    /// The token is valid but its roles do not satisfy the policy.
    NotAuthorized,
}

impl AccessDenial {
    /// True for every failure of the token itself, as opposed to a policy
    /// mismatch. Adapters collapse these into one "invalid token" outcome.
    pub fn is_token_failure(self) -> bool {
        !matches!(self, Self::NotAuthorized)
    }
}

/// Outcome of [`AccessGuard::check_access`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed(Principal),
    Denied(AccessDenial),
}

/// Central policy evaluation entry point.
#[derive(Clone)]
pub struct AccessGuard {
    tokens: Arc<dyn TokenCodec>,
}

impl AccessGuard {
    pub fn new(tokens: Arc<dyn TokenCodec>) -> Self {
        Self { tokens }
    }

    /// Verify `token` and evaluate `policy` against its roles.
    ///
    /// Token defects are checked first (signature and structure, then
    /// expiry); the role match only runs on fully valid claims.
    pub fn check_access(&self, policy: Policy, token: &str) -> AccessDecision {
        let claims = match self.tokens.parse(token) {
            Ok(claims) => claims,
            Err(TokenError::InvalidSignature) => {
                warn!(?policy, "access denied: token signature invalid");
                return AccessDecision::Denied(AccessDenial::InvalidSignature);
            }
            Err(error) => {
                warn!(?policy, %error, "access denied: malformed token");
                return AccessDecision::Denied(AccessDenial::MalformedToken);
            }
        };

        if self.tokens.is_expired(&claims) {
            warn!(?policy, subject = %claims.subject, "access denied: token expired");
            return AccessDecision::Denied(AccessDenial::ExpiredToken);
        }

        if !policy.permits(&claims.roles) {
            warn!(
                ?policy,
                subject = %claims.subject,
                roles = ?claims.roles.names(),
                "access denied: role not permitted"
            );
            return AccessDecision::Denied(AccessDenial::NotAuthorized);
        }

        debug!(?policy, subject = %claims.subject, "access granted");
        AccessDecision::Allowed(Principal::from(claims))
    }
}
