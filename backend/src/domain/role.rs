//! Authorisation roles.
//!
//! Roles form a flat, closed enumeration. There is no hierarchy: an admin is
//! not implicitly a user or a customer. Accounts hold an unordered set of
//! roles, modelled as [`RoleSet`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single authorisation role. Wire names are upper case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
    Customer,
}

impl Role {
    /// Every role, in canonical order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::User, Role::Customer];

    /// Upper-case wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
            Self::Customer => "CUSTOMER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a role name is not part of the closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_owned()))
    }
}

/// Unordered set of roles held by an account or asserted by a token.
///
/// Iteration always follows the canonical `ADMIN, USER, CUSTOMER` order, so
/// encoded tokens list roles deterministically.
///
/// # Examples
/// ```
/// use storefront::domain::{Role, RoleSet};
///
/// let roles: RoleSet = [Role::Customer, Role::Admin].into_iter().collect();
/// assert_eq!(roles.names(), vec!["ADMIN", "CUSTOMER"]);
/// assert!(roles.contains_any(&[Role::User, Role::Admin]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Vec<Role>)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// Empty role set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the set holds `role`.
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether the set shares at least one role with `candidates`.
    pub fn contains_any(&self, candidates: &[Role]) -> bool {
        candidates.iter().any(|role| self.0.contains(role))
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Wire names in canonical order.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(Role::as_str).collect()
    }

    /// Parse role names, rejecting anything outside the enumeration.
    pub fn try_from_names<I, S>(names: I) -> Result<Self, UnknownRole>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().parse::<Role>())
            .collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Role> for RoleSet {
    fn from(value: Role) -> Self {
        std::iter::once(value).collect()
    }
}
