//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see domain ports, so
//! they stay testable with stub or mock implementations.

use std::sync::Arc;

use crate::domain::AccessGuard;
use crate::domain::ports::{LoginService, TokenCodec, UsersCommand, UsersQuery};

/// Port implementations required to build [`HttpState`].
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub users: Arc<dyn UsersQuery>,
    pub users_command: Arc<dyn UsersCommand>,
    pub tokens: Arc<dyn TokenCodec>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub users: Arc<dyn UsersQuery>,
    pub users_command: Arc<dyn UsersCommand>,
    pub tokens: Arc<dyn TokenCodec>,
    /// Guard evaluating route policies against the same codec.
    pub guard: AccessGuard,
}

impl HttpState {
    /// Construct state, deriving the access guard from the token codec.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            users,
            users_command,
            tokens,
        } = ports;
        Self {
            guard: AccessGuard::new(tokens.clone()),
            login,
            users,
            users_command,
            tokens,
        }
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
