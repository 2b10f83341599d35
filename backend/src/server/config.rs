//! Server settings loaded via OrthoConfig.

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_SERVICE_NAME: &str = "storefront";

/// Process-level settings. Every field can be supplied as
/// `STOREFRONT_<FIELD>` or the matching command-line flag.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STOREFRONT")]
pub struct AppSettings {
    /// Interface to bind; defaults to every IPv4 interface.
    pub host: Option<String>,
    #[ortho_config(default = 8080)]
    pub port: u16,
    /// PostgreSQL URL. Without one accounts live in memory.
    pub database_url: Option<String>,
    /// Name reported by `/api/health`.
    pub service_name: Option<String>,
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

/// Credentials for the administrator provisioned at startup.
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl AppSettings {
    /// Host and port for `HttpServer::bind`.
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_deref().unwrap_or(DEFAULT_HOST), self.port)
    }

    pub fn service_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }

    /// Bootstrap credentials, present only when all three are configured.
    pub fn bootstrap_admin(&self) -> Option<BootstrapAdmin> {
        match (
            &self.admin_username,
            &self.admin_email,
            &self.admin_password,
        ) {
            (Some(username), Some(email), Some(password)) => Some(BootstrapAdmin {
                username: username.clone(),
                email: email.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}
