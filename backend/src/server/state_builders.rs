//! Builders for the credential store and the HTTP state wired over it.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use storefront::domain::ports::UserRepository;
use storefront::domain::{
    Authenticator, EmailAddress, NewAccount, NewPassword, PersonName, Provisioning, Role,
    TokenSettings, UserAccountService, Username,
};
use storefront::inbound::http::state::{HttpState, HttpStatePorts};
use storefront::outbound::persistence::{
    DbPool, DieselUserRepository, InMemoryUserRepository, PoolConfig, run_pending_migrations,
};
use storefront::outbound::security::{Argon2Hasher, JwtTokenCodec};

use super::config::{AppSettings, BootstrapAdmin};

/// PostgreSQL store when a URL is configured, otherwise a process-local one.
///
/// Migrations run on the blocking pool before the async pool is built.
pub async fn build_user_repository(
    settings: &AppSettings,
) -> std::io::Result<Arc<dyn UserRepository>> {
    let Some(database_url) = settings.database_url.clone() else {
        warn!("no database URL configured; accounts are kept in memory");
        return Ok(Arc::new(InMemoryUserRepository::new()));
    };

    let url = database_url.clone();
    tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .map_err(|err| std::io::Error::other(format!("migration task failed: {err}")))?
        .map_err(|err| std::io::Error::other(format!("migrations failed: {err}")))?;

    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|err| std::io::Error::other(format!("database pool: {err}")))?;
    Ok(Arc::new(DieselUserRepository::new(pool)))
}

/// Wire the domain services over `users` and provision the bootstrap admin.
pub async fn build_http_state(
    settings: &AppSettings,
    users: Arc<dyn UserRepository>,
    token_settings: &TokenSettings,
    clock: Arc<dyn Clock + Send + Sync>,
) -> std::io::Result<HttpState> {
    let hasher = Arc::new(Argon2Hasher::new());
    let tokens = Arc::new(JwtTokenCodec::new(token_settings, clock));
    let login = Authenticator::new(users.clone(), hasher.clone(), tokens.clone())
        .await
        .map_err(|err| std::io::Error::other(format!("authenticator: {err}")))?;
    let accounts = Arc::new(UserAccountService::new(users, hasher));

    if let Some(admin) = settings.bootstrap_admin() {
        provision_admin(&accounts, admin).await?;
    }

    Ok(HttpState::new(HttpStatePorts {
        login: Arc::new(login),
        users: accounts.clone(),
        users_command: accounts,
        tokens,
    }))
}

fn bootstrap_account(admin: BootstrapAdmin) -> Result<NewAccount, String> {
    let invalid = |err: &dyn std::fmt::Display| format!("bootstrap admin is invalid: {err}");
    Ok(NewAccount {
        username: Username::new(&admin.username).map_err(|e| invalid(&e))?,
        email: EmailAddress::new(&admin.email).map_err(|e| invalid(&e))?,
        password: NewPassword::new(&admin.password).map_err(|e| invalid(&e))?,
        first_name: PersonName::new("first_name", "System").map_err(|e| invalid(&e))?,
        last_name: PersonName::new("last_name", "Administrator").map_err(|e| invalid(&e))?,
        phone: None,
        roles: Some(Role::Admin.into()),
    })
}

async fn provision_admin(
    accounts: &UserAccountService,
    admin: BootstrapAdmin,
) -> std::io::Result<()> {
    let account = bootstrap_account(admin).map_err(std::io::Error::other)?;
    let username = account.username.clone();
    match accounts.ensure_account(account).await {
        Ok(Provisioning::Created) => info!(%username, "bootstrap admin created"),
        Ok(Provisioning::AlreadyPresent) => info!(%username, "bootstrap admin already present"),
        Err(err) => {
            return Err(std::io::Error::other(format!(
                "bootstrap admin provisioning failed: {err}"
            )));
        }
    }
    Ok(())
}
