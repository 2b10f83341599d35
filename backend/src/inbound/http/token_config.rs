//! Token signing configuration parsing and validation.
//!
//! Reads the signing secret and token lifetime from the environment through
//! `mockable::Env` so the rules can be exercised without touching the real
//! process environment. Debug builds tolerate missing or invalid values with
//! warnings; release builds refuse to start.

use std::path::PathBuf;

use mockable::Env;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::{SecretTooShort, SigningSecret, TokenSettings, TokenTtl};

pub(crate) const SECRET_ENV: &str = "JWT_SECRET";
pub(crate) const SECRET_FILE_ENV: &str = "JWT_SECRET_FILE";
pub(crate) const EXPIRATION_ENV: &str = "JWT_EXPIRATION_MS";
const EXPIRATION_EXPECTED: &str = "a positive number of milliseconds, at most 100 years";

/// Well-known development secret. Never acceptable outside debug builds.
pub(crate) const DEVELOPMENT_SECRET: &str =
    "mySecretKeyForJWTTokenGenerationThatIsAtLeast256BitsLongForHS256Algorithm";

/// Build mode for token configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Fall back to development defaults with a warning.
    Debug,
    /// Require explicit, valid settings.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use storefront::inbound::http::token_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// assert_eq!(mode == BuildMode::Debug, cfg!(debug_assertions));
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Errors raised while validating token configuration.
#[derive(thiserror::Error, Debug)]
pub enum TokenConfigError {
    /// Neither `JWT_SECRET` nor `JWT_SECRET_FILE` is set.
    #[error("missing signing secret: set JWT_SECRET or JWT_SECRET_FILE")]
    MissingSecret,
    /// Reading the secret file failed.
    #[error("failed to read signing secret at {path}: {source}")]
    SecretRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The secret is shorter than HS256 requires.
    #[error(transparent)]
    SecretTooShort(#[from] SecretTooShort),
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Build token settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use mockable::MockEnv;
/// use storefront::inbound::http::token_config::{BuildMode, token_settings_from_env};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "JWT_SECRET" => Some("0123456789abcdef0123456789abcdef".to_owned()),
///     "JWT_EXPIRATION_MS" => Some("3600000".to_owned()),
///     _ => None,
/// });
///
/// let settings = token_settings_from_env(&env, BuildMode::Release)?;
/// assert_eq!(settings.ttl.as_duration().as_secs(), 3600);
/// # Ok(())
/// # }
/// ```
pub fn token_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<TokenSettings, TokenConfigError> {
    let secret = secret_from_env(env, mode)?;
    let ttl = ttl_from_env(env, mode)?;
    info!(
        fingerprint = %secret.fingerprint(),
        ttl_ms = ttl.as_duration().as_millis() as u64,
        "token signing configured"
    );
    Ok(TokenSettings { secret, ttl })
}

fn secret_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<SigningSecret, TokenConfigError> {
    let inline = env.string(SECRET_ENV).map(Zeroizing::new);
    let bytes = match env.string(SECRET_FILE_ENV) {
        Some(path) => {
            if inline.is_some() {
                warn!("both {SECRET_ENV} and {SECRET_FILE_ENV} set; using the file");
            }
            match read_secret_file(PathBuf::from(path)) {
                Ok(bytes) => bytes,
                Err(error) if mode.is_debug() => {
                    warn!(%error, "using development signing secret (dev only)");
                    development_secret()
                }
                Err(error) => return Err(error),
            }
        }
        None => match inline {
            Some(secret) => Zeroizing::new(secret.as_bytes().to_vec()),
            None if mode.is_debug() => {
                warn!("{SECRET_ENV} not set; using development signing secret (dev only)");
                development_secret()
            }
            None => return Err(TokenConfigError::MissingSecret),
        },
    };
    Ok(SigningSecret::new(bytes.to_vec())?)
}

fn development_secret() -> Zeroizing<Vec<u8>> {
    Zeroizing::new(DEVELOPMENT_SECRET.as_bytes().to_vec())
}

/// Read a secret file, dropping the trailing newline editors tend to add.
fn read_secret_file(path: PathBuf) -> Result<Zeroizing<Vec<u8>>, TokenConfigError> {
    match std::fs::read(&path) {
        Ok(bytes) => {
            let mut bytes = Zeroizing::new(bytes);
            while bytes.last().is_some_and(|b| matches!(b, b'\n' | b'\r')) {
                bytes.pop();
            }
            Ok(bytes)
        }
        Err(source) => Err(TokenConfigError::SecretRead { path, source }),
    }
}

fn ttl_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<TokenTtl, TokenConfigError> {
    let Some(value) = env.string(EXPIRATION_ENV) else {
        return Ok(TokenTtl::default());
    };
    let parsed = value
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|millis| TokenTtl::from_millis(millis).ok());
    match parsed {
        Some(ttl) => Ok(ttl),
        None if mode.is_debug() => {
            warn!(value = %value, "invalid {EXPIRATION_ENV}; using the 24 hour default");
            Ok(TokenTtl::default())
        }
        None => Err(TokenConfigError::InvalidEnv {
            name: EXPIRATION_ENV,
            value,
            expected: EXPIRATION_EXPECTED,
        }),
    }
}
