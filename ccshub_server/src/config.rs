use std::env::{self, VarError};

use ccshub_common::{parse_boolean_flag, Secret};
use chrono::Duration;
use log::*;

use crate::errors::ServerError;

const DEFAULT_CCSHUB_HOST: &str = "127.0.0.1";
const DEFAULT_CCSHUB_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/ccshub.db";
const DEFAULT_JWT_EXPIRATION_MS: i64 = 86_400_000;
const DEV_JWT_SECRET: &str = "defaultSecretKeyForDevelopmentPurposesOnly";
/// HS256 keys shorter than the hash output are rejected.
const MIN_JWT_SECRET_LEN: usize = 32;
const DEFAULT_OIDC_REGISTRATION_ID: &str = "azure-dev";
const DEFAULT_OIDC_SCOPES: &str = "openid profile email";
const DEFAULT_FRONTEND_DEV_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_FRONTEND_PROD_ORIGIN: &str = "https://csshub-systeminteg.vercel.app";
const DEFAULT_FRONTEND_PROD_LOGOUT_ORIGIN: &str = "https://csshub-final.vercel.app";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub oidc: OidcConfig,
    pub frontend: FrontendConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CCSHUB_HOST.to_string(),
            port: DEFAULT_CCSHUB_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            oidc: OidcConfig::default(),
            frontend: FrontendConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the environment. Unset values fall back to their defaults, but a JWT secret that is
    /// set and unusable is an error.
    pub fn from_env_or_default() -> Result<Self, ServerError> {
        let host = env::var("CCSHUB_HOST").ok().unwrap_or_else(|| DEFAULT_CCSHUB_HOST.into());
        let port = env::var("CCSHUB_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CCSHUB_PORT. {e} Using the default, {DEFAULT_CCSHUB_PORT}, \
                         instead."
                    );
                    DEFAULT_CCSHUB_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CCSHUB_PORT);
        let database_url = env::var("CCSHUB_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CCSHUB_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::from_env_or_default()?;
        let oidc = OidcConfig::from_env_or_default();
        let frontend = FrontendConfig::from_env_or_default();
        Ok(Self { host, port, database_url, auth, oidc, frontend })
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared secret used to sign and verify access tokens (HS256).
    pub jwt_secret: Secret<String>,
    /// How long issued access tokens remain valid.
    pub jwt_expiration: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using the built-in development secret. Anyone who \
             knows it can mint admin tokens. DO NOT operate on production like this. Set CCSHUB_JWT_SECRET. 🚨️🚨️🚨️"
        );
        Self {
            jwt_secret: Secret::new(DEV_JWT_SECRET.to_string()),
            jwt_expiration: Duration::milliseconds(DEFAULT_JWT_EXPIRATION_MS),
        }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, jwt_expiration: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), jwt_expiration }
    }

    /// Uses the development secret when `CCSHUB_JWT_SECRET` is unset. A secret that is set but cannot be used is an
    /// error; it is never swapped for the development secret.
    pub fn from_env_or_default() -> Result<Self, ServerError> {
        let secret = match env::var("CCSHUB_JWT_SECRET") {
            Ok(s) => Some(s),
            Err(VarError::NotPresent) => None,
            Err(e) => {
                error!("🚨️ CCSHUB_JWT_SECRET could not be read. {e}");
                return Err(ServerError::ConfigurationError(format!("{e} [CCSHUB_JWT_SECRET]")));
            },
        };
        Self::from_values(secret, env::var("CCSHUB_JWT_EXPIRATION_MS").ok())
    }

    fn from_values(secret: Option<String>, expiration_ms: Option<String>) -> Result<Self, ServerError> {
        let Some(secret) = secret else {
            return Ok(Self::default());
        };
        if secret.len() < MIN_JWT_SECRET_LEN {
            error!(
                "🚨️ The configured CCSHUB_JWT_SECRET is shorter than {MIN_JWT_SECRET_LEN} bytes and was rejected. The \
                 server will not start until it is replaced with a longer secret."
            );
            return Err(ServerError::ConfigurationError(format!(
                "CCSHUB_JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes long"
            )));
        }
        let jwt_expiration = match expiration_ms {
            Some(s) => match s.parse::<i64>() {
                Ok(ms) if ms > 0 => Duration::milliseconds(ms),
                _ => {
                    warn!(
                        "🪛️ Invalid configuration value for CCSHUB_JWT_EXPIRATION_MS ({s}). Using the default of \
                         {DEFAULT_JWT_EXPIRATION_MS} ms."
                    );
                    Duration::milliseconds(DEFAULT_JWT_EXPIRATION_MS)
                },
            },
            None => {
                info!("🪛️ CCSHUB_JWT_EXPIRATION_MS is not set. Tokens will be valid for 24 hours.");
                Duration::milliseconds(DEFAULT_JWT_EXPIRATION_MS)
            },
        };
        Ok(Self { jwt_secret: Secret::new(secret), jwt_expiration })
    }
}

//-------------------------------------------------  OidcConfig  -------------------------------------------------------
/// Settings for the external identity provider (an OpenID Connect provider using the authorization code flow).
#[derive(Clone, Debug)]
pub struct OidcConfig {
    pub registration_id: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub authorization_uri: String,
    pub token_uri: String,
    pub user_info_uri: String,
    pub end_session_uri: Option<String>,
    pub scopes: String,
    /// The public base URL of this server, used to build the callback URL. When `None`, the callback URL is built
    /// from the incoming request.
    pub redirect_base: Option<String>,
    /// Sets the `Secure` attribute on the login state cookie.
    pub secure_cookies: bool,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            registration_id: DEFAULT_OIDC_REGISTRATION_ID.to_string(),
            client_id: String::default(),
            client_secret: Secret::default(),
            authorization_uri: String::default(),
            token_uri: String::default(),
            user_info_uri: String::default(),
            end_session_uri: None,
            scopes: DEFAULT_OIDC_SCOPES.to_string(),
            redirect_base: None,
            secure_cookies: false,
        }
    }
}

impl OidcConfig {
    pub fn from_env_or_default() -> Self {
        let registration_id =
            env::var("CCSHUB_OIDC_REGISTRATION_ID").unwrap_or_else(|_| DEFAULT_OIDC_REGISTRATION_ID.to_string());
        let client_id = env::var("CCSHUB_OIDC_CLIENT_ID").unwrap_or_else(|_| {
            warn!("🪛️ CCSHUB_OIDC_CLIENT_ID is not set. External login will not work.");
            String::default()
        });
        let client_secret = env::var("CCSHUB_OIDC_CLIENT_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ CCSHUB_OIDC_CLIENT_SECRET is not set. External login will not work.");
            String::default()
        });
        let authorization_uri = env::var("CCSHUB_OIDC_AUTHORIZATION_URI").unwrap_or_default();
        let token_uri = env::var("CCSHUB_OIDC_TOKEN_URI").unwrap_or_default();
        let user_info_uri = env::var("CCSHUB_OIDC_USER_INFO_URI").unwrap_or_default();
        if authorization_uri.is_empty() || token_uri.is_empty() || user_info_uri.is_empty() {
            warn!(
                "🪛️ The identity provider endpoints are not fully configured. Set CCSHUB_OIDC_AUTHORIZATION_URI, \
                 CCSHUB_OIDC_TOKEN_URI and CCSHUB_OIDC_USER_INFO_URI to enable external login."
            );
        }
        let end_session_uri = env::var("CCSHUB_OIDC_END_SESSION_URI").ok().filter(|s| !s.trim().is_empty());
        if end_session_uri.is_none() {
            info!("🪛️ No provider end-session endpoint configured. Logout will only redirect to the front end.");
        }
        let scopes = env::var("CCSHUB_OIDC_SCOPES").unwrap_or_else(|_| DEFAULT_OIDC_SCOPES.to_string());
        let redirect_base = env::var("CCSHUB_OIDC_REDIRECT_BASE")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());
        let secure_cookies = parse_boolean_flag(env::var("CCSHUB_SECURE_COOKIES").ok(), false);
        Self {
            registration_id,
            client_id,
            client_secret: Secret::new(client_secret),
            authorization_uri,
            token_uri,
            user_info_uri,
            end_session_uri,
            scopes,
            redirect_base,
            secure_cookies,
        }
    }
}

//-------------------------------------------------  FrontendConfig  ---------------------------------------------------
/// Where browsers are sent after login and logout. The development origin is used whenever the request host
/// contains `localhost`.
#[derive(Clone, Debug)]
pub struct FrontendConfig {
    pub dev_origin: String,
    pub prod_origin: String,
    pub prod_logout_origin: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dev_origin: DEFAULT_FRONTEND_DEV_ORIGIN.to_string(),
            prod_origin: DEFAULT_FRONTEND_PROD_ORIGIN.to_string(),
            prod_logout_origin: DEFAULT_FRONTEND_PROD_LOGOUT_ORIGIN.to_string(),
        }
    }
}

impl FrontendConfig {
    pub fn from_env_or_default() -> Self {
        let origin = |name: &str, default: &str| {
            env::var(name).map(|s| s.trim_end_matches('/').to_string()).unwrap_or_else(|_| default.to_string())
        };
        Self {
            dev_origin: origin("CCSHUB_FRONTEND_DEV_ORIGIN", DEFAULT_FRONTEND_DEV_ORIGIN),
            prod_origin: origin("CCSHUB_FRONTEND_PROD_ORIGIN", DEFAULT_FRONTEND_PROD_ORIGIN),
            prod_logout_origin: origin("CCSHUB_FRONTEND_PROD_LOGOUT_ORIGIN", DEFAULT_FRONTEND_PROD_LOGOUT_ORIGIN),
        }
    }

    fn is_local(host: &str) -> bool {
        host.contains("localhost")
    }

    /// The origin that receives the browser after a successful external login.
    pub fn login_origin(&self, host: &str) -> &str {
        if Self::is_local(host) {
            &self.dev_origin
        } else {
            &self.prod_origin
        }
    }

    /// The origin the provider should send the browser back to after logout.
    pub fn logout_origin(&self, host: &str) -> &str {
        if Self::is_local(host) {
            &self.dev_origin
        } else {
            &self.prod_logout_origin
        }
    }
}
