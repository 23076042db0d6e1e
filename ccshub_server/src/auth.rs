//! Token service and request identities.
//!
//! Access tokens are HS256-signed JWTs. [`TokenIssuer::validate`] fails closed: any problem with a token (bad
//! format, bad signature, expired, claims of the wrong shape) produces `None`, and the caller only ever learns that the
//! request is unauthenticated.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpMessage, HttpRequest};
use ccshub_engine::db_types::{Admin, Role, User};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub email: String,
    pub preferred_username: String,
    pub name: String,
    pub user_id: i64,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

/// The account a token is being issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub subject: String,
    pub name: String,
    pub id: i64,
}

impl From<&User> for TokenSubject {
    fn from(user: &User) -> Self {
        Self { subject: user.email.clone(), name: user.username.clone(), id: user.id }
    }
}

impl From<&Admin> for TokenSubject {
    fn from(admin: &Admin) -> Self {
        Self { subject: admin.username.clone(), name: admin.username.clone(), id: admin.id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentitySource {
    Local,
    ExternalProvider,
}

/// Who is making the request. Built per request and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: String,
    pub name: String,
    pub user_id: Option<i64>,
    pub roles: Vec<String>,
    pub source: IdentitySource,
}

impl Identity {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r.parse::<Role>().map(|r| r == role).unwrap_or(false))
    }

    /// `ADMIN` and `ROLE_ADMIN` (in any case) both count.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

impl From<JwtClaims> for Identity {
    fn from(claims: JwtClaims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
            user_id: Some(claims.user_id),
            roles: claims.roles,
            source: IdentitySource::Local,
        }
    }
}

/// Handlers behind the authorization layer take an `Identity` argument to get at the caller. The access control
/// middleware places it in the request extensions; if it is absent the request is rejected as unauthenticated.
impl FromRequest for Identity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = req.extensions().get::<Identity>().cloned();
        ready(identity.ok_or(ServerError::AuthenticationError(AuthError::Unauthenticated)))
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: config.jwt_expiration,
        }
    }

    /// Issues a token for `subject` carrying `roles`, valid from now for the configured lifetime.
    pub fn issue_token(&self, subject: &TokenSubject, roles: &[String]) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: subject.subject.clone(),
            email: subject.subject.clone(),
            preferred_username: subject.subject.clone(),
            name: subject.name.clone(),
            user_id: subject.id,
            roles: roles.to_vec(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenSigningError(e.to_string()))
    }

    /// Checks the signature, the algorithm and the expiry, and that the token expires after it was issued.
    pub fn validate(&self, token: &str) -> Option<Identity> {
        let data = match decode::<JwtClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                debug!("🔐️ Rejected access token. {e}");
                return None;
            },
        };
        let claims = data.claims;
        if claims.exp <= claims.iat {
            debug!("🔐️ Rejected access token for {}. It expires before it was issued", claims.sub);
            return None;
        }
        trace!("🔐️ Access token validated for {}", claims.sub);
        Some(Identity::from(claims))
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header. The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(actix_web::http::header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// The local bearer-token flow of the authentication gateway. `None` means the request is unauthenticated.
pub fn resolve_identity(headers: &HeaderMap, issuer: &TokenIssuer) -> Option<Identity> {
    let token = bearer_token(headers)?;
    issuer.validate(token)
}
