//! The external identity provider flow.
//!
//! Browser logins go through an OpenID Connect provider using the authorization code flow:
//! 1. `GET /oauth2/authorization/{registration}` stores a random `state` in a short-lived cookie and sends the
//!    browser to the provider.
//! 2. The provider sends the browser back to `GET /login/oauth2/code/{registration}` with a `code`. We check the
//!    `state`, exchange the code for tokens, read the caller's claims from the user-info endpoint, find or create the
//!    matching user account and redirect to the front end with a locally issued access token.
//! 3. `/logout` clears the login state and sends the browser to the provider's end-session endpoint.
//!
//! Providers are inconsistent about which claims they fill in, so the caller's email is resolved by running an ordered
//! list of extractors over the claims ([`EMAIL_CLAIM_CHAIN`]). The first non-blank result wins, and if every extractor
//! comes up empty a placeholder address is made up from the subject identifier.
use actix_web::{
    cookie::{time, Cookie, SameSite},
    HttpRequest,
};
use ccshub_engine::{db_types::NewUser, traits::AccountManagement, AccountApi};
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    auth::{Identity, IdentitySource, TokenIssuer, TokenSubject},
    config::{FrontendConfig, OidcConfig},
    errors::{AuthError, ServerError},
    helpers::{request_host, request_origin},
};

pub const LOGIN_STATE_COOKIE: &str = "ccshub_oauth_state";
const LOGIN_STATE_LEN: usize = 32;
const LOGIN_STATE_TTL_MINUTES: i64 = 10;
/// Accounts created through an external login get this instead of a password hash. It is not a valid hash, so it
/// can never be used to log in locally.
pub const EXTERNAL_ACCOUNT_PASSWORD: &str = "N/A";
pub const NO_ACCESS_TOKEN_MESSAGE: &str = "Authentication failed: No access token issued.";

/// The claims returned by the provider's user-info endpoint.
pub type ProviderClaims = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderTokens {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// The parts of an OpenID Connect provider the login flow depends on.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    /// Where to send the browser to start a login.
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> String;
    /// Trades the authorization code for the provider's tokens.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<ProviderTokens, ServerError>;
    async fn fetch_claims(&self, access_token: &str) -> Result<ProviderClaims, ServerError>;
    fn end_session_endpoint(&self) -> Option<String>;
}

//-------------------------------------------  HttpIdentityProvider  ---------------------------------------------------
#[derive(Clone)]
pub struct HttpIdentityProvider {
    config: OidcConfig,
    client: reqwest::Client,
}

impl HttpIdentityProvider {
    pub fn new(config: OidcConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }
}

impl IdentityProvider for HttpIdentityProvider {
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> String {
        let separator = if self.config.authorization_uri.contains('?') { '&' } else { '?' };
        format!(
            "{}{separator}response_type=code&client_id={}&scope={}&state={}&redirect_uri={}",
            self.config.authorization_uri,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.scopes),
            urlencoding::encode(state),
            urlencoding::encode(redirect_uri),
        )
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<ProviderTokens, ServerError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.reveal().as_str()),
        ];
        let response = self
            .client
            .post(&self.config.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| ServerError::UpstreamFailure(format!("Could not reach the identity provider. {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("🔐️ The identity provider rejected the code exchange ({status}). {body}");
            return Err(ServerError::UpstreamFailure(format!(
                "The identity provider rejected the login with status {status}"
            )));
        }
        response
            .json::<ProviderTokens>()
            .await
            .map_err(|e| ServerError::UpstreamFailure(format!("Invalid token response from the identity provider. {e}")))
    }

    async fn fetch_claims(&self, access_token: &str) -> Result<ProviderClaims, ServerError> {
        let response = self
            .client
            .get(&self.config.user_info_uri)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ServerError::UpstreamFailure(format!("Could not reach the identity provider. {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServerError::UpstreamFailure(format!(
                "The identity provider did not return user information ({status})"
            )));
        }
        response
            .json::<ProviderClaims>()
            .await
            .map_err(|e| ServerError::UpstreamFailure(format!("Invalid user information from the provider. {e}")))
    }

    fn end_session_endpoint(&self) -> Option<String> {
        self.config.end_session_uri.clone()
    }
}

//-------------------------------------------  Claim extraction  -------------------------------------------------------
pub type ClaimExtractor = fn(&ProviderClaims) -> Option<String>;

/// The order in which claims are tried when looking for the caller's email address.
pub const EMAIL_CLAIM_CHAIN: [ClaimExtractor; 3] = [email_claim, preferred_username_claim, upn_claim];

fn string_claim(claims: &ProviderClaims, name: &str) -> Option<String> {
    claims.get(name).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

pub fn email_claim(claims: &ProviderClaims) -> Option<String> {
    string_claim(claims, "email")
}

pub fn preferred_username_claim(claims: &ProviderClaims) -> Option<String> {
    string_claim(claims, "preferred_username")
}

/// Azure AD puts the user principal name here.
pub fn upn_claim(claims: &ProviderClaims) -> Option<String> {
    string_claim(claims, "upn")
}

/// `fallback@<alphanumeric characters of the subject>.com`. The same subject always gives the same address.
pub fn fallback_email(subject: &str) -> String {
    let local: String = subject.chars().filter(char::is_ascii_alphanumeric).collect();
    format!("fallback@{local}.com")
}

pub fn resolve_email(claims: &ProviderClaims) -> String {
    EMAIL_CLAIM_CHAIN.iter().find_map(|extract| extract(claims)).unwrap_or_else(|| {
        let subject = string_claim(claims, "sub").unwrap_or_default();
        error!("🔐️ No email, preferred_username or upn claim for subject '{subject}'. Using a fallback email");
        fallback_email(&subject)
    })
}

/// The username for a newly created account: the `name` claim, else `given_name family_name`, else the email.
pub fn resolve_username(claims: &ProviderClaims, email: &str) -> String {
    if let Some(name) = string_claim(claims, "name") {
        return name;
    }
    let full_name = [string_claim(claims, "given_name"), string_claim(claims, "family_name")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if full_name.is_empty() {
        email.to_string()
    } else {
        full_name
    }
}

/// The identity asserted by the provider, before it is tied to a local account.
pub fn external_identity(claims: &ProviderClaims) -> Identity {
    let email = resolve_email(claims);
    let name = resolve_username(claims, &email);
    Identity {
        subject: string_claim(claims, "sub").unwrap_or_else(|| email.clone()),
        email,
        name,
        user_id: None,
        roles: vec!["USER".to_string()],
        source: IdentitySource::ExternalProvider,
    }
}

//-------------------------------------------  Login flow  ------------------------------------------------------------
pub fn new_login_state() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(LOGIN_STATE_LEN).map(char::from).collect()
}

pub fn login_state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(LOGIN_STATE_COOKIE, state.to_string())
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(LOGIN_STATE_TTL_MINUTES))
        .finish()
}

/// A cookie that makes the browser drop the login state.
pub fn expired_login_state_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(LOGIN_STATE_COOKIE, "").path("/").http_only(true).finish();
    cookie.make_removal();
    cookie
}

/// The callback URL registered with the provider for this server.
pub fn callback_url(req: &HttpRequest, config: &OidcConfig) -> String {
    let base = config.redirect_base.clone().unwrap_or_else(|| request_origin(req));
    format!("{base}/login/oauth2/code/{}", config.registration_id)
}

/// Runs the provider callback and returns the front-end URL to send the browser to.
pub async fn complete_login<B, P>(
    req: &HttpRequest,
    params: CallbackParams,
    accounts: &AccountApi<B>,
    provider: &P,
    issuer: &TokenIssuer,
    oidc: &OidcConfig,
    frontend: &FrontendConfig,
) -> Result<String, ServerError>
where
    B: AccountManagement,
    P: IdentityProvider,
{
    if let Some(err) = params.error {
        let description = params.error_description.unwrap_or_default();
        warn!("🔐️ The identity provider reported a failed login. {err}: {description}");
        return Err(AuthError::InvalidCredentials(format!("External login failed. {err}")).into());
    }
    let expected_state = req.cookie(LOGIN_STATE_COOKIE).map(|c| c.value().to_string());
    match (expected_state, params.state.as_deref()) {
        (Some(expected), Some(state)) if !expected.is_empty() && expected == state => {},
        _ => {
            warn!("🔐️ Login callback state does not match the state cookie");
            return Err(AuthError::LoginStateMismatch.into());
        },
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::InvalidCredentials("The login callback did not include a code".into()))?;
    let tokens = provider.exchange_code(&code, &callback_url(req, oidc)).await?;
    let access_token = tokens.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
        error!("🔐️ The identity provider did not issue an access token. The login is aborted.");
        ServerError::UpstreamFailure(NO_ACCESS_TOKEN_MESSAGE.into())
    })?;
    let claims = provider.fetch_claims(&access_token).await?;
    let identity = external_identity(&claims);
    debug!("🔐️ External login for {} resolved to {}", identity.subject, identity.email);
    let user = accounts
        .fetch_or_create(NewUser::new(identity.name.as_str(), identity.email.as_str(), EXTERNAL_ACCOUNT_PASSWORD))
        .await?;
    let token = issuer.issue_token(&TokenSubject::from(&user), &identity.roles)?;
    let host = request_host(req);
    let url = format!("{}/userpage?token={}", frontend.login_origin(&host), urlencoding::encode(&token));
    info!("🔐️ External login complete for user #{} ({}). Redirecting to the front end at {host}", user.id, user.email);
    Ok(url)
}

/// Where to send the browser on logout.
pub fn logout_url(host: &str, end_session_endpoint: Option<&str>, frontend: &FrontendConfig) -> String {
    let target = frontend.logout_origin(host);
    match end_session_endpoint {
        Some(endpoint) => {
            let separator = if endpoint.contains('?') { '&' } else { '?' };
            format!("{endpoint}{separator}post_logout_redirect_uri={}", urlencoding::encode(target))
        },
        None => target.to_string(),
    }
}
