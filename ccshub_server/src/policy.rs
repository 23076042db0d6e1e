//! The authorization policy.
//!
//! Every request is matched against one ordered table of `(method, path pattern, tier)` rules. The first matching rule
//! decides which tier applies; requests that match nothing need an authenticated caller.
//!
//! Patterns are literal paths, optionally ending in `/**` (the path itself and anything beneath it) or containing `*`
//! segments (exactly one path segment).
use std::fmt::Display;

use actix_web::http::Method;
use log::*;

use crate::auth::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Anyone may proceed. No token is parsed.
    Public,
    /// Any caller with a valid token.
    Authenticated,
    /// Only callers carrying an ADMIN-equivalent role.
    Admin,
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Public => write!(f, "public"),
            Tier::Authenticated => write!(f, "authenticated"),
            Tier::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Unauthenticated,
    Forbidden,
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    /// `None` matches any method.
    pub method: Option<Method>,
    pub pattern: &'static str,
    pub tier: Tier,
}

impl AccessRule {
    pub fn any(pattern: &'static str, tier: Tier) -> Self {
        Self { method: None, pattern, tier }
    }

    pub fn on(method: Method, pattern: &'static str, tier: Tier) -> Self {
        Self { method: Some(method), pattern, tier }
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map(|m| m == method).unwrap_or(true) && path_matches(self.pattern, path)
    }
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        use Tier::*;
        let rules = vec![
            AccessRule::any("/health", Public),
            AccessRule::on(Method::POST, "/api/auth/register", Public),
            AccessRule::on(Method::POST, "/api/auth/login", Public),
            AccessRule::on(Method::POST, "/api/admins/login", Public),
            AccessRule::any("/oauth2/**", Public),
            AccessRule::any("/login/**", Public),
            AccessRule::any("/logout", Public),
            AccessRule::any("/api/admins/**", Admin),
            AccessRule::any("/api/users/delete/**", Admin),
            AccessRule::on(Method::POST, "/api/events/create", Admin),
            AccessRule::any("/api/events/update/**", Admin),
            AccessRule::any("/api/events/delete/**", Admin),
            AccessRule::on(Method::POST, "/api/merchandises/create", Admin),
            AccessRule::any("/api/merchandises/edit/**", Admin),
            AccessRule::any("/api/merchandises/update/**", Admin),
            AccessRule::any("/api/merchandises/delete/**", Admin),
            AccessRule::on(Method::GET, "/api/events/**", Public),
            AccessRule::on(Method::GET, "/api/merchandises/**", Public),
            AccessRule::on(Method::POST, "/api/orders/create", Public),
            AccessRule::on(Method::POST, "/api/orders/upload-receipt/**", Public),
            AccessRule::on(Method::GET, "/api/orders/receipt-image/**", Public),
            AccessRule::on(Method::GET, "/api/orders/user/**", Authenticated),
            AccessRule::any("/api/orders/**", Admin),
            AccessRule::any("/api/users/**", Authenticated),
        ];
        Self { rules }
    }
}

impl AccessPolicy {
    /// The tier of the first rule that matches, or [`Tier::Authenticated`] when none do.
    pub fn tier_for(&self, method: &Method, path: &str) -> Tier {
        let path = normalize(path);
        self.rules.iter().find(|r| r.matches(method, path)).map(|r| r.tier).unwrap_or(Tier::Authenticated)
    }

    pub fn authorize(tier: Tier, identity: Option<&Identity>) -> Decision {
        match (tier, identity) {
            (Tier::Public, _) => Decision::Allow,
            (_, None) => Decision::Unauthenticated,
            (Tier::Authenticated, Some(_)) => Decision::Allow,
            (Tier::Admin, Some(id)) if id.is_admin() => Decision::Allow,
            (Tier::Admin, Some(id)) => {
                debug!("🛡️ {} does not carry an admin role. Roles: {:?}", id.subject, id.roles);
                Decision::Forbidden
            },
        }
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

fn path_matches(pattern: &str, path: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix("/**") {
        if path == prefix {
            return true;
        }
        return path.strip_prefix(prefix).map(|rest| rest.starts_with('/')).unwrap_or(false);
    }
    segments_match(pattern, path)
}

fn segments_match(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some("*"), Some(seg)) if !seg.is_empty() => continue,
            (Some(p), Some(seg)) if p == seg => continue,
            _ => return false,
        }
    }
}
