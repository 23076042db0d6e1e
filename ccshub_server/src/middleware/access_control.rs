//! Access control middleware for the ccsHub server.
//!
//! Wrapped around the whole application. For each request it looks up the authorization tier in the
//! [`AccessPolicy`] table. Public requests are forwarded untouched, without looking at any token. For everything else
//! the bearer token is resolved into an [`Identity`], which is placed in the request extensions for handlers to pick
//! up. Requests without a valid token get a 401, and non-admin callers on admin routes get a 403.
//!
//! Rules are matched against the percent-decoded path the router dispatches on, not the raw request URI.
use std::{pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{resolve_identity, TokenIssuer},
    errors::{AuthError, ServerError},
    policy::{AccessPolicy, Decision, Tier},
};

pub struct AccessControlFactory {
    policy: Arc<AccessPolicy>,
    issuer: TokenIssuer,
}

impl AccessControlFactory {
    pub fn new(policy: Arc<AccessPolicy>, issuer: TokenIssuer) -> Self {
        AccessControlFactory { policy, issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessControlFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AccessControlService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AccessControlService {
            policy: Arc::clone(&self.policy),
            issuer: self.issuer.clone(),
            service: Rc::new(service),
        })
    }
}

pub struct AccessControlService<S> {
    policy: Arc<AccessPolicy>,
    issuer: TokenIssuer,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AccessControlService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let path = req.match_info().as_str().to_string();
        let tier = self.policy.tier_for(req.method(), &path);
        if tier == Tier::Public {
            trace!("🛡️ {} {path} is public", req.method());
            return Box::pin(async move { service.call(req).await.map(ServiceResponse::map_into_left_body) });
        }
        let identity = resolve_identity(req.headers(), &self.issuer);
        let decision = AccessPolicy::authorize(tier, identity.as_ref());
        Box::pin(async move {
            let err = match decision {
                Decision::Allow => {
                    if let Some(identity) = identity {
                        req.extensions_mut().insert(identity);
                    }
                    return service.call(req).await.map(ServiceResponse::map_into_left_body);
                },
                Decision::Unauthenticated => {
                    debug!("🛡️ Unauthenticated request to {} {path} ({tier} route)", req.method());
                    AuthError::Unauthenticated
                },
                Decision::Forbidden => {
                    info!("🛡️ Denied {} {path} to a caller without an admin role", req.method());
                    AuthError::InsufficientPermissions("This resource requires an admin role.".into())
                },
            };
            Ok(req.error_response(ServerError::AuthenticationError(err)).map_into_right_body())
        })
    }
}
