/// Role-based authorization middleware
///
/// Must sit inside a strict `AuthGate` (wrapped before it, so it runs after
/// it). A request without an identity is "not authenticated" (401), which
/// is distinct from "wrong role" (403).
///
/// `admin` is a superuser: it passes every role check regardless of the
/// allowed set.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::Role;
use crate::error::{AppError, AuthError};
use crate::middleware::RequestIdentity;

/// Decide whether `identity` may proceed given the `allowed` roles.
pub fn authorize(
    identity: Option<&RequestIdentity>,
    allowed: &HashSet<Role>,
) -> Result<(), AuthError> {
    let identity = identity.ok_or(AuthError::NotAuthenticated)?;

    if identity.role.is_superuser() || allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}

pub struct RequireRoles {
    allowed: Arc<HashSet<Role>>,
}

impl RequireRoles {
    pub fn new<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Role>,
    {
        Self {
            allowed: Arc::new(roles.into_iter().collect()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRoles
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRolesService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequireRolesService {
            service: Rc::new(service),
            allowed: self.allowed.clone(),
        }))
    }
}

pub struct RequireRolesService<S> {
    service: Rc<S>,
    allowed: Arc<HashSet<Role>>,
}

impl<S, B> Service<ServiceRequest> for RequireRolesService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let decision = {
            let extensions = req.extensions();
            authorize(extensions.get::<RequestIdentity>(), &self.allowed)
        };

        match decision {
            Ok(()) => {
                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(err) => {
                tracing::warn!(path = %req.path(), error = %err, "Request rejected by role gate");
                Box::pin(async move { Err(AppError::Auth(err).into()) })
            }
        }
    }
}
