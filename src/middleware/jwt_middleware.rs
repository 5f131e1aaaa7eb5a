/// JWT Authentication Middleware
///
/// Validates the bearer token from the Authorization header and injects a
/// `RequestIdentity` into request extensions for route handlers.
///
/// Every request lands in exactly one state:
/// - `NoHeader`: no (or an empty) Authorization header
/// - `MalformedHeader`: not exactly `Bearer <token>`
/// - `InvalidToken`: the token fails validation
/// - `Authenticated`: identity attached
///
/// The strict gate answers the first three with 401. The optional gate lets
/// them through without an identity.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderValue},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::TokenService;
use crate::error::{AppError, AuthError};
use crate::middleware::RequestIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    Strict,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    NoHeader,
    MalformedHeader,
    InvalidToken,
    Authenticated(RequestIdentity),
}

impl GateOutcome {
    /// The error a strict gate answers with, if any.
    pub fn rejection(&self) -> Option<AuthError> {
        match self {
            GateOutcome::NoHeader => Some(AuthError::MissingToken),
            GateOutcome::MalformedHeader => Some(AuthError::MalformedHeader),
            GateOutcome::InvalidToken => Some(AuthError::TokenInvalid),
            GateOutcome::Authenticated(_) => None,
        }
    }
}

/// Split `Bearer <token>` on single spaces; anything but exactly two parts
/// with the literal `Bearer` scheme is malformed.
fn bearer_token(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}

/// Run the gate's state machine for one Authorization header value.
pub fn evaluate(header: Option<&HeaderValue>, tokens: &TokenService) -> GateOutcome {
    let value = match header {
        None => return GateOutcome::NoHeader,
        Some(value) => match value.to_str() {
            Ok("") => return GateOutcome::NoHeader,
            Ok(value) => value,
            Err(_) => return GateOutcome::MalformedHeader,
        },
    };

    let Some(token) = bearer_token(value) else {
        return GateOutcome::MalformedHeader;
    };

    match tokens.validate_access_token(token) {
        Ok(claims) => GateOutcome::Authenticated(claims.into()),
        Err(_) => GateOutcome::InvalidToken,
    }
}

/// Authentication gate for protected or identity-aware scopes
pub struct AuthGate {
    tokens: Arc<TokenService>,
    mode: GateMode,
}

impl AuthGate {
    /// Reject requests that do not carry a valid access token.
    pub fn strict(tokens: Arc<TokenService>) -> Self {
        Self {
            tokens,
            mode: GateMode::Strict,
        }
    }

    /// Attach an identity when a valid token is present, never reject.
    pub fn optional(tokens: Arc<TokenService>) -> Self {
        Self {
            tokens,
            mode: GateMode::Optional,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthGateService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
            mode: self.mode,
        }))
    }
}

pub struct AuthGateService<S> {
    service: Rc<S>,
    tokens: Arc<TokenService>,
    mode: GateMode,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
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
        let outcome = evaluate(req.headers().get(header::AUTHORIZATION), &self.tokens);

        let rejection = match outcome {
            GateOutcome::Authenticated(identity) => {
                tracing::debug!(
                    user_id = %identity.subject_id,
                    role = %identity.role,
                    "JWT validated successfully"
                );
                req.extensions_mut().insert(identity);
                None
            }
            other => {
                let rejection = other.rejection();
                match self.mode {
                    GateMode::Strict => rejection,
                    GateMode::Optional => {
                        tracing::debug!(outcome = ?other, "Continuing without identity");
                        None
                    }
                }
            }
        };

        match rejection {
            Some(err) => {
                tracing::info!(path = %req.path(), error = %err, "Request rejected by auth gate");
                Box::pin(async move { Err(AppError::Auth(err).into()) })
            }
            None => {
                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
        }
    }
}
