use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AccessClaims, Role};
use crate::error::{AppError, AuthError};

/// Identity of the caller for the current request.
///
/// Inserted into the request extensions by `AuthGate` and nowhere else.
/// Handlers take it as an argument (`RequestIdentity` to require it,
/// `Option<RequestIdentity>` to accept anonymous callers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestIdentity {
    pub subject_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<AccessClaims> for RequestIdentity {
    fn from(claims: AccessClaims) -> Self {
        Self {
            subject_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl FromRequest for RequestIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<RequestIdentity>()
                .cloned()
                .ok_or(AppError::Auth(AuthError::NotAuthenticated)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_extracts_identity_from_extensions() {
        let identity = RequestIdentity {
            subject_id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: Role::Collaborator,
        };
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(identity.clone());

        let extracted = RequestIdentity::extract(&req).await.unwrap();
        assert_eq!(extracted, identity);
    }

    #[actix_web::test]
    async fn test_missing_identity_is_not_authenticated() {
        let req = TestRequest::default().to_http_request();

        let result = RequestIdentity::extract(&req).await;
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::NotAuthenticated))
        ));
    }
}
