/// Token Service
///
/// Issues access/refresh token pairs and validates them. Holds only
/// immutable state (codec, lifetimes, time source), so one instance is
/// built at startup and shared across all workers behind an `Arc`.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::auth::clock::{TimeSource, WallClock};
use crate::auth::jwt::{parse_algorithm, TokenCodec};
use crate::auth::role::Role;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ConfigError, TokenError};

/// Upper bound for either token lifetime: ten years.
pub const MAX_TOKEN_LIFETIME: i64 = 10 * 365 * 86_400;

pub struct TokenService {
    codec: TokenCodec,
    access_lifetime: i64,
    refresh_lifetime: i64,
    clock: Arc<dyn TimeSource>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("codec", &self.codec)
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build a service from configuration using the wall clock.
    ///
    /// # Errors
    /// Returns error if the secret is empty, the algorithm is not HMAC,
    /// a lifetime is not positive, or the refresh lifetime does not exceed
    /// the access lifetime
    pub fn from_settings(settings: &JwtSettings) -> Result<Self, ConfigError> {
        Self::with_clock(settings, Arc::new(WallClock))
    }

    pub fn with_clock(
        settings: &JwtSettings,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        let algorithm = parse_algorithm(&settings.algorithm)?;
        let codec = TokenCodec::new(&settings.secret, algorithm)?;

        if settings.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.access_token_expiry must be positive".to_string(),
            ));
        }
        if settings.refresh_token_expiry > MAX_TOKEN_LIFETIME {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.refresh_token_expiry must not exceed {} seconds",
                MAX_TOKEN_LIFETIME
            )));
        }
        if settings.refresh_token_expiry <= settings.access_token_expiry {
            return Err(ConfigError::InvalidValue(
                "jwt.refresh_token_expiry must be longer than jwt.access_token_expiry".to_string(),
            ));
        }

        Ok(Self {
            codec,
            access_lifetime: settings.access_token_expiry,
            refresh_lifetime: settings.refresh_token_expiry,
            clock,
        })
    }

    /// Access token lifetime in seconds, reported to clients as `expires_in`.
    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime
    }

    pub fn refresh_lifetime_secs(&self) -> i64 {
        self.refresh_lifetime
    }

    /// Generate a new access token for an account
    ///
    /// # Errors
    /// Returns error if signing fails
    pub fn issue_access_token(
        &self,
        subject_id: Uuid,
        email: &str,
        role: Role,
    ) -> Result<String, AppError> {
        let claims = AccessClaims::new(
            subject_id,
            email.to_string(),
            role,
            self.clock.now(),
            self.access_lifetime,
        );

        self.codec
            .encode(&claims)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Generate a new refresh token for an account
    ///
    /// # Errors
    /// Returns error if signing fails
    pub fn issue_refresh_token(&self, subject_id: Uuid) -> Result<String, AppError> {
        let claims = RefreshClaims::new(subject_id, self.clock.now(), self.refresh_lifetime);

        self.codec
            .encode(&claims)
            .map_err(|e| AppError::Internal(format!("Refresh token generation failed: {}", e)))
    }

    /// Validate and extract claims from an access token
    ///
    /// Does not consult the account store.
    ///
    /// # Errors
    /// Returns `AuthError::TokenInvalid` whatever the underlying reason
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.codec
            .decode::<AccessClaims>(token, self.clock.now())
            .map_err(|e| reject("access", e))
    }

    /// Validate and extract claims from a refresh token
    ///
    /// # Errors
    /// Returns `AuthError::TokenInvalid` whatever the underlying reason
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.codec
            .decode::<RefreshClaims>(token, self.clock.now())
            .map_err(|e| reject("refresh", e))
    }
}

fn reject(kind: &'static str, reason: TokenError) -> AuthError {
    match reason {
        TokenError::SignatureInvalid => {
            tracing::warn!(token_kind = kind, reason = %reason, "Rejected token");
        }
        _ => {
            tracing::debug!(token_kind = kind, reason = %reason, "Rejected token");
        }
    }
    AuthError::TokenInvalid
}
