/// JWT Claims structures
///
/// Payloads of access and refresh tokens. Both carry the standard
/// `sub`/`iat`/`nbf`/`exp` claims (RFC 7519) plus a `token_use` marker so
/// that one kind of token can never be presented as the other.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// Validity window shared by every claim set the codec accepts.
pub trait ValidityWindow {
    /// The `token_use` value a claim set of this type must carry.
    const TOKEN_USE: TokenUse;

    fn subject(&self) -> &str;
    fn user_id(&self) -> Uuid;
    fn token_use(&self) -> TokenUse;
    fn issued_at(&self) -> i64;
    fn not_before(&self) -> i64;
    fn expires_at(&self) -> i64;
}

/// Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub token_use: TokenUse,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    /// Create new claims valid from `now` for `lifetime_seconds`
    pub fn new(user_id: Uuid, email: String, role: Role, now: i64, lifetime_seconds: i64) -> Self {
        Self {
            sub: user_id.to_string(),
            user_id,
            email,
            role,
            token_use: TokenUse::Access,
            iat: now,
            nbf: now,
            exp: now.saturating_add(lifetime_seconds),
        }
    }
}

impl ValidityWindow for AccessClaims {
    const TOKEN_USE: TokenUse = TokenUse::Access;

    fn subject(&self) -> &str {
        &self.sub
    }
    fn user_id(&self) -> Uuid {
        self.user_id
    }
    fn token_use(&self) -> TokenUse {
        self.token_use
    }
    fn issued_at(&self) -> i64 {
        self.iat
    }
    fn not_before(&self) -> i64 {
        self.nbf
    }
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// Claims for refresh tokens
///
/// Carries no email or role: those are re-read from the account store
/// whenever a refresh token is exchanged.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub token_use: TokenUse,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn new(user_id: Uuid, now: i64, lifetime_seconds: i64) -> Self {
        Self {
            sub: user_id.to_string(),
            user_id,
            token_use: TokenUse::Refresh,
            iat: now,
            nbf: now,
            exp: now.saturating_add(lifetime_seconds),
        }
    }
}

impl ValidityWindow for RefreshClaims {
    const TOKEN_USE: TokenUse = TokenUse::Refresh;

    fn subject(&self) -> &str {
        &self.sub
    }
    fn user_id(&self) -> Uuid {
        self.user_id
    }
    fn token_use(&self) -> TokenUse {
        self.token_use
    }
    fn issued_at(&self) -> i64 {
        self.iat
    }
    fn not_before(&self) -> i64 {
        self.nbf
    }
    fn expires_at(&self) -> i64 {
        self.exp
    }
}
