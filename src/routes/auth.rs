/// Authentication Routes
///
/// Login, token refresh, and current account information.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::accounts::{Account, AccountStore};
use crate::auth::{unknown_account_hash, PasswordVerifier, TokenService};
use crate::error::{AppError, AuthError, DatabaseError, ValidationError};
use crate::middleware::RequestIdentity;
use crate::validators::{is_valid_email, is_valid_login_password};

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Login response with access and refresh tokens
#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: Account,
}

/// Refresh response; the refresh token itself is not rotated
#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: Account,
}

/// POST /api/v1/auth/login
///
/// Authenticate with email and password.
///
/// # Errors
/// - 400: Validation error (bad email format, password length)
/// - 401: Invalid credentials. Unknown email, wrong password and an
///   inactive account all produce the same response
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    accounts: web::Data<dyn AccountStore>,
    passwords: web::Data<dyn PasswordVerifier>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = form.into_inner();
    let email = is_valid_email(&email)?;
    is_valid_login_password(&password)?;

    let account = accounts.get_by_email(&email).await?;

    // Unknown emails still pay for a full bcrypt verify.
    let verifier = passwords.into_inner();
    let password_hash = match &account {
        Some(account) => account.password_hash.clone(),
        None => unknown_account_hash().to_string(),
    };
    let password_valid = web::block(move || verifier.verify(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

    let account = match account {
        Some(account) => account,
        None => {
            tracing::info!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    if !password_valid {
        tracing::info!(user_id = %account.id, "Login attempt with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    if !account.is_active() {
        tracing::warn!(
            user_id = %account.id,
            status = %account.status,
            "Login attempt on inactive account"
        );
        return Err(AuthError::InvalidCredentials.into());
    }

    let access_token = tokens.issue_access_token(account.id, &account.email, account.role)?;
    let refresh_token = tokens.issue_refresh_token(account.id)?;

    tracing::info!(user_id = %account.id, role = %account.role, "User logged in successfully");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: tokens.access_lifetime_secs(),
        user: account,
    }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new access token. Email and role come
/// from the account store as it is now, never from an earlier token.
///
/// # Errors
/// - 400: Missing refresh token
/// - 401: Invalid or expired refresh token, account gone, account inactive
/// - 500: Internal server error
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    accounts: web::Data<dyn AccountStore>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    if form.refresh_token.trim().is_empty() {
        return Err(ValidationError::EmptyField("refresh_token".to_string()).into());
    }

    let claims = tokens.validate_refresh_token(&form.refresh_token)?;

    let account = accounts
        .get_by_id(claims.user_id)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    if !account.is_active() {
        tracing::warn!(user_id = %account.id, status = %account.status, "Refresh for inactive account");
        return Err(AuthError::AccountInactive.into());
    }

    let access_token = tokens.issue_access_token(account.id, &account.email, account.role)?;

    tracing::info!(user_id = %account.id, "Token refreshed successfully");

    Ok(HttpResponse::Ok().json(RefreshResponse {
        access_token,
        token_type: "Bearer",
        expires_in: tokens.access_lifetime_secs(),
        user: account,
    }))
}

/// GET /api/v1/auth/me
///
/// Current account profile. Requires the strict auth gate.
///
/// # Errors
/// - 401: Missing or invalid token (handled by the gate)
/// - 404: Account no longer exists
pub async fn get_current_user(
    identity: RequestIdentity,
    accounts: web::Data<dyn AccountStore>,
) -> Result<HttpResponse, AppError> {
    let account = accounts
        .get_by_id(identity.subject_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User profile not found".to_string()))?;

    Ok(HttpResponse::Ok().json(account))
}
